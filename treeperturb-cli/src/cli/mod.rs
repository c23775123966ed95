//! Command-line interface orchestration for treeperturb.
//!
//! A single command loads a DOT tree, applies the requested perturbations,
//! checks payload uniqueness when duplication was not requested and writes
//! the perturbed tree back as DOT.

mod commands;

pub use commands::{Cli, CliError, ExecutionSummary, ValidationOutcome, render_summary, run_cli};
