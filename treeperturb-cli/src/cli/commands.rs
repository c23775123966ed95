//! Argument parsing and run orchestration for the treeperturb CLI.

use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::Parser;
use rand::{SeedableRng, rngs::SmallRng};
use thiserror::Error;
use tracing::{Span, field, info, instrument, warn};
use treeperturb_core::{
    Operation, PerturbError, PerturbationPlan, PerturbationPlanBuilder, PerturbationReport,
    Perturber, ValidationError, check_duplication,
};
use treeperturb_providers_dot::{DotError, load_path, write_path};

/// Command-line options parsed by [`clap`].
#[derive(Debug, Parser, Clone)]
#[command(
    name = "treeperturb",
    about = "Apply randomized structural edits to a labeled DOT tree.",
    allow_negative_numbers = true
)]
pub struct Cli {
    /// DOT file holding the input tree.
    #[arg(long)]
    pub tree: PathBuf,

    /// Destination of the perturbed DOT tree.
    #[arg(long)]
    pub out: PathBuf,

    /// Number (or weight, with a budget) of label swaps.
    #[arg(long, default_value_t = 0)]
    pub labelswap: usize,

    /// Number (or weight, with a budget) of node removals.
    #[arg(long, default_value_t = 0)]
    pub noderemove: usize,

    /// Number (or weight, with a budget) of label removals.
    #[arg(long, default_value_t = 0)]
    pub labelremove: usize,

    /// Number (or weight, with a budget) of label duplications.
    #[arg(long, default_value_t = 0)]
    pub labelduplication: usize,

    /// Number (or weight, with a budget) of node payload swaps.
    #[arg(long, default_value_t = 0)]
    pub nodeswap: usize,

    /// Total operations to draw from the weighted categories; -1 applies
    /// every count exactly instead.
    #[arg(
        long,
        default_value_t = -1,
        value_parser = clap::value_parser!(i64).range(-1..),
    )]
    pub totoperations: i64,

    /// Seed for the random source; drawn from system entropy when absent.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Fresh attempts from the loaded tree when a run hits stale label
    /// ownership.
    #[arg(
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..),
    )]
    pub attempts: u32,
}

impl Cli {
    /// Requested count of `operation`.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        match operation {
            Operation::LabelSwap => self.labelswap,
            Operation::NodeRemove => self.noderemove,
            Operation::LabelRemove => self.labelremove,
            Operation::LabelDuplication => self.labelduplication,
            Operation::NodeSwap => self.nodeswap,
        }
    }

    /// Budget of the run, or `None` for exhaustive mode.
    #[must_use]
    pub fn total_operations(&self) -> Option<usize> {
        usize::try_from(self.totoperations).ok()
    }

    /// Builds the perturbation plan described by the flags.
    ///
    /// # Errors
    /// Returns [`PerturbError::NoOperationWeights`] when a budget is given
    /// with every count at zero.
    pub fn plan(&self) -> Result<PerturbationPlan, PerturbError> {
        Operation::ALL
            .iter()
            .fold(PerturbationPlanBuilder::new(), |builder, &operation| {
                builder.with_count(operation, self.count(operation))
            })
            .with_total_operations(self.total_operations())
            .build()
    }
}

/// Errors surfaced while executing the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Loading or writing a DOT file failed.
    #[error(transparent)]
    Dot(#[from] DotError),
    /// Planning or running the perturbation failed.
    #[error(transparent)]
    Perturb(#[from] PerturbError),
    /// The perturbed tree repeats a payload.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result of the post-run payload check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// Every payload is unique.
    Passed,
    /// Label duplication was requested, so repeats are expected.
    Skipped,
}

/// Summarises a successful run.
#[derive(Debug, Clone)]
pub struct ExecutionSummary {
    /// Where the perturbed tree was written.
    pub out: PathBuf,
    /// Applied operations of the successful attempt.
    pub report: PerturbationReport,
    /// Attempts used, the successful one included.
    pub attempts: u32,
    /// Live nodes in the written tree, root included.
    pub nodes: usize,
    /// Outcome of the payload check.
    pub validation: ValidationOutcome,
}

/// Loads the tree, perturbs it, validates it and writes the result.
///
/// The output file is only written once every step has succeeded.
///
/// # Errors
/// Returns [`CliError`] when loading, planning, any attempt, the payload
/// check or writing fails.
///
/// # Examples
/// ```
/// # use std::error::Error;
/// # use clap::Parser;
/// # use treeperturb_cli::cli::{Cli, ValidationOutcome, run_cli};
/// # fn main() -> Result<(), Box<dyn Error>> {
/// let dir = tempfile::tempdir()?;
/// let input = dir.path().join("in.dot");
/// let output = dir.path().join("out.dot");
/// std::fs::write(
///     &input,
///     "digraph { r [label=root]; a [label=a]; b [label=b]; r -> a; r -> b; }",
/// )?;
/// let cli = Cli::try_parse_from([
///     "treeperturb",
///     "--tree", input.to_str().ok_or("utf-8 path")?,
///     "--out", output.to_str().ok_or("utf-8 path")?,
///     "--nodeswap", "1",
///     "--seed", "7",
/// ])?;
/// let summary = run_cli(cli)?;
/// assert_eq!(summary.nodes, 3);
/// assert_eq!(summary.validation, ValidationOutcome::Passed);
/// assert!(output.exists());
/// # Ok(())
/// # }
/// ```
#[instrument(
    name = "cli.run",
    err,
    skip(cli),
    fields(
        tree = %cli.tree.display(),
        out = %cli.out.display(),
        seed = field::Empty,
        attempts = field::Empty,
    ),
)]
pub fn run_cli(cli: Cli) -> Result<ExecutionSummary, CliError> {
    let span = Span::current();
    let plan = cli.plan()?;
    let loaded = load_path(&cli.tree)?;
    let mut rng = match cli.seed {
        Some(seed) => {
            span.record("seed", seed);
            SmallRng::seed_from_u64(seed)
        }
        None => SmallRng::from_entropy(),
    };

    let mut attempt = 1;
    let (tree, report) = loop {
        let mut perturber = Perturber::new(loaded.tree.clone(), loaded.index.clone(), &mut rng);
        match perturber.run(&plan) {
            Ok(report) => break (perturber.into_parts().0, report),
            Err(err) if err.is_retryable() && attempt < cli.attempts => {
                warn!(attempt, error = %err, "restarting perturbation from the loaded tree");
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    };
    span.record("attempts", attempt);

    let validation = if plan.requires_validation() {
        check_duplication(&tree)?;
        ValidationOutcome::Passed
    } else {
        ValidationOutcome::Skipped
    };
    write_path(&tree, &cli.out)?;

    info!(
        applied = report.len(),
        nodes = tree.len(),
        attempts = attempt,
        "perturbed tree written"
    );
    Ok(ExecutionSummary {
        out: cli.out,
        report,
        attempts: attempt,
        nodes: tree.len(),
        validation,
    })
}

/// Renders `summary` to `writer` as `key: value` lines.
///
/// # Errors
/// Returns [`io::Error`] if writing fails.
///
/// # Examples
/// ```
/// # use std::path::PathBuf;
/// # use treeperturb_cli::cli::{ExecutionSummary, ValidationOutcome, render_summary};
/// # use treeperturb_core::PerturbationReport;
/// let summary = ExecutionSummary {
///     out: PathBuf::from("out.dot"),
///     report: PerturbationReport::default(),
///     attempts: 1,
///     nodes: 4,
///     validation: ValidationOutcome::Passed,
/// };
/// let mut buffer = Vec::new();
/// render_summary(&summary, &mut buffer)?;
/// let text = String::from_utf8(buffer).expect("utf-8");
/// assert!(text.contains("validation: dup ok\n"));
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn render_summary(summary: &ExecutionSummary, mut writer: impl Write) -> io::Result<()> {
    for operation in Operation::ALL {
        writeln!(writer, "{operation}: {}", summary.report.count(operation))?;
    }
    writeln!(writer, "nodes: {}", summary.nodes)?;
    writeln!(writer, "attempts: {}", summary.attempts)?;
    let validation = match summary.validation {
        ValidationOutcome::Passed => "dup ok",
        ValidationOutcome::Skipped => "skipped (label duplication requested)",
    };
    writeln!(writer, "validation: {validation}")?;
    writeln!(writer, "output: {}", summary.out.display())?;
    Ok(())
}
