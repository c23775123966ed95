//! Support library for the treeperturb CLI binary.
//!
//! Exposes the command pipeline and logging setup so doctests and
//! integration tests can drive a run without forking a subprocess.

pub mod cli;
pub mod logging;
