//! Shared test utilities used across treeperturb crates.

pub mod profile;
pub mod tracing;
