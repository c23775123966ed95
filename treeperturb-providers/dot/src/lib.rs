//! DOT provider: loads labeled trees from Graphviz `digraph` text and writes
//! them back.
//!
//! Supported input is a subset of the DOT language: an optional `strict`
//! keyword, a single `digraph` with optional id, node statements, edge chains
//! `a -> b -> c`, attribute defaults, graph attribute assignments, quoted
//! identifiers, and `//`, `/* */` and `#` comments. Every node needs a
//! `label` attribute holding its comma-joined labels, given directly or
//! through a preceding `node [label=...]` default.

mod errors;
mod lexer;
mod parser;
mod writer;

use std::{fs, path::Path};

use tracing::{debug, instrument};
use treeperturb_core::{LabelIndex, LabeledTree};

pub use crate::{
    errors::DotError,
    writer::{write_path, write_tree},
};

/// A freshly parsed tree together with its label index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedTree {
    /// The parsed tree.
    pub tree: LabeledTree,
    /// Label ownership recorded from the parsed tree.
    pub index: LabelIndex,
}

/// Parses DOT text into a tree and its label index.
///
/// # Errors
/// Returns [`DotError::Syntax`] for text outside the supported subset,
/// [`DotError::UndirectedGraph`] for an undirected `graph`,
/// [`DotError::MissingLabel`] for an unlabelled node and [`DotError::Tree`]
/// when the graph is not a rooted tree.
///
/// # Examples
/// ```
/// use treeperturb_providers_dot::parse_str;
///
/// let loaded = parse_str(r#"digraph { r [label="root"]; a [label="x,y"]; r -> a; }"#)?;
/// assert_eq!(loaded.tree.len(), 2);
/// assert_eq!(loaded.index.labels(), ["x", "y"]);
/// # Ok::<(), treeperturb_providers_dot::DotError>(())
/// ```
#[instrument(name = "dot.parse", err, skip(text), fields(bytes = text.len()))]
pub fn parse_str(text: &str) -> Result<LoadedTree, DotError> {
    let tree = parser::Parser::new(text)?.parse()?;
    let index = LabelIndex::from_tree(&tree);
    debug!(nodes = tree.len(), labels = index.len(), "tree parsed");
    Ok(LoadedTree { tree, index })
}

/// Reads and parses the DOT file at `path`.
///
/// # Errors
/// Returns [`DotError::Io`] when the file cannot be read, and otherwise the
/// errors of [`parse_str`].
#[instrument(name = "dot.load", err, skip(path), fields(path = %path.as_ref().display()))]
pub fn load_path(path: impl AsRef<Path>) -> Result<LoadedTree, DotError> {
    let text = fs::read_to_string(path.as_ref())?;
    parse_str(&text)
}
