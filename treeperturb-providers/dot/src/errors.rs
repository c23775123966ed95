use thiserror::Error;
use treeperturb_core::TreeError;

/// Errors raised while reading or writing DOT trees.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DotError {
    /// The source or destination could not be read or written.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// The text is not valid within the supported DOT subset.
    #[error("syntax error at {line}:{column}: {message}")]
    Syntax {
        /// One-based line of the offending token.
        line: usize,
        /// One-based column of the offending token.
        column: usize,
        /// What was expected or found.
        message: String,
    },
    /// A node has no `label` attribute, directly or through `node` defaults.
    #[error("node `{node}` has no label attribute")]
    MissingLabel {
        /// Name of the unlabelled node.
        node: String,
    },
    /// The input declares an undirected `graph`.
    #[error("only directed graphs (`digraph`) describe a rooted tree")]
    UndirectedGraph,
    /// The graph is well formed but not a rooted labeled tree.
    #[error("invalid tree: {0}")]
    Tree(#[from] TreeError),
}
