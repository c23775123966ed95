//! DOT serialization of a [`LabeledTree`].

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use tracing::{debug, instrument};
use treeperturb_core::LabeledTree;

use crate::errors::DotError;

/// Writes `tree` as a `digraph` to `writer`.
///
/// Every live node becomes one `"name" [label="a,b"];` statement in insertion
/// order, followed by one `"parent" -> "child";` statement per edge, parents
/// in insertion order and children in their stored order.
///
/// # Errors
/// Returns [`DotError::Io`] when the writer fails.
///
/// # Examples
/// ```
/// use treeperturb_core::{LabelSet, LabeledTreeBuilder};
/// use treeperturb_providers_dot::write_tree;
///
/// let mut builder = LabeledTreeBuilder::new();
/// let root = builder.add_node("r", LabelSet::parse("root"));
/// let leaf = builder.add_node("x", LabelSet::parse("a,b"));
/// builder.add_edge(root, leaf);
/// let tree = builder.build()?;
///
/// let mut out = Vec::new();
/// write_tree(&tree, &mut out)?;
/// assert_eq!(
///     String::from_utf8(out)?,
///     "digraph {\n    \"r\" [label=\"root\"];\n    \"x\" [label=\"a,b\"];\n    \"r\" -> \"x\";\n}\n"
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn write_tree<W: Write>(tree: &LabeledTree, mut writer: W) -> Result<(), DotError> {
    writeln!(writer, "digraph {{")?;
    for node in tree.node_ids() {
        let (Ok(name), Ok(payload)) = (tree.name(node), tree.payload(node)) else {
            continue;
        };
        writeln!(
            writer,
            "    \"{}\" [label=\"{}\"];",
            escape(name),
            escape(&payload.to_string())
        )?;
    }
    for parent in tree.node_ids() {
        let (Ok(parent_name), Ok(children)) = (tree.name(parent), tree.children(parent)) else {
            continue;
        };
        for &child in children {
            if let Ok(child_name) = tree.name(child) {
                writeln!(
                    writer,
                    "    \"{}\" -> \"{}\";",
                    escape(parent_name),
                    escape(child_name)
                )?;
            }
        }
    }
    writeln!(writer, "}}")?;
    writer.flush()?;
    Ok(())
}

/// Writes `tree` to the file at `path`, replacing any existing content.
///
/// # Errors
/// Returns [`DotError::Io`] when the file cannot be created or written.
#[instrument(
    name = "dot.write",
    err,
    skip(tree, path),
    fields(path = %path.as_ref().display(), nodes = tree.len()),
)]
pub fn write_path(tree: &LabeledTree, path: impl AsRef<Path>) -> Result<(), DotError> {
    let file = File::create(path.as_ref())?;
    write_tree(tree, BufWriter::new(file))?;
    debug!("tree written");
    Ok(())
}

/// Escapes the characters the lexer resolves inside quoted strings.
fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
