//! Post-run payload uniqueness check.

use std::{collections::HashMap, sync::Arc};

use tracing::{debug, instrument};

use crate::{error::ValidationError, tree::LabeledTree};

/// Fails when two live nodes render to the same payload string.
///
/// Nodes are visited in insertion order, root included, and the first repeat
/// is reported. Payloads are compared in their rendered `a,b` form, so label
/// order matters: `a,b` and `b,a` are distinct.
///
/// # Errors
/// Returns [`ValidationError::DuplicatePayload`] naming the shared payload and
/// both nodes.
///
/// # Examples
/// ```
/// use treeperturb_core::{LabelSet, LabeledTreeBuilder, check_duplication};
///
/// let mut builder = LabeledTreeBuilder::new();
/// let root = builder.add_node("r", LabelSet::parse("root"));
/// let a = builder.add_node("a", LabelSet::parse("x,y"));
/// let b = builder.add_node("b", LabelSet::parse("x,y"));
/// builder.add_edge(root, a);
/// builder.add_edge(root, b);
/// let tree = builder.build()?;
///
/// assert!(check_duplication(&tree).is_err());
/// # Ok::<(), treeperturb_core::TreeError>(())
/// ```
#[instrument(name = "core.check_duplication", err, skip(tree), fields(nodes = tree.len()))]
pub fn check_duplication(tree: &LabeledTree) -> Result<(), ValidationError> {
    let mut seen = HashMap::with_capacity(tree.len());
    for node in tree.node_ids() {
        let Ok(payload) = tree.payload(node) else {
            continue;
        };
        let rendered = payload.to_string();
        if let Some(&first) = seen.get(&rendered) {
            return Err(ValidationError::DuplicatePayload {
                payload: Arc::from(rendered),
                first,
                second: node,
            });
        }
        seen.insert(rendered, node);
    }
    debug!("payloads are unique");
    Ok(())
}
