//! The five randomized edit operators applied to a [`LabeledTree`].
//!
//! Every operator enumerates its eligible candidates explicitly and samples
//! uniformly from them. The root is never a candidate, so collapsing or
//! swapping it cannot happen through this module; when too few candidates
//! exist the operator fails with [`PerturbError::Infeasible`] rather than
//! searching indefinitely.

use std::{fmt, sync::Arc};

use rand::{Rng, seq::SliceRandom};
use tracing::debug;

use crate::{
    Result,
    error::PerturbError,
    label_index::LabelIndex,
    tree::{LabeledTree, NodeId},
};

/// Categories of edit operations, listed in exhaustive-mode order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    /// Exchange two labels between their owning nodes.
    LabelSwap,
    /// Collapse a non-root node into its parent.
    NodeRemove,
    /// Drop one label, collapsing its owner when it was the last one.
    LabelRemove,
    /// Copy one label onto another non-root node.
    LabelDuplication,
    /// Exchange the full payloads of two non-root nodes.
    NodeSwap,
}

impl Operation {
    /// Every category in the order exhaustive mode applies them.
    pub const ALL: [Self; 5] = [
        Self::LabelSwap,
        Self::NodeRemove,
        Self::LabelRemove,
        Self::LabelDuplication,
        Self::NodeSwap,
    ];

    /// Stable lowercase name, matching the command-line flag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LabelSwap => "labelswap",
            Self::NodeRemove => "noderemove",
            Self::LabelRemove => "labelremove",
            Self::LabelDuplication => "labelduplication",
            Self::NodeSwap => "nodeswap",
        }
    }

    /// Position of the category within [`Self::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::LabelSwap => 0,
            Self::NodeRemove => 1,
            Self::LabelRemove => 2,
            Self::LabelDuplication => 3,
            Self::NodeSwap => 4,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one applied edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppliedOperation {
    /// Two labels traded owners.
    LabelSwap {
        /// First drawn label.
        first: Arc<str>,
        /// Second drawn label.
        second: Arc<str>,
        /// Recorded owner of `first`.
        first_owner: NodeId,
        /// Recorded owner of `second`.
        second_owner: NodeId,
    },
    /// A node was collapsed into its parent.
    NodeRemove {
        /// The collapsed node.
        node: NodeId,
    },
    /// A label was dropped from the working set and its owner.
    LabelRemove {
        /// The removed label.
        label: Arc<str>,
        /// Recorded owner of the label.
        node: NodeId,
        /// Whether the owner was collapsed because it held a single label.
        collapsed: bool,
    },
    /// A label was appended to a second node.
    LabelDuplication {
        /// The duplicated label.
        label: Arc<str>,
        /// Node that received the copy.
        target: NodeId,
    },
    /// Two payloads were exchanged.
    NodeSwap {
        /// First node.
        first: NodeId,
        /// Second node.
        second: NodeId,
    },
}

impl AppliedOperation {
    /// Category of the applied edit.
    #[must_use]
    pub const fn operation(&self) -> Operation {
        match self {
            Self::LabelSwap { .. } => Operation::LabelSwap,
            Self::NodeRemove { .. } => Operation::NodeRemove,
            Self::LabelRemove { .. } => Operation::LabelRemove,
            Self::LabelDuplication { .. } => Operation::LabelDuplication,
            Self::NodeSwap { .. } => Operation::NodeSwap,
        }
    }
}

/// Applies one operator of the given category.
///
/// # Errors
/// Returns [`PerturbError::Infeasible`] when no candidate exists,
/// [`PerturbError::StaleLabel`] when stale label ownership blocks the edit,
/// and [`PerturbError::Tree`] if the tree rejects the edit.
pub fn apply<R: Rng + ?Sized>(
    operation: Operation,
    tree: &mut LabeledTree,
    index: &mut LabelIndex,
    rng: &mut R,
) -> Result<AppliedOperation> {
    match operation {
        Operation::LabelSwap => label_swap(tree, index, rng),
        Operation::NodeRemove => node_remove(tree, rng),
        Operation::LabelRemove => label_remove(tree, index, rng),
        Operation::LabelDuplication => label_duplication(tree, index, rng),
        Operation::NodeSwap => node_swap(tree, rng),
    }
}

/// Draws two distinct labels and moves each onto the other's owner.
///
/// The owner of the first label loses it and gains the second, and vice
/// versa. Partners whose trade would land a label on an owner that already
/// carries a copy of it are never drawn, so no label is merged away.
///
/// When both labels share an owner they trade positions within its payload.
/// This deliberately departs from appending the second label and then
/// removing the first, which would leave a repeated label such as `a,a`.
///
/// # Errors
/// Returns [`PerturbError::Infeasible`] with fewer than two drawable labels
/// or no eligible partner, and [`PerturbError::StaleLabel`] when an owner no
/// longer holds its label.
pub fn label_swap<R: Rng + ?Sized>(
    tree: &mut LabeledTree,
    index: &LabelIndex,
    rng: &mut R,
) -> Result<AppliedOperation> {
    if index.len() < 2 {
        return Err(PerturbError::Infeasible {
            operation: Operation::LabelSwap,
            reason: "fewer than two drawable labels",
        });
    }
    let current: &LabeledTree = tree;
    let (first, second) = index
        .pick_label_pair_where(rng, |first, second| {
            trade_keeps_labels(current, index, first, second)
        })
        .ok_or(PerturbError::Infeasible {
            operation: Operation::LabelSwap,
            reason: "no partner label would change both payloads",
        })?;
    let first_owner = held_owner(tree, index, first)?;
    let second_owner = held_owner(tree, index, second)?;

    if first_owner == second_owner {
        let traded = tree.payload_mut(first_owner)?.swap_positions(first, second);
        debug_assert!(traded, "both labels sit on the shared owner");
    } else {
        let payload = tree.payload_mut(first_owner)?;
        let removed = payload.remove(first);
        let added = payload.push(second);
        debug_assert!(removed && added, "first owner trades `{first}` for `{second}`");
        let payload = tree.payload_mut(second_owner)?;
        let removed = payload.remove(second);
        let added = payload.push(first);
        debug_assert!(removed && added, "second owner trades `{second}` for `{first}`");
    }
    debug!(
        first,
        second,
        first_owner = %first_owner,
        second_owner = %second_owner,
        "labels swapped"
    );
    Ok(AppliedOperation::LabelSwap {
        first: Arc::from(first),
        second: Arc::from(second),
        first_owner,
        second_owner,
    })
}

/// Collapses one uniformly drawn non-root node into its parent.
///
/// # Errors
/// Returns [`PerturbError::Infeasible`] when the tree holds only its root.
pub fn node_remove<R: Rng + ?Sized>(tree: &mut LabeledTree, rng: &mut R) -> Result<AppliedOperation> {
    let node = tree
        .non_root_nodes()
        .choose(rng)
        .copied()
        .ok_or(PerturbError::Infeasible {
            operation: Operation::NodeRemove,
            reason: "the tree has no non-root node",
        })?;
    tree.collapse_node(node)?;
    debug!(node = %node, remaining = tree.len(), "node collapsed");
    Ok(AppliedOperation::NodeRemove { node })
}

/// Draws one label and removes it from its owner and the working set.
///
/// An owner holding a single label is collapsed instead of being emptied,
/// whichever label that is: after swaps the recorded owner may carry a
/// different label than the one drawn, and it still goes.
///
/// # Errors
/// Returns [`PerturbError::Infeasible`] with no drawable labels.
/// [`PerturbError::StaleLabel`] is returned when the recorded owner has
/// already been collapsed, or when it holds several labels but not the drawn
/// one.
pub fn label_remove<R: Rng + ?Sized>(
    tree: &mut LabeledTree,
    index: &mut LabelIndex,
    rng: &mut R,
) -> Result<AppliedOperation> {
    let label: Arc<str> = index
        .pick_label(rng)
        .map(Arc::from)
        .ok_or(PerturbError::Infeasible {
            operation: Operation::LabelRemove,
            reason: "no drawable labels",
        })?;
    let stale = |node| PerturbError::StaleLabel {
        label: Arc::clone(&label),
        node,
    };
    let node = match index.owner(&label) {
        Some(node) if tree.contains(node) => node,
        Some(node) => return Err(stale(node)),
        None => return Err(stale(tree.root())),
    };

    let collapsed = tree.payload(node)?.len() == 1;
    if collapsed {
        tree.collapse_node(node)?;
    } else if !tree.payload_mut(node)?.remove(&label) {
        return Err(stale(node));
    }
    index.forget(&label);
    debug!(label = &*label, node = %node, collapsed, "label removed");
    Ok(AppliedOperation::LabelRemove {
        label,
        node,
        collapsed,
    })
}

/// Draws one label and appends it to a uniformly drawn non-root node other
/// than its recorded owner that does not already carry it.
///
/// The owner mapping is left untouched, so the label is afterwards carried by
/// one more payload while the index still names the original owner.
///
/// # Errors
/// Returns [`PerturbError::Infeasible`] with no drawable labels or no
/// eligible target node.
pub fn label_duplication<R: Rng + ?Sized>(
    tree: &mut LabeledTree,
    index: &LabelIndex,
    rng: &mut R,
) -> Result<AppliedOperation> {
    let label = index.pick_label(rng).ok_or(PerturbError::Infeasible {
        operation: Operation::LabelDuplication,
        reason: "no drawable labels",
    })?;
    let owner = index.owner(label);
    let candidates: Vec<NodeId> = tree
        .non_root_nodes()
        .into_iter()
        .filter(|&node| Some(node) != owner && !holds(tree, node, label))
        .collect();
    let target = candidates
        .choose(rng)
        .copied()
        .ok_or(PerturbError::Infeasible {
            operation: Operation::LabelDuplication,
            reason: "every non-root node other than the owner already carries the label",
        })?;
    let added = tree.payload_mut(target)?.push(label);
    debug_assert!(added, "target {target} lacked `{label}`");
    debug!(label, target = %target, "label duplicated");
    Ok(AppliedOperation::LabelDuplication {
        label: Arc::from(label),
        target,
    })
}

/// Exchanges the payloads of two distinct, uniformly drawn non-root nodes.
///
/// # Errors
/// Returns [`PerturbError::Infeasible`] with fewer than two non-root nodes.
pub fn node_swap<R: Rng + ?Sized>(tree: &mut LabeledTree, rng: &mut R) -> Result<AppliedOperation> {
    let candidates = tree.non_root_nodes();
    let mut picked = candidates.choose_multiple(rng, 2).copied();
    let (Some(first), Some(second)) = (picked.next(), picked.next()) else {
        return Err(PerturbError::Infeasible {
            operation: Operation::NodeSwap,
            reason: "fewer than two non-root nodes",
        });
    };
    tree.swap_label_payload(first, second)?;
    debug!(first = %first, second = %second, "payloads swapped");
    Ok(AppliedOperation::NodeSwap { first, second })
}

fn holds(tree: &LabeledTree, node: NodeId, label: &str) -> bool {
    tree.payload(node).is_ok_and(|payload| payload.contains(label))
}

/// Whether trading `first` and `second` between their recorded owners moves
/// both labels. Stale owners are left for [`held_owner`] to report.
fn trade_keeps_labels(tree: &LabeledTree, index: &LabelIndex, first: &str, second: &str) -> bool {
    match (index.owner(first), index.owner(second)) {
        (Some(first_owner), Some(second_owner)) if first_owner != second_owner => {
            !holds(tree, first_owner, second) && !holds(tree, second_owner, first)
        }
        _ => true,
    }
}

/// Resolves the recorded owner of `label`, checking it still holds the label.
fn held_owner(tree: &LabeledTree, index: &LabelIndex, label: &str) -> Result<NodeId> {
    let stale = |node| PerturbError::StaleLabel {
        label: Arc::from(label),
        node,
    };
    let node = index.owner(label).ok_or_else(|| stale(tree.root()))?;
    match tree.payload(node) {
        Ok(payload) if payload.contains(label) => Ok(node),
        _ => Err(stale(node)),
    }
}

#[cfg(test)]
mod tests;
