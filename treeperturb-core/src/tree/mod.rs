//! Rooted labeled tree mutated in place by the perturbation operators.
//!
//! Nodes are stored in insertion order and addressed by [`NodeId`]. Collapsed
//! nodes leave a vacant slot behind so identifiers are never reused within a
//! run, which keeps the label index and operation records unambiguous.

mod builder;

use std::{collections::VecDeque, fmt, sync::Arc};

use crate::{error::TreeError, label::LabelSet};

pub use self::builder::LabeledTreeBuilder;

type TreeResult<T> = core::result::Result<T, TreeError>;

/// Opaque identifier of a node within a [`LabeledTree`].
///
/// # Examples
/// ```
/// use treeperturb_core::NodeId;
///
/// let id = NodeId::new(3);
/// assert_eq!(id.get(), 3);
/// assert_eq!(id.to_string(), "#3");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Wraps a raw slot index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the raw slot index.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct NodeSlot {
    name: Arc<str>,
    labels: LabelSet,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A rooted tree whose nodes carry [`LabelSet`] payloads.
///
/// The root is fixed at construction: it is never collapsed and its payload is
/// never swapped. Every other node has exactly one parent, and collapsing a
/// node splices its children into the parent so the tree stays connected.
///
/// # Examples
/// ```
/// use treeperturb_core::{LabelSet, LabeledTreeBuilder};
///
/// let mut builder = LabeledTreeBuilder::new();
/// let root = builder.add_node("r", LabelSet::parse("root"));
/// let a = builder.add_node("a", LabelSet::parse("a"));
/// let b = builder.add_node("b", LabelSet::parse("b"));
/// builder.add_edge(root, a);
/// builder.add_edge(a, b);
/// let mut tree = builder.build()?;
///
/// tree.collapse_node(a)?;
/// assert_eq!(tree.parent(b)?, Some(root));
/// assert_eq!(tree.len(), 2);
/// # Ok::<(), treeperturb_core::TreeError>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledTree {
    slots: Vec<Option<NodeSlot>>,
    root: NodeId,
    live: usize,
}

impl LabeledTree {
    /// Returns the root node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// A tree always holds its root, so it is never empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of parent/child edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.live_slots().map(|(_, slot)| slot.children.len()).sum()
    }

    /// Returns `true` when `node` is part of the tree.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.slot(node).is_ok()
    }

    /// Live node identifiers in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.live_slots().map(|(id, _)| id)
    }

    /// Live non-root node identifiers in insertion order.
    #[must_use]
    pub fn non_root_nodes(&self) -> Vec<NodeId> {
        self.node_ids().filter(|&id| id != self.root).collect()
    }

    /// Returns the parent of `node`, or `None` for the root.
    ///
    /// # Errors
    /// Returns [`TreeError::UnknownNode`] when `node` is not in the tree.
    pub fn parent(&self, node: NodeId) -> TreeResult<Option<NodeId>> {
        Ok(self.slot(node)?.parent)
    }

    /// Returns the ordered children of `node`.
    ///
    /// # Errors
    /// Returns [`TreeError::UnknownNode`] when `node` is not in the tree.
    pub fn children(&self, node: NodeId) -> TreeResult<&[NodeId]> {
        Ok(&self.slot(node)?.children)
    }

    /// Returns the label payload of `node`.
    ///
    /// # Errors
    /// Returns [`TreeError::UnknownNode`] when `node` is not in the tree.
    pub fn payload(&self, node: NodeId) -> TreeResult<&LabelSet> {
        Ok(&self.slot(node)?.labels)
    }

    /// Returns the source name of `node`.
    ///
    /// # Errors
    /// Returns [`TreeError::UnknownNode`] when `node` is not in the tree.
    pub fn name(&self, node: NodeId) -> TreeResult<&str> {
        Ok(&self.slot(node)?.name)
    }

    /// Mutable access to the payload of a non-root node.
    ///
    /// # Errors
    /// Returns [`TreeError::RootDeletion`] for the root and
    /// [`TreeError::UnknownNode`] when `node` is not in the tree.
    pub fn payload_mut(&mut self, node: NodeId) -> TreeResult<&mut LabelSet> {
        self.ensure_not_root(node)?;
        Ok(&mut self.slot_mut(node)?.labels)
    }

    /// Removes `node`, reattaching its children to its former parent in the
    /// position `node` occupied.
    ///
    /// # Errors
    /// Returns [`TreeError::RootDeletion`] when `node` is the root and
    /// [`TreeError::UnknownNode`] when it is not in the tree. The tree is left
    /// unchanged on error.
    pub fn collapse_node(&mut self, node: NodeId) -> TreeResult<()> {
        let slot = self.slot(node)?;
        let parent = slot.parent.ok_or(TreeError::RootDeletion { node })?;
        self.slot(parent)?;

        let removed = self
            .slots
            .get_mut(node.get())
            .and_then(Option::take)
            .ok_or(TreeError::UnknownNode { node })?;
        self.live -= 1;

        for &child in &removed.children {
            self.slot_mut(child)?.parent = Some(parent);
        }
        let siblings = &mut self.slot_mut(parent)?.children;
        match siblings.iter().position(|&sibling| sibling == node) {
            Some(position) => {
                siblings.splice(position..=position, removed.children);
            }
            None => siblings.extend(removed.children),
        }
        Ok(())
    }

    /// Exchanges the full payloads of two non-root nodes.
    ///
    /// Swapping a node with itself is a no-op.
    ///
    /// # Errors
    /// Returns [`TreeError::RootDeletion`] when either node is the root and
    /// [`TreeError::UnknownNode`] when either is not in the tree. The tree is
    /// left unchanged on error.
    pub fn swap_label_payload(&mut self, first: NodeId, second: NodeId) -> TreeResult<()> {
        self.ensure_not_root(first)?;
        self.ensure_not_root(second)?;
        if first == second {
            return Ok(());
        }
        let taken = std::mem::take(&mut self.slot_mut(first)?.labels);
        let displaced = std::mem::replace(&mut self.slot_mut(second)?.labels, taken);
        self.slot_mut(first)?.labels = displaced;
        Ok(())
    }

    /// Returns `true` when every live node is reachable from the root and
    /// every non-root node names a live parent listing it as a child.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let mut seen = 0usize;
        let mut queue = VecDeque::from([self.root]);
        while let Some(node) = queue.pop_front() {
            let Ok(slot) = self.slot(node) else {
                return false;
            };
            seen += 1;
            if seen > self.live {
                return false;
            }
            for &child in &slot.children {
                if self.slot(child).map(|c| c.parent) != Ok(Some(node)) {
                    return false;
                }
                queue.push_back(child);
            }
        }
        seen == self.live
    }

    pub(crate) fn from_slots(slots: Vec<NodeSlotInit>, root: NodeId) -> Self {
        let live = slots.len();
        let slots = slots
            .into_iter()
            .map(|init| {
                Some(NodeSlot {
                    name: init.name,
                    labels: init.labels,
                    parent: init.parent,
                    children: init.children,
                })
            })
            .collect();
        Self { slots, root, live }
    }

    fn ensure_not_root(&self, node: NodeId) -> TreeResult<()> {
        self.slot(node)?;
        if node == self.root {
            return Err(TreeError::RootDeletion { node });
        }
        Ok(())
    }

    fn slot(&self, node: NodeId) -> TreeResult<&NodeSlot> {
        self.slots
            .get(node.get())
            .and_then(Option::as_ref)
            .ok_or(TreeError::UnknownNode { node })
    }

    fn slot_mut(&mut self, node: NodeId) -> TreeResult<&mut NodeSlot> {
        self.slots
            .get_mut(node.get())
            .and_then(Option::as_mut)
            .ok_or(TreeError::UnknownNode { node })
    }

    fn live_slots(&self) -> impl Iterator<Item = (NodeId, &NodeSlot)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|slot| (NodeId::new(index), slot)))
    }
}

/// Fully resolved node handed from the builder to the tree.
#[derive(Debug)]
pub(crate) struct NodeSlotInit {
    pub(crate) name: Arc<str>,
    pub(crate) labels: LabelSet,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}
