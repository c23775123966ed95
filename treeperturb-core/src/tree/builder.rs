//! Validating construction of [`LabeledTree`] values.
//!
//! Loaders declare nodes and edges in source order; [`LabeledTreeBuilder::build`]
//! then locates the root by its reserved label and checks that the edges form
//! a single rooted tree.

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use tracing::{debug, instrument};

use super::{LabeledTree, NodeId, NodeSlotInit};
use crate::{
    error::TreeError,
    label::{LabelSet, ROOT_LABEL},
};

type TreeResult<T> = core::result::Result<T, TreeError>;

#[derive(Debug, Clone)]
struct PendingNode {
    name: Arc<str>,
    labels: LabelSet,
}

/// Collects nodes and edges and validates them into a [`LabeledTree`].
///
/// # Examples
/// ```
/// use treeperturb_core::{LabelSet, LabeledTreeBuilder, TreeError};
///
/// let mut builder = LabeledTreeBuilder::new();
/// builder.add_node("n0", LabelSet::parse("a"));
/// let err = builder.build().expect_err("no node carries `root`");
/// assert_eq!(err, TreeError::MissingRoot);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LabeledTreeBuilder {
    nodes: Vec<PendingNode>,
    edges: Vec<(NodeId, NodeId)>,
    named_edges: Vec<(Arc<str>, Arc<str>)>,
}

impl LabeledTreeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a node and returns the identifier it will keep in the tree.
    pub fn add_node(&mut self, name: impl Into<Arc<str>>, labels: LabelSet) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(PendingNode {
            name: name.into(),
            labels,
        });
        id
    }

    /// Declares a parent → child edge between two nodes returned by
    /// [`Self::add_node`].
    pub fn add_edge(&mut self, parent: NodeId, child: NodeId) {
        self.edges.push((parent, child));
    }

    /// Declares a parent → child edge by node name, resolved at build time.
    pub fn add_named_edge(&mut self, parent: impl Into<Arc<str>>, child: impl Into<Arc<str>>) {
        self.named_edges.push((parent.into(), child.into()));
    }

    /// Validates the declarations and produces the tree.
    ///
    /// # Errors
    /// Returns [`TreeError`] when names repeat, a payload is empty, an edge
    /// names an unknown node or loops, the root label is missing or
    /// ambiguous, the root has a parent, a node has several parents, or some
    /// node is unreachable from the root.
    #[instrument(
        name = "core.build_tree",
        err,
        skip(self),
        fields(nodes = self.nodes.len(), edges = self.edges.len() + self.named_edges.len()),
    )]
    pub fn build(self) -> TreeResult<LabeledTree> {
        let by_name = self.index_names()?;
        let root = self.find_root()?;

        let mut edges = self.edges.clone();
        for (parent, child) in &self.named_edges {
            edges.push((resolve(&by_name, parent)?, resolve(&by_name, child)?));
        }

        let mut parents: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); self.nodes.len()];
        for (parent, child) in edges {
            let child_name = self.name_of(child)?;
            self.name_of(parent)?;
            if parent == child {
                return Err(TreeError::SelfLoop { name: child_name });
            }
            if child == root {
                return Err(TreeError::RootHasParent { name: child_name });
            }
            let slot = parents
                .get_mut(child.get())
                .ok_or(TreeError::UnknownNode { node: child })?;
            if slot.is_some() {
                return Err(TreeError::MultipleParents { name: child_name });
            }
            *slot = Some(parent);
            children
                .get_mut(parent.get())
                .ok_or(TreeError::UnknownNode { node: parent })?
                .push(child);
        }

        let unreachable = count_unreachable(root, &children, self.nodes.len());
        if unreachable > 0 {
            return Err(TreeError::Disconnected { unreachable });
        }

        let slots = self
            .nodes
            .into_iter()
            .zip(parents)
            .zip(children)
            .map(|((node, parent), children)| NodeSlotInit {
                name: node.name,
                labels: node.labels,
                parent,
                children,
            })
            .collect();
        let tree = LabeledTree::from_slots(slots, root);
        debug!(root = %root, nodes = tree.len(), "tree constructed");
        Ok(tree)
    }

    fn index_names(&self) -> TreeResult<HashMap<Arc<str>, NodeId>> {
        let mut by_name = HashMap::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            if node.labels.is_empty() {
                return Err(TreeError::EmptyPayload {
                    name: Arc::clone(&node.name),
                });
            }
            if by_name
                .insert(Arc::clone(&node.name), NodeId::new(index))
                .is_some()
            {
                return Err(TreeError::DuplicateNode {
                    name: Arc::clone(&node.name),
                });
            }
        }
        Ok(by_name)
    }

    fn find_root(&self) -> TreeResult<NodeId> {
        let mut marked = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.labels.contains(ROOT_LABEL));
        let (index, first) = marked.next().ok_or(TreeError::MissingRoot)?;
        if let Some((_, second)) = marked.next() {
            return Err(TreeError::AmbiguousRoot {
                first: Arc::clone(&first.name),
                second: Arc::clone(&second.name),
            });
        }
        Ok(NodeId::new(index))
    }

    fn name_of(&self, node: NodeId) -> TreeResult<Arc<str>> {
        self.nodes
            .get(node.get())
            .map(|pending| Arc::clone(&pending.name))
            .ok_or(TreeError::UnknownNode { node })
    }
}

fn resolve(by_name: &HashMap<Arc<str>, NodeId>, name: &Arc<str>) -> TreeResult<NodeId> {
    by_name
        .get(name)
        .copied()
        .ok_or_else(|| TreeError::UndeclaredNode {
            name: Arc::clone(name),
        })
}

fn count_unreachable(root: NodeId, children: &[Vec<NodeId>], total: usize) -> usize {
    let mut visited = vec![false; total];
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        let Some(flag) = visited.get_mut(node.get()) else {
            continue;
        };
        if *flag {
            continue;
        }
        *flag = true;
        if let Some(next) = children.get(node.get()) {
            queue.extend(next.iter().copied());
        }
    }
    visited.iter().filter(|seen| !**seen).count()
}
