//! Tree fixtures shared by the integration tests.

use treeperturb_core::{LabelIndex, LabelSet, LabeledTree, LabeledTreeBuilder, NodeId};

/// Builds `root → n0 → n1 → ...` with the given payloads.
pub fn chain(payloads: &[&str]) -> (LabeledTree, Vec<NodeId>) {
    let mut builder = LabeledTreeBuilder::new();
    let mut parent = builder.add_node("root", LabelSet::parse("root"));
    let mut ids = Vec::with_capacity(payloads.len());
    for (position, payload) in payloads.iter().enumerate() {
        let node = builder.add_node(format!("n{position}"), LabelSet::parse(payload));
        builder.add_edge(parent, node);
        ids.push(node);
        parent = node;
    }
    (builder.build().expect("chain is a valid tree"), ids)
}

/// Builds a root with `size` leaf children labelled `l0`, `l1`, ...
pub fn star(size: usize) -> (LabeledTree, LabelIndex) {
    let mut builder = LabeledTreeBuilder::new();
    let root = builder.add_node("root", LabelSet::parse("root"));
    for position in 0..size {
        let node = builder.add_node(format!("n{position}"), LabelSet::parse(&format!("l{position}")));
        builder.add_edge(root, node);
    }
    let tree = builder.build().expect("star is a valid tree");
    let index = LabelIndex::from_tree(&tree);
    (tree, index)
}
