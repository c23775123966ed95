//! Unit tests for the edit operators.

use rand::{SeedableRng, rngs::SmallRng};
use rstest::rstest;

use super::*;
use crate::{LabelSet, LabeledTreeBuilder};

const SEEDS: std::ops::Range<u64> = 0..64;

/// Builds `root → chain[0] → chain[1] → ...` with the given payloads.
fn chain(payloads: &[&str]) -> (LabeledTree, Vec<NodeId>) {
    let mut builder = LabeledTreeBuilder::new();
    let mut parent = builder.add_node("root", LabelSet::parse("root"));
    let mut ids = Vec::new();
    for (index, payload) in payloads.iter().enumerate() {
        let node = builder.add_node(format!("n{index}"), LabelSet::parse(payload));
        builder.add_edge(parent, node);
        ids.push(node);
        parent = node;
    }
    (builder.build().expect("chain is a valid tree"), ids)
}

/// Builds a root with one child per payload.
fn star(payloads: &[&str]) -> (LabeledTree, Vec<NodeId>) {
    let mut builder = LabeledTreeBuilder::new();
    let root = builder.add_node("root", LabelSet::parse("root"));
    let ids = payloads
        .iter()
        .enumerate()
        .map(|(index, payload)| {
            let node = builder.add_node(format!("n{index}"), LabelSet::parse(payload));
            builder.add_edge(root, node);
            node
        })
        .collect();
    (builder.build().expect("star is a valid tree"), ids)
}

fn payload(tree: &LabeledTree, node: NodeId) -> String {
    tree.payload(node).expect("node is live").to_string()
}

#[test]
fn operation_order_matches_exhaustive_schedule() {
    let names: Vec<_> = Operation::ALL.iter().map(|op| op.as_str()).collect();
    assert_eq!(
        names,
        [
            "labelswap",
            "noderemove",
            "labelremove",
            "labelduplication",
            "nodeswap"
        ]
    );
    for (position, op) in Operation::ALL.iter().enumerate() {
        assert_eq!(op.index(), position);
    }
}

#[test]
fn label_remove_collapses_single_label_owner() {
    let mut observed = false;
    for seed in SEEDS {
        let (mut tree, ids) = chain(&["a", "b"]);
        let mut index = LabelIndex::from_tree(&tree);
        let mut rng = SmallRng::seed_from_u64(seed);
        let applied = label_remove(&mut tree, &mut index, &mut rng).expect("labels exist");
        let AppliedOperation::LabelRemove {
            label, collapsed, ..
        } = applied
        else {
            panic!("unexpected operation record");
        };
        if &*label != "a" {
            continue;
        }
        observed = true;
        let &[a, b] = ids.as_slice() else {
            panic!("chain has two nodes");
        };
        assert!(collapsed);
        assert!(!tree.contains(a));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.parent(b), Ok(Some(tree.root())));
        assert_eq!(payload(&tree, b), "b");
        assert_eq!(index.labels(), ["b"]);
    }
    assert!(observed, "some seed must draw label `a`");
}

#[rstest]
#[case(3)]
#[case(17)]
#[case(99)]
fn label_remove_keeps_topology_for_multi_label_owner(#[case] seed: u64) {
    let (mut tree, ids) = chain(&["a,b"]);
    let edges = tree.edge_count();
    let mut index = LabelIndex::from_tree(&tree);
    let mut rng = SmallRng::seed_from_u64(seed);

    let applied = label_remove(&mut tree, &mut index, &mut rng).expect("labels exist");
    let AppliedOperation::LabelRemove {
        label, collapsed, ..
    } = applied
    else {
        panic!("unexpected operation record");
    };
    assert!(!collapsed);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.edge_count(), edges);
    assert!(!tree.payload(ids[0]).expect("live").contains(&label));
    assert!(!index.contains(&label));
    assert_eq!(index.len(), 1);
}

#[test]
fn label_remove_collapses_single_label_owner_holding_a_swapped_label() {
    for seed in SEEDS {
        let (mut tree, ids) = star(&["a", "b"]);
        let mut index = LabelIndex::from_tree(&tree);
        let mut rng = SmallRng::seed_from_u64(seed);
        label_swap(&mut tree, &index, &mut rng).expect("two owners can trade");
        let &[n0, n1] = ids.as_slice() else {
            panic!("star has two leaves");
        };
        assert_eq!(payload(&tree, n0), "b");
        assert_eq!(payload(&tree, n1), "a");

        let applied = label_remove(&mut tree, &mut index, &mut rng)
            .expect("a single-label owner collapses whatever it holds");
        let AppliedOperation::LabelRemove {
            label,
            node,
            collapsed,
        } = applied
        else {
            panic!("unexpected operation record");
        };
        assert!(collapsed);
        assert_eq!(Some(node), index.owner(&label));
        assert!(!tree.contains(node));
        assert_eq!(tree.len(), 2);
        assert!(tree.is_connected());
        assert_eq!(index.len(), 1);
    }
}

#[test]
fn label_remove_reports_collapsed_owner_as_stale() {
    let (mut tree, ids) = star(&["a"]);
    let mut index = LabelIndex::from_tree(&tree);
    tree.collapse_node(ids[0]).expect("n0 is not root");
    let mut rng = SmallRng::seed_from_u64(4);

    let err = label_remove(&mut tree, &mut index, &mut rng).expect_err("owner of `a` is gone");
    assert!(matches!(
        err,
        PerturbError::StaleLabel { ref label, node } if &**label == "a" && node == ids[0]
    ));
    assert!(index.contains("a"));
}

#[test]
fn label_remove_reports_multi_label_owner_missing_the_label() {
    let (mut tree, ids) = star(&["a,x"]);
    let mut index = LabelIndex::from_tree(&tree);
    index.forget("x");
    {
        let owner = tree.payload_mut(ids[0]).expect("n0 is live");
        assert!(owner.remove("a"));
        assert!(owner.push("y"));
    }
    let before = tree.clone();
    let mut rng = SmallRng::seed_from_u64(9);

    let err = label_remove(&mut tree, &mut index, &mut rng).expect_err("n0 lost `a`");
    assert!(matches!(err, PerturbError::StaleLabel { node, .. } if node == ids[0]));
    assert_eq!(tree, before);
}

#[test]
fn label_duplication_skips_nodes_already_carrying_the_label() {
    for seed in SEEDS {
        let (mut tree, _) = star(&["a", "b", "c"]);
        let mut index = LabelIndex::from_tree(&tree);
        index.forget("b");
        index.forget("c");
        let mut rng = SmallRng::seed_from_u64(seed);

        let first = label_duplication(&mut tree, &index, &mut rng).expect("two free targets");
        let second = label_duplication(&mut tree, &index, &mut rng).expect("one free target");
        let (
            AppliedOperation::LabelDuplication { target: t1, .. },
            AppliedOperation::LabelDuplication { target: t2, .. },
        ) = (first, second)
        else {
            panic!("unexpected operation records");
        };
        assert_ne!(t1, t2);
        let carriers = tree
            .node_ids()
            .filter(|&node| tree.payload(node).is_ok_and(|p| p.contains("a")))
            .count();
        assert_eq!(carriers, 3);

        let before = tree.clone();
        let err = label_duplication(&mut tree, &index, &mut rng)
            .expect_err("every other node carries `a`");
        assert_eq!(err.code(), crate::PerturbErrorCode::Infeasible);
        assert_eq!(tree, before);
    }
}

#[test]
fn label_swap_never_merges_a_label_into_an_owner_carrying_it() {
    for seed in SEEDS {
        let (mut tree, ids) = star(&["a", "b", "c"]);
        let index = LabelIndex::from_tree(&tree);
        assert!(tree.payload_mut(ids[0]).expect("n0 is live").push("b"));
        let mut rng = SmallRng::seed_from_u64(seed);

        let applied = label_swap(&mut tree, &index, &mut rng).expect("eligible pairs exist");
        let AppliedOperation::LabelSwap { first, second, .. } = applied else {
            panic!("unexpected operation record");
        };
        let mut pair = [&*first, &*second];
        pair.sort_unstable();
        assert_ne!(pair, ["a", "b"]);
        let carried: usize = tree
            .non_root_nodes()
            .into_iter()
            .filter_map(|node| tree.payload(node).ok().map(LabelSet::len))
            .sum();
        assert_eq!(carried, 4);
    }
}

#[test]
fn label_swap_without_eligible_partner_is_infeasible() {
    let (mut tree, ids) = star(&["a", "b"]);
    let index = LabelIndex::from_tree(&tree);
    assert!(tree.payload_mut(ids[0]).expect("n0 is live").push("b"));
    let before = tree.clone();
    let mut rng = SmallRng::seed_from_u64(6);

    let err = label_swap(&mut tree, &index, &mut rng).expect_err("the only trade merges `b`");
    assert!(matches!(
        err,
        PerturbError::Infeasible { operation: Operation::LabelSwap, reason }
            if reason.starts_with("no partner")
    ));
    assert_eq!(tree, before);
}

#[test]
fn label_duplication_never_targets_owner_or_root() {
    for seed in SEEDS {
        let (mut tree, _) = star(&["a", "b", "c"]);
        let mut rng = SmallRng::seed_from_u64(seed);
        let index = LabelIndex::from_tree(&tree);
        let before = index.clone();

        let applied = label_duplication(&mut tree, &index, &mut rng).expect("targets exist");
        let AppliedOperation::LabelDuplication { label, target } = applied else {
            panic!("unexpected operation record");
        };
        let owner = index.owner(&label).expect("label has an owner");
        assert_ne!(target, owner);
        assert_ne!(target, tree.root());
        let carriers = tree
            .node_ids()
            .filter(|&node| tree.payload(node).is_ok_and(|p| p.contains(&label)))
            .count();
        assert_eq!(carriers, 2);
        assert_eq!(index, before);
    }
}

#[test]
fn label_duplication_needs_a_second_non_root_node() {
    let (mut tree, _) = star(&["a,b"]);
    let index = LabelIndex::from_tree(&tree);
    let mut rng = SmallRng::seed_from_u64(5);
    let err = label_duplication(&mut tree, &index, &mut rng).expect_err("owner is the only node");
    assert_eq!(err.code(), crate::PerturbErrorCode::Infeasible);
}

#[rstest]
#[case(0)]
#[case(8)]
#[case(21)]
fn label_swap_moves_labels_between_owners(#[case] seed: u64) {
    let (mut tree, ids) = star(&["a,x", "b"]);
    let index = LabelIndex::from_tree(&tree);
    let mut rng = SmallRng::seed_from_u64(seed);

    let applied = label_swap(&mut tree, &index, &mut rng).expect("three labels exist");
    let AppliedOperation::LabelSwap {
        first,
        second,
        first_owner,
        second_owner,
    } = applied
    else {
        panic!("unexpected operation record");
    };
    let first_payload = tree.payload(first_owner).expect("live");
    let second_payload = tree.payload(second_owner).expect("live");
    if first_owner == second_owner {
        assert_eq!(payload(&tree, ids[0]), "x,a");
    } else {
        assert!(first_payload.contains(&second) && !first_payload.contains(&first));
        assert!(second_payload.contains(&first) && !second_payload.contains(&second));
    }
    assert_eq!(tree.len(), 3);
}

#[test]
fn label_swap_reports_stale_owner_after_collapse() {
    let (mut tree, ids) = star(&["a", "b"]);
    let index = LabelIndex::from_tree(&tree);
    tree.collapse_node(ids[0]).expect("n0 is not root");
    let mut rng = SmallRng::seed_from_u64(1);

    let err = label_swap(&mut tree, &index, &mut rng).expect_err("owner of `a` is gone");
    assert!(matches!(
        err,
        PerturbError::StaleLabel { ref label, node } if &**label == "a" && node == ids[0]
    ));
    assert!(err.is_retryable());
    assert_eq!(payload(&tree, ids[1]), "b");
}

#[test]
fn node_remove_collapses_a_non_root_node() {
    for seed in SEEDS {
        let (mut tree, _) = chain(&["a", "b", "c"]);
        let mut rng = SmallRng::seed_from_u64(seed);
        let applied = node_remove(&mut tree, &mut rng).expect("non-root nodes exist");
        let AppliedOperation::NodeRemove { node } = applied else {
            panic!("unexpected operation record");
        };
        assert_ne!(node, tree.root());
        assert!(!tree.contains(node));
        assert_eq!(tree.len(), 3);
        assert!(tree.is_connected());
    }
}

#[test]
fn node_swap_exchanges_two_non_root_payloads() {
    for seed in SEEDS {
        let (mut tree, _) = star(&["a", "b", "c"]);
        let before = tree.clone();
        let mut rng = SmallRng::seed_from_u64(seed);
        let applied = node_swap(&mut tree, &mut rng).expect("three non-root nodes");
        let AppliedOperation::NodeSwap { first, second } = applied else {
            panic!("unexpected operation record");
        };
        assert_ne!(first, second);
        assert_ne!(first, tree.root());
        assert_ne!(second, tree.root());
        assert_eq!(tree.payload(first), before.payload(second));
        assert_eq!(tree.payload(second), before.payload(first));
        assert_eq!(payload(&tree, tree.root()), "root");
    }
}

#[rstest]
#[case::node_remove(Operation::NodeRemove, &[])]
#[case::node_swap(Operation::NodeSwap, &["a"])]
#[case::label_swap(Operation::LabelSwap, &["a"])]
#[case::label_remove(Operation::LabelRemove, &[])]
#[case::label_duplication(Operation::LabelDuplication, &[])]
fn operators_report_infeasible_trees(#[case] operation: Operation, #[case] payloads: &[&str]) {
    let (mut tree, _) = star(payloads);
    let mut index = LabelIndex::from_tree(&tree);
    let before = tree.clone();
    let mut rng = SmallRng::seed_from_u64(0);

    let err = apply(operation, &mut tree, &mut index, &mut rng).expect_err("too small");
    assert!(matches!(
        err,
        PerturbError::Infeasible { operation: reported, .. } if reported == operation
    ));
    assert!(!err.is_retryable());
    assert_eq!(tree, before);
}

#[test]
fn applied_operation_reports_its_category() {
    let record = AppliedOperation::NodeRemove {
        node: NodeId::new(1),
    };
    assert_eq!(record.operation(), Operation::NodeRemove);
    assert_eq!(Operation::LabelDuplication.to_string(), "labelduplication");
}
