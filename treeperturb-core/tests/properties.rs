//! Property tests: operators keep the tree a single rooted component.

use proptest::{collection::vec, prelude::*};
use rand::{Rng, SeedableRng, rngs::SmallRng};
use treeperturb_core::{
    LabelIndex, LabelSet, LabeledTree, LabeledTreeBuilder, Operation, PerturbErrorCode, ROOT_LABEL,
    apply, check_duplication,
};
use treeperturb_test_support::profile::ProptestRunProfile;

/// Builds a random tree of `size` non-root nodes from `seed`.
///
/// Each node hangs under a uniformly drawn earlier node and carries one to
/// three globally unique labels.
fn random_tree(size: usize, seed: u64) -> LabeledTree {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut builder = LabeledTreeBuilder::new();
    let mut ids = vec![builder.add_node("root", LabelSet::parse(ROOT_LABEL))];
    let mut next_label = 0usize;
    for position in 0..size {
        let width = rng.gen_range(1..=3);
        let labels: LabelSet = (next_label..next_label + width)
            .map(|label| format!("l{label}"))
            .collect();
        next_label += width;
        let node = builder.add_node(format!("n{position}"), labels);
        if let Some(&parent) = ids.get(rng.gen_range(0..ids.len())) {
            builder.add_edge(parent, node);
        }
        ids.push(node);
    }
    builder.build().expect("random tree is valid")
}

fn check_structure(tree: &LabeledTree) -> Result<(), TestCaseError> {
    let root = tree.root();
    prop_assert!(tree.contains(root));
    prop_assert_eq!(tree.parent(root), Ok(None));
    prop_assert!(tree.payload(root).is_ok_and(|p| p.contains(ROOT_LABEL)));
    prop_assert!(tree.is_connected());
    prop_assert_eq!(tree.edge_count() + 1, tree.len());
    for node in tree.non_root_nodes() {
        let parent = tree.parent(node).ok().flatten();
        prop_assert!(parent.is_some(), "{} lost its parent", node);
        if let Some(parent) = parent {
            prop_assert!(tree.children(parent).is_ok_and(|c| c.contains(&node)));
        }
        prop_assert!(tree.payload(node).is_ok_and(|p| !p.is_empty()));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestRunProfile::load(64, false).config())]

    #[test]
    fn operators_preserve_rooted_connectivity(
        size in 0usize..24,
        tree_seed in any::<u64>(),
        run_seed in any::<u64>(),
        picks in vec(0usize..5, 0..24),
    ) {
        let mut tree = random_tree(size, tree_seed);
        let mut index = LabelIndex::from_tree(&tree);
        let root = tree.root();
        let mut rng = SmallRng::seed_from_u64(run_seed);
        let mut duplicated = false;

        for pick in picks {
            let Some(&operation) = Operation::ALL.get(pick) else {
                continue;
            };
            let snapshot = tree.clone();
            let before = tree.len();
            match apply(operation, &mut tree, &mut index, &mut rng) {
                Ok(applied) => {
                    duplicated |= applied.operation() == Operation::LabelDuplication;
                    prop_assert!(tree.len() + 1 >= before);
                    // Equal payloads may trade places without a visible change.
                    if operation != Operation::NodeSwap {
                        prop_assert_ne!(&tree, &snapshot, "{} left the tree unchanged", operation);
                    }
                }
                Err(err) => {
                    prop_assert!(
                        matches!(err.code(), PerturbErrorCode::Infeasible | PerturbErrorCode::StaleLabel),
                        "unexpected failure: {}", err
                    );
                    prop_assert_eq!(tree.len(), before);
                }
            }
            prop_assert_eq!(tree.root(), root);
            check_structure(&tree)?;
        }

        if !duplicated {
            prop_assert_eq!(check_duplication(&tree), Ok(()));
        }
    }

    #[test]
    fn payload_swap_is_an_involution(
        size in 2usize..16,
        seed in any::<u64>(),
        first in any::<prop::sample::Index>(),
        second in any::<prop::sample::Index>(),
    ) {
        let mut tree = random_tree(size, seed);
        let nodes = tree.non_root_nodes();
        let a = *first.get(&nodes);
        let b = *second.get(&nodes);
        let before = tree.clone();
        tree.swap_label_payload(a, b).expect("non-root nodes");
        prop_assert_eq!(tree.payload(a), before.payload(b));
        tree.swap_label_payload(a, b).expect("non-root nodes");
        prop_assert_eq!(tree, before);
    }

    #[test]
    fn collapse_removes_exactly_one_node(
        size in 1usize..24,
        seed in any::<u64>(),
        victim in any::<prop::sample::Index>(),
    ) {
        let mut tree = random_tree(size, seed);
        let node = *victim.get(&tree.non_root_nodes());
        let parent = tree.parent(node).ok().flatten().expect("non-root has a parent");
        let children = tree.children(node).map(<[_]>::to_vec).unwrap_or_default();
        let before = tree.len();

        tree.collapse_node(node).expect("non-root nodes collapse");

        prop_assert_eq!(tree.len() + 1, before);
        prop_assert!(!tree.contains(node));
        for child in children {
            prop_assert_eq!(tree.parent(child), Ok(Some(parent)));
        }
        check_structure(&tree)?;
    }
}
