//! Label ownership and the working set of perturbable labels.
//!
//! The owner mapping is recorded once when the index is built and is not
//! maintained by the operators afterwards: a label swapped, duplicated or
//! collapsed away keeps pointing at the node that held it at load time.
//! Operators report [`crate::PerturbError::StaleLabel`] when the recorded
//! owner has been collapsed, or when it no longer holds a label they must
//! move off it.

use std::collections::{BTreeSet, HashMap};

use rand::{Rng, seq::SliceRandom};

use crate::{
    label::ROOT_LABEL,
    tree::{LabeledTree, NodeId},
};

/// Maps labels to their load-time owner and tracks which labels may still be
/// drawn by the operators.
///
/// # Examples
/// ```
/// use treeperturb_core::{LabelIndex, LabelSet, LabeledTreeBuilder};
///
/// let mut builder = LabeledTreeBuilder::new();
/// let root = builder.add_node("r", LabelSet::parse("root"));
/// let a = builder.add_node("a", LabelSet::parse("a,b"));
/// builder.add_edge(root, a);
/// let tree = builder.build()?;
///
/// let mut index = LabelIndex::from_tree(&tree);
/// assert_eq!(index.labels(), ["a", "b"]);
/// assert_eq!(index.owner("b"), Some(a));
/// index.forget("b");
/// assert_eq!(index.labels(), ["a"]);
/// assert_eq!(index.owner("b"), Some(a));
/// # Ok::<(), treeperturb_core::TreeError>(())
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LabelIndex {
    owners: HashMap<String, NodeId>,
    working: Vec<String>,
}

impl LabelIndex {
    /// Registers every label carried by a non-root node.
    ///
    /// Labels on the root, including the reserved [`ROOT_LABEL`], are never
    /// perturbable. When a label repeats across nodes the last node in
    /// insertion order becomes its owner. The working set is sorted so draws
    /// are reproducible for a fixed random source.
    #[must_use]
    pub fn from_tree(tree: &LabeledTree) -> Self {
        let mut owners = HashMap::new();
        let mut working = BTreeSet::new();
        for node in tree.non_root_nodes() {
            let Ok(payload) = tree.payload(node) else {
                continue;
            };
            for label in payload.iter().filter(|&label| label != ROOT_LABEL) {
                owners.insert(label.to_owned(), node);
                working.insert(label.to_owned());
            }
        }
        Self {
            owners,
            working: working.into_iter().collect(),
        }
    }

    /// Labels that operators may still draw, in sorted order.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.working
    }

    /// Number of drawable labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.working.len()
    }

    /// Returns `true` when no label can be drawn.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.working.is_empty()
    }

    /// Returns `true` when `label` is still drawable.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.working
            .binary_search_by(|held| held.as_str().cmp(label))
            .is_ok()
    }

    /// Returns the node that held `label` when the index was built.
    #[must_use]
    pub fn owner(&self, label: &str) -> Option<NodeId> {
        self.owners.get(label).copied()
    }

    /// Removes `label` from the working set; its owner entry is kept.
    ///
    /// Returns `true` when the label was drawable.
    pub fn forget(&mut self, label: &str) -> bool {
        match self
            .working
            .binary_search_by(|held| held.as_str().cmp(label))
        {
            Ok(position) => {
                self.working.remove(position);
                true
            }
            Err(_) => false,
        }
    }

    /// Draws one drawable label uniformly.
    pub fn pick_label<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.working.choose(rng).map(String::as_str)
    }

    /// Draws two distinct drawable labels uniformly without replacement.
    pub fn pick_label_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(&str, &str)> {
        self.pick_label_pair_where(rng, |_, _| true)
    }

    /// Draws a first label uniformly, then its partner uniformly among the
    /// other drawable labels accepted by `eligible(first, partner)`.
    ///
    /// With a predicate that accepts everything this is a uniform draw of an
    /// unordered pair. Returns `None` when fewer than two labels are drawable
    /// or no partner of the drawn first label is eligible.
    pub fn pick_label_pair_where<R, F>(
        &self,
        rng: &mut R,
        mut eligible: F,
    ) -> Option<(&str, &str)>
    where
        R: Rng + ?Sized,
        F: FnMut(&str, &str) -> bool,
    {
        let first = self.pick_label(rng)?;
        let partners: Vec<&str> = self
            .working
            .iter()
            .map(String::as_str)
            .filter(|&partner| partner != first && eligible(first, partner))
            .collect();
        let second = partners.choose(rng).copied()?;
        Some((first, second))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::{SeedableRng, rngs::SmallRng};
    use rstest::rstest;

    use super::*;
    use crate::{label::LabelSet, tree::LabeledTreeBuilder};

    fn tree_with(payloads: &[&str]) -> LabeledTree {
        let mut builder = LabeledTreeBuilder::new();
        let root = builder.add_node("r", LabelSet::parse("root,pinned"));
        for (index, payload) in payloads.iter().enumerate() {
            let node = builder.add_node(format!("n{index}"), LabelSet::parse(payload));
            builder.add_edge(root, node);
        }
        builder.build().expect("test tree is valid")
    }

    #[test]
    fn root_labels_are_not_perturbable() {
        let index = LabelIndex::from_tree(&tree_with(&["b,a", "c"]));
        assert_eq!(index.labels(), ["a", "b", "c"]);
        assert_eq!(index.owner("root"), None);
        assert_eq!(index.owner("pinned"), None);
        assert_eq!(index.owner("c"), Some(NodeId::new(2)));
    }

    #[test]
    fn forget_keeps_owner_mapping() {
        let mut index = LabelIndex::from_tree(&tree_with(&["a", "b"]));
        assert!(index.forget("a"));
        assert!(!index.forget("a"));
        assert!(!index.contains("a"));
        assert_eq!(index.owner("a"), Some(NodeId::new(1)));
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(42)]
    fn pick_label_pair_returns_distinct_labels(#[case] seed: u64) {
        let index = LabelIndex::from_tree(&tree_with(&["a", "b", "c", "d"]));
        let mut rng = SmallRng::seed_from_u64(seed);
        for _ in 0..50 {
            let (first, second) = index.pick_label_pair(&mut rng).expect("four labels");
            assert_ne!(first, second);
        }
    }

    #[test]
    fn pick_label_pair_needs_two_labels() {
        let index = LabelIndex::from_tree(&tree_with(&["a"]));
        let mut rng = SmallRng::seed_from_u64(3);
        assert!(index.pick_label_pair(&mut rng).is_none());
        assert_eq!(index.pick_label(&mut rng), Some("a"));
    }

    #[test]
    fn pick_label_pair_where_only_returns_eligible_partners() {
        let index = LabelIndex::from_tree(&tree_with(&["a", "b", "c", "d"]));
        let mut rng = SmallRng::seed_from_u64(5);
        let mut drawn = 0;
        for _ in 0..100 {
            if let Some((first, second)) =
                index.pick_label_pair_where(&mut rng, |_, partner| partner == "d")
            {
                assert_ne!(first, "d");
                assert_eq!(second, "d");
                drawn += 1;
            }
        }
        assert!(drawn > 0, "some first label besides `d` must be drawn");
        assert!(
            index
                .pick_label_pair_where(&mut rng, |_, _| false)
                .is_none()
        );
    }

    #[test]
    fn pick_label_pair_covers_every_unordered_pair() {
        let index = LabelIndex::from_tree(&tree_with(&["a", "b", "c"]));
        let mut rng = SmallRng::seed_from_u64(17);
        let seen: HashSet<(String, String)> = (0..300)
            .filter_map(|_| index.pick_label_pair(&mut rng))
            .map(|(first, second)| {
                let (low, high) = if first < second { (first, second) } else { (second, first) };
                (low.to_owned(), high.to_owned())
            })
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn pick_label_reaches_every_label() {
        let index = LabelIndex::from_tree(&tree_with(&["a", "b", "c"]));
        let mut rng = SmallRng::seed_from_u64(11);
        let seen: HashSet<&str> = (0..200)
            .filter_map(|_| index.pick_label(&mut rng))
            .collect();
        assert_eq!(seen.len(), 3);
    }
}
