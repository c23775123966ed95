//! Run orchestration: owns the tree, label index and random source for one
//! perturbation and applies a [`PerturbationPlan`] to them.

use rand::Rng;
use tracing::{info, instrument};

use crate::{
    Result,
    label_index::LabelIndex,
    operators::{self, AppliedOperation, Operation},
    plan::PerturbationPlan,
    tree::LabeledTree,
};

/// Outcome of a successful [`Perturber::run`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PerturbationReport {
    applied: Vec<AppliedOperation>,
    tallies: [usize; 5],
}

impl PerturbationReport {
    fn record(&mut self, applied: AppliedOperation) {
        if let Some(slot) = self.tallies.get_mut(applied.operation().index()) {
            *slot += 1;
        }
        self.applied.push(applied);
    }

    /// Applied operations in application order.
    #[must_use]
    pub fn applied(&self) -> &[AppliedOperation] {
        &self.applied
    }

    /// Number of applied operations of the given category.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.tallies.get(operation.index()).copied().unwrap_or(0)
    }

    /// Total number of applied operations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.applied.len()
    }

    /// Returns `true` when no operation was applied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Exclusive owner of the state mutated during one perturbation run.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use treeperturb_core::{
///     LabelIndex, LabelSet, LabeledTreeBuilder, Operation, PerturbationPlanBuilder, Perturber,
/// };
///
/// let mut builder = LabeledTreeBuilder::new();
/// let root = builder.add_node("r", LabelSet::parse("root"));
/// for name in ["a", "b", "c"] {
///     let node = builder.add_node(name, LabelSet::parse(name));
///     builder.add_edge(root, node);
/// }
/// let tree = builder.build()?;
/// let index = LabelIndex::from_tree(&tree);
///
/// let plan = PerturbationPlanBuilder::new()
///     .with_count(Operation::NodeSwap, 2)
///     .build()?;
/// let mut perturber = Perturber::new(tree, index, SmallRng::seed_from_u64(1));
/// let report = perturber.run(&plan)?;
/// assert_eq!(report.count(Operation::NodeSwap), 2);
/// assert_eq!(perturber.tree().len(), 4);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Perturber<R> {
    tree: LabeledTree,
    index: LabelIndex,
    rng: R,
}

impl<R: Rng> Perturber<R> {
    /// Takes ownership of the run state.
    #[must_use]
    pub fn new(tree: LabeledTree, index: LabelIndex, rng: R) -> Self {
        Self { tree, index, rng }
    }

    /// The tree in its current state.
    #[must_use]
    pub fn tree(&self) -> &LabeledTree {
        &self.tree
    }

    /// The label index in its current state.
    #[must_use]
    pub fn index(&self) -> &LabelIndex {
        &self.index
    }

    /// Schedules `plan` and applies every operation in order.
    ///
    /// # Errors
    /// Stops at the first failing operation and returns its error; the tree
    /// keeps every edit applied before the failure.
    #[instrument(
        name = "core.run",
        err,
        skip(self, plan),
        fields(
            nodes = self.tree.len(),
            labels = self.index.len(),
            operations = plan.len(),
        ),
    )]
    pub fn run(&mut self, plan: &PerturbationPlan) -> Result<PerturbationReport> {
        let schedule = plan.schedule(&mut self.rng);
        let mut report = PerturbationReport::default();
        for operation in schedule {
            let applied = operators::apply(operation, &mut self.tree, &mut self.index, &mut self.rng)?;
            report.record(applied);
        }
        info!(
            applied = report.len(),
            nodes = self.tree.len(),
            labels = self.index.len(),
            "perturbation complete"
        );
        Ok(report)
    }

    /// Hands the tree and label index back to the caller.
    #[must_use]
    pub fn into_parts(self) -> (LabeledTree, LabelIndex) {
        (self.tree, self.index)
    }
}
