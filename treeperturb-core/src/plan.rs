//! Perturbation plans: how many edits of each category to apply and how to
//! sequence them.
//!
//! Without a budget the plan is exhaustive: each category runs exactly its
//! requested count, categories in [`Operation::ALL`] order. With a budget the
//! counts become weights of a categorical distribution from which the budget
//! is drawn independently with replacement.

use rand::{Rng, distributions::Distribution, distributions::WeightedIndex};

use crate::{Result, error::PerturbError, operators::Operation};

/// How a [`PerturbationPlan`] sequences its operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleMode {
    /// Apply every requested operation, category by category.
    Exhaustive,
    /// Draw `total` operations from the count-weighted distribution.
    Budgeted {
        /// Number of operations to draw.
        total: usize,
        /// Distribution over [`Operation::ALL`] weighted by requested counts.
        weights: WeightedIndex<usize>,
    },
}

/// Configures and validates [`PerturbationPlan`] instances.
///
/// # Examples
/// ```
/// use treeperturb_core::{Operation, PerturbationPlanBuilder};
///
/// let plan = PerturbationPlanBuilder::new()
///     .with_count(Operation::LabelSwap, 2)
///     .with_count(Operation::NodeSwap, 1)
///     .build()
///     .expect("exhaustive plans are always valid");
/// assert_eq!(plan.count(Operation::LabelSwap), 2);
/// assert!(plan.requires_validation());
/// ```
#[derive(Debug, Clone, Default)]
pub struct PerturbationPlanBuilder {
    counts: [usize; 5],
    total_operations: Option<usize>,
}

impl PerturbationPlanBuilder {
    /// Creates a builder with every count at zero and no budget.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the requested count (or weight, in budgeted mode) of `operation`.
    #[must_use]
    pub fn with_count(mut self, operation: Operation, count: usize) -> Self {
        if let Some(slot) = self.counts.get_mut(operation.index()) {
            *slot = count;
        }
        self
    }

    /// Selects budgeted mode with `total` draws, or exhaustive mode for `None`.
    #[must_use]
    pub fn with_total_operations(mut self, total: Option<usize>) -> Self {
        self.total_operations = total;
        self
    }

    /// Returns the configured count of `operation`.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.counts.get(operation.index()).copied().unwrap_or(0)
    }

    /// Returns the configured budget, if any.
    #[must_use]
    pub fn total_operations(&self) -> Option<usize> {
        self.total_operations
    }

    /// Validates the configuration and constructs the plan.
    ///
    /// # Errors
    /// Returns [`PerturbError::NoOperationWeights`] when a budget is set and
    /// every count is zero, since no distribution can be formed.
    ///
    /// # Examples
    /// ```
    /// use treeperturb_core::{PerturbError, PerturbationPlanBuilder};
    ///
    /// let err = PerturbationPlanBuilder::new()
    ///     .with_total_operations(Some(10))
    ///     .build()
    ///     .expect_err("all weights are zero");
    /// assert_eq!(err, PerturbError::NoOperationWeights { budget: 10 });
    /// ```
    pub fn build(self) -> Result<PerturbationPlan> {
        let mode = match self.total_operations {
            None => ScheduleMode::Exhaustive,
            Some(total) => {
                let weights = WeightedIndex::new(self.counts)
                    .map_err(|_| PerturbError::NoOperationWeights { budget: total })?;
                ScheduleMode::Budgeted { total, weights }
            }
        };
        Ok(PerturbationPlan {
            counts: self.counts,
            mode,
        })
    }
}

/// A validated description of the edits to apply to one tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbationPlan {
    counts: [usize; 5],
    mode: ScheduleMode,
}

impl PerturbationPlan {
    /// Returns the requested count of `operation`.
    #[must_use]
    pub fn count(&self, operation: Operation) -> usize {
        self.counts.get(operation.index()).copied().unwrap_or(0)
    }

    /// Returns how the plan sequences its operations.
    #[must_use]
    pub const fn mode(&self) -> &ScheduleMode {
        &self.mode
    }

    /// Number of operations the schedule will contain.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.mode {
            ScheduleMode::Exhaustive => self.counts.iter().sum(),
            ScheduleMode::Budgeted { total, .. } => *total,
        }
    }

    /// Returns `true` when the schedule contains no operations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the payload duplication check applies after the run.
    ///
    /// Label duplication deliberately repeats labels across payloads, so the
    /// check only runs when no duplication was requested.
    #[must_use]
    pub fn requires_validation(&self) -> bool {
        self.count(Operation::LabelDuplication) == 0
    }

    /// Produces the operation sequence for one run.
    ///
    /// Exhaustive plans ignore `rng`; budgeted plans draw every entry from it.
    pub fn schedule<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Operation> {
        match &self.mode {
            ScheduleMode::Exhaustive => Operation::ALL
                .iter()
                .flat_map(|&operation| {
                    std::iter::repeat_n(operation, self.count(operation))
                })
                .collect(),
            ScheduleMode::Budgeted { total, weights } => (0..*total)
                .filter_map(|_| Operation::ALL.get(weights.sample(rng)).copied())
                .collect(),
        }
    }
}
