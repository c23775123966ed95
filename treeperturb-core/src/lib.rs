//! Treeperturb core library.
//!
//! Randomized structural perturbation of labeled rooted trees: the tree
//! model, the label index, five edit operators, the plan scheduler and the
//! payload uniqueness check.

mod error;
mod label;
mod label_index;
mod operators;
mod perturber;
mod plan;
mod tree;
mod validate;

pub use crate::{
    error::{
        PerturbError, PerturbErrorCode, Result, TreeError, TreeErrorCode, ValidationError,
        ValidationErrorCode,
    },
    label::{LABEL_DELIMITER, LabelSet, ROOT_LABEL},
    label_index::LabelIndex,
    operators::{
        AppliedOperation, Operation, apply, label_duplication, label_remove, label_swap,
        node_remove, node_swap,
    },
    perturber::{PerturbationReport, Perturber},
    plan::{PerturbationPlan, PerturbationPlanBuilder, ScheduleMode},
    tree::{LabeledTree, LabeledTreeBuilder, NodeId},
    validate::check_duplication,
};
