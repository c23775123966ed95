//! Error types for the treeperturb core library.
//!
//! Defines error enums exposed by the public API and a convenient result alias.

use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::{operators::Operation, tree::NodeId};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by [`crate::LabeledTree`] operations and construction.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum TreeError {
    /// The root was addressed by an operation that must never touch it.
    #[error("node {node} is the root and cannot be collapsed or swapped")]
    RootDeletion {
        /// Identifier of the root node.
        node: NodeId,
    },
    /// The node does not exist or was already collapsed.
    #[error("node {node} is not part of the tree")]
    UnknownNode {
        /// Identifier that failed to resolve.
        node: NodeId,
    },
    /// An edge referenced a node name that was never declared.
    #[error("edge references undeclared node `{name}`")]
    UndeclaredNode {
        /// Name used by the offending edge.
        name: Arc<str>,
    },
    /// Two nodes were declared with the same name.
    #[error("node `{name}` is declared more than once")]
    DuplicateNode {
        /// Name declared twice.
        name: Arc<str>,
    },
    /// A node was declared without any label.
    #[error("node `{name}` carries an empty label payload")]
    EmptyPayload {
        /// Name of the unlabeled node.
        name: Arc<str>,
    },
    /// No node carries the reserved root label.
    #[error("no node carries the reserved `root` label")]
    MissingRoot,
    /// More than one node carries the reserved root label.
    #[error("nodes `{first}` and `{second}` both carry the reserved `root` label")]
    AmbiguousRoot {
        /// First node carrying the root label.
        first: Arc<str>,
        /// Second node carrying the root label.
        second: Arc<str>,
    },
    /// The node marked as root has an incoming edge.
    #[error("root node `{name}` has a parent")]
    RootHasParent {
        /// Name of the root node.
        name: Arc<str>,
    },
    /// A node has more than one incoming edge.
    #[error("node `{name}` has more than one parent")]
    MultipleParents {
        /// Name of the node with several parents.
        name: Arc<str>,
    },
    /// An edge connects a node to itself.
    #[error("node `{name}` has an edge to itself")]
    SelfLoop {
        /// Name of the looping node.
        name: Arc<str>,
    },
    /// Some nodes cannot be reached from the root.
    #[error("{unreachable} node(s) are not reachable from the root")]
    Disconnected {
        /// Number of unreachable nodes.
        unreachable: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`TreeError`] variants.
    enum TreeErrorCode for TreeError {
        /// The root was addressed by an operation that must never touch it.
        RootDeletion => RootDeletion { .. } => "TREE_ROOT_DELETION",
        /// The node does not exist or was already collapsed.
        UnknownNode => UnknownNode { .. } => "TREE_UNKNOWN_NODE",
        /// An edge referenced a node name that was never declared.
        UndeclaredNode => UndeclaredNode { .. } => "TREE_UNDECLARED_NODE",
        /// Two nodes were declared with the same name.
        DuplicateNode => DuplicateNode { .. } => "TREE_DUPLICATE_NODE",
        /// A node was declared without any label.
        EmptyPayload => EmptyPayload { .. } => "TREE_EMPTY_PAYLOAD",
        /// No node carries the reserved root label.
        MissingRoot => MissingRoot => "TREE_MISSING_ROOT",
        /// More than one node carries the reserved root label.
        AmbiguousRoot => AmbiguousRoot { .. } => "TREE_AMBIGUOUS_ROOT",
        /// The node marked as root has an incoming edge.
        RootHasParent => RootHasParent { .. } => "TREE_ROOT_HAS_PARENT",
        /// A node has more than one incoming edge.
        MultipleParents => MultipleParents { .. } => "TREE_MULTIPLE_PARENTS",
        /// An edge connects a node to itself.
        SelfLoop => SelfLoop { .. } => "TREE_SELF_LOOP",
        /// Some nodes cannot be reached from the root.
        Disconnected => Disconnected { .. } => "TREE_DISCONNECTED",
    }
}

/// Error reported by [`crate::check_duplication`].
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ValidationError {
    /// Two nodes render to the same payload string.
    #[error("nodes {first} and {second} share the payload `{payload}`")]
    DuplicatePayload {
        /// The shared payload string.
        payload: Arc<str>,
        /// Node visited first.
        first: NodeId,
        /// Node carrying the repeated payload.
        second: NodeId,
    },
}

define_error_codes! {
    /// Stable codes describing [`ValidationError`] variants.
    enum ValidationErrorCode for ValidationError {
        /// Two nodes render to the same payload string.
        DuplicatePayload => DuplicatePayload { .. } => "VALIDATION_DUPLICATE_PAYLOAD",
    }
}

/// Error type produced when planning or running a perturbation.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PerturbError {
    /// A total-operation budget was requested but every category count is zero.
    #[error("a budget of {budget} operations needs at least one non-zero operation count")]
    NoOperationWeights {
        /// The requested budget.
        budget: usize,
    },
    /// The tree or label set is too small for the operator to pick a candidate.
    #[error("{operation} is infeasible: {reason}")]
    Infeasible {
        /// Operator that could not run.
        operation: Operation,
        /// Why no candidate exists.
        reason: &'static str,
    },
    /// The label index maps a label to a node that no longer carries it.
    #[error("label `{label}` is no longer held by its recorded owner {node}")]
    StaleLabel {
        /// Label drawn from the working set.
        label: Arc<str>,
        /// Owner recorded at load time.
        node: NodeId,
    },
    /// A tree operation failed.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// The post-run duplication check failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

define_error_codes! {
    /// Stable codes describing [`PerturbError`] variants.
    enum PerturbErrorCode for PerturbError {
        /// A total-operation budget was requested but every category count is zero.
        NoOperationWeights => NoOperationWeights { .. } => "PERTURB_NO_OPERATION_WEIGHTS",
        /// The tree or label set is too small for the operator to pick a candidate.
        Infeasible => Infeasible { .. } => "PERTURB_INFEASIBLE",
        /// The label index maps a label to a node that no longer carries it.
        StaleLabel => StaleLabel { .. } => "PERTURB_STALE_LABEL",
        /// A tree operation failed.
        TreeFailure => Tree(..) => "PERTURB_TREE_FAILURE",
        /// The post-run duplication check failed.
        ValidationFailure => Validation(..) => "PERTURB_VALIDATION_FAILURE",
    }
}

impl PerturbError {
    /// Retrieve the inner [`TreeErrorCode`] when the error originated in the tree.
    #[must_use]
    pub const fn tree_code(&self) -> Option<TreeErrorCode> {
        match self {
            Self::Tree(error) => Some(error.code()),
            _ => None,
        }
    }

    /// Returns `true` when a fresh attempt from the original tree may succeed.
    ///
    /// Only stale label ownership depends on the random draw order; every
    /// other failure reflects the input or the plan.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StaleLabel { .. })
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, PerturbError>;
