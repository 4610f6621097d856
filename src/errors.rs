//! Error types.
//!
//! Most of the scene API is total: lookups return [`Option`] and invalid
//! animation transitions are ignored by contract. The errors below cover the
//! remaining misuse of handles and hierarchy edits.

use thiserror::Error;

/// Errors returned by handle-taking scene operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneError {
    /// The node handle does not refer to a live node.
    #[error("node not found")]
    NodeNotFound,

    /// The feature handle does not refer to a live feature.
    #[error("feature not found")]
    FeatureNotFound,

    /// The group handle does not refer to a live feature group.
    #[error("feature group not found")]
    GroupNotFound,

    /// The feature's kind differs from the group's kind.
    #[error("feature kind does not match group kind")]
    GroupKindMismatch,

    /// The feature is not of the kind the operation expects.
    #[error("feature is not of the expected kind")]
    FeatureKindMismatch,

    /// Attaching here would make a node its own ancestor.
    #[error("attach would create a cycle in the node hierarchy")]
    HierarchyCycle,
}

/// Alias for `Result<T, SceneError>`.
pub type Result<T> = std::result::Result<T, SceneError>;
