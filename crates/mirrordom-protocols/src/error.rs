//! Error taxonomy for the synchronization layer.
//!
//! [`DomError`] covers caller-visible violations of the tree contract and
//! always propagates synchronously. Transport problems are [`ChannelError`].
//! Resolution misses and stale responses are not errors at all - the router
//! recovers from those internally.

use thiserror::Error;

use crate::NodeId;

/// Structural or identity violations raised to the calling code.
#[derive(Debug, Error)]
pub enum DomError {
    #[error("node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("cannot insert node {node} into its own subtree")]
    HierarchyViolation { node: NodeId },

    #[error("the {0} attribute is assigned at creation and cannot be changed")]
    ImmutableId(String),

    #[error("operation requires an element node, got {0}")]
    NotAnElement(NodeId),

    #[error("failed to parse HTML fragment: {0}")]
    Parse(String),
}

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("connection closed")]
    Closed,

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: String, reason: String },
}
