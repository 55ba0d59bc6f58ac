//! # MirrorDom Core
//!
//! The authoritative node tree and the synchronization layer that keeps a
//! remote browser DOM mirroring it.
//!
//! Host code mutates the tree through [`WebNode`] handles. Each mutation is
//! applied to the local tree unconditionally; when the node is *connected*
//! (its owning document has at least one live transport), exactly one
//! browser command is emitted first, so the remote DOM never diverges.
//! Browser-originated events and query responses come back through
//! [`sync::router::handle_message`], which resolves targets via the weak
//! identity registry and either drives listener dispatch or completes a
//! pending query handle.
//!
//! ## Modules
//!
//! - [`dom`] - the plain tree: nodes, attributes, HTML serialization,
//!   fragment parsing. No knowledge of connections.
//! - [`sync`] - the synchronization core: identity registry, pending-request
//!   tracker, mutation emitter, inbound router, event synthesis, and the
//!   per-process [`SyncContext`].

pub mod dom;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use dom::{Node, SYNC_ID_ATTR, strip_sync_ids};
pub use sync::{
    Document, DomEvent, ListenerId, NodeRegistry, PendingRequests, QueryHandle, SyncContext,
    WebNode, handle_message,
};
