//! The synchronization core.
//!
//! - [`context`] - per-process [`SyncContext`]: node factory, identity
//!   registry, fragment parsing.
//! - [`registry`] - weak identity-to-node mapping.
//! - [`pending`] - request/response correlation for browser queries.
//! - [`emitter`] - [`WebNode`], the mutation emitter wrapping the plain tree.
//! - [`router`] - inbound message classification and dispatch.
//! - [`event`] - typed events and origin-agnostic listener dispatch.
//! - [`document`] - document skeleton, connection bookkeeping, rendering.

pub mod context;
pub mod document;
pub mod emitter;
pub mod event;
pub mod pending;
pub mod registry;
pub mod router;

pub use context::SyncContext;
pub use document::Document;
pub use emitter::WebNode;
pub use event::{DomEvent, ListenerId};
pub use pending::{PendingRequests, QueryHandle};
pub use registry::NodeRegistry;
pub use router::handle_message;
