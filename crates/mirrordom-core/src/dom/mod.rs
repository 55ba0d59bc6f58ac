//! The plain node tree: structure, attributes, serialization, parsing.
//!
//! Nothing in this module pushes anything to a browser; the synchronization
//! decorator in [`crate::sync`] layers that on top.

pub(crate) mod node;
pub(crate) mod parser;
pub(crate) mod serialize;

pub use node::Node;
pub use serialize::strip_sync_ids;

/// Attribute carrying a node's identity in serialized HTML. Assigned at
/// creation; rejected by `set_attribute`.
pub const SYNC_ID_ATTR: &str = "mdom-id";
