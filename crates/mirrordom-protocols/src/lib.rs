//! # MirrorDom Protocols
//!
//! Wire protocol definitions for the MirrorDom synchronization layer.
//! Contains only message shapes, the transport seam, and the error
//! taxonomy - no implementations.
//!
//! ## Core Types
//!
//! - [`DomCommand`] - the closed set of browser-executable mutations
//! - [`OutboundCommand`] - the envelope a command travels in
//! - [`InboundMessage`] - browser-originated events and query responses
//! - [`Transport`] - the per-connection send seam
//! - [`DomError`] / [`ChannelError`] - domain and transport errors

pub mod error;
pub mod message;
pub mod transport;

pub use error::{ChannelError, DomError};
pub use message::{
    AdjacentPosition, DomCommand, EventPayload, EventTargetRef, InboundMessage, OutboundCommand,
};
pub use transport::Transport;

/// Stable identifier relating a host-side node to its browser counterpart.
pub type NodeId = String;
