//! Transport seam between the synchronization core and a live connection.

use crate::ChannelError;

/// One live session to a browser viewer.
///
/// Implementations are expected to preserve the order of accepted `send`
/// calls; the core relies on that for per-node command FIFO. `send` must not
/// block: real transports enqueue onto a per-connection queue drained by a
/// writer task.
pub trait Transport: Send + Sync {
    /// Unique identifier for this connection.
    fn id(&self) -> &str;

    /// Queue one serialized message for delivery.
    fn send(&self, message: &str) -> Result<(), ChannelError>;

    /// Whether the connection is still live. Closed connections are pruned
    /// by the connection gate on its next evaluation.
    fn is_open(&self) -> bool;
}
