//! Request/response correlation for browser-side queries.
//!
//! Each element carries its own [`PendingRequests`] table, so request ids
//! only need to be unique per node and outstanding queries die with the
//! node that issued them.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

/// Per-node table of in-flight queries awaiting a browser response.
pub struct PendingRequests {
    next_id: AtomicU64,
    waiters: Mutex<HashMap<u64, oneshot::Sender<Value>>>,
}

impl PendingRequests {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            waiters: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a fresh request id and the receiver its response will
    /// arrive on.
    pub(crate) fn issue(&self) -> (u64, oneshot::Receiver<Value>) {
        let reqid = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.waiters.lock().insert(reqid, tx);
        (reqid, rx)
    }

    /// Deliver a response. Returns `false` when the request id is unknown,
    /// which happens on duplicate or stale responses and is harmless.
    pub fn resolve(&self, reqid: u64, data: Value) -> bool {
        let Some(tx) = self.waiters.lock().remove(&reqid) else {
            return false;
        };
        // The waiter may have been dropped; nothing left to notify then.
        let _ = tx.send(data);
        true
    }

    pub fn outstanding(&self) -> usize {
        self.waiters.lock().len()
    }
}

enum HandleState {
    Ready(Option<Value>),
    Waiting(oneshot::Receiver<Value>),
}

/// Future for one browser query.
///
/// Resolves to `Some(value)` when the browser answers, or `None` when no
/// answer can ever come: the query was issued while disconnected, or the
/// node (and with it the pending table) was dropped.
pub struct QueryHandle {
    state: HandleState,
}

impl QueryHandle {
    pub(crate) fn resolved(value: Option<Value>) -> Self {
        Self {
            state: HandleState::Ready(value),
        }
    }

    pub(crate) fn waiting(rx: oneshot::Receiver<Value>) -> Self {
        Self {
            state: HandleState::Waiting(rx),
        }
    }

    /// `true` when the outcome is already known without awaiting.
    pub fn is_resolved(&self) -> bool {
        matches!(self.state, HandleState::Ready(_))
    }
}

impl Future for QueryHandle {
    type Output = Option<Value>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            HandleState::Ready(value) => Poll::Ready(value.take()),
            HandleState::Waiting(rx) => match Pin::new(rx).poll(cx) {
                Poll::Ready(Ok(value)) => Poll::Ready(Some(value)),
                // Sender dropped without a response: the node died.
                Poll::Ready(Err(_)) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_issue_and_resolve() {
        let pending = PendingRequests::new();
        let (reqid, rx) = pending.issue();
        assert_eq!(pending.outstanding(), 1);
        assert!(pending.resolve(reqid, json!({"x": 1})));
        assert_eq!(pending.outstanding(), 0);
        let handle = QueryHandle::waiting(rx);
        assert_eq!(handle.await, Some(json!({"x": 1})));
    }

    #[test]
    fn test_resolve_unknown_id_is_noop() {
        let pending = PendingRequests::new();
        assert!(!pending.resolve(42, json!(null)));
    }

    #[test]
    fn test_request_ids_count_up_from_zero() {
        let pending = PendingRequests::new();
        let (first, _rx_a) = pending.issue();
        let (second, _rx_b) = pending.issue();
        assert_eq!(first, 0);
        assert_eq!(second, 1);
    }

    #[tokio::test]
    async fn test_resolved_handle_is_immediate() {
        let handle = QueryHandle::resolved(None);
        assert!(handle.is_resolved());
        assert_eq!(handle.await, None);
    }

    #[tokio::test]
    async fn test_dropped_table_resolves_to_none() {
        let pending = PendingRequests::new();
        let (_reqid, rx) = pending.issue();
        drop(pending);
        assert_eq!(QueryHandle::waiting(rx).await, None);
    }
}
