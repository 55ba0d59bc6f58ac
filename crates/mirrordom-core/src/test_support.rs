//! Test doubles shared by the unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use mirrordom_protocols::{ChannelError, Transport};

/// A [`Transport`] that records everything sent through it.
pub(crate) struct RecordingTransport {
    id: String,
    open: AtomicBool,
    sent: Mutex<Vec<String>>,
}

impl RecordingTransport {
    pub(crate) fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            open: AtomicBool::new(true),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Simulate the peer going away.
    pub(crate) fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Everything sent, parsed as JSON.
    pub(crate) fn commands(&self) -> Vec<Value> {
        self.sent()
            .iter()
            .map(|text| serde_json::from_str(text).expect("sent message is JSON"))
            .collect()
    }

    pub(crate) fn last_command(&self) -> Option<Value> {
        self.commands().pop()
    }

    pub(crate) fn clear(&self) {
        self.sent.lock().clear();
    }
}

impl Transport for RecordingTransport {
    fn id(&self) -> &str {
        &self.id
    }

    fn send(&self, message: &str) -> Result<(), ChannelError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(ChannelError::Closed);
        }
        self.sent.lock().push(message.to_string());
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}
