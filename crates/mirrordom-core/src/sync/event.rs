//! Typed events and listener dispatch.
//!
//! Dispatch is origin-agnostic: listeners observe the same [`DomEvent`]
//! whether the event arrived from a browser or was synthesized locally.

use std::sync::Arc;

use serde_json::{Map, Value};

use mirrordom_protocols::{EventPayload, NodeId};

use crate::dom::Node;

/// Identifies one registered listener on one node, for later removal.
pub type ListenerId = u64;

/// Callback invoked on dispatch. Shared so storage and dispatch snapshots
/// can hold it concurrently.
pub type Listener = Arc<dyn Fn(&DomEvent) + Send + Sync>;

/// One event as seen by listeners.
#[derive(Clone, Debug)]
pub struct DomEvent {
    pub event_type: String,
    /// Node the listener was registered on.
    pub current_target: NodeId,
    /// Node the event originated at.
    pub target: NodeId,
    pub bubbles: bool,
    /// Everything else the browser attached: input values, coordinates,
    /// key codes.
    pub extra: Map<String, Value>,
}

impl DomEvent {
    /// A locally synthesized event with no browser payload.
    pub fn synthetic(event_type: &str, target: &NodeId) -> Self {
        Self {
            event_type: event_type.to_string(),
            current_target: target.clone(),
            target: target.clone(),
            bubbles: false,
            extra: Map::new(),
        }
    }

    pub(crate) fn from_payload(payload: EventPayload) -> Self {
        Self {
            event_type: payload.event_type,
            current_target: payload.current_target.id,
            target: payload.target.id,
            bubbles: payload.bubbles,
            extra: payload.extra,
        }
    }

    /// Extra payload field, if the browser sent one.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Invoke every listener registered on `node` for the event's type.
///
/// Listeners are snapshotted before the first call, so a listener adding
/// or removing listeners does not affect the current dispatch.
pub(crate) fn dispatch(node: &Node, event: &DomEvent) {
    for listener in node.listeners_for(&event.event_type) {
        listener(event);
    }
}
