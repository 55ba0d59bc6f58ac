//! Inbound message routing.
//!
//! Classifies raw transport text and hands it to the right node. Every
//! failure mode here is a drop with a log line: a message referencing a
//! node that has since been removed is expected traffic, not an error.

use std::sync::Arc;

use tracing::{debug, trace};

use mirrordom_protocols::InboundMessage;

use crate::sync::context::SyncContext;
use crate::sync::event::{self, DomEvent};

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;

/// Route one raw inbound message.
pub fn handle_message(ctx: &Arc<SyncContext>, raw: &str) {
    let message: InboundMessage = match serde_json::from_str(raw) {
        Ok(message) => message,
        Err(err) => {
            debug!(error = %err, raw, "dropping unparseable message");
            return;
        }
    };
    match message {
        InboundMessage::Event { event } => {
            let id = event.current_target.id.clone();
            let Some(node) = ctx.resolve(&id) else {
                debug!(node = %id, "dropping event for unknown node");
                return;
            };
            let event = DomEvent::from_payload(event);
            trace!(node = %id, event = %event.event_type, "dispatching event");
            event::dispatch(&node, &event);
        }
        InboundMessage::Response { id, reqid, data } => {
            let Some(node) = ctx.resolve(&id) else {
                debug!(node = %id, reqid, "dropping response for unknown node");
                return;
            };
            let Some(pending) = node.pending() else {
                debug!(node = %id, reqid, "dropping response for non-element");
                return;
            };
            if !pending.resolve(reqid, data) {
                debug!(node = %id, reqid, "dropping response with unknown reqid");
            }
        }
        InboundMessage::Unknown => {
            debug!(raw, "dropping message of unknown type");
        }
    }
}
