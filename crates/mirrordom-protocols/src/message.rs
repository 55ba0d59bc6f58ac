//! Protocol message definitions.
//!
//! One outbound shape and one inbound shape cross the boundary:
//!
//! - Outbound: an [`OutboundCommand`] envelope
//!   `{ "method", "params", "target": "node", "id", "tag" }` describing one
//!   DOM mutation or method call for the browser to execute.
//! - Inbound: an [`InboundMessage`], discriminated by `type` into `event`
//!   (browser-originated DOM event) or `response` (correlated reply to an
//!   earlier query). Any other discriminator deserializes to
//!   [`InboundMessage::Unknown`] and is ignored by the router.
//!
//! The command set is closed and enumerable ([`DomCommand`]); the method
//! strings are what the browser client dispatches on.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::NodeId;

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;

/// Insertion position for `insertAdjacentHTML`, in DOM terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjacentPosition {
    BeforeBegin,
    AfterBegin,
    BeforeEnd,
    AfterEnd,
}

impl AdjacentPosition {
    /// The position string the browser API expects.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BeforeBegin => "beforebegin",
            Self::AfterBegin => "afterbegin",
            Self::BeforeEnd => "beforeend",
            Self::AfterEnd => "afterend",
        }
    }
}

/// The closed set of browser-executable commands.
///
/// Each host-side mutation maps to exactly one variant; the browser client
/// dispatches on [`DomCommand::method`] and reads positional
/// [`DomCommand::params`].
#[derive(Debug, Clone, PartialEq)]
pub enum DomCommand {
    /// Insert serialized HTML relative to the target node.
    InsertAdjacentHtml {
        position: AdjacentPosition,
        html: String,
    },
    /// Insert serialized HTML before the child at `index`.
    Insert { index: usize, html: String },
    /// Remove the child element carrying the given identity.
    RemoveChildById { id: NodeId },
    /// Remove the child at `index` (used for children without identity).
    RemoveChildByIndex { index: usize },
    /// Replace the child element carrying the given identity.
    ReplaceChildById { html: String, id: NodeId },
    /// Remove all children of the target node.
    Empty,
    /// Remove the target node itself from its parent.
    Remove,
    SetAttribute { name: String, value: String },
    RemoveAttribute { name: String },
    TextContent { text: String },
    InnerHtml { html: String },
    /// Start forwarding events of this type from the browser.
    AddEventListener { event: String },
    /// Stop forwarding events of this type.
    RemoveEventListener { event: String },
    /// Execute arbitrary JavaScript in the context of the target node.
    Eval { script: String },
    Click,
    Scroll { x: i64, y: i64 },
    ScrollTo { x: i64, y: i64 },
    ScrollBy { x: i64, y: i64 },
    /// A command expecting a correlated `response` carrying `reqid`.
    Query { method: String, reqid: u64 },
}

impl DomCommand {
    /// The method string the browser client dispatches on.
    pub fn method(&self) -> &str {
        match self {
            Self::InsertAdjacentHtml { .. } => "insertAdjacentHTML",
            Self::Insert { .. } => "insert",
            Self::RemoveChildById { .. } => "removeChildById",
            Self::RemoveChildByIndex { .. } => "removeChildByIndex",
            Self::ReplaceChildById { .. } => "replaceChildById",
            Self::Empty => "empty",
            Self::Remove => "remove",
            Self::SetAttribute { .. } => "setAttribute",
            Self::RemoveAttribute { .. } => "removeAttribute",
            Self::TextContent { .. } => "textContent",
            Self::InnerHtml { .. } => "innerHTML",
            Self::AddEventListener { .. } => "addEventListener",
            Self::RemoveEventListener { .. } => "removeEventListener",
            Self::Eval { .. } => "eval",
            Self::Click => "click",
            Self::Scroll { .. } => "scroll",
            Self::ScrollTo { .. } => "scrollTo",
            Self::ScrollBy { .. } => "scrollBy",
            Self::Query { method, .. } => method,
        }
    }

    /// Positional arguments for the method.
    pub fn params(&self) -> Vec<Value> {
        match self {
            Self::InsertAdjacentHtml { position, html } => {
                vec![json!(position.as_str()), json!(html)]
            }
            Self::Insert { index, html } => vec![json!(index), json!(html)],
            Self::RemoveChildById { id } => vec![json!(id)],
            Self::RemoveChildByIndex { index } => vec![json!(index)],
            Self::ReplaceChildById { html, id } => vec![json!(html), json!(id)],
            Self::Empty | Self::Remove | Self::Click => Vec::new(),
            Self::SetAttribute { name, value } => vec![json!(name), json!(value)],
            Self::RemoveAttribute { name } => vec![json!(name)],
            Self::TextContent { text } => vec![json!(text)],
            Self::InnerHtml { html } => vec![json!(html)],
            Self::AddEventListener { event } | Self::RemoveEventListener { event } => {
                vec![json!(event)]
            }
            Self::Eval { script } => vec![json!(script)],
            Self::Scroll { x, y } | Self::ScrollTo { x, y } | Self::ScrollBy { x, y } => {
                vec![json!(x), json!(y)]
            }
            Self::Query { reqid, .. } => vec![json!(reqid)],
        }
    }
}

/// Envelope for one outbound command, addressed to a single node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundCommand {
    pub method: String,
    pub params: Vec<Value>,
    /// Routing discriminator; always `"node"` for node-addressed commands.
    pub target: String,
    /// Identity of the node the browser should execute against.
    pub id: NodeId,
    /// Tag name of the target node, for client-side sanity checks.
    pub tag: String,
}

impl OutboundCommand {
    /// Build the envelope for `command` addressed to node `id` / `tag`.
    pub fn node(id: impl Into<NodeId>, tag: impl Into<String>, command: &DomCommand) -> Self {
        Self {
            method: command.method().to_string(),
            params: command.params(),
            target: "node".to_string(),
            id: id.into(),
            tag: tag.into(),
        }
    }

    /// Serialize to the JSON text sent over the wire.
    pub fn to_json(&self) -> String {
        json!({
            "method": self.method,
            "params": self.params,
            "target": self.target,
            "id": self.id,
            "tag": self.tag,
        })
        .to_string()
    }
}

/// Addressing stub inside an event payload: `{"id": <node identity>}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventTargetRef {
    pub id: NodeId,
}

/// Descriptor of a browser-originated DOM event.
///
/// Extra event-specific fields (`value`, `key`, coordinates, ...) are
/// captured in `extra` and surfaced to listeners untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(rename = "currentTarget")]
    pub current_target: EventTargetRef,
    pub target: EventTargetRef,
    #[serde(default)]
    pub bubbles: bool,
    #[serde(default, flatten)]
    pub extra: Map<String, Value>,
}

/// Inbound transport message, discriminated by `type`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum InboundMessage {
    /// A DOM event forwarded by the browser.
    #[serde(rename = "event")]
    Event { event: EventPayload },
    /// A reply to an earlier query, correlated by `reqid`.
    #[serde(rename = "response")]
    Response {
        id: NodeId,
        reqid: u64,
        #[serde(default)]
        data: Value,
    },
    /// Forward-compatible catch-all; dropped by the router.
    #[serde(other)]
    Unknown,
}
