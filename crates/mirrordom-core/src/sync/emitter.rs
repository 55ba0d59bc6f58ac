//! [`WebNode`]: the mutation emitter.
//!
//! A `WebNode` wraps a plain [`Node`] and mirrors every mutation to the
//! browser. Each operation runs in three steps: validate against current
//! local state, emit one command to every open connection of the owning
//! document, then apply the mutation locally. A node with no owning
//! document or no open connection mutates locally only; emission resumes
//! the moment the subtree lands under a connected document.

use std::sync::Arc;

use tracing::{debug, warn};

use mirrordom_protocols::{
    AdjacentPosition, DomCommand, DomError, OutboundCommand, Transport,
};

use crate::dom::{Node, SYNC_ID_ATTR, serialize};
use crate::sync::context::SyncContext;
use crate::sync::event::{self, DomEvent, Listener, ListenerId};
use crate::sync::pending::QueryHandle;

#[cfg(test)]
#[path = "emitter_tests.rs"]
mod tests;

/// A node handle that pushes its mutations to connected browsers.
#[derive(Clone)]
pub struct WebNode {
    node: Node,
    ctx: Arc<SyncContext>,
}

impl WebNode {
    pub(crate) fn new(node: Node, ctx: Arc<SyncContext>) -> Self {
        Self { node, ctx }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn context(&self) -> &Arc<SyncContext> {
        &self.ctx
    }

    /// Wrap another node in the same context.
    pub fn adopt(&self, node: &Node) -> WebNode {
        self.ctx.web(node)
    }

    /// `true` when the owning document has at least one open connection.
    pub fn is_connected(&self) -> bool {
        self.node
            .owner_document()
            .map(|doc| doc.has_open_connection())
            .unwrap_or(false)
    }

    // --- emission ---

    /// Send one command for this node to every open connection, if any.
    fn emit(&self, command: &DomCommand) {
        self.fan_out(&OutboundCommand::node(
            self.node.id().clone(),
            self.node.tag().unwrap_or_default(),
            command,
        ));
    }

    fn fan_out(&self, envelope: &OutboundCommand) {
        let Some(doc) = self.node.owner_document() else {
            return;
        };
        let connections = doc.open_connections();
        if connections.is_empty() {
            return;
        }
        let text = envelope.to_json();
        for conn in connections {
            Self::send_on(&conn, &text);
        }
    }

    fn send_on(conn: &Arc<dyn Transport>, text: &str) {
        if let Err(err) = conn.send(text) {
            // A send failure means the connection is going away; the
            // document prunes it on the next emission.
            warn!(connection = conn.id(), error = %err, "dropping command");
        } else {
            debug!(connection = conn.id(), payload = text, "sent command");
        }
    }

    /// Emit to a single connection, regardless of document bookkeeping.
    /// Used when announcing existing state to a connection that just opened.
    pub(crate) fn emit_to(&self, conn: &Arc<dyn Transport>, command: &DomCommand) {
        let envelope = OutboundCommand::node(
            self.node.id().clone(),
            self.node.tag().unwrap_or_default(),
            command,
        );
        Self::send_on(conn, &envelope.to_json());
    }

    // --- structural mutation ---

    pub fn append_child(&self, child: impl AsRef<Node>) -> Result<(), DomError> {
        let child = child.as_ref();
        self.node.ensure_can_contain(child)?;
        self.emit(&DomCommand::InsertAdjacentHtml {
            position: AdjacentPosition::BeforeEnd,
            html: serialize::child_html_in(&self.node, child),
        });
        self.node.append_child(child)
    }

    pub fn insert_before(
        &self,
        child: impl AsRef<Node>,
        reference: &Node,
    ) -> Result<(), DomError> {
        let child = child.as_ref();
        self.node.ensure_can_contain(child)?;
        let index = self
            .node
            .index_of(reference)
            .ok_or_else(|| DomError::NotAChild {
                parent: self.node.id().clone(),
                child: reference.id().clone(),
            })?;
        if Node::ptr_eq(child, reference) {
            return Ok(());
        }
        let html = serialize::child_html_in(&self.node, child);
        if reference.is_element() {
            // An element reference can be addressed directly.
            self.adopt(reference).emit(&DomCommand::InsertAdjacentHtml {
                position: AdjacentPosition::BeforeBegin,
                html,
            });
        } else {
            self.emit(&DomCommand::Insert { index, html });
        }
        self.node.insert_before(child, reference)
    }

    pub fn remove_child(&self, child: impl AsRef<Node>) -> Result<(), DomError> {
        let child = child.as_ref();
        let index = self
            .node
            .index_of(child)
            .ok_or_else(|| DomError::NotAChild {
                parent: self.node.id().clone(),
                child: child.id().clone(),
            })?;
        if child.is_element() {
            self.emit(&DomCommand::RemoveChildById {
                id: child.id().clone(),
            });
        } else {
            self.emit(&DomCommand::RemoveChildByIndex { index });
        }
        self.node.remove_child(child)
    }

    pub fn replace_child(
        &self,
        new_child: impl AsRef<Node>,
        old_child: &Node,
    ) -> Result<(), DomError> {
        let new_child = new_child.as_ref();
        self.node.ensure_can_contain(new_child)?;
        let index = self
            .node
            .index_of(old_child)
            .ok_or_else(|| DomError::NotAChild {
                parent: self.node.id().clone(),
                child: old_child.id().clone(),
            })?;
        if Node::ptr_eq(new_child, old_child) {
            return Ok(());
        }
        let html = serialize::child_html_in(&self.node, new_child);
        if old_child.is_element() {
            self.emit(&DomCommand::ReplaceChildById {
                html,
                id: old_child.id().clone(),
            });
        } else {
            // Text and comment children have no browser-side identity;
            // replace positionally.
            self.emit(&DomCommand::Insert { index, html });
            self.emit(&DomCommand::RemoveChildByIndex { index: index + 1 });
        }
        self.node.replace_child(new_child, old_child)
    }

    pub fn empty(&self) {
        self.emit(&DomCommand::Empty);
        self.node.empty();
    }

    pub fn remove(&self) {
        self.emit(&DomCommand::Remove);
        self.node.remove();
    }

    // --- attributes ---

    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        if name == SYNC_ID_ATTR {
            return Err(DomError::ImmutableId(SYNC_ID_ATTR.to_string()));
        }
        if !self.node.is_element() {
            return Err(DomError::NotAnElement(self.node.id().clone()));
        }
        self.emit(&DomCommand::SetAttribute {
            name: name.to_string(),
            value: value.to_string(),
        });
        self.node.set_attribute(name, value)
    }

    /// Remove an attribute, returning its old value. Absent attributes
    /// (and non-element nodes) are a no-op with nothing emitted.
    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        if !self.node.has_attribute(name) {
            return None;
        }
        self.emit(&DomCommand::RemoveAttribute {
            name: name.to_string(),
        });
        self.node.remove_attribute(name)
    }

    // --- class helpers ---

    pub fn add_class(&self, class: &str) -> Result<(), DomError> {
        let mut classes = self.node.class_list();
        if classes.iter().any(|c| c == class) {
            return Ok(());
        }
        classes.push(class.to_string());
        self.set_attribute("class", &classes.join(" "))
    }

    pub fn remove_class(&self, class: &str) -> Result<bool, DomError> {
        let mut classes = self.node.class_list();
        let before = classes.len();
        classes.retain(|c| c != class);
        if classes.len() == before {
            return Ok(false);
        }
        if classes.is_empty() {
            self.remove_attribute("class");
        } else {
            self.set_attribute("class", &classes.join(" "))?;
        }
        Ok(true)
    }

    // --- content ---

    pub fn set_text_content(&self, text: &str) -> Result<(), DomError> {
        self.emit(&DomCommand::TextContent {
            text: text.to_string(),
        });
        self.node.empty();
        if !text.is_empty() {
            let child = self.ctx.create_text(text);
            self.node.append_child(&child)?;
        }
        Ok(())
    }

    /// Replace this node's children with a parsed HTML fragment.
    ///
    /// The fragment is parsed first so the emitted command carries the
    /// identity attributes of the freshly created nodes; host and browser
    /// agree on identities from the start.
    pub fn set_inner_html(&self, html: &str) -> Result<(), DomError> {
        let fragment = self.ctx.parse_fragment(html)?;
        let mut rendered = String::new();
        for child in fragment.children() {
            rendered.push_str(&serialize::child_html_in(&self.node, &child));
        }
        self.emit(&DomCommand::InnerHtml { html: rendered });
        self.node.empty();
        self.node.append_child(&fragment)
    }

    // --- event listeners ---

    /// Register a listener. The browser is told to start forwarding the
    /// event type on the first listener for it; later registrations are
    /// host-local bookkeeping.
    pub fn add_event_listener(&self, event: &str, listener: Listener) -> ListenerId {
        let (id, first_of_type) = self.node.add_listener(event, listener);
        if first_of_type {
            self.emit(&DomCommand::AddEventListener {
                event: event.to_string(),
            });
        }
        id
    }

    /// Remove a listener by id. The browser stops forwarding the event
    /// type once no listener for it remains. Returns `false` when the id
    /// was not registered.
    pub fn remove_event_listener(&self, event: &str, id: ListenerId) -> bool {
        match self.node.remove_listener(event, id) {
            Some(none_left) => {
                if none_left {
                    self.emit(&DomCommand::RemoveEventListener {
                        event: event.to_string(),
                    });
                }
                true
            }
            None => false,
        }
    }

    /// Invoke this node's listeners for `event`.
    pub fn dispatch_event(&self, event: &DomEvent) {
        event::dispatch(&self.node, event);
    }

    // --- browser method calls ---

    /// Run a script in the browser with `node` bound to this node.
    pub fn exec(&self, script: &str) {
        self.emit(&DomCommand::Eval {
            script: script.to_string(),
        });
    }

    /// Low-level primitive: call an arbitrary browser-side method on this
    /// node. No response correlation; fire-and-forget.
    pub fn js_exec(&self, method: &str, params: Vec<serde_json::Value>) {
        self.fan_out(&OutboundCommand {
            method: method.to_string(),
            params,
            target: "node".to_string(),
            id: self.node.id().clone(),
            tag: self.node.tag().unwrap_or_default().to_string(),
        });
    }

    /// Click this node.
    ///
    /// Connected, the click happens in the browser and the resulting event
    /// comes back through the normal inbound path. Disconnected, a
    /// synthetic click is dispatched locally so host-side handlers still
    /// run.
    pub fn click(&self) {
        if self.is_connected() {
            self.emit(&DomCommand::Click);
        } else {
            let event = DomEvent::synthetic("click", self.node.id());
            event::dispatch(&self.node, &event);
        }
    }

    pub fn scroll(&self, x: i64, y: i64) {
        self.emit(&DomCommand::Scroll { x, y });
    }

    pub fn scroll_to(&self, x: i64, y: i64) {
        self.emit(&DomCommand::ScrollTo { x, y });
    }

    pub fn scroll_by(&self, x: i64, y: i64) {
        self.emit(&DomCommand::ScrollBy { x, y });
    }

    // --- queries ---

    /// Ask the browser to run `method` on this node and report the result.
    ///
    /// Disconnected nodes resolve immediately to `None` without emitting
    /// anything.
    pub fn js_query(&self, method: &str) -> QueryHandle {
        if !self.is_connected() {
            return QueryHandle::resolved(None);
        }
        let Some(pending) = self.node.pending() else {
            return QueryHandle::resolved(None);
        };
        let (reqid, rx) = pending.issue();
        self.emit(&DomCommand::Query {
            method: method.to_string(),
            reqid,
        });
        QueryHandle::waiting(rx)
    }

    pub fn scroll_x(&self) -> QueryHandle {
        self.js_query("scrollX")
    }

    pub fn scroll_y(&self) -> QueryHandle {
        self.js_query("scrollY")
    }

    pub fn bounding_client_rect(&self) -> QueryHandle {
        self.js_query("getBoundingClientRect")
    }

    // --- visibility ---

    pub fn show(&self) {
        self.remove_attribute("hidden");
    }

    pub fn hide(&self) -> Result<(), DomError> {
        self.set_attribute("hidden", "true")
    }

    // --- convenience passthroughs ---

    pub fn html(&self) -> String {
        self.node.html()
    }

    pub fn html_noid(&self) -> String {
        self.node.html_noid()
    }

    pub fn text_content(&self) -> String {
        self.node.text_content()
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.node.get_attribute(name)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.node.has_class(class)
    }

    pub fn has_classes(&self) -> bool {
        self.node.has_classes()
    }
}

impl AsRef<Node> for WebNode {
    fn as_ref(&self) -> &Node {
        &self.node
    }
}

impl std::fmt::Debug for WebNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "WebNode({:?})", self.node)
    }
}
