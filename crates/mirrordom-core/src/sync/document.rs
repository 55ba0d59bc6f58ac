//! The mirrored document: skeleton, connection bookkeeping, rendering.

use std::sync::Arc;

use tracing::{debug, info};

use mirrordom_protocols::{DomCommand, DomError, Transport};

use crate::dom::Node;
use crate::sync::context::SyncContext;
use crate::sync::emitter::WebNode;

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;

/// A host-authoritative document with a standard HTML skeleton.
///
/// Owns the document root that connections attach to; every node reachable
/// from [`Document::body`] (or [`Document::head`]) is mirrored to all open
/// connections.
pub struct Document {
    ctx: Arc<SyncContext>,
    root: Node,
    html: WebNode,
    head: WebNode,
    title: WebNode,
    body: WebNode,
}

impl Document {
    /// Build `<html><head><meta charset><title>…</title></head><body>`.
    pub fn new(ctx: Arc<SyncContext>, title: &str) -> Result<Self, DomError> {
        let root = ctx.document_node();
        let html = ctx.create_element("html");
        let head = ctx.create_element("head");
        let charset = ctx.create_element("meta");
        charset.set_attribute("charset", "utf-8")?;
        let title_el = ctx.create_element("title");
        title_el.set_text_content(title)?;
        let body = ctx.create_element("body");

        head.append_child(&charset)?;
        head.append_child(&title_el)?;
        html.append_child(&head)?;
        html.append_child(&body)?;
        root.append_child(html.node())?;

        Ok(Self {
            ctx,
            root,
            html,
            head,
            title: title_el,
            body,
        })
    }

    pub fn context(&self) -> &Arc<SyncContext> {
        &self.ctx
    }

    pub fn html(&self) -> &WebNode {
        &self.html
    }

    pub fn head(&self) -> &WebNode {
        &self.head
    }

    pub fn body(&self) -> &WebNode {
        &self.body
    }

    pub fn title(&self) -> String {
        self.title.text_content()
    }

    pub fn set_title(&self, title: &str) -> Result<(), DomError> {
        self.title.set_text_content(title)
    }

    /// Append `<script src=…>` to the body, typically the browser client.
    pub fn add_script(&self, src: &str) -> Result<(), DomError> {
        let script = self.ctx.create_element("script");
        script.set_attribute("src", src)?;
        self.body.append_child(&script)
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<WebNode> {
        let node = self.ctx.resolve(&id.to_string())?;
        Some(self.ctx.web(&node))
    }

    // --- connections ---

    /// Attach a connection and announce existing listener registrations.
    ///
    /// The page a browser loads carries the serialized markup but not the
    /// event hooks, so each element with listeners re-announces them on the
    /// fresh connection before any new mutation reaches it.
    pub fn add_connection(&self, conn: Arc<dyn Transport>) {
        info!(connection = conn.id(), "connection attached");
        self.announce_listeners(&conn, self.html.node());
        self.root.add_connection(conn);
    }

    fn announce_listeners(&self, conn: &Arc<dyn Transport>, node: &Node) {
        let types = node.listener_types();
        if !types.is_empty() {
            let web = self.ctx.web(node);
            for event in types {
                debug!(node = %node.id(), event, "announcing listener");
                web.emit_to(conn, &DomCommand::AddEventListener { event });
            }
        }
        for child in node.children() {
            self.announce_listeners(conn, &child);
        }
    }

    pub fn remove_connection(&self, id: &str) {
        info!(connection = id, "connection detached");
        self.root.remove_connection(id);
    }

    pub fn connection_count(&self) -> usize {
        self.root.open_connections().len()
    }

    /// The full page as served to a newly arriving browser, identity
    /// attributes included.
    pub fn render(&self) -> String {
        format!("<!DOCTYPE html>{}", self.html.html())
    }
}
