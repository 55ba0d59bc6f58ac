//! The [`SyncContext`]: node factory and identity authority.
//!
//! All nodes of one mirrored document tree are created through a single
//! context, which hands out identities and records every node in its
//! registry so inbound messages can be routed back to them.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use mirrordom_protocols::{DomError, NodeId};

use crate::dom::{Node, parser};
use crate::sync::emitter::WebNode;
use crate::sync::registry::NodeRegistry;

pub struct SyncContext {
    registry: NodeRegistry,
    next_id: AtomicU64,
}

impl SyncContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            registry: NodeRegistry::new(),
            next_id: AtomicU64::new(1),
        })
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    fn allocate_id(&self) -> NodeId {
        self.next_id.fetch_add(1, Ordering::Relaxed).to_string()
    }

    /// Look up a node by identity.
    pub fn resolve(&self, id: &NodeId) -> Option<Node> {
        self.registry.resolve(id)
    }

    /// Wrap a node in the synchronizing decorator.
    pub fn web(self: &Arc<Self>, node: &Node) -> WebNode {
        WebNode::new(node.clone(), self.clone())
    }

    // --- node factories ---

    pub fn create_element(self: &Arc<Self>, tag: &str) -> WebNode {
        let node = self.element_node(tag, None);
        self.web(&node)
    }

    /// Element with a caller-chosen identity. The caller is responsible for
    /// uniqueness; a collision shadows the earlier registration.
    pub fn create_element_with_id(self: &Arc<Self>, tag: &str, id: NodeId) -> WebNode {
        let node = self.element_node(tag, Some(id));
        self.web(&node)
    }

    pub(crate) fn element_node(&self, tag: &str, id: Option<NodeId>) -> Node {
        let id = id.unwrap_or_else(|| self.allocate_id());
        let node = Node::new_element(id, tag.to_ascii_lowercase());
        self.registry.register(&node);
        node
    }

    pub fn create_text(&self, data: &str) -> Node {
        let node = Node::new_text(self.allocate_id(), data.to_string());
        self.registry.register(&node);
        node
    }

    pub fn create_comment(&self, data: &str) -> Node {
        let node = Node::new_comment(self.allocate_id(), data.to_string());
        self.registry.register(&node);
        node
    }

    pub fn create_fragment(&self) -> Node {
        let node = Node::new_fragment(self.allocate_id());
        self.registry.register(&node);
        node
    }

    pub(crate) fn document_node(&self) -> Node {
        let node = Node::new_document(self.allocate_id());
        self.registry.register(&node);
        node
    }

    /// Parse an HTML fragment into a detached fragment node owned by this
    /// context.
    pub fn parse_fragment(&self, html: &str) -> Result<Node, DomError> {
        parser::parse_fragment_html(self, html)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities_are_unique() {
        let ctx = SyncContext::new();
        let a = ctx.create_element("div");
        let b = ctx.create_element("div");
        assert_ne!(a.node().id(), b.node().id());
    }

    #[test]
    fn test_tag_is_normalized_to_lowercase() {
        let ctx = SyncContext::new();
        let div = ctx.create_element("DIV");
        assert_eq!(div.node().tag(), Some("div"));
    }

    #[test]
    fn test_explicit_identity() {
        let ctx = SyncContext::new();
        let el = ctx.create_element_with_id("section", "main-panel".to_string());
        assert_eq!(el.node().id(), "main-panel");
        assert!(ctx.resolve(&"main-panel".to_string()).is_some());
    }

    #[test]
    fn test_all_node_kinds_are_registered() {
        let ctx = SyncContext::new();
        let text = ctx.create_text("t");
        let comment = ctx.create_comment("c");
        let frag = ctx.create_fragment();
        for node in [&text, &comment, &frag] {
            assert!(ctx.resolve(node.id()).is_some());
        }
    }
}
