//! Node handles and plain structural operations.
//!
//! A [`Node`] is a cheap clonable handle (`Arc`) onto shared interior state.
//! Parent links are weak; children own their subtrees, so dropping the last
//! external handle to a detached subtree frees it, and the identity registry
//! (which holds only weak references) observes the death automatically.
//!
//! Structural operations here validate and mutate the local tree only.
//! Browser emission lives in [`crate::sync::emitter::WebNode`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use mirrordom_protocols::{DomError, NodeId, Transport};

use crate::dom::{SYNC_ID_ATTR, serialize};
use crate::sync::event::{Listener, ListenerId};
use crate::sync::pending::PendingRequests;

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;

pub(crate) struct ElementData {
    pub(crate) tag: String,
    pub(crate) attrs: RwLock<Vec<(String, String)>>,
    pub(crate) listeners: RwLock<HashMap<String, Vec<(ListenerId, Listener)>>>,
    next_listener: AtomicU64,
    pub(crate) pending: PendingRequests,
}

pub(crate) enum NodeData {
    Document {
        connections: RwLock<Vec<Arc<dyn Transport>>>,
    },
    Element(ElementData),
    Text {
        data: String,
    },
    Comment {
        data: String,
    },
    Fragment,
}

pub(crate) struct NodeInner {
    id: NodeId,
    pub(crate) data: NodeData,
    parent: RwLock<Weak<NodeInner>>,
    children: RwLock<Vec<Node>>,
}

/// Handle onto one tree node.
#[derive(Clone)]
pub struct Node(pub(crate) Arc<NodeInner>);

impl Node {
    fn with_data(id: NodeId, data: NodeData) -> Self {
        Self(Arc::new(NodeInner {
            id,
            data,
            parent: RwLock::new(Weak::new()),
            children: RwLock::new(Vec::new()),
        }))
    }

    pub(crate) fn new_element(id: NodeId, tag: String) -> Self {
        Self::with_data(
            id,
            NodeData::Element(ElementData {
                tag,
                attrs: RwLock::new(Vec::new()),
                listeners: RwLock::new(HashMap::new()),
                next_listener: AtomicU64::new(0),
                pending: PendingRequests::new(),
            }),
        )
    }

    pub(crate) fn new_text(id: NodeId, data: String) -> Self {
        Self::with_data(id, NodeData::Text { data })
    }

    pub(crate) fn new_comment(id: NodeId, data: String) -> Self {
        Self::with_data(id, NodeData::Comment { data })
    }

    pub(crate) fn new_fragment(id: NodeId) -> Self {
        Self::with_data(id, NodeData::Fragment)
    }

    pub(crate) fn new_document(id: NodeId) -> Self {
        Self::with_data(
            id,
            NodeData::Document {
                connections: RwLock::new(Vec::new()),
            },
        )
    }

    // --- identity ---

    pub fn id(&self) -> &NodeId {
        &self.0.id
    }

    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn downgrade(&self) -> Weak<NodeInner> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn from_weak(weak: &Weak<NodeInner>) -> Option<Node> {
        weak.upgrade().map(Node)
    }

    // --- kind probes ---

    pub fn tag(&self) -> Option<&str> {
        match &self.0.data {
            NodeData::Element(el) => Some(el.tag.as_str()),
            _ => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self.0.data, NodeData::Element(_))
    }

    pub fn is_text(&self) -> bool {
        matches!(self.0.data, NodeData::Text { .. })
    }

    pub fn is_document(&self) -> bool {
        matches!(self.0.data, NodeData::Document { .. })
    }

    pub fn is_fragment(&self) -> bool {
        matches!(self.0.data, NodeData::Fragment)
    }

    // --- tree navigation ---

    pub fn parent(&self) -> Option<Node> {
        Node::from_weak(&self.0.parent.read())
    }

    /// Snapshot of the current children.
    pub fn children(&self) -> Vec<Node> {
        self.0.children.read().clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.children.read().len()
    }

    pub fn index_of(&self, child: &Node) -> Option<usize> {
        self.0
            .children
            .read()
            .iter()
            .position(|c| Node::ptr_eq(c, child))
    }

    /// `true` if `other` is this node or lies anywhere in its subtree.
    pub fn contains(&self, other: &Node) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(node) = cursor {
            if Node::ptr_eq(&node, self) {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    /// Walk the parent chain to the owning document, if attached to one.
    pub fn owner_document(&self) -> Option<Node> {
        let mut cursor = self.clone();
        loop {
            if cursor.is_document() {
                return Some(cursor);
            }
            cursor = cursor.parent()?;
        }
    }

    // --- structural mutation (local only) ---

    pub(crate) fn ensure_can_contain(&self, child: &Node) -> Result<(), DomError> {
        if !(self.is_element() || self.is_document() || self.is_fragment()) {
            return Err(DomError::NotAnElement(self.id().clone()));
        }
        if child.contains(self) {
            return Err(DomError::HierarchyViolation {
                node: child.id().clone(),
            });
        }
        Ok(())
    }

    /// Detach this node from its parent, if any.
    fn unlink(&self) {
        if let Some(parent) = self.parent() {
            let mut children = parent.0.children.write();
            if let Some(idx) = children.iter().position(|c| Node::ptr_eq(c, self)) {
                children.remove(idx);
            }
        }
        *self.0.parent.write() = Weak::new();
    }

    pub fn append_child(&self, child: &Node) -> Result<(), DomError> {
        self.ensure_can_contain(child)?;
        // Appending a fragment adopts its children, leaving it empty.
        if child.is_fragment() {
            for grandchild in child.children() {
                self.append_child(&grandchild)?;
            }
            return Ok(());
        }
        child.unlink();
        self.0.children.write().push(child.clone());
        *child.0.parent.write() = Arc::downgrade(&self.0);
        Ok(())
    }

    pub fn insert_before(&self, child: &Node, reference: &Node) -> Result<(), DomError> {
        self.ensure_can_contain(child)?;
        if self.index_of(reference).is_none() {
            return Err(DomError::NotAChild {
                parent: self.id().clone(),
                child: reference.id().clone(),
            });
        }
        if Node::ptr_eq(child, reference) {
            return Ok(());
        }
        if child.is_fragment() {
            for grandchild in child.children() {
                self.insert_before(&grandchild, reference)?;
            }
            return Ok(());
        }
        // Unlinking may shift sibling indices; find the reference again.
        child.unlink();
        let idx = self.index_of(reference).ok_or_else(|| DomError::NotAChild {
            parent: self.id().clone(),
            child: reference.id().clone(),
        })?;
        self.0.children.write().insert(idx, child.clone());
        *child.0.parent.write() = Arc::downgrade(&self.0);
        Ok(())
    }

    pub fn remove_child(&self, child: &Node) -> Result<(), DomError> {
        let idx = self.index_of(child).ok_or_else(|| DomError::NotAChild {
            parent: self.id().clone(),
            child: child.id().clone(),
        })?;
        self.0.children.write().remove(idx);
        *child.0.parent.write() = Weak::new();
        Ok(())
    }

    pub fn replace_child(&self, new_child: &Node, old_child: &Node) -> Result<(), DomError> {
        self.ensure_can_contain(new_child)?;
        if self.index_of(old_child).is_none() {
            return Err(DomError::NotAChild {
                parent: self.id().clone(),
                child: old_child.id().clone(),
            });
        }
        if Node::ptr_eq(new_child, old_child) {
            return Ok(());
        }
        self.insert_before(new_child, old_child)?;
        self.remove_child(old_child)
    }

    /// Remove all children.
    pub fn empty(&self) {
        let drained: Vec<Node> = std::mem::take(&mut *self.0.children.write());
        for child in drained {
            *child.0.parent.write() = Weak::new();
        }
    }

    /// Detach this node from its parent's tree.
    pub fn remove(&self) {
        self.unlink();
    }

    // --- attributes ---

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        match &self.0.data {
            NodeData::Element(el) => el
                .attrs
                .read()
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone()),
            _ => None,
        }
    }

    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        if name == SYNC_ID_ATTR {
            return Err(DomError::ImmutableId(SYNC_ID_ATTR.to_string()));
        }
        let NodeData::Element(el) = &self.0.data else {
            return Err(DomError::NotAnElement(self.id().clone()));
        };
        let mut attrs = el.attrs.write();
        if let Some(entry) = attrs.iter_mut().find(|(k, _)| k == name) {
            entry.1 = value.to_string();
        } else {
            attrs.push((name.to_string(), value.to_string()));
        }
        Ok(())
    }

    pub fn remove_attribute(&self, name: &str) -> Option<String> {
        let NodeData::Element(el) = &self.0.data else {
            return None;
        };
        let mut attrs = el.attrs.write();
        let idx = attrs.iter().position(|(k, _)| k == name)?;
        Some(attrs.remove(idx).1)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.get_attribute(name).is_some()
    }

    /// Ordered attribute snapshot, excluding the identity attribute (which
    /// only exists in serialized form).
    pub fn attributes(&self) -> Vec<(String, String)> {
        match &self.0.data {
            NodeData::Element(el) => el.attrs.read().clone(),
            _ => Vec::new(),
        }
    }

    // --- class helpers ---

    pub fn class_list(&self) -> Vec<String> {
        self.get_attribute("class")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.class_list().iter().any(|c| c == class)
    }

    pub fn has_classes(&self) -> bool {
        !self.class_list().is_empty()
    }

    // --- text ---

    pub fn text_data(&self) -> Option<&str> {
        match &self.0.data {
            NodeData::Text { data } | NodeData::Comment { data } => Some(data.as_str()),
            _ => None,
        }
    }

    /// Concatenated text of this node's subtree (comments excluded).
    pub fn text_content(&self) -> String {
        fn collect(node: &Node, out: &mut String) {
            match &node.0.data {
                NodeData::Text { data } => out.push_str(data),
                NodeData::Comment { .. } => {}
                _ => {
                    for child in node.children() {
                        collect(&child, out);
                    }
                }
            }
        }
        let mut out = String::new();
        collect(self, &mut out);
        out
    }

    // --- serialization ---

    /// HTML of this node and its subtree, identity attributes included.
    pub fn html(&self) -> String {
        serialize::outer_html(self)
    }

    /// HTML of this node's children.
    pub fn inner_html(&self) -> String {
        serialize::inner_html(self)
    }

    /// HTML with the identity attribute stripped, for display/comparison.
    pub fn html_noid(&self) -> String {
        serialize::strip_sync_ids(&self.html())
    }

    // --- event listener storage (dispatch lives in crate::sync::event) ---

    /// Store a listener; returns its id and whether it is the first for the
    /// event type.
    pub(crate) fn add_listener(&self, event: &str, listener: Listener) -> (ListenerId, bool) {
        let NodeData::Element(el) = &self.0.data else {
            return (0, false);
        };
        let id = el.next_listener.fetch_add(1, Ordering::Relaxed);
        let mut listeners = el.listeners.write();
        let slot = listeners.entry(event.to_string()).or_default();
        slot.push((id, listener));
        (id, slot.len() == 1)
    }

    /// Remove a listener; `Some(true)` when none remain for the event type,
    /// `None` when the id was not found.
    pub(crate) fn remove_listener(&self, event: &str, id: ListenerId) -> Option<bool> {
        let NodeData::Element(el) = &self.0.data else {
            return None;
        };
        let mut listeners = el.listeners.write();
        let slot = listeners.get_mut(event)?;
        let idx = slot.iter().position(|(lid, _)| *lid == id)?;
        slot.remove(idx);
        let none_left = slot.is_empty();
        if none_left {
            listeners.remove(event);
        }
        Some(none_left)
    }

    pub(crate) fn listeners_for(&self, event: &str) -> Vec<Listener> {
        match &self.0.data {
            NodeData::Element(el) => el
                .listeners
                .read()
                .get(event)
                .map(|slot| slot.iter().map(|(_, l)| l.clone()).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Event types with at least one registered listener.
    pub fn listener_types(&self) -> Vec<String> {
        match &self.0.data {
            NodeData::Element(el) => el.listeners.read().keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    // --- pending queries ---

    pub(crate) fn pending(&self) -> Option<&PendingRequests> {
        match &self.0.data {
            NodeData::Element(el) => Some(&el.pending),
            _ => None,
        }
    }

    // --- connections (document nodes only) ---

    pub(crate) fn add_connection(&self, conn: Arc<dyn Transport>) {
        if let NodeData::Document { connections } = &self.0.data {
            connections.write().push(conn);
        }
    }

    pub(crate) fn remove_connection(&self, id: &str) {
        if let NodeData::Document { connections } = &self.0.data {
            connections.write().retain(|c| c.id() != id);
        }
    }

    /// Live connections of this document node, pruning closed ones.
    pub(crate) fn open_connections(&self) -> Vec<Arc<dyn Transport>> {
        match &self.0.data {
            NodeData::Document { connections } => {
                let mut conns = connections.write();
                conns.retain(|c| c.is_open());
                conns.clone()
            }
            _ => Vec::new(),
        }
    }

    pub(crate) fn has_open_connection(&self) -> bool {
        !self.open_connections().is_empty()
    }
}

impl AsRef<Node> for Node {
    fn as_ref(&self) -> &Node {
        self
    }
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &self.0.data {
            NodeData::Document { .. } => "Document",
            NodeData::Element(el) => return write!(f, "Element(<{}> id={})", el.tag, self.0.id),
            NodeData::Text { .. } => "Text",
            NodeData::Comment { .. } => "Comment",
            NodeData::Fragment => "Fragment",
        };
        write!(f, "{}(id={})", kind, self.0.id)
    }
}
