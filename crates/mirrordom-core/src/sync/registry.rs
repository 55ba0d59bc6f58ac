//! Weak identity-to-node mapping.

use std::sync::Weak;

use dashmap::DashMap;

use mirrordom_protocols::NodeId;

use crate::dom::Node;
use crate::dom::node::NodeInner;

/// Maps node identities to live nodes without keeping them alive.
///
/// Entries hold weak references only; a node reachable from nowhere else
/// is freed normally, and its stale entry is pruned on the next lookup.
#[derive(Default)]
pub struct NodeRegistry {
    nodes: DashMap<NodeId, Weak<NodeInner>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, node: &Node) {
        self.nodes.insert(node.id().clone(), node.downgrade());
    }

    /// Look up a node by identity. Dead entries are removed as they are
    /// encountered.
    pub fn resolve(&self, id: &NodeId) -> Option<Node> {
        let entry = self.nodes.get(id)?;
        match Node::from_weak(&entry) {
            Some(node) => Some(node),
            None => {
                drop(entry);
                self.nodes.remove(id);
                None
            }
        }
    }

    /// Number of entries, live or not-yet-pruned.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
