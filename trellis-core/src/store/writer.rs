//! Node writer handed to rule effects.

use serde_json::Value;
use tracing::warn;

use super::subscriber::{Change, Subscribers};
use crate::model::{Node, NodeId, NodeMap, NodePatch};

/// Write access to the node map for the duration of a sweep.
///
/// [`NodeWriter::update`] is a bare mutator: it merges a patch and notifies
/// subscribers, but never triggers further rule evaluation.
pub struct NodeWriter<'a> {
    nodes: &'a mut NodeMap,
    subscribers: &'a Subscribers,
    writes: usize,
}

impl<'a> NodeWriter<'a> {
    pub(crate) fn new(nodes: &'a mut NodeMap, subscribers: &'a Subscribers) -> Self {
        Self {
            nodes,
            subscribers,
            writes: 0,
        }
    }

    /// Merge `patch` onto the node `id`.
    ///
    /// Returns `false` (and changes nothing) if the node does not exist.
    pub fn update(&mut self, id: &str, patch: NodePatch) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            warn!(node = id, "effect wrote to an unknown node; ignoring");
            return false;
        };

        node.apply(patch);
        let id = node.id().clone();
        self.writes += 1;
        self.subscribers.notify(&Change::NodeUpdated(id));
        true
    }

    /// Get a node as it currently stands, including earlier writes in this sweep.
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Shorthand for a node's value.
    pub fn value(&self, id: &str) -> Option<&Value> {
        self.nodes.get(id).map(|node| &node.value)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// The readonly view of every node.
    pub fn nodes(&self) -> &NodeMap {
        &*self.nodes
    }

    /// Ids of all nodes, in registration order.
    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes.keys()
    }

    /// Number of successful writes through this writer.
    pub fn writes(&self) -> usize {
        self.writes
    }
}
