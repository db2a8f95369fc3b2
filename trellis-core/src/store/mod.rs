//! Store
//!
//! The store owns the canonical node and rule maps plus the listener
//! registry. Reactivity is explicit: every mutating method commits its change
//! and then notifies subscribers with a [`Change`]. No write is intercepted
//! behind the caller's back.
//!
//! The store does not evaluate rules and does not validate identity; the
//! engine does both before calling in.

mod subscriber;
mod writer;

use std::sync::Arc;

use crate::model::{Node, NodeMap, NodePatch, Rule, RuleMap};

pub use subscriber::{Change, Listener, SubscriberId, Subscribers, Subscription};
pub use writer::NodeWriter;

/// Owner of the node map, rule map and subscribers.
#[derive(Debug, Default)]
pub struct Store {
    nodes: NodeMap,
    rules: RuleMap,
    subscribers: Subscribers,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    /// Mutable nodes alongside the rules, bypassing notification.
    pub fn maps_mut(&mut self) -> (&mut NodeMap, &RuleMap) {
        (&mut self.nodes, &self.rules)
    }

    pub fn rules(&self) -> &RuleMap {
        &self.rules
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn rule(&self, id: &str) -> Option<&Arc<Rule>> {
        self.rules.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_rule(&self, id: &str) -> bool {
        self.rules.contains_key(id)
    }

    /// Insert a node, replacing any node with the same id.
    pub fn insert_node(&mut self, node: Node) {
        let id = node.id().clone();
        self.nodes.insert(id.clone(), node);
        self.subscribers.notify(&Change::NodeRegistered(id));
    }

    /// Merge a patch onto a node. Returns `false` if the node does not exist.
    pub fn patch_node(&mut self, id: &str, patch: NodePatch) -> bool {
        self.writer().update(id, patch)
    }

    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.shift_remove(id)?;
        self.subscribers
            .notify(&Change::NodeRemoved(node.id().clone()));
        Some(node)
    }

    /// Insert a rule, replacing any rule with the same id.
    pub fn insert_rule(&mut self, rule: Arc<Rule>) {
        let id = rule.id().clone();
        self.rules.insert(id.clone(), rule);
        self.subscribers.notify(&Change::RuleAdded(id));
    }

    pub fn remove_rule(&mut self, id: &str) -> Option<Arc<Rule>> {
        let rule = self.rules.shift_remove(id)?;
        self.subscribers
            .notify(&Change::RuleRemoved(rule.id().clone()));
        Some(rule)
    }

    /// Clear both maps with a single notification. Subscribers are kept.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.rules.clear();
        self.subscribers.notify(&Change::Reset);
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(listener)
    }

    pub fn subscribers(&self) -> &Subscribers {
        &self.subscribers
    }

    /// A writer over the node map that notifies on every write.
    pub fn writer(&mut self) -> NodeWriter<'_> {
        NodeWriter::new(&mut self.nodes, &self.subscribers)
    }

    /// Borrow the rule map alongside a node writer, as a sweep needs both.
    pub fn split(&mut self) -> (&RuleMap, NodeWriter<'_>) {
        (
            &self.rules,
            NodeWriter::new(&mut self.nodes, &self.subscribers),
        )
    }
}
