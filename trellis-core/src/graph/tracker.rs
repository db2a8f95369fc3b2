//! Dependency Tracker
//!
//! Owns the [`DependencyGraph`] and answers "which rules must run when this
//! node changes" in O(1) average time.

use indexmap::IndexSet;

use super::DependencyGraph;
use crate::error::{EngineError, Result};
use crate::model::{NodeId, Rule, RuleId};

/// Maintains the node-to-rules reverse index.
#[derive(Debug, Default, Clone)]
pub struct DependencyTracker {
    graph: DependencyGraph,
}

impl DependencyTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a rule's dependency list without registering it.
    pub fn validate(rule: &Rule) -> Result<()> {
        if rule.dependencies().is_empty() {
            return Err(EngineError::Configuration {
                rule: rule.id().clone(),
            });
        }
        Ok(())
    }

    /// Add edges from each of the rule's dependencies to the rule.
    ///
    /// Fails with [`EngineError::Configuration`] if the rule declares no
    /// dependencies, leaving the graph untouched.
    pub fn register_rule(&mut self, rule: &Rule) -> Result<()> {
        Self::validate(rule)?;

        for node_id in rule.dependencies() {
            self.graph
                .entry(node_id.clone())
                .or_insert_with(IndexSet::new)
                .insert(rule.id().clone());
        }
        Ok(())
    }

    /// Remove the rule's edges, dropping entries that become empty.
    pub fn unregister_rule(&mut self, rule: &Rule) {
        for node_id in rule.dependencies() {
            let emptied = match self.graph.get_mut(node_id.as_str()) {
                Some(dependents) => {
                    dependents.shift_remove(rule.id().as_str());
                    dependents.is_empty()
                }
                None => false,
            };

            if emptied {
                self.graph.shift_remove(node_id.as_str());
            }
        }
    }

    /// Rules depending on `node_id`, in registration order.
    ///
    /// Empty if the node is untracked.
    pub fn dependent_rules(&self, node_id: &str) -> impl Iterator<Item = &RuleId> + '_ {
        self.graph
            .get(node_id)
            .into_iter()
            .flat_map(|dependents| dependents.iter())
    }

    /// Check if any rule depends on `node_id`.
    pub fn has_dependent(&self, node_id: &str) -> bool {
        self.graph.contains_key(node_id)
    }

    /// Node ids that at least one rule depends on.
    pub fn tracked_nodes(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.graph.keys()
    }

    /// Drop every edge.
    pub fn clear(&mut self) {
        self.graph.clear();
    }

    /// Get the underlying graph.
    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Number of tracked nodes.
    pub fn len(&self) -> usize {
        self.graph.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }
}
