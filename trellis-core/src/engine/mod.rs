//! Engine
//!
//! The engine is the only object collaborators touch. It composes the
//! [`Store`], the [`DependencyTracker`] and the [`RuleEvaluator`] and decides
//! which sweep each operation triggers.
//!
//! # How It Works
//!
//! | operation          | sweep                                  |
//! |--------------------|----------------------------------------|
//! | `register_node`    | none                                   |
//! | `update_node`      | incremental, for the updated node      |
//! | `unregister_node`  | incremental, after the node is deleted |
//! | `add_rule`         | full                                   |
//! | `add_rules`        | one full sweep for the whole batch     |
//! | `remove_rule`      | none                                   |
//! | `reset`            | none                                   |
//!
//! Registering a node never evaluates anything, so a form with hundreds of
//! fields can be bootstrapped without a sweep per field.
//!
//! # Thread Safety
//!
//! Every operation runs to completion before returning and there is exactly
//! one logical writer. Hosts calling from several threads wrap the engine in
//! a [`SharedEngine`] and serialize through its lock. Listeners run while
//! that lock is held, so they must not lock the engine themselves.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::evaluator::{EvaluationStats, RuleEvaluator};
use crate::graph::DependencyTracker;
use crate::model::{Node, NodeMap, NodePatch, Rule, RuleId, RuleMap};
use crate::store::{Change, Store, Subscription};

/// An engine behind a lock, for hosts that share it between threads.
pub type SharedEngine = Arc<Mutex<Engine>>;

/// Number of sweeps run since the engine was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepCounts {
    pub full: u64,
    pub incremental: u64,
}

/// Live, borrowed view of the engine's maps. Not a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct EngineState<'a> {
    pub nodes: &'a NodeMap,
    pub rules: &'a RuleMap,
}

/// Live, mutable view of the node map.
///
/// Writes through this view neither notify subscribers nor evaluate rules;
/// follow them with [`Engine::evaluate_for_node`] or [`Engine::evaluate`].
#[derive(Debug)]
pub struct EngineStateMut<'a> {
    pub nodes: &'a mut NodeMap,
    pub rules: &'a RuleMap,
}

/// The reactive rule engine.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    store: Store,
    tracker: DependencyTracker,
    evaluator: RuleEvaluator,
    sweeps: SweepCounts,
    last_evaluation: Option<EvaluationStats>,
}

impl Engine {
    /// Create an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            evaluator: RuleEvaluator::new(&config),
            config,
            store: Store::new(),
            tracker: DependencyTracker::new(),
            sweeps: SweepCounts::default(),
            last_evaluation: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Nodes
    // ------------------------------------------------------------------

    /// Register a node. Never evaluates any rule.
    pub fn register_node(&mut self, node: Node) -> Result<()> {
        if self.store.contains_node(node.id().as_str()) {
            return Err(EngineError::duplicate_node(node.id()));
        }
        self.store.insert_node(node);
        Ok(())
    }

    /// Merge `patch` onto node `id`, then run the rules depending on it.
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<EvaluationStats> {
        if !self.store.patch_node(id, patch) {
            return Err(EngineError::node_not_found(id));
        }
        self.run_incremental(id)
    }

    /// Delete node `id`, then run the rules depending on it.
    ///
    /// The node is already gone while those rules run. Returns `Ok(None)`
    /// without evaluating if the node does not exist.
    pub fn unregister_node(&mut self, id: &str) -> Result<Option<EvaluationStats>> {
        if self.store.remove_node(id).is_none() {
            warn!(node = id, "unregister_node: node does not exist");
            return Ok(None);
        }
        self.run_incremental(id).map(Some)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.store.node(id)
    }

    /// All nodes, in registration order.
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> + '_ {
        self.store.nodes().values()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.store.contains_node(id)
    }

    pub fn node_count(&self) -> usize {
        self.store.nodes().len()
    }

    // ------------------------------------------------------------------
    // Rules
    // ------------------------------------------------------------------

    /// Add a rule and run a full sweep.
    ///
    /// On error the rule map and dependency graph are unchanged.
    pub fn add_rule(&mut self, rule: Rule) -> Result<EvaluationStats> {
        if self.store.contains_rule(rule.id().as_str()) {
            return Err(EngineError::duplicate_rule(rule.id()));
        }
        self.tracker.register_rule(&rule)?;
        self.store.insert_rule(Arc::new(rule));
        self.run_full()
    }

    /// Add several rules with a single full sweep at the end.
    ///
    /// The whole batch is validated before anything is inserted, so a
    /// failing batch leaves the engine unchanged.
    pub fn add_rules<I>(&mut self, rules: I) -> Result<EvaluationStats>
    where
        I: IntoIterator<Item = Rule>,
    {
        let rules: Vec<Rule> = rules.into_iter().collect();

        {
            let mut batch: HashSet<&RuleId> = HashSet::with_capacity(rules.len());
            for rule in &rules {
                if self.store.contains_rule(rule.id().as_str()) || !batch.insert(rule.id()) {
                    return Err(EngineError::duplicate_rule(rule.id()));
                }
                DependencyTracker::validate(rule)?;
            }
        }

        debug!(count = rules.len(), "adding rule batch");
        for rule in rules {
            self.tracker.register_rule(&rule)?;
            self.store.insert_rule(Arc::new(rule));
        }
        self.run_full()
    }

    /// Remove a rule. Never evaluates.
    ///
    /// Returns the removed rule, or `None` (with a warning) if it did not exist.
    pub fn remove_rule(&mut self, id: &str) -> Option<Arc<Rule>> {
        let Some(rule) = self.store.remove_rule(id) else {
            warn!(rule = id, "remove_rule: rule does not exist");
            return None;
        };
        self.tracker.unregister_rule(&rule);
        Some(rule)
    }

    pub fn rule(&self, id: &str) -> Option<&Arc<Rule>> {
        self.store.rule(id)
    }

    /// All rules, in registration order.
    pub fn rules(&self) -> impl ExactSizeIterator<Item = &Arc<Rule>> + '_ {
        self.store.rules().values()
    }

    pub fn has_rule(&self, id: &str) -> bool {
        self.store.contains_rule(id)
    }

    pub fn rule_count(&self) -> usize {
        self.store.rules().len()
    }

    /// Rules an update to `node_id` would consider, in registration order.
    pub fn dependent_rules(&self, node_id: &str) -> Vec<RuleId> {
        self.tracker.dependent_rules(node_id).cloned().collect()
    }

    pub fn tracker(&self) -> &DependencyTracker {
        &self.tracker
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Run a full sweep over every rule.
    pub fn evaluate(&mut self) -> Result<EvaluationStats> {
        self.run_full()
    }

    /// Run the rules depending on `node_id`, e.g. after writing through
    /// [`Engine::state_mut`].
    pub fn evaluate_for_node(&mut self, node_id: &str) -> Result<EvaluationStats> {
        self.run_incremental(node_id)
    }

    /// Stats of the most recent sweep that completed.
    pub fn last_evaluation(&self) -> Option<&EvaluationStats> {
        self.last_evaluation.as_ref()
    }

    pub fn sweep_counts(&self) -> SweepCounts {
        self.sweeps
    }

    fn run_full(&mut self) -> Result<EvaluationStats> {
        self.sweeps.full += 1;
        let (rules, mut writer) = self.store.split();
        let outcome = self.evaluator.evaluate_all(rules.values(), &mut writer);
        self.record(outcome)
    }

    fn run_incremental(&mut self, node_id: &str) -> Result<EvaluationStats> {
        self.sweeps.incremental += 1;
        let (rules, mut writer) = self.store.split();
        let outcome = self
            .evaluator
            .evaluate_for_node(node_id, &self.tracker, rules, &mut writer);
        self.record(outcome)
    }

    fn record(&mut self, outcome: Result<EvaluationStats>) -> Result<EvaluationStats> {
        if let Ok(stats) = &outcome {
            self.last_evaluation = Some(stats.clone());
        }
        outcome
    }

    // ------------------------------------------------------------------
    // Lifecycle and observation
    // ------------------------------------------------------------------

    /// Clear nodes, rules and dependency edges. Never evaluates.
    ///
    /// Subscribers stay registered and receive a single [`Change::Reset`].
    pub fn reset(&mut self) {
        self.tracker.clear();
        self.store.clear();
        self.last_evaluation = None;
    }

    /// Register a change listener. See [`Change`] for the events delivered.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    pub fn subscriber_count(&self) -> usize {
        self.store.subscribers().len()
    }

    pub fn state(&self) -> EngineState<'_> {
        EngineState {
            nodes: self.store.nodes(),
            rules: self.store.rules(),
        }
    }

    pub fn state_mut(&mut self) -> EngineStateMut<'_> {
        let (nodes, rules) = self.store.maps_mut();
        EngineStateMut { nodes, rules }
    }

    pub fn into_shared(self) -> SharedEngine {
        Arc::new(Mutex::new(self))
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
