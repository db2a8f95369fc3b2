//! Rule Evaluator
//!
//! The evaluator is a stateless executor: given candidate rules and write
//! access to the nodes, it runs one sweep and reports [`EvaluationStats`].
//!
//! # Algorithm
//!
//! Each call starts a fresh sweep context (depth 0, nothing visited):
//!
//! 1. Drop disabled rules (counted as skipped)
//! 2. Stable-sort the rest by priority, highest first. Ties keep the
//!    candidates' original order, i.e. registration order.
//! 3. For each rule:
//!    - if it was already fired in this sweep, or the depth limit is
//!      reached, loop protection trips: fail the sweep or skip the rule
//!    - if its condition is false, skip it
//!    - otherwise mark it visited and run its effect one level deeper
//! 4. Effect errors are logged and the sweep moves on, unless the evaluator
//!    runs in debug mode, in which case the error aborts the sweep.
//!
//! Writes made by an effect are not rolled back when it fails.
//!
//! # Cascading
//!
//! The [`NodeWriter`] handed to effects never re-enters the evaluator. If
//! rule A writes node X and rule B depends on X, B only runs in the same
//! sweep if it was already a candidate; otherwise the caller has to
//! re-trigger evaluation for X.

mod stats;
mod sweep;

use std::sync::Arc;

use tracing::{debug, debug_span, error, trace, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graph::DependencyTracker;
use crate::model::{Rule, RuleMap};
use crate::store::NodeWriter;

pub use stats::EvaluationStats;
use sweep::Sweep;

/// Runs sweeps of rules over nodes.
#[derive(Debug, Clone)]
pub struct RuleEvaluator {
    max_depth: usize,
    throw_on_loop: bool,
    debug: bool,
}

impl RuleEvaluator {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            throw_on_loop: config.throw_on_loop,
            debug: config.debug,
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn throw_on_loop(&self) -> bool {
        self.throw_on_loop
    }

    /// Full sweep: every given rule is a candidate.
    pub fn evaluate_all<'r, I>(&self, rules: I, nodes: &mut NodeWriter<'_>) -> Result<EvaluationStats>
    where
        I: IntoIterator<Item = &'r Arc<Rule>>,
    {
        let _span = debug_span!("sweep", mode = "full").entered();
        self.execute(rules.into_iter().collect(), nodes)
    }

    /// Incremental sweep: only rules depending on `node_id` are candidates.
    ///
    /// Tracked rule ids missing from `rules` are dropped silently.
    pub fn evaluate_for_node(
        &self,
        node_id: &str,
        tracker: &DependencyTracker,
        rules: &RuleMap,
        nodes: &mut NodeWriter<'_>,
    ) -> Result<EvaluationStats> {
        let _span = debug_span!("sweep", mode = "incremental", node = node_id).entered();

        let candidates = tracker
            .dependent_rules(node_id)
            .filter_map(|rule_id| rules.get(rule_id.as_str()))
            .collect();

        self.execute(candidates, nodes)
    }

    fn execute(&self, candidates: Vec<&Arc<Rule>>, nodes: &mut NodeWriter<'_>) -> Result<EvaluationStats> {
        let mut sweep = Sweep::new();
        let mut stats = EvaluationStats::default();

        let mut ordered = Vec::with_capacity(candidates.len());
        for rule in candidates {
            if rule.is_enabled() {
                ordered.push(rule);
            } else {
                stats.rules_skipped += 1;
            }
        }

        // `sort_by` is stable, so equal priorities keep candidate order.
        ordered.sort_by(|a, b| b.priority().cmp(&a.priority()));

        for rule in ordered {
            if sweep.has_visited(rule.id()) || sweep.depth() >= self.max_depth {
                stats.loop_detected = true;

                if self.throw_on_loop {
                    return Err(EngineError::LoopDetected {
                        rule: rule.id().clone(),
                        depth: sweep.depth(),
                    });
                }

                warn!(rule = %rule.id(), depth = sweep.depth(), "loop detected; skipping rule");
                stats.loop_skipped += 1;
                continue;
            }

            if !rule.check(nodes.nodes()) {
                trace!(rule = %rule.id(), "condition false; skipping rule");
                stats.rules_skipped += 1;
                continue;
            }

            let outcome = {
                let guard = sweep.enter(rule.id());
                stats.max_depth_reached = stats.max_depth_reached.max(guard.depth());
                trace!(rule = %rule.id(), priority = rule.priority(), "running effect");
                rule.run(nodes)
            };
            stats.rules_evaluated += 1;

            if let Err(source) = outcome {
                stats.rules_failed += 1;
                error!(rule = %rule.id(), error = %source, "rule effect failed");

                if self.debug {
                    return Err(EngineError::RuleEffect {
                        rule: rule.id().clone(),
                        source,
                    });
                }
            }
        }

        stats.duration = sweep.elapsed();
        debug!(
            evaluated = stats.rules_evaluated,
            skipped = stats.rules_skipped,
            loop_detected = stats.loop_detected,
            duration_ms = stats.duration_ms(),
            "sweep finished"
        );

        Ok(stats)
    }
}

impl Default for RuleEvaluator {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
