//! Per-sweep execution context.
//!
//! Every top-level sweep gets a fresh [`Sweep`]: an effect nesting depth and
//! the set of rules already fired. A rule id fires at most once per sweep;
//! `visited` is never cleared while the sweep runs.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use crate::model::RuleId;

#[derive(Debug)]
pub(crate) struct Sweep {
    depth: usize,
    visited: HashSet<RuleId>,
    started_at: Instant,
}

impl Sweep {
    pub(crate) fn new() -> Self {
        Self {
            depth: 0,
            visited: HashSet::new(),
            started_at: Instant::now(),
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn has_visited(&self, rule: &RuleId) -> bool {
        self.visited.contains(rule)
    }

    /// Mark `rule` visited and enter one level of effect nesting.
    ///
    /// The level is exited when the returned guard drops, even if the
    /// effect panics.
    pub(crate) fn enter(&mut self, rule: &RuleId) -> DepthGuard<'_> {
        self.visited.insert(rule.clone());
        self.depth += 1;
        DepthGuard {
            depth: &mut self.depth,
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Guard that decrements the sweep depth when dropped.
pub(crate) struct DepthGuard<'a> {
    depth: &'a mut usize,
}

impl DepthGuard<'_> {
    pub(crate) fn depth(&self) -> usize {
        *self.depth
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        *self.depth -= 1;
    }
}
