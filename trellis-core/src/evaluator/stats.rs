//! Sweep statistics.

use std::time::Duration;

use serde::Serialize;

/// What a single sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvaluationStats {
    /// Effects invoked, including ones that returned an error.
    pub rules_evaluated: usize,

    /// Rules skipped because they were disabled or their condition failed.
    pub rules_skipped: usize,

    /// Rules skipped by loop protection (only when not failing fast).
    pub loop_skipped: usize,

    /// Effects that returned an error.
    pub rules_failed: usize,

    /// Deepest effect nesting observed.
    pub max_depth_reached: usize,

    /// Wall time spent in the sweep.
    pub duration: Duration,

    /// Whether loop protection tripped at least once.
    pub loop_detected: bool,
}

impl EvaluationStats {
    pub fn duration_ms(&self) -> f64 {
        self.duration.as_secs_f64() * 1000.0
    }
}
