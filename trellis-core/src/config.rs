//! Engine Configuration
//!
//! All behavior toggles are carried in an explicit [`EngineConfig`] handed to
//! the engine at construction. Nothing is read from the environment.
//!
//! # Defaults
//!
//! | field           | default                      |
//! |-----------------|------------------------------|
//! | `debug`         | `false`                      |
//! | `max_depth`     | `10`                         |
//! | `throw_on_loop` | `cfg!(debug_assertions)`     |
//!
//! Debug builds fail fast on loops; release builds log and skip the
//! offending rule.

use serde::{Deserialize, Serialize};

/// Default bound on effect nesting within a sweep.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Behavior toggles for an [`Engine`](crate::Engine).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Re-raise effect errors instead of logging and continuing.
    pub debug: bool,

    /// A rule cannot start once this many effects are executing.
    pub max_depth: usize,

    /// Abort the sweep with [`EngineError::LoopDetected`](crate::EngineError)
    /// instead of skipping the rule.
    pub throw_on_loop: bool,
}

impl EngineConfig {
    /// Fail fast on loops and effect errors.
    pub fn development() -> Self {
        Self {
            debug: true,
            max_depth: DEFAULT_MAX_DEPTH,
            throw_on_loop: true,
        }
    }

    /// Log and skip on loops and effect errors.
    pub fn production() -> Self {
        Self {
            debug: false,
            max_depth: DEFAULT_MAX_DEPTH,
            throw_on_loop: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_throw_on_loop(mut self, throw_on_loop: bool) -> Self {
        self.throw_on_loop = throw_on_loop;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debug: false,
            max_depth: DEFAULT_MAX_DEPTH,
            throw_on_loop: cfg!(debug_assertions),
        }
    }
}
