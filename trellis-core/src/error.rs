//! Engine Errors
//!
//! Identity and shape errors (duplicate ids, unknown ids, rules without
//! dependencies) always propagate to the caller of the failing operation.
//! Sweep errors (loops, failing effects) only surface when the engine is
//! configured to fail fast; otherwise the evaluator logs them and skips the
//! offending rule.

use std::fmt;

use crate::model::{NodeId, RuleId};

/// Which id space an identity error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Rule,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Node => f.write_str("node"),
            EntityKind::Rule => f.write_str("rule"),
        }
    }
}

/// Unified error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A rule was registered without any dependencies.
    #[error("rule '{rule}' declares no dependencies; dependencies must be listed explicitly")]
    Configuration { rule: RuleId },

    /// A node or rule id is already taken.
    #[error("{kind} '{id}' is already registered")]
    DuplicateId { kind: EntityKind, id: String },

    /// A node or rule id is unknown.
    #[error("{kind} '{id}' does not exist")]
    NotFound { kind: EntityKind, id: String },

    /// A rule was revisited within one sweep, or the depth limit was hit.
    #[error("loop detected at rule '{rule}' (depth {depth})")]
    LoopDetected { rule: RuleId, depth: usize },

    /// A rule's effect returned an error.
    #[error("effect of rule '{rule}' failed: {source}")]
    RuleEffect {
        rule: RuleId,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl EngineError {
    pub(crate) fn duplicate_node(id: &NodeId) -> Self {
        EngineError::DuplicateId {
            kind: EntityKind::Node,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate_rule(id: &RuleId) -> Self {
        EngineError::DuplicateId {
            kind: EntityKind::Rule,
            id: id.to_string(),
        }
    }

    pub(crate) fn node_not_found(id: &str) -> Self {
        EngineError::NotFound {
            kind: EntityKind::Node,
            id: id.to_owned(),
        }
    }

    /// Returns `true` for errors caused by the shape of the call itself
    /// (duplicate or unknown ids, missing dependencies).
    pub fn is_identity_error(&self) -> bool {
        matches!(
            self,
            EngineError::Configuration { .. }
                | EngineError::DuplicateId { .. }
                | EngineError::NotFound { .. }
        )
    }

    /// Returns `true` for errors raised while a sweep was running.
    pub fn is_sweep_error(&self) -> bool {
        matches!(
            self,
            EngineError::LoopDetected { .. } | EngineError::RuleEffect { .. }
        )
    }
}

/// Result alias used across the crate.
pub type Result<T, E = EngineError> = std::result::Result<T, E>;
