//! Rules
//!
//! A rule is a declarative computation over nodes: it names the nodes it
//! reads (its dependencies), an effect that writes to nodes, an optional
//! condition gating the effect, and a priority ordering it within a sweep.
//!
//! Dependencies are always declared explicitly. The engine never infers them
//! from what an effect happens to read, which keeps the set of rules a node
//! change can trigger fully predictable.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use super::{NodeId, NodeMap, RuleId};
use crate::store::NodeWriter;

/// What an effect returns. An `Err` is logged (or re-raised in debug mode) by
/// the evaluator; writes made before the error are kept.
pub type EffectResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A rule's write-capable computation.
///
/// The [`NodeWriter`] is both the `update` mutator and the readonly view of
/// the node map. Reads observe writes made earlier in the same sweep.
pub type Effect = Arc<dyn Fn(&mut NodeWriter<'_>) -> EffectResult + Send + Sync>;

/// A predicate over the current nodes deciding whether a rule's effect runs.
pub type Condition = Arc<dyn Fn(&NodeMap) -> bool + Send + Sync>;

/// A declarative computation over nodes.
///
/// # Example
///
/// ```rust
/// use serde_json::Value;
/// use trellis_core::model::{NodePatch, Rule};
///
/// let rule = Rule::new("adult-check", "Derive status from age", |nodes| {
///     let age = nodes.value("age").and_then(Value::as_i64).unwrap_or(0);
///     let status = if age >= 18 { "adult" } else { "minor" };
///     nodes.update("status", NodePatch::value_only(status));
///     Ok(())
/// })
/// .depends_on(["age"])
/// .with_priority(10);
///
/// assert_eq!(rule.dependencies().len(), 1);
/// ```
pub struct Rule {
    id: RuleId,
    name: String,
    dependencies: SmallVec<[NodeId; 4]>,
    effect: Effect,
    condition: Option<Condition>,
    priority: i32,
    enabled: bool,
}

impl Rule {
    /// Create an enabled rule with priority 0 and no dependencies yet.
    ///
    /// A rule must be given at least one dependency with [`Rule::depends_on`]
    /// before the engine will accept it.
    pub fn new<F>(id: impl Into<RuleId>, name: impl Into<String>, effect: F) -> Self
    where
        F: Fn(&mut NodeWriter<'_>) -> EffectResult + Send + Sync + 'static,
    {
        Self {
            id: id.into(),
            name: name.into(),
            dependencies: SmallVec::new(),
            effect: Arc::new(effect),
            condition: None,
            priority: 0,
            enabled: true,
        }
    }

    /// Declare nodes this rule reads. Appends to any already declared.
    pub fn depends_on<I, N>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        self.dependencies
            .extend(dependencies.into_iter().map(Into::into));
        self
    }

    /// Gate the effect on a condition over the current nodes.
    pub fn when<F>(mut self, condition: F) -> Self
    where
        F: Fn(&NodeMap) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Higher priorities run first within a sweep.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn id(&self) -> &RuleId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[NodeId] {
        &self.dependencies
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }

    /// Evaluate the gating condition. A rule without one always passes.
    pub fn check(&self, nodes: &NodeMap) -> bool {
        self.condition
            .as_ref()
            .map_or(true, |condition| condition(nodes))
    }

    /// Invoke the effect.
    pub fn run(&self, writer: &mut NodeWriter<'_>) -> EffectResult {
        (self.effect)(writer)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("priority", &self.priority)
            .field("enabled", &self.enabled)
            .field("has_condition", &self.has_condition())
            .finish()
    }
}
