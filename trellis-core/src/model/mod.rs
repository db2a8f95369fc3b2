//! Data Model
//!
//! Passive value types shared by every other module: the reactive state cells
//! ([`Node`]), the declarative computations over them ([`Rule`]), and the ids
//! both are keyed by.
//!
//! # Ownership
//!
//! Nodes and rules are owned exclusively by the engine's store. Nodes are
//! mutated in place through [`NodePatch`] merges; rules are immutable once
//! built and shared as `Arc<Rule>` so a sweep can hold its candidate list
//! while effects write to the node map.
//!
//! # Ordering
//!
//! All maps are [`IndexMap`]s. Registration order is observable: it breaks
//! priority ties during a sweep, and it is the order accessors return.

mod id;
mod node;
mod rule;

use std::sync::Arc;

use indexmap::IndexMap;

pub use id::{NodeId, RuleId};
pub use node::{Node, NodePatch};
pub use rule::{Condition, Effect, EffectResult, Rule};

/// The canonical node map, in registration order.
pub type NodeMap = IndexMap<NodeId, Node>;

/// The canonical rule map, in registration order.
pub type RuleMap = IndexMap<RuleId, Arc<Rule>>;
