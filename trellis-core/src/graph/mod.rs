//! Dependency Graph
//!
//! This module maintains the reverse index that drives incremental
//! evaluation: for every node id, the set of rules that declared it as a
//! dependency.
//!
//! # Overview
//!
//! Edges come exclusively from the `dependencies` list of registered rules:
//!
//! - registering a rule adds `node -> rule` for each declared node
//! - unregistering a rule removes those edges, pruning empty entries
//!
//! The graph is therefore always exactly the reverse index of the current
//! rule set. There are no stale entries and no inferred edges.
//!
//! # Design Decisions
//!
//! 1. Entries are [`IndexSet`]s rather than hash sets so dependents come back
//!    in registration order, which the evaluator relies on for tie-breaking.
//!
//! 2. Removal uses `shift_remove` to keep that order intact.
//!
//! 3. Nodes themselves are not part of the graph. A rule may depend on a node
//!    that has not been registered yet (or has been removed).

mod tracker;

use indexmap::{IndexMap, IndexSet};

use crate::model::{NodeId, RuleId};

pub use tracker::DependencyTracker;

/// Node id to the ids of the rules depending on it.
pub type DependencyGraph = IndexMap<NodeId, IndexSet<RuleId>>;
