//! Trellis Core
//!
//! This crate provides the rule engine behind the Trellis reactive form
//! framework. It implements:
//!
//! - Named state cells ("nodes") holding a value and UI flags
//! - Declarative rules with explicit dependencies, priorities and conditions
//! - Incremental re-evaluation driven by a dependency graph
//! - Loop protection and explicit change subscriptions
//!
//! Everything is single-process, in-memory and synchronous: every engine
//! operation runs to completion before it returns.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `model`: Nodes, rules and their ids
//! - `graph`: The node-to-rules dependency index
//! - `evaluator`: Ordered, loop-protected rule sweeps
//! - `store`: Canonical node/rule maps and change notification
//! - `engine`: The public API composing the above
//!
//! # Example
//!
//! ```rust
//! use serde_json::{json, Value};
//! use trellis_core::{Engine, Node, NodePatch, Rule};
//!
//! let mut engine = Engine::new();
//! engine.register_node(Node::new("age", 0))?;
//! engine.register_node(Node::new("status", ""))?;
//!
//! engine.add_rule(
//!     Rule::new("r1", "status from age", |nodes| {
//!         let age = nodes.value("age").and_then(Value::as_i64).unwrap_or(0);
//!         let status = if age >= 18 { "adult" } else { "minor" };
//!         nodes.update("status", NodePatch::value_only(status));
//!         Ok(())
//!     })
//!     .depends_on(["age"]),
//! )?;
//!
//! engine.update_node("age", NodePatch::value_only(20))?;
//! assert_eq!(engine.node("status").map(|n| &n.value), Some(&json!("adult")));
//! # Ok::<(), trellis_core::EngineError>(())
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod model;
pub mod store;

pub use config::EngineConfig;
pub use engine::{Engine, EngineState, EngineStateMut, SharedEngine, SweepCounts};
pub use error::{EngineError, EntityKind, Result};
pub use evaluator::{EvaluationStats, RuleEvaluator};
pub use graph::{DependencyGraph, DependencyTracker};
pub use model::{Condition, Effect, EffectResult, Node, NodeId, NodeMap, NodePatch, Rule, RuleId, RuleMap};
pub use store::{Change, NodeWriter, Store, Subscription};
