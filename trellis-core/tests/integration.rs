//! Integration Tests for the Rule Engine
//!
//! These tests verify that nodes, rules, the dependency tracker and the
//! evaluator work together through the public engine API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use trellis_core::{
    Change, Engine, EngineConfig, EngineError, Node, NodePatch, Rule, RuleEvaluator, Store,
};

type Log = Arc<Mutex<Vec<String>>>;

/// A rule on `deps` that appends its own id to `log` each time it fires.
fn recording_rule(log: &Log, id: &str, deps: &[&str], priority: i32) -> Rule {
    let log = log.clone();
    let name = id.to_owned();
    Rule::new(id, id, move |_| {
        log.lock().push(name.clone());
        Ok(())
    })
    .depends_on(deps.iter().copied())
    .with_priority(priority)
}

fn status_rule() -> Rule {
    Rule::new("r1", "status from age", |nodes| {
        let age = nodes.value("age").and_then(Value::as_i64).unwrap_or(0);
        let status = if age >= 18 { "adult" } else { "minor" };
        nodes.update("status", NodePatch::value_only(status));
        Ok(())
    })
    .depends_on(["age"])
}

fn value_of<'a>(engine: &'a Engine, id: &str) -> Option<&'a Value> {
    engine.node(id).map(|node| &node.value)
}

/// Test the age/status scenario end to end.
#[test]
fn status_follows_age() {
    let mut engine = Engine::new();
    engine.register_node(Node::new("age", 0)).unwrap();
    engine.register_node(Node::new("status", "")).unwrap();
    engine.add_rule(status_rule()).unwrap();

    engine.update_node("age", NodePatch::value_only(20)).unwrap();
    assert_eq!(value_of(&engine, "status"), Some(&json!("adult")));

    engine.update_node("age", NodePatch::value_only(10)).unwrap();
    assert_eq!(value_of(&engine, "status"), Some(&json!("minor")));
}

/// Test that a rule without dependencies is rejected and not stored.
#[test]
fn rule_without_dependencies_is_rejected() {
    let mut engine = Engine::new();
    let effects = Arc::new(AtomicUsize::new(0));
    let counter = effects.clone();

    let err = engine
        .add_rule(Rule::new("orphan", "orphan", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .unwrap_err();

    assert!(matches!(err, EngineError::Configuration { ref rule } if rule == "orphan"));
    assert!(err.is_identity_error());
    assert_eq!(engine.rule_count(), 0);
    assert!(engine.rule("orphan").is_none());
    assert_eq!(effects.load(Ordering::SeqCst), 0);
}

/// Test that registering nodes never runs any effect.
#[test]
fn register_node_never_evaluates() {
    let mut engine = Engine::new();
    let log = Log::default();
    engine
        .add_rule(recording_rule(&log, "watch", &["late"], 0))
        .unwrap();
    log.lock().clear();

    engine.register_node(Node::new("late", 1)).unwrap();
    for i in 0..50 {
        engine.register_node(Node::new(format!("field-{i}"), i)).unwrap();
    }

    assert!(log.lock().is_empty());
    assert_eq!(engine.sweep_counts().incremental, 0);
    assert_eq!(engine.sweep_counts().full, 1);
}

/// Test that an update runs exactly the dependent rules, once each, in order.
#[test]
fn update_runs_exactly_the_dependent_rules() {
    let mut engine = Engine::new();
    let log = Log::default();
    engine.register_node(Node::new("x", 0)).unwrap();
    engine.register_node(Node::new("y", 0)).unwrap();
    engine
        .add_rules([
            recording_rule(&log, "low", &["x"], -1),
            recording_rule(&log, "other", &["y"], 100),
            recording_rule(&log, "both", &["x", "y"], 0),
            recording_rule(&log, "high", &["x"], 3),
        ])
        .unwrap();
    log.lock().clear();

    let expected = engine.dependent_rules("x");
    assert_eq!(expected, vec!["low", "both", "high"]);

    let stats = engine.update_node("x", NodePatch::value_only(1)).unwrap();

    assert_eq!(*log.lock(), vec!["high", "both", "low"]);
    assert_eq!(stats.rules_evaluated, expected.len());
}

/// Test descending priority with registration order breaking ties.
#[test]
fn priority_ties_keep_registration_order() {
    let mut engine = Engine::new();
    let log = Log::default();
    engine.register_node(Node::new("X", 0)).unwrap();
    engine.add_rule(recording_rule(&log, "A", &["X"], 5)).unwrap();
    engine.add_rule(recording_rule(&log, "B", &["X"], 5)).unwrap();
    engine.add_rule(recording_rule(&log, "C", &["X"], 10)).unwrap();
    log.lock().clear();

    engine.evaluate_for_node("X").unwrap();

    assert_eq!(*log.lock(), vec!["C", "A", "B"]);
}

/// Test that re-adding a removed rule moves it to the end of its tie group.
#[test]
fn re_added_rule_runs_after_its_peers() {
    let mut engine = Engine::new();
    let log = Log::default();
    engine
        .add_rules([
            recording_rule(&log, "A", &["X"], 0),
            recording_rule(&log, "B", &["X"], 0),
        ])
        .unwrap();
    engine.remove_rule("A");
    engine.add_rule(recording_rule(&log, "A", &["X"], 0)).unwrap();
    log.lock().clear();

    engine.evaluate_for_node("X").unwrap();

    assert_eq!(*log.lock(), vec!["B", "A"]);
}

/// Test that a full sweep is idempotent for pure effects.
#[test]
fn evaluate_is_idempotent_for_pure_effects() {
    let mut engine = Engine::new();
    engine.register_node(Node::new("first", "Ada")).unwrap();
    engine.register_node(Node::new("last", "Lovelace")).unwrap();
    engine.register_node(Node::new("full", "")).unwrap();
    engine
        .add_rule(
            Rule::new("full-name", "join names", |nodes| {
                let first = nodes.value("first").and_then(Value::as_str).unwrap_or("");
                let last = nodes.value("last").and_then(Value::as_str).unwrap_or("");
                let full = format!("{first} {last}");
                nodes.update("full", NodePatch::value_only(full));
                Ok(())
            })
            .depends_on(["first", "last"]),
        )
        .unwrap();

    engine.evaluate().unwrap();
    let once: Vec<Node> = engine.nodes().cloned().collect();
    engine.evaluate().unwrap();
    let twice: Vec<Node> = engine.nodes().cloned().collect();

    assert_eq!(once, twice);
    assert_eq!(value_of(&engine, "full"), Some(&json!("Ada Lovelace")));
}

/// Test that unregister then register reproduces the node.
#[test]
fn unregister_register_round_trip() {
    let mut engine = Engine::new();
    let original = Node::new("email", "a@b.c").with_visible(true).with_error("invalid");
    engine.register_node(original.clone()).unwrap();
    engine.add_rule(Rule::new("r1", "noop", |_| Ok(())).depends_on(["email"])).unwrap();
    engine.remove_rule("r1");

    engine.unregister_node("email").unwrap();
    assert!(engine.node("email").is_none());
    engine.register_node(original.clone()).unwrap();

    assert_eq!(engine.node("email"), Some(&original));
    assert!(!engine.tracker().has_dependent("email"));
    assert!(engine.dependent_rules("email").is_empty());
}

/// Test that dependent rules see the node as absent during unregister.
#[test]
fn unregister_deletes_before_evaluating() {
    let mut engine = Engine::new();
    engine.register_node(Node::new("coupon", "SAVE10")).unwrap();
    engine.register_node(Node::new("discount", 0)).unwrap();
    engine
        .add_rule(
            Rule::new("discount", "discount from coupon", |nodes| {
                let discount = if nodes.contains("coupon") { 10 } else { 0 };
                nodes.update("discount", NodePatch::value_only(discount));
                Ok(())
            })
            .depends_on(["coupon"]),
        )
        .unwrap();
    assert_eq!(value_of(&engine, "discount"), Some(&json!(10)));

    let stats = engine.unregister_node("coupon").unwrap();

    assert_eq!(stats.map(|s| s.rules_evaluated), Some(1));
    assert_eq!(value_of(&engine, "discount"), Some(&json!(0)));
}

/// Test that batched rule insertion triggers one full sweep.
#[test]
fn add_rules_runs_a_single_sweep() {
    let mut engine = Engine::new();
    for i in 0..100 {
        engine.register_node(Node::new(format!("n{i}"), i)).unwrap();
    }
    let log = Log::default();

    let stats = engine
        .add_rules([
            recording_rule(&log, "ruleA", &["n1"], 0),
            recording_rule(&log, "ruleB", &["n2"], 0),
        ])
        .unwrap();

    assert_eq!(engine.sweep_counts().full, 1);
    assert_eq!(stats.rules_evaluated, 2);
    assert_eq!(*log.lock(), vec!["ruleA", "ruleB"]);
}

/// Test loop protection failing fast on a revisited rule.
#[test]
fn revisited_rule_raises_when_failing_fast() {
    let log = Log::default();
    let rule = Arc::new(recording_rule(&log, "loop", &["x"], 0));
    let mut store = Store::new();
    store.insert_node(Node::new("x", 0));

    let evaluator = RuleEvaluator::new(&EngineConfig::default().with_throw_on_loop(true));
    let err = evaluator
        .evaluate_all([&rule, &rule], &mut store.writer())
        .unwrap_err();

    assert!(matches!(err, EngineError::LoopDetected { ref rule, .. } if rule == "loop"));
    assert_eq!(log.lock().len(), 1);
}

/// Test loop protection degrading gracefully on a revisited rule.
#[test]
fn revisited_rule_is_skipped_when_degrading() {
    let log = Log::default();
    let rule = Arc::new(recording_rule(&log, "loop", &["x"], 0));
    let mut store = Store::new();
    store.insert_node(Node::new("x", 0));

    let evaluator = RuleEvaluator::new(&EngineConfig::production());
    let stats = evaluator
        .evaluate_all([&rule, &rule], &mut store.writer())
        .unwrap();

    assert!(stats.loop_detected);
    assert_eq!(stats.loop_skipped, 1);
    assert_eq!(stats.rules_evaluated, 1);
    assert_eq!(log.lock().len(), 1);
}

/// Test the depth limit through the engine API.
#[test]
fn depth_limit_applies_to_engine_sweeps() {
    let log = Log::default();
    let mut engine = Engine::with_config(EngineConfig::development().with_max_depth(0));
    engine.register_node(Node::new("x", 0)).unwrap();

    let err = engine
        .add_rule(recording_rule(&log, "r", &["x"], 0))
        .unwrap_err();

    assert!(err.is_sweep_error());
    // The rule is stored even though its first sweep failed.
    assert!(engine.has_rule("r"));
    assert!(log.lock().is_empty());
    assert!(engine.last_evaluation().is_none());
}

/// Test that effect writes do not cascade into other rules.
#[test]
fn effect_writes_do_not_cascade() {
    let mut engine = Engine::new();
    let log = Log::default();
    for id in ["a", "b", "c"] {
        engine.register_node(Node::new(id, 0)).unwrap();
    }
    engine
        .add_rules([
            Rule::new("a-to-b", "copy a to b", |nodes| {
                let a = nodes.value("a").cloned().unwrap_or_default();
                nodes.update("b", NodePatch::value_only(a));
                Ok(())
            })
            .depends_on(["a"]),
            recording_rule(&log, "watch-b", &["b"], 0),
        ])
        .unwrap();
    log.lock().clear();

    engine.update_node("a", NodePatch::value_only(5)).unwrap();
    assert_eq!(value_of(&engine, "b"), Some(&json!(5)));
    assert!(log.lock().is_empty());

    engine.evaluate_for_node("b").unwrap();
    assert_eq!(*log.lock(), vec!["watch-b"]);
}

/// Test that a failing effect leaves its target untouched and the sweep continues.
#[test]
fn failing_effect_is_skipped_in_production() {
    let mut engine = Engine::with_config(EngineConfig::production());
    let log = Log::default();
    engine.register_node(Node::new("x", 0)).unwrap();
    engine.register_node(Node::new("target", "unchanged")).unwrap();
    engine
        .add_rules([
            Rule::new("broken", "broken", |_| Err("lookup failed".into()))
                .depends_on(["x"])
                .with_priority(1),
            recording_rule(&log, "fine", &["x"], 0),
        ])
        .unwrap();
    log.lock().clear();

    let stats = engine.update_node("x", NodePatch::value_only(1)).unwrap();

    assert_eq!(stats.rules_failed, 1);
    assert_eq!(*log.lock(), vec!["fine"]);
    assert_eq!(value_of(&engine, "target"), Some(&json!("unchanged")));
}

/// Test that conditions gate effects against current state.
#[test]
fn condition_gates_effect() {
    let mut engine = Engine::new();
    engine.register_node(Node::new("newsletter", false)).unwrap();
    engine.register_node(Node::new("email", "").with_visible(false)).unwrap();
    engine
        .add_rule(
            Rule::new("show-email", "show email when subscribed", |nodes| {
                nodes.update("email", NodePatch::new().visible(true));
                Ok(())
            })
            .depends_on(["newsletter"])
            .when(|nodes| {
                nodes
                    .get("newsletter")
                    .and_then(|node| node.value.as_bool())
                    .unwrap_or(false)
            }),
        )
        .unwrap();
    assert_eq!(engine.node("email").and_then(|n| n.visible), Some(false));

    let stats = engine
        .update_node("newsletter", NodePatch::value_only(true))
        .unwrap();

    assert_eq!(stats.rules_evaluated, 1);
    assert_eq!(engine.node("email").and_then(|n| n.visible), Some(true));
}

/// Test that disabled rules never fire.
#[test]
fn disabled_rule_is_skipped() {
    let mut engine = Engine::new();
    let log = Log::default();
    engine
        .add_rule(recording_rule(&log, "off", &["x"], 0).with_enabled(false))
        .unwrap();
    engine.register_node(Node::new("x", 0)).unwrap();

    let stats = engine.update_node("x", NodePatch::value_only(1)).unwrap();

    assert!(log.lock().is_empty());
    assert_eq!(stats.rules_skipped, 1);
}

/// Test that several subscribers each see every change, in order.
#[test]
fn subscribers_observe_mutations() {
    let mut engine = Engine::new();
    let first = Arc::new(Mutex::new(Vec::new()));
    let second = Arc::new(AtomicUsize::new(0));

    let sink = first.clone();
    let _s1 = engine.subscribe(move |change| sink.lock().push(change.clone()));
    let counter = second.clone();
    let s2 = engine.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    engine.register_node(Node::new("age", 0)).unwrap();
    engine.register_node(Node::new("status", "")).unwrap();
    engine.add_rule(status_rule()).unwrap();
    s2.unsubscribe();
    engine.update_node("age", NodePatch::value_only(30)).unwrap();
    engine.remove_rule("r1");
    engine.unregister_node("status").unwrap();

    assert_eq!(
        *first.lock(),
        vec![
            Change::NodeRegistered("age".into()),
            Change::NodeRegistered("status".into()),
            Change::RuleAdded("r1".into()),
            Change::NodeUpdated("status".into()),
            Change::NodeUpdated("age".into()),
            Change::NodeUpdated("status".into()),
            Change::RuleRemoved("r1".into()),
            Change::NodeRemoved("status".into()),
        ]
    );
    assert_eq!(second.load(Ordering::SeqCst), 4);
    assert_eq!(engine.subscriber_count(), 1);
}

/// Test that the state view is live rather than a snapshot.
#[test]
fn state_is_live() {
    let mut engine = Engine::new();
    engine.register_node(Node::new("a", 1)).unwrap();

    engine.state_mut().nodes.insert("b".into(), Node::new("b", 2));

    let state = engine.state();
    assert_eq!(state.nodes.len(), 2);
    assert!(state.rules.is_empty());
    assert_eq!(value_of(&engine, "b"), Some(&json!(2)));
}
