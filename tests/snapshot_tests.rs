//! `Session::snapshot`/`Session::restore` round trips: facts, rules, and
//! derived answers survive a save/restore cycle, and a restored session
//! rejects being reopened under an incompatible vector space.

use sys2_core::encoder::Node;
use sys2_core::kb::Condition;
use sys2_core::session::{Session, SessionConfig};
use sys2_core::truth::Truth;
use sys2_core::vector::Strategy;

fn triple(s: &str, r: &str, o: &str) -> Node {
    Node::triple(Node::Atom(s.into()), r, Node::Atom(o.into()))
}

fn config() -> SessionConfig {
    SessionConfig {
        dimension: 256,
        theory_seed: 11,
        ..SessionConfig::default()
    }
}

#[test]
fn snapshot_round_trip_preserves_facts_rules_and_answers() {
    let mut session = Session::new(config());
    session.add_fact(triple("Socrates", "isA", "Human"), 1.0).unwrap();
    session
        .add_rule(
            triple("Socrates", "isMortal", "True"),
            Condition::Atom(triple("Socrates", "isA", "Human")),
        )
        .unwrap();

    let blob = session.snapshot().unwrap();
    let mut restored = Session::restore(config(), &blob).unwrap();

    assert_eq!(restored.fact_count(), session.fact_count());
    assert_eq!(restored.rule_count(), session.rule_count());
    assert_eq!(restored.ask(&triple("Socrates", "isA", "Human")), Truth::True);
    assert_eq!(restored.ask(&triple("Socrates", "isMortal", "True")), Truth::True);
}

#[test]
fn restore_rejects_mismatched_dimension() {
    let mut session = Session::new(config());
    session.add_fact(triple("Socrates", "isA", "Human"), 1.0).unwrap();
    let blob = session.snapshot().unwrap();

    let mismatched = SessionConfig {
        dimension: 64,
        ..config()
    };
    let err = Session::restore(mismatched, &blob);
    assert!(err.is_err());
}

#[test]
fn restore_rejects_mismatched_strategy() {
    let mut session = Session::new(config());
    session.add_fact(triple("Socrates", "isA", "Human"), 1.0).unwrap();
    let blob = session.snapshot().unwrap();

    let mismatched = SessionConfig {
        strategy: Strategy::BinaryDense,
        ..config()
    };
    let err = Session::restore(mismatched, &blob);
    assert!(err.is_err());
}

#[test]
fn restore_rejects_garbage_blob() {
    let err = Session::restore(config(), b"definitely not a snapshot");
    assert!(err.is_err());
}

#[test]
fn restored_session_continues_to_accept_new_facts() {
    let mut session = Session::new(config());
    session.add_fact(triple("Socrates", "isA", "Human"), 1.0).unwrap();
    let blob = session.snapshot().unwrap();

    let mut restored = Session::restore(config(), &blob).unwrap();
    restored.add_fact(triple("Plato", "isA", "Human"), 1.0).unwrap();
    assert_eq!(restored.fact_count(), 2);
    assert_eq!(restored.ask(&triple("Plato", "isA", "Human")), Truth::True);
}
