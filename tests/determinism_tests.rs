//! Testable Property 3: re-encoding the same facts under the same seed
//! always yields the same vectors and the same answers — nothing in the
//! pipeline (bundling tiebreaks, permutation tables, vocabulary interning)
//! leaks nondeterminism across independent sessions or process runs.

use sys2_core::encoder::Node;
use sys2_core::kb::Condition;
use sys2_core::session::{Session, SessionConfig};
use sys2_core::truth::Truth;
use sys2_core::vector::{Strategy, VectorSpace};

fn triple(s: &str, r: &str, o: &str) -> Node {
    Node::triple(Node::Atom(s.into()), r, Node::Atom(o.into()))
}

fn config() -> SessionConfig {
    SessionConfig {
        dimension: 256,
        theory_seed: 42,
        ..SessionConfig::default()
    }
}

#[test]
fn two_independent_sessions_reach_identical_verdicts() {
    let mut a = Session::new(config());
    let mut b = Session::new(config());

    for session in [&mut a, &mut b] {
        session.add_fact(triple("Socrates", "isA", "Human"), 1.0).unwrap();
        session
            .add_rule(
                triple("Socrates", "isMortal", "True"),
                Condition::Atom(triple("Socrates", "isA", "Human")),
            )
            .unwrap();
    }

    assert_eq!(a.ask(&triple("Socrates", "isMortal", "True")), Truth::True);
    assert_eq!(b.ask(&triple("Socrates", "isMortal", "True")), Truth::True);

    let proof_a = a.prove(&triple("Socrates", "isMortal", "True"));
    let proof_b = b.prove(&triple("Socrates", "isMortal", "True"));
    assert_eq!(
        proof_a.proof.unwrap().confidence,
        proof_b.proof.unwrap().confidence,
        "identical seed and ingest order must produce bit-identical confidence"
    );
}

#[test]
fn vector_space_from_name_is_seed_stable_across_strategies() {
    for strategy in [Strategy::SignedByte, Strategy::BinaryDense] {
        let first = VectorSpace::new(strategy, 512, 7);
        let second = VectorSpace::new(strategy, 512, 7);
        assert_eq!(first.from_name("Aristotle"), second.from_name("Aristotle"));
    }
}

#[test]
fn different_seeds_diverge() {
    let mut a = Session::new(config());
    let mut b = Session::new(SessionConfig {
        theory_seed: 1337,
        ..config()
    });
    for session in [&mut a, &mut b] {
        session.add_fact(triple("Plato", "isA", "Human"), 1.0).unwrap();
    }
    // Both still answer their own direct fact correctly...
    assert_eq!(a.ask(&triple("Plato", "isA", "Human")), Truth::True);
    assert_eq!(b.ask(&triple("Plato", "isA", "Human")), Truth::True);
    // ...but the underlying vocabulary vectors differ between seeds.
    let space_a = VectorSpace::new(Strategy::SignedByte, 256, 42);
    let space_b = VectorSpace::new(Strategy::SignedByte, 256, 1337);
    assert_ne!(space_a.from_name("Plato"), space_b.from_name("Plato"));
}

#[test]
fn repeated_ingest_order_does_not_change_fact_count_or_verdict() {
    let mut forward = Session::new(config());
    let mut reverse = Session::new(config());

    let facts = [
        triple("Paris", "locatedIn", "France"),
        triple("France", "locatedIn", "Europe"),
    ];
    for fact in &facts {
        forward.add_fact(fact.clone(), 1.0).unwrap();
    }
    for fact in facts.iter().rev() {
        reverse.add_fact(fact.clone(), 1.0).unwrap();
    }

    assert_eq!(forward.fact_count(), reverse.fact_count());
    for fact in &facts {
        assert_eq!(forward.ask(fact), Truth::True);
        assert_eq!(reverse.ask(fact), Truth::True);
    }
}
