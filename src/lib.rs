//! # sys2-core
//!
//! A hyperdimensional symbolic-vector reasoning core: facts and rules are
//! encoded as fixed-width integer hypervectors, similarity search answers
//! single-step pattern queries with unbound holes, and a backward-chaining
//! prover derives conclusions through rule chains, transitive closure, and
//! negation-as-failure, decaying confidence with every inferential hop.
//!
//! ## Pipeline
//! ```text
//! Node (subject, relation, object)
//!     |
//! [Encoder]            -> Vector   (vector/, permuter.rs, vocabulary.rs)
//!     |
//! [KnowledgeBase]       -> indexed facts/rules (kb/)
//!     |
//! [QueryEngine]         -> single-step hole resolution (unify.rs)
//! [ProofEngine]         -> backward-chained derivation (prover/)
//!     |
//! Truth / QueryResult / ProveResult
//! ```
//!
//! ## Usage
//! ```rust
//! use sys2_core::encoder::Node;
//! use sys2_core::session::{Session, SessionConfig};
//! use sys2_core::kb::Condition;
//! use sys2_core::truth::Truth;
//!
//! let mut session = Session::new(SessionConfig {
//!     dimension: 256,
//!     ..SessionConfig::default()
//! });
//!
//! let socrates_is_human = Node::triple(
//!     Node::Atom("Socrates".into()),
//!     "isA",
//!     Node::Atom("Human".into()),
//! );
//! session.add_fact(socrates_is_human.clone(), 1.0).unwrap();
//! session
//!     .add_rule(
//!         Node::triple(Node::Atom("Socrates".into()), "isMortal", Node::Atom("True".into())),
//!         Condition::Atom(socrates_is_human),
//!     )
//!     .unwrap();
//!
//! let mortal = Node::triple(Node::Atom("Socrates".into()), "isMortal", Node::Atom("True".into()));
//! assert_eq!(session.ask(&mortal), Truth::True);
//! ```

pub mod audit;
pub mod config;
pub mod encoder;
pub mod error;
pub mod kb;
pub mod matcher;
pub mod permuter;
pub mod plugin;
pub mod prover;
pub mod session;
pub mod snapshot;
pub mod transitive;
pub mod truth;
pub mod unify;
pub mod vector;
pub mod vocabulary;

pub use encoder::Node;
pub use error::{Sys2Error, Sys2Result};
pub use session::{Session, SessionConfig};
pub use truth::Truth;
