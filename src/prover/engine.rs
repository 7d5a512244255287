//! `ProofEngine`: depth- and time-bounded backward chaining with cycle
//! detection over facts, transitive relations, and rules.

use super::condition::prove_condition;
use super::{ProveFailure, ProveResult, Step};
use crate::encoder::Node;
use crate::kb::KnowledgeBase;
use crate::matcher::{KBMatcher, Stats};
use crate::transitive::TransitiveReasoner;
use crate::unify::Binding;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

/// Confidence multiplier applied per additional rule hop in a derivation
/// chain, compounding with [`crate::transitive::TRANSITIVE_DECAY`] but
/// tracked independently since rule chains and transitive chains are
/// different mechanisms.
pub const CONFIDENCE_DECAY: f32 = 0.95;
/// Confidence assigned to a condition established purely by a rule firing,
/// before any decay is applied.
pub const CONDITION_CONFIDENCE: f32 = 0.9;
/// Fixed confidence for a `Not` condition that succeeds under the
/// closed-world assumption (negation as failure carries no graded evidence).
pub const NEGATION_CONFIDENCE: f32 = 0.8;

#[derive(Debug, Clone)]
pub struct ProverConfig {
    /// Closed-world assumption: `Not(p)` succeeds iff `p` cannot be proven.
    /// When `false`, `Not(p)` only succeeds given an explicit negative fact,
    /// which this engine does not model, so it always fails open-world.
    pub closed_world: bool,
    /// When a rule's conclusion is a conjunction-shaped head (rare; most
    /// rules conclude a single triple), whether to require proving every
    /// conjunct vs. treating the head as a single opaque goal.
    pub expand_conjunctive_consequents: bool,
    pub max_depth: usize,
    pub timeout: Duration,
}

impl Default for ProverConfig {
    fn default() -> Self {
        ProverConfig {
            closed_world: true,
            expand_conjunctive_consequents: false,
            max_depth: 16,
            timeout: Duration::from_secs(2),
        }
    }
}

pub(crate) struct ProofContext {
    pub depth: usize,
    pub deadline: Instant,
    pub visited: HashSet<u64>,
    pub steps: Vec<Step>,
}

impl ProofContext {
    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

pub struct ProofEngine<'a> {
    pub kb: &'a KnowledgeBase,
    pub config: ProverConfig,
    stats: Stats,
}

impl<'a> ProofEngine<'a> {
    pub fn new(kb: &'a KnowledgeBase, config: ProverConfig) -> Self {
        ProofEngine {
            kb,
            config,
            stats: Stats::default(),
        }
    }

    pub fn stats(&self) -> crate::matcher::StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn prove(&self, goal: &Node) -> ProveResult {
        let mut ctx = ProofContext {
            depth: 0,
            deadline: Instant::now() + self.config.timeout,
            visited: HashSet::new(),
            steps: Vec::new(),
        };
        match self.prove_goal(goal, &Binding::new(), &mut ctx) {
            Ok((confidence, binding)) => {
                ProveResult::success(binding.apply(goal), ctx.steps, confidence, binding)
            }
            Err(failure) => ProveResult::failure(failure),
        }
    }

    /// Attempts to establish `goal` under `binding`: direct fact, transitive
    /// chain, then rule chaining, in that priority order (cheapest checks
    /// first). Appends a [`Step`] to `ctx.steps` for whichever path succeeds.
    pub(crate) fn prove_goal(
        &self,
        goal: &Node,
        binding: &Binding,
        ctx: &mut ProofContext,
    ) -> Result<(f32, Binding), ProveFailure> {
        if ctx.expired() {
            return Err(ProveFailure::TimedOut);
        }
        if ctx.depth > self.config.max_depth {
            return Err(ProveFailure::DepthExceeded {
                limit: self.config.max_depth,
            });
        }

        let grounded = binding.apply(goal);
        let fingerprint = fingerprint_node(&grounded);
        if grounded.is_ground() && !ctx.visited.insert(fingerprint) {
            return Err(ProveFailure::CycleDetected);
        }

        let matcher = KBMatcher::new(self.kb, &self.stats);

        if grounded.is_ground() {
            if let Some(confidence) = matcher.try_direct(&grounded, binding, 0.0) {
                ctx.steps.push(Step::Fact {
                    node: grounded.clone(),
                    confidence,
                });
                return Ok((confidence, binding.clone()));
            }
        }

        if let Some((relation, hops, confidence, extended)) = self.try_transitive(&grounded, binding) {
            ctx.steps.push(Step::TransitiveChain {
                relation,
                hops,
                confidence,
            });
            return Ok((confidence, extended));
        }

        for (fact, extended) in matcher.find_exact(&grounded, binding) {
            ctx.steps.push(Step::Fact {
                node: fact.node.clone(),
                confidence: fact.confidence,
            });
            return Ok((fact.confidence, extended));
        }

        for rule in matcher.try_rule_chain(&grounded) {
            let Some(head_binding) = unify_conclusion(&rule.conclusion, &grounded, binding.clone()) else {
                continue;
            };
            ctx.depth += 1;
            let outcome = prove_condition(self, &rule.condition, &head_binding, ctx);
            ctx.depth -= 1;
            if let Some((body_confidence, final_binding, _body_steps)) = outcome {
                let decay = CONFIDENCE_DECAY.powi(ctx.depth as i32 + 1);
                let confidence = (CONDITION_CONFIDENCE * body_confidence * decay).clamp(0.0, 1.0);
                ctx.steps.push(Step::RuleApplied {
                    rule_id: rule.id,
                    conclusion: final_binding.apply(&rule.conclusion),
                    confidence,
                });
                return Ok((confidence, final_binding));
            }
        }

        Err(ProveFailure::NoPathFound)
    }

    fn try_transitive(&self, goal: &Node, binding: &Binding) -> Option<(String, usize, f32, Binding)> {
        let Node::Triple {
            subject,
            relation,
            object,
        } = goal
        else {
            return None;
        };
        let (Node::Atom(from), Node::Atom(to)) = (subject.as_ref(), object.as_ref()) else {
            return None;
        };
        let reasoner = TransitiveReasoner::new(self.kb);
        let (hops, confidence) = reasoner.chain(relation, from, to)?;
        Some((relation.clone(), hops.len(), confidence, binding.clone()))
    }
}

/// Unifies a rule's conclusion pattern against a grounded goal, extending
/// `binding`. Fails if the conclusion's relation differs or a hole conflicts
/// with an already-bound value.
fn unify_conclusion(conclusion: &Node, goal: &Node, binding: Binding) -> Option<Binding> {
    match (conclusion, goal) {
        (
            Node::Triple {
                subject: cs,
                relation: cr,
                object: co,
            },
            Node::Triple {
                subject: gs,
                relation: gr,
                object: go,
            },
        ) if cr == gr => {
            let binding = unify_term(cs, gs, binding)?;
            unify_term(co, go, binding)
        }
        _ => None,
    }
}

fn unify_term(pattern: &Node, value: &Node, binding: Binding) -> Option<Binding> {
    match (pattern, value) {
        (Node::Hole(name), Node::Atom(v)) => match binding.get(name) {
            Some(existing) if existing != *v => None,
            Some(_) => Some(binding),
            None => Some(binding.extend(name, v)),
        },
        (Node::Hole(_), Node::Hole(_)) => Some(binding),
        (Node::Atom(a), Node::Atom(b)) if a == b => Some(binding),
        _ => None,
    }
}

fn fingerprint_node(node: &Node) -> u64 {
    let mut hasher = DefaultHasher::new();
    format!("{node:?}").hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::{Condition, Provenance, Rule};
    use crate::vector::{Strategy, VectorSpace};

    fn triple(s: &str, r: &str, o: &str) -> Node {
        Node::triple(Node::Atom(s.into()), r, Node::Atom(o.into()))
    }

    #[test]
    fn proves_ground_fact_directly() {
        let kb = KnowledgeBase::new();
        let space = VectorSpace::new(Strategy::SignedByte, 32, 1);
        kb.add_fact(triple("Socrates", "isA", "Human"), space.zero(), 1.0, Provenance::ingested());
        let engine = ProofEngine::new(&kb, ProverConfig::default());
        let result = engine.prove(&triple("Socrates", "isA", "Human"));
        assert!(result.success);
    }

    #[test]
    fn proves_via_single_rule_hop() {
        let kb = KnowledgeBase::new();
        let space = VectorSpace::new(Strategy::SignedByte, 32, 1);
        kb.add_fact(triple("Socrates", "isA", "Human"), space.zero(), 1.0, Provenance::ingested());
        kb.add_rule(
            triple("Socrates", "isMortal", "True"),
            Condition::Atom(triple("Socrates", "isA", "Human")),
        );
        let engine = ProofEngine::new(&kb, ProverConfig::default());
        let result = engine.prove(&triple("Socrates", "isMortal", "True"));
        assert!(result.success);
        let proof = result.proof.unwrap();
        assert!(proof.confidence > 0.0 && proof.confidence <= 1.0);
    }

    #[test]
    fn unreachable_goal_fails_cleanly() {
        let kb = KnowledgeBase::new();
        let engine = ProofEngine::new(&kb, ProverConfig::default());
        let result = engine.prove(&triple("Nobody", "isA", "Nothing"));
        assert!(!result.success);
        assert_eq!(result.failure, Some(ProveFailure::NoPathFound));
    }

    #[test]
    fn direct_self_referential_rule_does_not_hang() {
        let kb = KnowledgeBase::new();
        let rule = Rule {
            id: 0,
            conclusion: triple("a", "loop", "b"),
            condition: Condition::Atom(triple("a", "loop", "b")),
        };
        kb.add_rule(rule.conclusion.clone(), rule.condition.clone());
        let engine = ProofEngine::new(&kb, ProverConfig::default());
        let result = engine.prove(&triple("a", "loop", "b"));
        assert!(!result.success);
    }
}
