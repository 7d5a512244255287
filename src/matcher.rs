//! `KBMatcher`: ground-fact lookup and rule-chain discovery shared by the
//! query engine and the prover, with per-session counters for diagnostics.

use crate::encoder::Node;
use crate::kb::{Fact, KnowledgeBase, Rule};
use crate::unify::Binding;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running counters for a session's reasoning activity. Cheap, lock-free,
/// read via `snapshot()` for a `/stats`-style report.
#[derive(Debug, Default)]
pub struct Stats {
    pub facts_scanned: AtomicU64,
    pub rules_tried: AtomicU64,
    pub exact_hits: AtomicU64,
}

impl Stats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            facts_scanned: self.facts_scanned.load(Ordering::Relaxed),
            rules_tried: self.rules_tried.load(Ordering::Relaxed),
            exact_hits: self.exact_hits.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub facts_scanned: u64,
    pub rules_tried: u64,
    pub exact_hits: u64,
}

/// Bridges a [`Condition`](crate::kb::Condition) atom (possibly with unbound
/// variables under a `Binding`) to the facts and rules that could satisfy it.
pub struct KBMatcher<'a> {
    pub kb: &'a KnowledgeBase,
    pub stats: &'a Stats,
}

impl<'a> KBMatcher<'a> {
    pub fn new(kb: &'a KnowledgeBase, stats: &'a Stats) -> Self {
        KBMatcher { kb, stats }
    }

    /// Fully-ground check: does any stored fact equal `node` (after applying
    /// `binding`) and clear `min_confidence`? Returns the matching fact's
    /// confidence if so.
    pub fn try_direct(&self, node: &Node, binding: &Binding, min_confidence: f32) -> Option<f32> {
        let grounded = binding.apply(node);
        if !grounded.is_ground() {
            return None;
        }
        let Node::Triple {
            subject,
            relation,
            object,
        } = &grounded
        else {
            return None;
        };
        self.stats.rules_tried.fetch_add(0, Ordering::Relaxed);
        let hits = self.kb.lookup_exact(relation, subject, object);
        self.stats
            .facts_scanned
            .fetch_add(hits.len() as u64, Ordering::Relaxed);
        let best = hits
            .into_iter()
            .map(|f| f.confidence)
            .fold(None, |acc: Option<f32>, c| Some(acc.map_or(c, |a| a.max(c))));
        match best {
            Some(confidence) if confidence >= min_confidence => {
                self.stats.exact_hits.fetch_add(1, Ordering::Relaxed);
                Some(confidence)
            }
            _ => None,
        }
    }

    /// All facts matching `node` under `binding`, with the binding extended
    /// by each fact's concrete values for any holes still open in `node`.
    /// Holes not present in the fact's triple (shouldn't happen for
    /// well-formed patterns) are left unbound.
    pub fn find_exact(&self, node: &Node, binding: &Binding) -> Vec<(Fact, Binding)> {
        let pattern = binding.apply(node);
        let Node::Triple {
            subject,
            relation,
            object,
        } = &pattern
        else {
            return Vec::new();
        };
        let hits = self.kb.lookup_exact(relation, subject, object);
        self.stats
            .facts_scanned
            .fetch_add(hits.len() as u64, Ordering::Relaxed);
        hits.into_iter()
            .filter_map(|fact| {
                let extended = unify_ground(&pattern, &fact.node, binding.clone())?;
                Some((fact, extended))
            })
            .collect()
    }

    /// Rules whose conclusion shares `node`'s relation, for the prover to
    /// expand as alternative ways of establishing the goal.
    pub fn try_rule_chain(&self, node: &Node) -> Vec<Rule> {
        let Node::Triple { relation, .. } = node else {
            return Vec::new();
        };
        let rules = self.kb.rules_for_head(relation);
        self.stats
            .rules_tried
            .fetch_add(rules.len() as u64, Ordering::Relaxed);
        rules
    }
}

/// Extends `binding` so that every `Hole` in `pattern` maps to the
/// corresponding value in `ground`. Fails (returns `None`) if a hole is
/// already bound to a conflicting value.
fn unify_ground(pattern: &Node, ground: &Node, binding: Binding) -> Option<Binding> {
    match (pattern, ground) {
        (Node::Hole(name), Node::Atom(value)) => match binding.get(name) {
            Some(existing) if existing != *value => None,
            Some(_) => Some(binding),
            None => Some(binding.extend(name, value)),
        },
        (Node::Atom(a), Node::Atom(b)) if a == b => Some(binding),
        (Node::Number(a), Node::Number(b)) if (a - b).abs() < f64::EPSILON => Some(binding),
        (
            Node::Triple {
                subject: ps,
                relation: pr,
                object: po,
            },
            Node::Triple {
                subject: gs,
                relation: gr,
                object: go,
            },
        ) if pr == gr => {
            let binding = unify_ground(ps, gs, binding)?;
            unify_ground(po, go, binding)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::Provenance;
    use crate::vector::{Strategy, VectorSpace};

    fn triple(s: &str, r: &str, o: &str) -> Node {
        Node::triple(Node::Atom(s.into()), r, Node::Atom(o.into()))
    }

    #[test]
    fn try_direct_finds_ground_fact() {
        let kb = KnowledgeBase::new();
        let space = VectorSpace::new(Strategy::SignedByte, 64, 1);
        kb.add_fact(triple("a", "r", "b"), space.zero(), 0.8, Provenance::ingested());
        let stats = Stats::default();
        let matcher = KBMatcher::new(&kb, &stats);
        let conf = matcher.try_direct(&triple("a", "r", "b"), &Binding::new(), 0.5);
        assert_eq!(conf, Some(0.8));
    }

    #[test]
    fn find_exact_binds_holes_from_fact() {
        let kb = KnowledgeBase::new();
        let space = VectorSpace::new(Strategy::SignedByte, 64, 1);
        kb.add_fact(triple("a", "r", "b"), space.zero(), 1.0, Provenance::ingested());
        let stats = Stats::default();
        let matcher = KBMatcher::new(&kb, &stats);
        let pattern = Node::triple(Node::Atom("a".into()), "r", Node::Hole("y".into()));
        let hits = matcher.find_exact(&pattern, &Binding::new());
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].1.get("y").as_deref(), Some("b"));
    }
}
