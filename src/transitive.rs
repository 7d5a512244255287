//! Transitive closure over relations flagged `transitive` on their
//! [`RelationSlot`](crate::kb::RelationSlot), with per-hop confidence decay.

use crate::encoder::Node;
use crate::kb::{Fact, KnowledgeBase};
use std::collections::HashSet;

/// Confidence of a one-hop transitive link absent any stored fact confidence
/// to anchor on (used only as a floor; stored confidences are preferred).
pub const TRANSITIVE_BASE: f32 = 0.9;
/// Multiplicative decay applied per additional hop in a transitive chain.
pub const TRANSITIVE_DECAY: f32 = 0.98;
/// Hard ceiling on chain length; guards against pathological relation graphs
/// independent of the prover's own depth limit.
const MAX_HOPS: usize = 64;

/// One hop of a discovered transitive chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Hop {
    pub from: String,
    pub to: String,
    pub confidence: f32,
}

/// Walks the ground `relation` edges stored as facts, chasing
/// `subject -> object -> object -> ...` paths.
pub struct TransitiveReasoner<'a> {
    pub kb: &'a KnowledgeBase,
}

impl<'a> TransitiveReasoner<'a> {
    pub fn new(kb: &'a KnowledgeBase) -> Self {
        TransitiveReasoner { kb }
    }

    fn edges_from(&self, relation: &str, from: &str) -> Vec<Fact> {
        self.kb
            .lookup_exact(relation, &Node::Atom(from.to_string()), &Node::Hole("_".into()))
    }

    /// Finds a chain `from -> ... -> to` via `relation`, if one exists,
    /// returning its hops and the chain's combined confidence
    /// (`base_confidence * TRANSITIVE_DECAY ^ (hops - 1)`). Cycle-safe: a
    /// node already on the current path is never revisited.
    pub fn chain(&self, relation: &str, from: &str, to: &str) -> Option<(Vec<Hop>, f32)> {
        if !self.kb.is_transitive(relation) {
            return None;
        }
        let mut visited = HashSet::new();
        visited.insert(from.to_string());
        self.dfs(relation, from, to, &mut visited, Vec::new())
    }

    fn dfs(
        &self,
        relation: &str,
        current: &str,
        target: &str,
        visited: &mut HashSet<String>,
        mut path: Vec<Hop>,
    ) -> Option<(Vec<Hop>, f32)> {
        if path.len() >= MAX_HOPS {
            return None;
        }
        for edge in self.edges_from(relation, current) {
            let Node::Triple { object, .. } = &edge.node else { continue };
            let Node::Atom(next) = object.as_ref() else { continue };
            if visited.contains(next) {
                continue;
            }
            let mut extended = path.clone();
            extended.push(Hop {
                from: current.to_string(),
                to: next.clone(),
                confidence: edge.confidence,
            });
            if next == target {
                let conf = chain_confidence(&extended);
                return Some((extended, conf));
            }
            visited.insert(next.clone());
            if let Some(found) = self.dfs(relation, next, target, visited, extended) {
                return Some(found);
            }
            visited.remove(next);
        }
        path.clear();
        None
    }

    /// Every node reachable from `from` via `relation`, each tagged with the
    /// confidence of the shortest chain found to it. Used to answer
    /// "everything transitively related to X" queries without a target.
    pub fn all_transitive_targets(&self, relation: &str, from: &str) -> Vec<(String, f32)> {
        if !self.kb.is_transitive(relation) {
            return Vec::new();
        }
        let mut found: Vec<(String, f32)> = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(from.to_string());
        self.collect_all(relation, from, &mut visited, 1.0, &mut found);
        found
    }

    fn collect_all(
        &self,
        relation: &str,
        current: &str,
        visited: &mut HashSet<String>,
        running_confidence: f32,
        found: &mut Vec<(String, f32)>,
    ) {
        if visited.len() > MAX_HOPS {
            return;
        }
        for edge in self.edges_from(relation, current) {
            let Node::Triple { object, .. } = &edge.node else { continue };
            let Node::Atom(next) = object.as_ref() else { continue };
            if visited.contains(next) {
                continue;
            }
            let hop_confidence = running_confidence * edge.confidence.max(TRANSITIVE_BASE) * TRANSITIVE_DECAY;
            found.push((next.clone(), hop_confidence));
            visited.insert(next.clone());
            self.collect_all(relation, next, visited, hop_confidence, found);
        }
    }
}

fn chain_confidence(hops: &[Hop]) -> f32 {
    let base = hops.iter().map(|h| h.confidence).fold(1.0f32, f32::min).min(TRANSITIVE_BASE);
    let decay = TRANSITIVE_DECAY.powi(hops.len() as i32 - 1);
    (base * decay).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kb::{Provenance, RelationSlot};
    use crate::vector::{Strategy, VectorSpace};

    fn setup_chain() -> KnowledgeBase {
        let kb = KnowledgeBase::new();
        let mut slot = RelationSlot::new("locatedIn");
        slot.transitive = true;
        kb.set_relation_slot(slot);
        let space = VectorSpace::new(Strategy::SignedByte, 32, 1);
        for (s, o) in [("Paris", "France"), ("France", "Europe"), ("Europe", "Earth")] {
            kb.add_fact(
                Node::triple(Node::Atom(s.into()), "locatedIn", Node::Atom(o.into())),
                space.zero(),
                1.0,
                Provenance::ingested(),
            );
        }
        kb
    }

    #[test]
    fn finds_multi_hop_chain() {
        let kb = setup_chain();
        let reasoner = TransitiveReasoner::new(&kb);
        let (hops, confidence) = reasoner.chain("locatedIn", "Paris", "Earth").unwrap();
        assert_eq!(hops.len(), 3);
        let expected = TRANSITIVE_BASE * TRANSITIVE_DECAY.powi(2);
        assert!((confidence - expected).abs() < 1e-5, "confidence {confidence} != {expected}");
    }

    #[test]
    fn non_transitive_relation_never_chains() {
        let kb = KnowledgeBase::new();
        let space = VectorSpace::new(Strategy::SignedByte, 32, 1);
        kb.add_fact(
            Node::triple(Node::Atom("a".into()), "likes", Node::Atom("b".into())),
            space.zero(),
            1.0,
            Provenance::ingested(),
        );
        let reasoner = TransitiveReasoner::new(&kb);
        assert!(reasoner.chain("likes", "a", "b").is_none());
    }

    #[test]
    fn cycle_does_not_infinite_loop() {
        let kb = KnowledgeBase::new();
        let mut slot = RelationSlot::new("relatedTo");
        slot.transitive = true;
        kb.set_relation_slot(slot);
        let space = VectorSpace::new(Strategy::SignedByte, 32, 1);
        for (s, o) in [("a", "b"), ("b", "c"), ("c", "a")] {
            kb.add_fact(
                Node::triple(Node::Atom(s.into()), "relatedTo", Node::Atom(o.into())),
                space.zero(),
                1.0,
                Provenance::ingested(),
            );
        }
        let reasoner = TransitiveReasoner::new(&kb);
        assert!(reasoner.chain("relatedTo", "a", "nonexistent").is_none());
        let targets = reasoner.all_transitive_targets("relatedTo", "a");
        assert_eq!(targets.len(), 2);
    }
}
