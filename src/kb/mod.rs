//! ConceptStore / KB: the ground truth of a session — atoms (via
//! [`crate::vocabulary::Vocabulary`]), facts, rules, relation slots, and the
//! indexes over them.

mod bloom;

use crate::encoder::Node;
use crate::vector::{math, Vector};
use arc_swap::ArcSwap;
use bloom::BloomFilter;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

pub type FactId = u64;
pub type RuleId = u64;

/// Where a fact came from. Timestamps use `chrono` for the same reason the
/// teacher's storage layer does: human-readable, timezone-correct audit data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProvenanceKind {
    Ingested,
    Derived { rule: RuleId },
    Asserted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub source: ProvenanceKind,
    pub inserted_at: DateTime<Utc>,
}

impl Provenance {
    pub fn ingested() -> Self {
        Provenance {
            source: ProvenanceKind::Ingested,
            inserted_at: Utc::now(),
        }
    }

    pub fn derived(rule: RuleId) -> Self {
        Provenance {
            source: ProvenanceKind::Derived { rule },
            inserted_at: Utc::now(),
        }
    }
}

/// An immutable ground fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,
    pub node: Node,
    pub vector: Vector,
    pub confidence: f32,
    pub provenance: Provenance,
}

/// A tree of `{Atom(N), And, Or, Not}` forming a rule body or a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    Atom(Node),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Variable names appearing anywhere in the condition tree, in
    /// left-to-right order, deduplicated.
    pub fn holes(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_holes(&mut out);
        out
    }

    fn collect_holes(&self, out: &mut Vec<String>) {
        match self {
            Condition::Atom(node) => {
                for h in node.holes() {
                    if !out.contains(&h) {
                        out.push(h);
                    }
                }
            }
            Condition::And(parts) | Condition::Or(parts) => {
                for p in parts {
                    p.collect_holes(out);
                }
            }
            Condition::Not(inner) => inner.collect_holes(out),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub conclusion: Node,
    pub condition: Condition,
}

/// Flags describing how a relation participates in reasoning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationSlot {
    pub name: String,
    pub transitive: bool,
    pub symmetric: bool,
    pub inverse_of: Option<String>,
    pub computable: bool,
}

impl RelationSlot {
    pub fn new(name: impl Into<String>) -> Self {
        RelationSlot {
            name: name.into(),
            transitive: false,
            symmetric: false,
            inverse_of: None,
            computable: false,
        }
    }
}

/// Which positions of a triple are ground, used as the secondary key of the
/// exact-match index alongside the relation name. Two triples with the same
/// relation but different ground/hole shape never need to be compared
/// against each other during a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ArgShape {
    subject_ground: bool,
    object_ground: bool,
}

impl ArgShape {
    fn of(subject: &Node, object: &Node) -> Self {
        ArgShape {
            subject_ground: subject.is_ground(),
            object_ground: object.is_ground(),
        }
    }
}

#[derive(Default)]
struct Indexes {
    /// (relation, shape) -> fact ids whose node matches that shape.
    exact: HashMap<(String, ArgShape), Vec<FactId>>,
    /// relation -> bloom filter over every shape key seen, for a fast
    /// negative before touching `exact`.
    relation_seen: HashMap<String, BloomFilter>,
    /// rule head operator -> rule ids.
    rules_by_head: HashMap<String, Vec<RuleId>>,
}

/// Holds facts/rules/relation-slots and the indexes over them. Vocabulary
/// lives in [`crate::vocabulary::Vocabulary`], owned alongside this by the
/// `Session` (an atom can be referenced by a fact before the fact exists,
/// e.g. during query construction, so the two stores are independent).
pub struct KnowledgeBase {
    facts: RwLock<Vec<Fact>>,
    rules: RwLock<Vec<Rule>>,
    rel_slots: RwLock<HashMap<String, RelationSlot>>,
    /// Published via `ArcSwap` so readers never block on a rebuild and never
    /// observe a partially rebuilt index: a reader takes one lock-free
    /// snapshot of the `Arc` and sees either the old or the new index, never
    /// a mix.
    indexes: ArcSwap<Indexes>,
    dirty: AtomicBool,
    next_fact_id: AtomicU64,
    next_rule_id: AtomicU64,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new()
    }
}

impl KnowledgeBase {
    pub fn new() -> Self {
        KnowledgeBase {
            facts: RwLock::new(Vec::new()),
            rules: RwLock::new(Vec::new()),
            rel_slots: RwLock::new(HashMap::new()),
            indexes: ArcSwap::from_pointee(Indexes::default()),
            dirty: AtomicBool::new(false),
            next_fact_id: AtomicU64::new(0),
            next_rule_id: AtomicU64::new(0),
        }
    }

    pub fn ensure_relation(&self, name: &str) -> RelationSlot {
        let mut slots = self.rel_slots.write();
        slots
            .entry(name.to_string())
            .or_insert_with(|| RelationSlot::new(name))
            .clone()
    }

    pub fn set_relation_slot(&self, slot: RelationSlot) {
        self.rel_slots.write().insert(slot.name.clone(), slot);
    }

    pub fn relation_slot(&self, name: &str) -> Option<RelationSlot> {
        self.rel_slots.read().get(name).cloned()
    }

    pub fn is_transitive(&self, name: &str) -> bool {
        self.rel_slots
            .read()
            .get(name)
            .map(|s| s.transitive)
            .unwrap_or(false)
    }

    /// Encodes and inserts a fully-ground fact, returning its id. Marks the
    /// secondary indexes dirty; they are rebuilt lazily on the next read,
    /// and a read never observes a partially rebuilt index.
    pub fn add_fact(&self, node: Node, vector: Vector, confidence: f32, provenance: Provenance) -> FactId {
        let id = self.next_fact_id.fetch_add(1, Ordering::SeqCst);
        self.facts.write().push(Fact {
            id,
            node,
            vector,
            confidence,
            provenance,
        });
        self.dirty.store(true, Ordering::SeqCst);
        id
    }

    pub fn add_rule(&self, conclusion: Node, condition: Condition) -> RuleId {
        let id = self.next_rule_id.fetch_add(1, Ordering::SeqCst);
        self.rules.write().push(Rule {
            id,
            conclusion,
            condition,
        });
        self.dirty.store(true, Ordering::SeqCst);
        id
    }

    fn rebuild_if_dirty(&self) {
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return;
        }
        let facts = self.facts.read();
        let rules = self.rules.read();
        let mut idx = Indexes::default();
        for fact in facts.iter() {
            if let Node::Triple {
                subject,
                relation,
                object,
            } = &fact.node
            {
                let shape = ArgShape::of(subject, object);
                idx.exact
                    .entry((relation.clone(), shape))
                    .or_default()
                    .push(fact.id);
                idx.relation_seen
                    .entry(relation.clone())
                    .or_insert_with(|| BloomFilter::new(64))
                    .insert(&shape_key(relation, shape));
            }
        }
        for rule in rules.iter() {
            if let Node::Triple { relation, .. } = &rule.conclusion {
                idx.rules_by_head.entry(relation.clone()).or_default().push(rule.id);
            }
        }
        self.indexes.store(Arc::new(idx));
    }

    pub fn facts(&self) -> Vec<Fact> {
        self.facts.read().clone()
    }

    pub fn fact(&self, id: FactId) -> Option<Fact> {
        self.facts.read().iter().find(|f| f.id == id).cloned()
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.rules.read().clone()
    }

    /// Exact metadata match. `subject_pattern`/`object_pattern` may contain
    /// holes, treated as wildcards; ground sub-nodes must match exactly.
    pub fn lookup_exact(&self, relation: &str, subject_pattern: &Node, object_pattern: &Node) -> Vec<Fact> {
        self.rebuild_if_dirty();
        let shape = ArgShape::of(subject_pattern, object_pattern);
        let idx = self.indexes.load();
        if let Some(filter) = idx.relation_seen.get(relation) {
            if !filter.might_contain(&shape_key(relation, shape)) {
                return Vec::new();
            }
        } else {
            return Vec::new();
        }
        let Some(ids) = idx.exact.get(&(relation.to_string(), shape)) else {
            return Vec::new();
        };
        let facts = self.facts.read();
        ids.iter()
            .filter_map(|id| facts.iter().find(|f| f.id == *id))
            .filter(|f| matches_pattern(&f.node, subject_pattern, object_pattern))
            .cloned()
            .collect()
    }

    /// Facts whose stored vector has similarity >= `threshold`, ordered
    /// descending (ties broken by ascending `FactId` for determinism).
    pub fn lookup_similar(&self, query: &Vector, threshold: f32) -> Vec<(Fact, f32)> {
        let facts = self.facts.read();
        let mut scored: Vec<(Fact, f32)> = facts
            .iter()
            .map(|f| (f.clone(), math::similarity(query, &f.vector)))
            .filter(|(_, sim)| *sim >= threshold)
            .collect();
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.id.cmp(&b.0.id))
        });
        scored
    }

    pub fn rules_for_head(&self, operator: &str) -> Vec<Rule> {
        self.rebuild_if_dirty();
        let idx = self.indexes.load();
        let Some(ids) = idx.rules_by_head.get(operator) else {
            return Vec::new();
        };
        let rules = self.rules.read();
        ids.iter()
            .filter_map(|id| rules.iter().find(|r| r.id == *id))
            .cloned()
            .collect()
    }

    /// An atomic, consistent copy of facts/rules/relation-slots for
    /// serialization or for handing to another reasoning call without
    /// holding a lock on `self`.
    pub fn export(&self) -> KbExport {
        KbExport {
            facts: self.facts.read().clone(),
            rules: self.rules.read().clone(),
            rel_slots: self.rel_slots.read().values().cloned().collect(),
            next_fact_id: self.next_fact_id.load(Ordering::SeqCst),
            next_rule_id: self.next_rule_id.load(Ordering::SeqCst),
        }
    }

    pub fn restore(export: KbExport) -> Self {
        let kb = KnowledgeBase::new();
        *kb.facts.write() = export.facts;
        *kb.rules.write() = export.rules;
        let mut slots = kb.rel_slots.write();
        for slot in export.rel_slots {
            slots.insert(slot.name.clone(), slot);
        }
        drop(slots);
        kb.next_fact_id.store(export.next_fact_id, Ordering::SeqCst);
        kb.next_rule_id.store(export.next_rule_id, Ordering::SeqCst);
        kb.dirty.store(true, Ordering::SeqCst);
        kb
    }
}

fn shape_key(relation: &str, shape: ArgShape) -> String {
    format!("{relation}|{}|{}", shape.subject_ground, shape.object_ground)
}

fn matches_pattern(node: &Node, subject_pattern: &Node, object_pattern: &Node) -> bool {
    let Node::Triple { subject, object, .. } = node else {
        return false;
    };
    node_matches(subject, subject_pattern) && node_matches(object, object_pattern)
}

fn node_matches(ground: &Node, pattern: &Node) -> bool {
    match pattern {
        Node::Hole(_) => true,
        _ => ground == pattern,
    }
}

/// A consistent, point-in-time copy of a KB's mutable state. Used for
/// `Session::snapshot`/`restore` (see [`crate::snapshot`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbExport {
    pub facts: Vec<Fact>,
    pub rules: Vec<Rule>,
    pub rel_slots: Vec<RelationSlot>,
    pub next_fact_id: FactId,
    pub next_rule_id: RuleId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{Strategy, VectorSpace};

    fn triple(s: &str, r: &str, o: &str) -> Node {
        Node::triple(Node::Atom(s.into()), r, Node::Atom(o.into()))
    }

    #[test]
    fn exact_lookup_respects_shape_and_ground_values() {
        let kb = KnowledgeBase::new();
        let space = VectorSpace::new(Strategy::SignedByte, 64, 1);
        kb.add_fact(
            triple("Socrates", "isA", "Human"),
            space.zero(),
            1.0,
            Provenance::ingested(),
        );
        kb.add_fact(
            triple("Plato", "isA", "Human"),
            space.zero(),
            1.0,
            Provenance::ingested(),
        );
        let hits = kb.lookup_exact("isA", &Node::Atom("Socrates".into()), &Node::Hole("y".into()));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].node, triple("Socrates", "isA", "Human"));
    }

    #[test]
    fn unknown_relation_returns_empty_without_panicking() {
        let kb = KnowledgeBase::new();
        let hits = kb.lookup_exact("neverSeen", &Node::Hole("x".into()), &Node::Hole("y".into()));
        assert!(hits.is_empty());
    }

    #[test]
    fn export_restore_round_trip_preserves_facts() {
        let kb = KnowledgeBase::new();
        let space = VectorSpace::new(Strategy::SignedByte, 64, 1);
        kb.add_fact(triple("a", "r", "b"), space.zero(), 0.9, Provenance::ingested());
        let exported = kb.export();
        let restored = KnowledgeBase::restore(exported);
        assert_eq!(restored.facts().len(), 1);
        assert_eq!(restored.facts()[0].node, triple("a", "r", "b"));
    }
}
