//! Turns a parsed assertion/question AST into a single vector.

use crate::permuter::RelationPermuter;
use crate::vector::{math, Vector};
use crate::vocabulary::Vocabulary;
use serde::{Deserialize, Serialize};

/// A reserved relation name recognized by the encoder as a property-value
/// pair: `Triple(Atom(key), DIM_PAIR, Number(value))`. When the supplied
/// [`DimensionRegistry`] maps `key` to a lane index, the encoder writes a
/// clamped value onto that lane in addition to the standard encoding; when
/// it doesn't, the pair is encoded as opaque atoms only.
pub const DIM_PAIR: &str = "DIM_PAIR";

/// `(subject, relation, object)` node, or a hole, or a nested triple. Bounded
/// by the encoder's recursion horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Atom(String),
    Hole(String),
    Number(f64),
    Triple {
        subject: Box<Node>,
        relation: String,
        object: Box<Node>,
    },
}

impl Node {
    pub fn triple(subject: Node, relation: impl Into<String>, object: Node) -> Node {
        Node::Triple {
            subject: Box::new(subject),
            relation: relation.into(),
            object: Box::new(object),
        }
    }

    /// A node is fully ground if it contains no `Hole` at any depth.
    pub fn is_ground(&self) -> bool {
        match self {
            Node::Atom(_) | Node::Number(_) => true,
            Node::Hole(_) => false,
            Node::Triple { subject, object, .. } => subject.is_ground() && object.is_ground(),
        }
    }

    /// Names of every hole appearing in the node, in left-to-right order,
    /// deduplicated on first occurrence.
    pub fn holes(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_holes(&mut out);
        out
    }

    fn collect_holes(&self, out: &mut Vec<String>) {
        match self {
            Node::Hole(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Node::Triple { subject, object, .. } => {
                subject.collect_holes(out);
                object.collect_holes(out);
            }
            Node::Atom(_) | Node::Number(_) => {}
        }
    }
}

/// External collaborator: maps domain property/relation names onto
/// fixed vector lanes. The encoder consults it only for the `DIM_PAIR`
/// pattern; everything else about dimension-catalog semantics is data, not
/// core-engine logic.
pub trait DimensionRegistry: Send + Sync {
    fn axis_for_property(&self, name: &str) -> Option<usize>;
    fn axes_for_relation(&self, name: &str) -> Vec<usize>;
    fn existence_index(&self) -> Option<usize>;
    fn is_isa_variant(&self, relation: &str) -> bool;
}

/// Default registry with no dimension catalog loaded: every lookup misses,
/// so the encoder falls back to opaque-atom encoding. Every session runs
/// standalone without requiring a host-supplied catalog.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDimensionRegistry;

impl DimensionRegistry for NullDimensionRegistry {
    fn axis_for_property(&self, _name: &str) -> Option<usize> {
        None
    }
    fn axes_for_relation(&self, _name: &str) -> Vec<usize> {
        Vec::new()
    }
    fn existence_index(&self) -> Option<usize> {
        None
    }
    fn is_isa_variant(&self, _relation: &str) -> bool {
        false
    }
}

/// Default recursion horizon for composite encoding.
pub const DEFAULT_HORIZON: usize = 3;

/// Stateless (beyond borrowed collaborators) turn-AST-into-vector encoder.
pub struct Encoder<'a> {
    pub vocabulary: &'a Vocabulary,
    pub permuter: &'a RelationPermuter,
    pub dimensions: &'a dyn DimensionRegistry,
    pub horizon: usize,
}

impl<'a> Encoder<'a> {
    pub fn new(
        vocabulary: &'a Vocabulary,
        permuter: &'a RelationPermuter,
        dimensions: &'a dyn DimensionRegistry,
    ) -> Self {
        Encoder {
            vocabulary,
            permuter,
            dimensions,
            horizon: DEFAULT_HORIZON,
        }
    }

    pub fn with_horizon(mut self, horizon: usize) -> Self {
        self.horizon = horizon;
        self
    }

    /// Encoding never fails; missing atoms are created on demand via the
    /// vocabulary, and an over-horizon recursion degrades to the zero
    /// vector rather than erroring.
    pub fn encode(&self, node: &Node, depth: usize) -> Vector {
        if depth > self.horizon {
            return self.vocabulary.space().zero();
        }
        match node {
            Node::Atom(name) => self.vocabulary.intern(name),
            Node::Number(_) => self.vocabulary.space().zero(),
            Node::Hole(_) => self.vocabulary.space().zero(),
            Node::Triple {
                subject,
                relation,
                object,
            } => self.encode_triple(subject, relation, object, depth),
        }
    }

    fn encode_triple(&self, subject: &Node, relation: &str, object: &Node, depth: usize) -> Vector {
        let (table, _newly_registered) = self.permuter.table_for(relation);
        let subject_vec = self.encode(subject, depth + 1);
        let object_vec = self.encode(object, depth + 1);
        let bound_object = math::permute(&object_vec, &table.forward);
        let mut result = math::bundle(&[subject_vec, bound_object], self.stable_tiebreak(relation));

        if relation == DIM_PAIR {
            if let (Node::Atom(key), Node::Number(value)) = (subject, object) {
                if let Some(lane) = self.dimensions.axis_for_property(key) {
                    write_numeric_lane(&mut result, lane, *value);
                }
            }
        }

        result
    }

    /// Deterministic (not time- or thread-based) seed for bundling ties,
    /// derived from the relation name so re-encoding the same triple always
    /// breaks the same ties the same way (Testable Property 3).
    fn stable_tiebreak(&self, relation: &str) -> u64 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        relation.hash(&mut hasher);
        hasher.finish()
    }
}

/// Clamps `value` into the lane's representable range and writes it
/// in-place. Binary-strategy vectors have no numeric lanes to write and are
/// left untouched (the pair still encodes as opaque atoms via `bundle`).
fn write_numeric_lane(v: &mut Vector, lane: usize, value: f64) {
    if let Vector::Signed(lanes) = v {
        if lane < lanes.len() {
            let clamped = value.clamp(f64::from(i8::MIN + 1), f64::from(i8::MAX));
            lanes[lane] = clamped.round() as i8;
        }
    }
}
