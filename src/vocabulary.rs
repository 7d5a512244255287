//! Vocabulary / AtomStore: interns atom names to deterministic vectors.

use crate::vector::{Vector, VectorSpace};
use parking_lot::RwLock;
use std::collections::HashMap;

/// A named symbol with its associated vector.
#[derive(Debug, Clone)]
pub struct Atom {
    pub name: String,
    pub vec: Vector,
}

/// Reserved names for logical operators, interned eagerly so they get
/// distinguished vectors before any user atom can collide with them.
pub const OP_AND: &str = "__AND__";
pub const OP_OR: &str = "__OR__";
pub const OP_NOT: &str = "__NOT__";
pub const OP_IMPLIES: &str = "__IMPLIES__";

const RESERVED: [&str; 4] = [OP_AND, OP_OR, OP_NOT, OP_IMPLIES];

/// Interns atom names to vectors, deterministic from `(name, theory_seed)`.
/// Append-only: atoms are created on first reference and never removed
/// within a session's lifetime.
#[derive(Debug)]
pub struct Vocabulary {
    space: VectorSpace,
    atoms: RwLock<HashMap<String, Vector>>,
    /// Insertion order, needed for deterministic iteration when building a
    /// snapshot or scanning the whole vocabulary for `top_k_similar`.
    order: RwLock<Vec<String>>,
}

impl Vocabulary {
    pub fn new(space: VectorSpace) -> Self {
        let vocab = Vocabulary {
            space,
            atoms: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
        };
        for name in RESERVED {
            vocab.intern(name);
        }
        vocab
    }

    /// Returns the vector for `name`, creating and interning it if this is
    /// the first time it has been seen.
    pub fn intern(&self, name: &str) -> Vector {
        if let Some(v) = self.atoms.read().get(name) {
            return v.clone();
        }
        let mut atoms = self.atoms.write();
        if let Some(v) = atoms.get(name) {
            return v.clone();
        }
        let v = self.space.from_name(name);
        atoms.insert(name.to_string(), v.clone());
        self.order.write().push(name.to_string());
        v
    }

    pub fn get(&self, name: &str) -> Option<Vector> {
        self.atoms.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.atoms.read().contains_key(name)
    }

    /// All interned atoms in insertion order, for `top_k_similar` scans and
    /// for serializing a snapshot.
    pub fn all(&self) -> Vec<(String, Vector)> {
        let order = self.order.read();
        let atoms = self.atoms.read();
        order
            .iter()
            .map(|name| (name.clone(), atoms[name].clone()))
            .collect()
    }

    pub fn space(&self) -> &VectorSpace {
        &self.space
    }

    pub fn len(&self) -> usize {
        self.atoms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rebuilds a vocabulary from a snapshot's recorded atoms, preserving
    /// insertion order exactly as captured (see [`crate::snapshot`]) rather
    /// than re-deriving vectors from `space`, so a restored session is
    /// byte-identical to the one that was saved even if `from_name`'s
    /// algorithm ever changes in a later version.
    pub fn restore(space: VectorSpace, atoms: Vec<(String, Vector)>) -> Self {
        let vocab = Vocabulary {
            space,
            atoms: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
        };
        for (name, vector) in atoms {
            vocab.atoms.write().insert(name.clone(), vector);
            vocab.order.write().push(name);
        }
        vocab
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Strategy;

    #[test]
    fn intern_is_idempotent_and_deterministic() {
        let vocab = Vocabulary::new(VectorSpace::new(Strategy::SignedByte, 64, 1));
        let a = vocab.intern("Socrates");
        let b = vocab.intern("Socrates");
        assert_eq!(a, b);
    }

    #[test]
    fn reserved_operators_preinterned() {
        let vocab = Vocabulary::new(VectorSpace::new(Strategy::SignedByte, 64, 1));
        assert!(vocab.contains(OP_AND));
        assert!(vocab.contains(OP_OR));
        assert!(vocab.contains(OP_NOT));
        assert!(vocab.contains(OP_IMPLIES));
    }

    #[test]
    fn unknown_atoms_created_on_demand() {
        let vocab = Vocabulary::new(VectorSpace::new(Strategy::SignedByte, 64, 1));
        assert!(!vocab.contains("Plato"));
        vocab.intern("Plato");
        assert!(vocab.contains("Plato"));
    }
}
