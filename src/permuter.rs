//! `RelationPermuter`: deterministic, cached, bijective permutation tables
//! keyed by relation name.

use crate::vector::prng::seed_stream;
use parking_lot::RwLock;
use std::collections::HashMap;

/// A permutation over `[0, dimension)`, plus its inverse, cached after first
/// construction.
#[derive(Debug, Clone)]
pub struct PermutationTable {
    pub forward: Vec<u32>,
    pub inverse: Vec<u32>,
}

/// Builds the inverse of a permutation: `inverse[table[i]] == i`.
pub fn invert(table: &[u32]) -> Vec<u32> {
    let mut inverse = vec![0u32; table.len()];
    for (i, &p) in table.iter().enumerate() {
        inverse[p as usize] = i as u32;
    }
    inverse
}

/// Fisher-Yates shuffle of `[0, dimension)` driven by a deterministic stream,
/// so the same `(theory_seed, relation_name)` always yields the same
/// bijection on any platform.
fn generate_permutation(theory_seed: u64, relation: &str, dimension: usize) -> Vec<u32> {
    let mut table: Vec<u32> = (0..dimension as u32).collect();
    let mut stream = seed_stream(theory_seed, relation);
    for i in (1..dimension).rev() {
        let j = stream.next_below((i + 1) as u32) as usize;
        table.swap(i, j);
    }
    table
}

/// Deterministic-from-seed permutation source with on-the-fly registration.
/// An [`crate::audit::AuditSink`] event is recorded when a previously-unseen
/// relation is registered (see [`RelationPermuter::table_for`]'s `newly_registered`
/// return); the permuter itself never panics on an unknown name.
pub struct RelationPermuter {
    theory_seed: u64,
    dimension: usize,
    cache: RwLock<HashMap<String, PermutationTable>>,
}

impl RelationPermuter {
    pub fn new(theory_seed: u64, dimension: usize) -> Self {
        RelationPermuter {
            theory_seed,
            dimension,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cached/registered table for `relation`, and whether this
    /// call registered it for the first time (callers use that to emit an
    /// audit event instead of this module depending on `AuditSink` directly).
    pub fn table_for(&self, relation: &str) -> (PermutationTable, bool) {
        if let Some(table) = self.cache.read().get(relation) {
            return (table.clone(), false);
        }
        let mut cache = self.cache.write();
        // Re-check under the write lock: another caller may have registered
        // it between the read-lock miss and acquiring the write lock.
        if let Some(table) = cache.get(relation) {
            return (table.clone(), false);
        }
        let forward = generate_permutation(self.theory_seed, relation, self.dimension);
        let inverse = invert(&forward);
        let table = PermutationTable { forward, inverse };
        cache.insert(relation.to_string(), table.clone());
        (table, true)
    }

    /// The inverse permutation for `relation`, registering it if needed.
    pub fn inverse_for(&self, relation: &str) -> (Vec<u32>, bool) {
        let (table, newly) = self.table_for(relation);
        (table.inverse, newly)
    }

    pub fn known_relations(&self) -> Vec<String> {
        self.cache.read().keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_bijection() {
        let p = RelationPermuter::new(7, 64);
        let (table, _) = p.table_for("isA");
        let mut seen = vec![false; 64];
        for &x in &table.forward {
            assert!(!seen[x as usize], "not a bijection");
            seen[x as usize] = true;
        }
    }

    #[test]
    fn permute_inverse_round_trip_exact() {
        let p = RelationPermuter::new(7, 64);
        let (table, _) = p.table_for("locatedIn");
        for i in 0..64usize {
            assert_eq!(table.inverse[table.forward[i] as usize], i as u32);
        }
    }

    #[test]
    fn cached_and_deterministic() {
        let p = RelationPermuter::new(7, 32);
        let (a, first) = p.table_for("causes");
        assert!(first);
        let (b, second) = p.table_for("causes");
        assert!(!second);
        assert_eq!(a.forward, b.forward);
    }

    #[test]
    fn different_relations_get_different_tables() {
        let p = RelationPermuter::new(7, 128);
        let (a, _) = p.table_for("before");
        let (b, _) = p.table_for("after");
        assert_ne!(a.forward, b.forward);
    }
}
