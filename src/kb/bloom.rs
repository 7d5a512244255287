//! Small Bloom filter for fast negative membership tests.
//!
//! Used ahead of the per-relation exact-match index so a `lookup_exact` on
//! an operator the KB has genuinely never seen short-circuits without a
//! `HashMap` probe. No false negatives; possible false positives, which is
//! fine here since a positive only buys a full index lookup, never a wrong
//! answer.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    num_bits: usize,
    num_hashes: u32,
}

impl BloomFilter {
    /// Sized for `expected_items` at roughly 1% false-positive rate.
    pub fn new(expected_items: usize) -> Self {
        let expected_items = expected_items.max(1);
        let num_bits = optimal_bits(expected_items, 0.01);
        let num_hashes = optimal_hashes(num_bits, expected_items);
        BloomFilter {
            bits: vec![0u64; num_bits.div_ceil(64)],
            num_bits,
            num_hashes,
        }
    }

    fn hashes(&self, value: &str) -> (u64, u64) {
        let mut h1 = DefaultHasher::new();
        value.hash(&mut h1);
        let a = h1.finish();
        let mut h2 = DefaultHasher::new();
        a.hash(&mut h2);
        value.hash(&mut h2);
        let b = h2.finish();
        (a, b)
    }

    pub fn insert(&mut self, value: &str) {
        let (a, b) = self.hashes(value);
        for i in 0..self.num_hashes as u64 {
            let idx = (a.wrapping_add(i.wrapping_mul(b)) as usize) % self.num_bits;
            self.bits[idx / 64] |= 1u64 << (idx % 64);
        }
    }

    pub fn might_contain(&self, value: &str) -> bool {
        let (a, b) = self.hashes(value);
        (0..self.num_hashes as u64).all(|i| {
            let idx = (a.wrapping_add(i.wrapping_mul(b)) as usize) % self.num_bits;
            self.bits[idx / 64] & (1u64 << (idx % 64)) != 0
        })
    }
}

fn optimal_bits(n: usize, fp_rate: f64) -> usize {
    let n = n as f64;
    let m = -(n * fp_rate.ln()) / (std::f64::consts::LN_2.powi(2));
    (m.ceil() as usize).max(64)
}

fn optimal_hashes(num_bits: usize, n: usize) -> u32 {
    let k = (num_bits as f64 / n as f64) * std::f64::consts::LN_2;
    (k.round() as u32).clamp(1, 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_false_negatives() {
        let mut filter = BloomFilter::new(1000);
        for i in 0..500 {
            filter.insert(&format!("rel_{i}"));
        }
        for i in 0..500 {
            assert!(filter.might_contain(&format!("rel_{i}")));
        }
    }

    #[test]
    fn absent_relation_usually_negative() {
        let mut filter = BloomFilter::new(1000);
        filter.insert("isA");
        assert!(!filter.might_contain("totallyDifferentRelationName"));
    }
}
