//! Deterministic pseudo-random byte stream.
//!
//! Every vector/permutation in this crate must be bit-identical across
//! platforms given the same `theory_seed` (Testable Property 3), which rules
//! out the `rand` crate's platform-dependent algorithm choices and any use
//! of `std`'s randomized `HashMap` seed. Instead we hash `(theory_seed, name)`
//! with `std::hash::Hasher` (the same `DefaultHasher` double-hashing idiom
//! used for join-key and Bloom-filter hashing elsewhere in this family of
//! engines) and expand the result with a fixed SplitMix64 stream, which is
//! specified bit-for-bit and has no platform-dependent behavior.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// SplitMix64, as specified by Vigna & Blackman. Deterministic, fast,
/// good enough statistical quality for hypervector generation.
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        SplitMix64 { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform value in `[0, bound)` via Lemire's method, bias-free for our
    /// purposes (bound is always far smaller than 2^64).
    pub fn next_below(&mut self, bound: u32) -> u32 {
        if bound == 0 {
            return 0;
        }
        ((u64::from(self.next_u64() as u32)).wrapping_mul(u64::from(bound)) >> 32) as u32
    }

    /// A signed byte in `[-127, 127]` (127 excluded on the negative side so
    /// `saturating_neg` never has to special-case `i8::MIN`).
    pub fn next_signed_lane(&mut self) -> i8 {
        let raw = (self.next_u64() % 255) as i16 - 127;
        raw as i8
    }

    pub fn next_bit(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }
}

/// Seeds a [`SplitMix64`] stream deterministically from `(theory_seed, name)`.
pub fn seed_stream(theory_seed: u64, name: &str) -> SplitMix64 {
    let mut hasher = DefaultHasher::new();
    theory_seed.hash(&mut hasher);
    name.hash(&mut hasher);
    let h1 = hasher.finish();
    // Second independent hash so the 64-bit seed isn't just one hasher's
    // output verbatim -- mirrors the "two base hashes" double-hashing
    // technique used for Bloom filter index derivation.
    name.hash(&mut hasher);
    theory_seed.hash(&mut hasher);
    let h2 = hasher.finish();
    SplitMix64::new(h1 ^ h2.rotate_left(32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_instances() {
        let mut a = seed_stream(42, "Socrates");
        let mut b = seed_stream(42, "Socrates");
        for _ in 0..32 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn differs_by_name() {
        let mut a = seed_stream(42, "Socrates");
        let mut b = seed_stream(42, "Plato");
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn differs_by_seed() {
        let mut a = seed_stream(1, "Socrates");
        let mut b = seed_stream(2, "Socrates");
        assert_ne!(a.next_u64(), b.next_u64());
    }
}
