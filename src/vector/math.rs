//! Pure vector-algebra primitives: saturated add, binding, bundling,
//! permutation, similarity, and top-k search.
//!
//! Everything here is a pure function. Numeric overflow is absorbed by
//! saturation; dimension mismatch is a programming-error contract violation
//! (an `assert!`, not a `Result`).

use super::Vector;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Lane-wise addition clamped to the lane range.
pub fn add_saturated(a: &Vector, b: &Vector) -> Vector {
    a.assert_compatible(b);
    match (a, b) {
        (Vector::Signed(la), Vector::Signed(lb)) => Vector::Signed(
            la.iter()
                .zip(lb.iter())
                .map(|(&x, &y)| saturating_add_i8(x, y))
                .collect(),
        ),
        (Vector::Binary { bits: ba, dimension }, Vector::Binary { bits: bb, .. }) => {
            // Saturated add on single-bit lanes is OR: 1 + anything stays 1.
            let bits = ba.iter().zip(bb.iter()).map(|(&x, &y)| x | y).collect();
            Vector::Binary {
                bits,
                dimension: *dimension,
            }
        }
        _ => unreachable!("assert_compatible guarantees matching strategies"),
    }
}

fn saturating_add_i8(a: i8, b: i8) -> i8 {
    let sum = i16::from(a) + i16::from(b);
    sum.clamp(i16::from(i8::MIN + 1), i16::from(i8::MAX)) as i8
}

fn saturating_neg_i8(a: i8) -> i8 {
    // Lanes live in [-127, 127] (see `prng::next_signed_lane`), so negation
    // never needs to special-case `i8::MIN`.
    -a
}

/// Involutive binding: `bind(bind(a, b), b) == a` up to noise.
///
/// Binary strategy uses XOR (exactly involutive). Signed-byte strategy
/// flips the sign of each lane of `a` according to the sign of the
/// corresponding lane of `b`, which is also exactly involutive: applying
/// the same sign flip twice is the identity.
pub fn bind(a: &Vector, b: &Vector) -> Vector {
    a.assert_compatible(b);
    match (a, b) {
        (Vector::Signed(la), Vector::Signed(lb)) => Vector::Signed(
            la.iter()
                .zip(lb.iter())
                .map(|(&x, &y)| if y >= 0 { x } else { saturating_neg_i8(x) })
                .collect(),
        ),
        (Vector::Binary { bits: ba, dimension }, Vector::Binary { bits: bb, .. }) => {
            let bits = ba.iter().zip(bb.iter()).map(|(&x, &y)| x ^ y).collect();
            Vector::Binary {
                bits,
                dimension: *dimension,
            }
        }
        _ => unreachable!(),
    }
}

/// Commutative, associative-up-to-saturation superposition of several
/// vectors. `tiebreak_seed` deterministically breaks majority ties in the
/// binary strategy (even vote counts) so bundling never leaks nondeterminism.
pub fn bundle(vs: &[Vector], tiebreak_seed: u64) -> Vector {
    assert!(!vs.is_empty(), "bundle requires at least one vector");
    match &vs[0] {
        Vector::Signed(_) => {
            let dim = vs[0].dimension();
            let mut acc = vec![0i32; dim];
            for v in vs {
                if let Vector::Signed(lanes) = v {
                    for (a, &l) in acc.iter_mut().zip(lanes.iter()) {
                        *a += i32::from(l);
                    }
                }
            }
            let lanes = acc
                .into_iter()
                .map(|x| x.clamp(i32::from(i8::MIN + 1), i32::from(i8::MAX)) as i8)
                .collect();
            Vector::Signed(lanes)
        }
        Vector::Binary { dimension, .. } => {
            let dim = *dimension;
            let n = vs.len();
            let mut counts = vec![0u32; dim];
            for v in vs {
                if let Vector::Binary { bits, .. } = v {
                    for i in 0..dim {
                        if Vector::get_bit(bits, i) {
                            counts[i] += 1;
                        }
                    }
                }
            }
            let words = dim.div_ceil(64);
            let mut bits = vec![0u64; words];
            let half = n as u32;
            for (i, &c) in counts.iter().enumerate() {
                let bit = if c * 2 > half {
                    true
                } else if c * 2 < half {
                    false
                } else {
                    // Exact tie: deterministic pseudo-random break keyed on
                    // (tiebreak_seed, lane index), never on iteration order.
                    let mut stream = super::prng::SplitMix64::new(tiebreak_seed ^ (i as u64));
                    stream.next_bit()
                };
                Vector::set_bit(&mut bits, i, bit);
            }
            Vector::Binary { bits, dimension: dim }
        }
    }
}

/// Lane `i` of the output is lane `permutation[i]` of the input.
pub fn permute(v: &Vector, permutation: &[u32]) -> Vector {
    assert_eq!(
        v.dimension(),
        permutation.len(),
        "contract violation: permutation length mismatch"
    );
    match v {
        Vector::Signed(lanes) => {
            Vector::Signed(permutation.iter().map(|&p| lanes[p as usize]).collect())
        }
        Vector::Binary { bits, dimension } => {
            let words = dimension.div_ceil(64);
            let mut out = vec![0u64; words];
            for (i, &p) in permutation.iter().enumerate() {
                if Vector::get_bit(bits, p as usize) {
                    Vector::set_bit(&mut out, i, true);
                }
            }
            Vector::Binary {
                bits: out,
                dimension: *dimension,
            }
        }
    }
}

/// Signed: cosine similarity in `[-1, 1]`. Binary: normalized Hamming
/// similarity in `[0, 1]` (`1 - hamming_distance / dimension`). Symmetric,
/// and exactly `1.0` for equal vectors.
pub fn similarity(a: &Vector, b: &Vector) -> f32 {
    a.assert_compatible(b);
    match (a, b) {
        (Vector::Signed(la), Vector::Signed(lb)) => {
            let mut dot = 0f64;
            let mut na = 0f64;
            let mut nb = 0f64;
            for (&x, &y) in la.iter().zip(lb.iter()) {
                let (xf, yf) = (f64::from(x), f64::from(y));
                dot += xf * yf;
                na += xf * xf;
                nb += yf * yf;
            }
            if na == 0.0 || nb == 0.0 {
                return if na == nb { 1.0 } else { 0.0 };
            }
            (dot / (na.sqrt() * nb.sqrt())) as f32
        }
        (Vector::Binary { bits: ba, dimension }, Vector::Binary { bits: bb, .. }) => {
            let dist = hamming_distance(ba, bb);
            1.0 - (dist as f32 / *dimension as f32)
        }
        _ => unreachable!(),
    }
}

fn hamming_distance(a: &[u64], b: &[u64]) -> u32 {
    a.iter().zip(b.iter()).map(|(&x, &y)| (x ^ y).count_ones()).sum()
}

/// L1 distance restricted to the lanes where `mask` is `true`. Used by the
/// encoder to validate a numeric-lane write before it commits (signed-byte
/// strategy only; the call is a contract violation on binary vectors).
pub fn masked_l1_distance(a: &Vector, b: &Vector, mask: &[bool]) -> i64 {
    a.assert_compatible(b);
    match (a, b) {
        (Vector::Signed(la), Vector::Signed(lb)) => la
            .iter()
            .zip(lb.iter())
            .zip(mask.iter())
            .filter(|(_, &m)| m)
            .map(|((&x, &y), _)| (i64::from(x) - i64::from(y)).abs())
            .sum(),
        _ => panic!("contract violation: masked_l1_distance requires signed-byte vectors"),
    }
}

/// One entry of a [`top_k_similar`] result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub name: String,
    pub similarity: f32,
}

/// Stable top-k search with a deterministic lexicographic tiebreak on atom
/// name. The scan is rayon-parallel (order-independent), then sorted back
/// into a fixed order so parallelism never leaks nondeterminism.
pub fn top_k_similar(query: &Vector, vocabulary: &[(String, Vector)], k: usize) -> Vec<Ranked> {
    let mut scored: Vec<Ranked> = vocabulary
        .par_iter()
        .map(|(name, v)| Ranked {
            name: name.clone(),
            similarity: similarity(query, v),
        })
        .collect();
    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    scored.truncate(k);
    scored
}
