//! Property-based checks of the core vector algebra (Testable Properties 1
//! and 3): binding is involutive, similarity is symmetric and bounded, and
//! `VectorSpace::from_name` is a pure function of `(theory_seed, name)`.

use proptest::prelude::*;
use sys2_core::vector::math::{bind, similarity};
use sys2_core::vector::{Strategy, VectorSpace};

fn arb_name() -> impl proptest::strategy::Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9]{0,12}"
}

proptest! {
    #[test]
    fn bind_is_involutive_signed(seed in 0u64..10_000, a in arb_name(), b in arb_name()) {
        let space = VectorSpace::new(Strategy::SignedByte, 128, seed);
        let va = space.from_name(&a);
        let vb = space.from_name(&b);
        let bound = bind(&va, &vb);
        let back = bind(&bound, &vb);
        prop_assert!(similarity(&back, &va) > 0.99);
    }

    #[test]
    fn bind_is_involutive_binary(seed in 0u64..10_000, a in arb_name(), b in arb_name()) {
        let space = VectorSpace::new(Strategy::BinaryDense, 256, seed);
        let va = space.from_name(&a);
        let vb = space.from_name(&b);
        let bound = bind(&va, &vb);
        let back = bind(&bound, &vb);
        prop_assert_eq!(back, va);
    }

    #[test]
    fn similarity_is_symmetric(seed in 0u64..10_000, a in arb_name(), b in arb_name()) {
        let space = VectorSpace::new(Strategy::SignedByte, 128, seed);
        let va = space.from_name(&a);
        let vb = space.from_name(&b);
        prop_assert!((similarity(&va, &vb) - similarity(&vb, &va)).abs() < 1e-5);
    }

    #[test]
    fn signed_similarity_is_bounded(seed in 0u64..10_000, a in arb_name(), b in arb_name()) {
        let space = VectorSpace::new(Strategy::SignedByte, 128, seed);
        let sim = similarity(&space.from_name(&a), &space.from_name(&b));
        prop_assert!((-1.0..=1.0).contains(&sim));
    }

    #[test]
    fn binary_similarity_is_bounded(seed in 0u64..10_000, a in arb_name(), b in arb_name()) {
        let space = VectorSpace::new(Strategy::BinaryDense, 256, seed);
        let sim = similarity(&space.from_name(&a), &space.from_name(&b));
        prop_assert!((0.0..=1.0).contains(&sim));
    }

    #[test]
    fn from_name_is_deterministic_across_spaces(seed in 0u64..10_000, name in arb_name()) {
        let first = VectorSpace::new(Strategy::SignedByte, 64, seed);
        let second = VectorSpace::new(Strategy::SignedByte, 64, seed);
        prop_assert_eq!(first.from_name(&name), second.from_name(&name));
    }
}
