//! Vector-algebra and session-level benchmarks: raw bind/bundle/permute/
//! similarity throughput, plus end-to-end fact ingest and proof through a
//! `Session`.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;
use sys2_core::encoder::Node;
use sys2_core::kb::Condition;
use sys2_core::session::{Session, SessionConfig};
use sys2_core::vector::math::{bind, bundle, permute, similarity, top_k_similar};
use sys2_core::vector::{Strategy, VectorSpace};

fn triple(s: &str, r: &str, o: &str) -> Node {
    Node::triple(Node::Atom(s.into()), r, Node::Atom(o.into()))
}

fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind");
    for &dim in &[256usize, 1024, 4096] {
        let space = VectorSpace::new(Strategy::SignedByte, dim, 1);
        let a = space.from_name("a");
        let b = space.from_name("b");
        group.bench_with_input(BenchmarkId::new("signed", dim), &dim, |bencher, _| {
            bencher.iter(|| bind(&a, &b));
        });

        let space = VectorSpace::new(Strategy::BinaryDense, dim, 1);
        let a = space.from_name("a");
        let b = space.from_name("b");
        group.bench_with_input(BenchmarkId::new("binary", dim), &dim, |bencher, _| {
            bencher.iter(|| bind(&a, &b));
        });
    }
    group.finish();
}

fn bench_bundle(c: &mut Criterion) {
    let mut group = c.benchmark_group("bundle");
    for &count in &[2usize, 8, 32] {
        let space = VectorSpace::new(Strategy::SignedByte, 1024, 1);
        let vectors: Vec<_> = (0..count).map(|i| space.from_name(&format!("v{i}"))).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bencher, _| {
            bencher.iter(|| bundle(&vectors, 7));
        });
    }
    group.finish();
}

fn bench_permute(c: &mut Criterion) {
    let space = VectorSpace::new(Strategy::SignedByte, 2048, 1);
    let v = space.from_name("x");
    let permutation: Vec<u32> = (0..2048u32).rev().collect();
    c.bench_function("permute_signed_2048", |b| {
        b.iter(|| permute(&v, &permutation));
    });
}

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");
    for &dim in &[256usize, 1024, 4096] {
        let space = VectorSpace::new(Strategy::SignedByte, dim, 1);
        let a = space.from_name("a");
        let b = space.from_name("b");
        group.bench_with_input(BenchmarkId::new("signed", dim), &dim, |bencher, _| {
            bencher.iter(|| similarity(&a, &b));
        });
    }
    group.finish();
}

fn bench_top_k_similar(c: &mut Criterion) {
    let mut group = c.benchmark_group("top_k_similar");
    for &vocab_size in &[100usize, 1_000, 10_000] {
        let space = VectorSpace::new(Strategy::SignedByte, 512, 1);
        let vocabulary: Vec<(String, _)> = (0..vocab_size)
            .map(|i| (format!("atom{i}"), space.from_name(&format!("atom{i}"))))
            .collect();
        let query = space.from_name("atom0");
        group.bench_with_input(BenchmarkId::from_parameter(vocab_size), &vocab_size, |bencher, _| {
            bencher.iter(|| top_k_similar(&query, &vocabulary, 5));
        });
    }
    group.finish();
}

fn bench_fact_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_ingest");
    for &count in &[100u64, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |bencher, &n| {
            bencher.iter(|| {
                let mut session = Session::new(SessionConfig {
                    dimension: 512,
                    ..SessionConfig::default()
                });
                for i in 0..n {
                    session
                        .add_fact(triple(&format!("s{i}"), "rel", &format!("o{i}")), 1.0)
                        .unwrap();
                }
                session
            });
        });
    }
    group.finish();
}

fn bench_rule_chain_proof(c: &mut Criterion) {
    let mut session = Session::new(SessionConfig {
        dimension: 512,
        ..SessionConfig::default()
    });
    session.add_fact(triple("Socrates", "isA", "Human"), 1.0).unwrap();
    session
        .add_rule(
            triple("Socrates", "isMortal", "True"),
            Condition::Atom(triple("Socrates", "isA", "Human")),
        )
        .unwrap();
    c.bench_function("rule_chain_proof", |b| {
        b.iter(|| session.prove(&triple("Socrates", "isMortal", "True")));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .warm_up_time(Duration::from_secs(3));
    targets = bench_bind, bench_bundle, bench_permute, bench_similarity,
        bench_top_k_similar, bench_fact_ingest, bench_rule_chain_proof
}
criterion_main!(benches);
