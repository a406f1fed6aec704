//! # Bit Vector Benchmark
//!
//! Free-run search across run lengths that exercise each scan granularity.
//!
//! Run with: `cargo bench --package oroboros_storage --bench bitvec_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use oroboros_storage::bits::BitOps;
use oroboros_storage::{Arena, BitOp, BitVec, ScratchArena, ScratchBits};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const WORDS: usize = 1024;

/// Dense pattern: roughly 3 of every 4 bits set.
fn dense_pattern() -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    (0..WORDS).map(|_| rng.gen::<u64>() | rng.gen::<u64>()).collect()
}

/// Benchmark: `find` for short and long runs.
fn bench_find(c: &mut Criterion) {
    let words = dense_pattern();
    let mut group = c.benchmark_group("bitvec_find");

    for n in [1usize, 3, 7, 14, 30, 62, 64, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(words.find(black_box(0), n)));
        });
    }

    group.finish();
}

/// Benchmark: set algebra between arena vectors.
fn bench_algebra(c: &mut Criterion) {
    let mut arena = Arena::default();
    let a = BitVec::new(&mut arena, WORDS * 64);
    let b = BitVec::new(&mut arena, WORDS * 64);
    b.words_mut(&mut arena).copy_from_slice(&dense_pattern());

    c.bench_function("bitvec_union_intersect_64K_bits", |bench| {
        bench.iter(|| {
            a.combine(&mut arena, &b, BitOp::Union);
            a.combine(&mut arena, &b, BitOp::Intersect);
            black_box(a.words(&arena).count_ones())
        });
    });
}

/// Benchmark: scratch acquire/release cycle.
fn bench_scratch(c: &mut Criterion) {
    let scratch = ScratchArena::new(16);
    c.bench_function("scratch_bits_acquire_release", |b| {
        b.iter(|| {
            let mut bits = ScratchBits::new(&scratch, WORDS * 64);
            bits.set(black_box(100), true);
            let found = bits.find(0, 64);
            bits.release();
            black_box(found)
        });
    });
}

criterion_group!(benches, bench_find, bench_algebra, bench_scratch);
criterion_main!(benches);
