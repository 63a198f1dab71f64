//! Lane Scaling Benchmark
//!
//! Compares the three ways of evaluating the same mbcrypt digest: serial on
//! the calling thread, the rayon reference, and a long-lived unit pool.
//! With enough cores the parallel paths stay flat as lanes grow.

#![allow(clippy::pedantic, clippy::nursery)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mbcrypt::{PoolConfig, PoolCoordinator, MAX_POOL_UNITS};
use std::hint::black_box;

const COST: u32 = 6;
const SALT: [u8; 16] = *b"0123456789abcdef";

fn lane_counts() -> Vec<usize> {
    let cores = num_cpus::get().clamp(1, MAX_POOL_UNITS);
    let mut counts = vec![1, 2, 4, cores];
    counts.sort_unstable();
    counts.dedup();
    counts
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_lanes(c: &mut Criterion) {
    let mut group = c.benchmark_group("mbcrypt lanes (cost 6)");
    group.sample_size(10);

    for lanes in lane_counts() {
        // 1. Serial baseline: cost grows linearly with lanes
        group.bench_with_input(BenchmarkId::new("serial", lanes), &lanes, |b, &n| {
            b.iter(|| mbcrypt::hash_with_single_thread(n, black_box(b"pw"), &SALT, COST).unwrap())
        });

        // 2. Rayon reference
        group.bench_with_input(BenchmarkId::new("rayon", lanes), &lanes, |b, &n| {
            b.iter(|| mbcrypt::hash_parallel(n, black_box(b"pw"), &SALT, COST).unwrap())
        });

        // 3. Unit pool, spawned once and reused per iteration
        let mut pool = PoolCoordinator::spawn(&PoolConfig::new(lanes)).unwrap();
        group.bench_with_input(BenchmarkId::new("pool", lanes), &lanes, |b, _| {
            b.iter(|| pool.hash(black_box(b"pw"), &SALT, COST).unwrap())
        });
        pool.shutdown();
    }
    group.finish();
}

criterion_group!(benches, bench_lanes);
criterion_main!(benches);
