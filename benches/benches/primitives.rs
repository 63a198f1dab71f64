//! Primitive Benchmarks
//!
//! SHA-256 throughput against the RustCrypto `sha2` crate, HMAC latency and
//! the exponential cost curve of a single bcrypt.

#![allow(clippy::pedantic, clippy::nursery)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use sha2::Digest as _;
use std::hint::black_box;

const KB: usize = 1024;

// =============================================================================
// BENCHMARK 1: SHA-256
// =============================================================================

/// Streaming engine vs `sha2` on the same inputs.
fn bench_sha256(c: &mut Criterion) {
    let mut group = c.benchmark_group("1-SHA256");

    let sizes = [(64, "64B"), (KB, "1KB"), (64 * KB, "64KB"), (KB * KB, "1MB")];

    for (size, name) in sizes {
        let mut input = vec![0u8; size];
        rand::rng().fill(&mut input[..]);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("mbcrypt", name), &input, |b, data| {
            b.iter(|| mbcrypt::sha256(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("sha2", name), &input, |b, data| {
            b.iter(|| sha2::Sha256::digest(black_box(data)))
        });
    }
    group.finish();
}

// =============================================================================
// BENCHMARK 2: HMAC
// =============================================================================

/// One DRBG-sized HMAC: 32-byte key, 4-byte message.
fn bench_hmac(c: &mut Criterion) {
    let mut group = c.benchmark_group("2-HMAC");
    let key = [0x42u8; 32];

    group.bench_function("hmac_sha256 (4B)", |b| {
        b.iter(|| mbcrypt::hmac_sha256(black_box(&key), black_box(&[0, 0, 0, 1])))
    });

    let mut src = mbcrypt::HmacCounterByteSource::new(&key, u32::MAX);
    group.throughput(Throughput::Bytes(32));
    group.bench_function("drbg block (32B)", |b| {
        b.iter(|| {
            for _ in 0..32 {
                black_box(mbcrypt::ByteSource::next_byte(&mut src).unwrap());
            }
        })
    });
    group.finish();
}

// =============================================================================
// BENCHMARK 3: BCRYPT COST CURVE
// =============================================================================

/// Every cost step doubles the key-expansion rounds.
fn bench_bcrypt(c: &mut Criterion) {
    let mut group = c.benchmark_group("3-Bcrypt");
    group.sample_size(10);

    let salt = *b"0123456789abcdef";
    for cost in 4..=8 {
        group.bench_with_input(BenchmarkId::from_parameter(cost), &cost, |b, &cost| {
            b.iter(|| mbcrypt::raw_bcrypt(black_box(b"password"), &salt, cost, None).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sha256, bench_hmac, bench_bcrypt);
criterion_main!(benches);
