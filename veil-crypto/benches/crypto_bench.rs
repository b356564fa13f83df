//! Criterion benchmarks for Veil crypto: keygen, derivation, recovery, address.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use veil_crypto::{
    derive_stealth_public, ledger_address, meta_private_from_seed, public_from_scalar,
    random_scalar, recover_stealth_private, scalar_from_bytes_strict,
};

fn bench_keygen(c: &mut Criterion) {
    let mut g = c.benchmark_group("keygen");
    g.throughput(Throughput::Elements(1));
    g.bench_function("meta_private_from_seed", |b| {
        b.iter(|| black_box(meta_private_from_seed(b"bench-seed")).unwrap());
    });
    g.finish();
}

fn bench_derive(c: &mut Criterion) {
    let private = meta_private_from_seed(b"bench-owner").unwrap();
    let scalar = scalar_from_bytes_strict(private.as_array()).unwrap();
    let public = public_from_scalar(&scalar).unwrap();
    let ephemeral = random_scalar();

    let mut g = c.benchmark_group("derive");
    g.throughput(Throughput::Elements(1));
    g.bench_function("derive_stealth_public", |b| {
        b.iter(|| black_box(derive_stealth_public(&public, &ephemeral)).unwrap());
    });
    g.finish();
}

fn bench_recover(c: &mut Criterion) {
    let private = meta_private_from_seed(b"bench-owner").unwrap();
    let scalar = scalar_from_bytes_strict(private.as_array()).unwrap();
    let public = public_from_scalar(&scalar).unwrap();
    let derived = derive_stealth_public(&public, &random_scalar()).unwrap();

    let mut g = c.benchmark_group("recover");
    g.throughput(Throughput::Elements(1));
    g.bench_function("recover_stealth_private", |b| {
        b.iter(|| black_box(recover_stealth_private(&private, &derived.ephemeral_pub)).unwrap());
    });
    g.finish();
}

fn bench_ledger_address(c: &mut Criterion) {
    let public = public_from_scalar(&random_scalar()).unwrap();

    let mut g = c.benchmark_group("address");
    g.throughput(Throughput::Elements(1));
    g.bench_function("ledger_address", |b| {
        b.iter(|| black_box(ledger_address(&public)));
    });
    g.finish();
}

criterion_group!(
    benches,
    bench_keygen,
    bench_derive,
    bench_recover,
    bench_ledger_address
);
criterion_main!(benches);
