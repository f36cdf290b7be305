//! Criterion micro-benchmarks for flatten/unflatten.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use tessera_bench::{build_array, reference_shapes, stress_shapes};
use tessera_host::HostBackend;
use tessera_layout::{flatten_array, unflatten_buffer};

fn bench_flatten_reference(c: &mut Criterion) {
    let be = Arc::new(HostBackend::default());
    let x = build_array(&be, &reference_shapes()).unwrap();
    c.bench_function("flatten_reference", |b| {
        b.iter(|| black_box(flatten_array(black_box(&x)).unwrap()));
    });
}

fn bench_unflatten_reference(c: &mut Criterion) {
    let be = Arc::new(HostBackend::default());
    let shapes = reference_shapes();
    let flat = flatten_array(&build_array(&be, &shapes).unwrap()).unwrap();
    c.bench_function("unflatten_reference", |b| {
        b.iter(|| black_box(unflatten_buffer(Arc::clone(&be), &shapes, black_box(&flat)).unwrap()));
    });
}

fn bench_round_trip_stress(c: &mut Criterion) {
    let be = Arc::new(HostBackend::default());
    let shapes = stress_shapes();
    let x = build_array(&be, &shapes).unwrap();
    c.bench_function("flatten_unflatten_stress", |b| {
        b.iter(|| {
            let flat = flatten_array(&x).unwrap();
            black_box(unflatten_buffer(Arc::clone(&be), &shapes, &flat).unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_flatten_reference,
    bench_unflatten_reference,
    bench_round_trip_stress
);
criterion_main!(benches);
