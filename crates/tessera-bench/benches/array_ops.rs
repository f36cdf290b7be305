//! Criterion micro-benchmarks for grouped-array arithmetic and traversal.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use tessera_array::{Node, ObjectArray, Registry, Traversal};
use tessera_bench::{build_array, reference_shapes};
use tessera_core::Backend;
use tessera_host::HostBackend;

fn bench_add_in_place(c: &mut Criterion) {
    let be = Arc::new(HostBackend::default());
    let mut x = build_array(&be, &reference_shapes()).unwrap();
    let y = build_array(&be, &reference_shapes()).unwrap();
    c.bench_function("add_in_place_reference", |b| {
        b.iter(|| {
            x.add_in_place(black_box(&y)).unwrap();
        });
    });
}

fn bench_scalar_mul(c: &mut Criterion) {
    let be = Arc::new(HostBackend::default());
    let mut x = build_array(&be, &reference_shapes()).unwrap();
    c.bench_function("mul_scalar_reference", |b| {
        b.iter(|| {
            x.mul_in_place(black_box(1.0000001)).unwrap();
        });
    });
}

fn bench_map_nested(c: &mut Criterion) {
    let be = Arc::new(HostBackend::default());
    let registry = Registry::with_builtins();
    let traversal = Traversal::new(&registry);
    let leaf = |_: usize| Node::Array(build_array(&be, &reference_shapes()).unwrap());
    let node = Node::composite(ObjectArray::new([
        Node::composite(ObjectArray::new((0..3).map(leaf))),
        leaf(3),
    ]));
    c.bench_function("map_copy_nested", |b| {
        b.iter(|| black_box(traversal.map(&node, |buf| Ok(be.copy(buf)?)).unwrap()));
    });
}

criterion_group!(benches, bench_add_in_place, bench_scalar_mul, bench_map_nested);
criterion_main!(benches);
