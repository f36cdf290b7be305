//! Criterion micro-benchmarks for persist/restore and the binary codec.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use tessera_array::GroupedArray;
use tessera_bench::{build_array, reference_shapes};
use tessera_host::HostBackend;
use tessera_persist::codec::{from_bytes, to_bytes};
use tessera_persist::{persist, restore, PersistGuard};

fn bench_persist(c: &mut Criterion) {
    let be = Arc::new(HostBackend::default());
    let x = build_array(&be, &reference_shapes()).unwrap();
    let _guard = PersistGuard::enter(Arc::clone(&be)).unwrap();
    c.bench_function("persist_reference", |b| {
        b.iter(|| black_box(persist(black_box(&x)).unwrap()));
    });
}

fn bench_restore(c: &mut Criterion) {
    let be = Arc::new(HostBackend::default());
    let x = build_array(&be, &reference_shapes()).unwrap();
    let _guard = PersistGuard::enter(Arc::clone(&be)).unwrap();
    let persisted = persist(&x).unwrap();
    c.bench_function("restore_reference", |b| {
        b.iter(|| {
            let back: GroupedArray<HostBackend> = restore(black_box(&persisted)).unwrap();
            black_box(back)
        });
    });
}

fn bench_codec(c: &mut Criterion) {
    let be = Arc::new(HostBackend::default());
    let x = build_array(&be, &reference_shapes()).unwrap();
    let persisted = {
        let _guard = PersistGuard::enter(Arc::clone(&be)).unwrap();
        persist(&x).unwrap()
    };
    let bytes = to_bytes(&persisted).unwrap();

    c.bench_function("codec_encode_reference", |b| {
        b.iter(|| black_box(to_bytes(black_box(&persisted)).unwrap()));
    });
    c.bench_function("codec_decode_reference", |b| {
        b.iter(|| black_box(from_bytes(black_box(&bytes)).unwrap()));
    });
}

criterion_group!(benches, bench_persist, bench_restore, bench_codec);
criterion_main!(benches);
