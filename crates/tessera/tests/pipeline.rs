//! Whole-pipeline checks through the facade: traverse, flatten, unflatten,
//! persist, encode, restore.

use std::sync::Arc;

use tessera::persist::codec;
use tessera::prelude::*;
use tessera_test_utils::{group_values, iota_groups, registry, shapes_of, FieldPair, MockDiscretization};

const SHAPES: [(usize, usize); 2] = [(3, 2), (2, 3)];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("tessera=trace"))
        .with_test_writer()
        .try_init();
}

#[test]
fn flatten_unflatten_through_composite() {
    init_tracing();
    let reg = registry();
    let traversal = Traversal::new(&reg);
    let be = Arc::new(HostBackend::default());

    let left = iota_groups(&be, &SHAPES);
    let mut right = left.copy().unwrap();
    right.mul_in_place(-1.0).unwrap();
    let pair = Node::composite(FieldPair::new(left.clone(), right.clone()));

    let flat = flatten(&traversal, &pair).unwrap();
    let flat_pair = flat.downcast_ref::<FieldPair<HostBackend>>().unwrap();
    let flat_left = flat_pair.left.as_leaf().unwrap();
    assert_eq!(flat_left.shape(), &[12]);
    assert_eq!(flat_left.to_f64_vec(), Some((0..12u32).map(f64::from).collect()));

    let shapes = group_shapes(&MockDiscretization::new(&SHAPES), None).unwrap();
    assert_eq!(shapes, shapes_of(&SHAPES));
    let back = unflatten(&traversal, be, &shapes, &flat).unwrap();
    let back = back.downcast_ref::<FieldPair<HostBackend>>().unwrap();
    assert_eq!(group_values(back.left.as_array().unwrap()), group_values(&left));
    assert_eq!(group_values(back.right.as_array().unwrap()), group_values(&right));
}

#[test]
fn persisted_bytes_restore_on_another_backend() {
    init_tracing();
    let source = Arc::new(HostBackend::named("source").unwrap());
    let target = Arc::new(HostBackend::named("target").unwrap());
    let array = iota_groups(&source, &SHAPES);

    let bytes = with_persist_context(source, |_| {
        let persisted = persist(&array).unwrap();
        codec::to_bytes(&persisted).unwrap()
    })
    .unwrap();

    let restored: GroupedArray<HostBackend> = with_persist_context(target.clone(), |_| {
        restore(&codec::from_bytes(&bytes).unwrap()).unwrap()
    })
    .unwrap();

    assert!(Arc::ptr_eq(restored.backend().unwrap(), &target));
    assert_eq!(group_values(&restored), group_values(&array));
    assert_eq!(group_shapes_of(&restored).unwrap(), shapes_of(&SHAPES));
}

#[test]
fn multimap_combines_matching_structures() {
    init_tracing();
    let reg = registry();
    let traversal = Traversal::new(&reg);
    let be = Arc::new(HostBackend::default());

    let a = Node::composite(FieldPair::new(
        iota_groups(&be, &SHAPES),
        iota_groups(&be, &[(1, 1)]),
    ));
    let b = Node::composite(FieldPair::new(
        iota_groups(&be, &SHAPES),
        iota_groups(&be, &[(1, 1)]),
    ));

    let sum = traversal
        .multimap(&[&a, &b], |bufs| {
            let out = be.copy(bufs[0])?;
            be.apply(BinaryOp::Add, &out, tessera::types::BufferOperand::Buffer(bufs[1]))?;
            Ok(out)
        })
        .unwrap();
    let sum = sum.downcast_ref::<FieldPair<HostBackend>>().unwrap();
    assert_eq!(
        group_values(sum.left.as_array().unwrap())[1],
        vec![12.0, 14.0, 16.0, 18.0, 20.0, 22.0]
    );
}
