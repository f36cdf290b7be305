//! Host-backed fixtures and proptest strategies.

use std::sync::Arc;

use proptest::prelude::*;
use tessera_array::GroupedArray;
use tessera_core::GroupShape;
use tessera_host::{HostBackend, HostBuffer};

/// A fresh default host backend.
pub fn host() -> Arc<HostBackend> {
    Arc::new(HostBackend::default())
}

/// Grouped `f64` array with rank-2 groups of `shapes`, holding
/// `0, 1, 2, ...` in construction order across all groups.
pub fn iota_groups(backend: &Arc<HostBackend>, shapes: &[(usize, usize)]) -> GroupedArray<HostBackend> {
    let mut start = 0usize;
    let buffers: Vec<HostBuffer> = shapes
        .iter()
        .map(|&(nelements, ndofs)| {
            let count = nelements * ndofs;
            let values = (start..start + count).map(|v| v as f64).collect();
            start += count;
            HostBuffer::from_f64(&[nelements, ndofs], values).unwrap()
        })
        .collect();
    GroupedArray::attached(backend.clone(), buffers).unwrap()
}

/// Grouped `f64` array with one rank-1 group per slice.
pub fn f64_groups(backend: &Arc<HostBackend>, groups: &[&[f64]]) -> GroupedArray<HostBackend> {
    let buffers: Vec<HostBuffer> = groups
        .iter()
        .map(|g| HostBuffer::from_f64(&[g.len()], g.to_vec()).unwrap())
        .collect();
    GroupedArray::attached(backend.clone(), buffers).unwrap()
}

/// Contents of every group widened to `f64`.
pub fn group_values(array: &GroupedArray<HostBackend>) -> Vec<Vec<f64>> {
    array.iter().map(|b| b.to_f64_vec().unwrap()).collect()
}

/// Group shapes for the `GroupShape` API.
pub fn shapes_of(shapes: &[(usize, usize)]) -> Vec<GroupShape> {
    shapes.iter().copied().map(GroupShape::from).collect()
}

/// Up to five groups of up to 6 elements × 4 dofs.
pub fn arb_group_shapes() -> impl Strategy<Value = Vec<(usize, usize)>> {
    prop::collection::vec((0usize..6, 1usize..4), 1..5)
}

/// Arbitrary shapes paired with matching `f64` contents per group.
pub fn arb_grouped_f64() -> impl Strategy<Value = Vec<((usize, usize), Vec<f64>)>> {
    arb_group_shapes().prop_flat_map(|shapes| {
        shapes
            .into_iter()
            .map(|(ne, nd)| {
                prop::collection::vec(-1.0e6f64..1.0e6, ne * nd).prop_map(move |v| ((ne, nd), v))
            })
            .collect::<Vec<_>>()
    })
}

/// Build an attached grouped array from [`arb_grouped_f64`] output.
pub fn grouped_from(
    backend: &Arc<HostBackend>,
    groups: &[((usize, usize), Vec<f64>)],
) -> GroupedArray<HostBackend> {
    let buffers: Vec<HostBuffer> = groups
        .iter()
        .map(|((ne, nd), v)| HostBuffer::from_f64(&[*ne, *nd], v.clone()).unwrap())
        .collect();
    GroupedArray::attached(backend.clone(), buffers).unwrap()
}
