//! Benchmark profiles for the Tessera grouped-array toolkit.
//!
//! - [`reference_shapes`]: 4 groups, ~40K entries (mixed element types)
//! - [`stress_shapes`]: 16 groups, ~1M entries
//! - [`build_array`]: deterministic host-backed array for a profile

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use tessera_array::GroupedArray;
use tessera_core::{ArrayError, GroupShape, HostData};
use tessera_host::{HostBackend, HostBuffer};

/// Four groups resembling a mixed triangle/quad mesh at P2/P3.
pub fn reference_shapes() -> Vec<GroupShape> {
    vec![
        GroupShape::new(4000, 6),
        GroupShape::new(1000, 10),
        GroupShape::new(1500, 9),
        GroupShape::new(500, 16),
    ]
}

/// Sixteen groups, ~1M entries total.
pub fn stress_shapes() -> Vec<GroupShape> {
    (0..16)
        .map(|i| GroupShape::new(6000 + 250 * i, 10))
        .collect()
}

/// An `f64` grouped array on `backend` with deterministic contents.
pub fn build_array(
    backend: &Arc<HostBackend>,
    shapes: &[GroupShape],
) -> Result<GroupedArray<HostBackend>, ArrayError> {
    let buffers = shapes
        .iter()
        .enumerate()
        .map(|(g, shape)| {
            let count = shape.nelements * shape.ndofs_per_element;
            let values = (0..count).map(|i| (g * 31 + i) as f64 * 0.5).collect();
            HostBuffer::new(shape.dims(), HostData::F64(values))
        })
        .collect::<Result<Vec<_>, _>>()?;
    GroupedArray::attached(Arc::clone(backend), buffers)
}
