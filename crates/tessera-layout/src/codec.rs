//! Flatten and unflatten.

use std::sync::Arc;

use tessera_array::{GroupedArray, Node, Traversal};
use tessera_core::{ArrayError, Backend, BufferMeta, GroupShape};

use crate::discretization::group_shapes_of;
use crate::offsets::LayoutOffsetTable;

/// Replace every grouped array in `node` with one flat buffer.
///
/// Leaf buffers already in the structure pass through unchanged.
pub fn flatten<B: Backend>(traversal: &Traversal<'_, B>, node: &Node<B>) -> Result<Node<B>, ArrayError> {
    traversal.map_arrays(node, |array| flatten_array(array).map(Node::Leaf))
}

/// Gather all groups of `array` into a single one-dimensional buffer.
///
/// Group `i` lands at `[offset_i + iel * ndofs_i + idof]`. Every group
/// buffer must be rank 2 and the array must be attached to a backend.
pub fn flatten_array<B: Backend>(array: &GroupedArray<B>) -> Result<B::Buffer, ArrayError> {
    let backend = array
        .backend()
        .ok_or(ArrayError::Detached { operation: "flatten" })?;
    let dtype = array
        .entry_dtype()
        .ok_or_else(|| ArrayError::type_error("cannot flatten a grouped array with no groups"))?;
    let shapes = group_shapes_of(array)?;
    let table = LayoutOffsetTable::from_shapes(&shapes)?;

    let flat = backend.allocate(&[table.total()], dtype)?;
    for (group, (buffer, &start)) in array.iter().zip(table.starts()).enumerate() {
        // Row-major (nelements, ndofs) is already element-major, dof-minor.
        backend.copy_range(buffer, 0, &flat, start, buffer.size())?;
        tracing::trace!(group, start, count = buffer.size(), "gather group");
    }
    tracing::debug!(
        backend = backend.name(),
        groups = array.len(),
        total = table.total(),
        "flattened grouped array"
    );
    Ok(flat)
}

/// Replace every flat buffer in `node` with a grouped array of `shapes`.
///
/// Meeting a grouped array where a flat buffer is expected is an error.
pub fn unflatten<B: Backend>(
    traversal: &Traversal<'_, B>,
    backend: Arc<B>,
    shapes: &[GroupShape],
    node: &Node<B>,
) -> Result<Node<B>, ArrayError> {
    traversal.map_with(
        node,
        |_| {
            Err(ArrayError::type_error(
                "unflatten expects flat buffers, found GroupedArray",
            ))
        },
        |flat| unflatten_buffer(Arc::clone(&backend), shapes, flat).map(Node::Array),
    )
}

/// Scatter a flat buffer into fresh per-group buffers of `shapes`.
pub fn unflatten_buffer<B: Backend>(
    backend: Arc<B>,
    shapes: &[GroupShape],
    flat: &B::Buffer,
) -> Result<GroupedArray<B>, ArrayError> {
    let table = LayoutOffsetTable::from_shapes(shapes)?;
    if flat.size() != table.total() {
        return Err(ArrayError::SizeMismatch {
            actual: flat.size(),
            expected: table.total(),
        });
    }

    let mut groups = Vec::with_capacity(shapes.len());
    for (shape, &start) in shapes.iter().zip(table.starts()) {
        let buffer = backend.allocate(&shape.dims(), flat.dtype())?;
        let count = buffer.size();
        backend.copy_range(flat, start, &buffer, 0, count)?;
        groups.push(buffer);
    }
    tracing::debug!(
        backend = backend.name(),
        groups = shapes.len(),
        total = table.total(),
        "unflattened buffer"
    );
    GroupedArray::attached(backend, groups)
}
