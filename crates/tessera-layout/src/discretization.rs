//! Group shapes from a discretization or an existing array.

use tessera_core::{ArrayError, Backend, BufferMeta, GroupShape};
use tessera_array::GroupedArray;

/// Per-group sizing reported by a discretization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElementGroupInfo {
    /// Number of elements in the group.
    pub nelements: usize,
    /// Natural number of dofs per element (e.g. nodes of the reference element).
    pub nunit_dofs: usize,
}

/// Source of element-group sizes, in a stable group order.
pub trait Discretization {
    /// One entry per element group.
    fn groups(&self) -> Vec<ElementGroupInfo>;
}

/// Group shapes for `discr`, optionally overriding the per-element dof counts.
///
/// With `ndofs_override = Some(counts)`, group `i` uses `counts[i]` dofs per
/// element (e.g. all ones for one value per element). The override must
/// have one entry per group.
pub fn group_shapes<D: Discretization + ?Sized>(
    discr: &D,
    ndofs_override: Option<&[usize]>,
) -> Result<Vec<GroupShape>, ArrayError> {
    let groups = discr.groups();
    match ndofs_override {
        None => Ok(groups
            .iter()
            .map(|g| GroupShape::new(g.nelements, g.nunit_dofs))
            .collect()),
        Some(counts) => {
            if counts.len() != groups.len() {
                return Err(ArrayError::LengthMismatch {
                    left: groups.len(),
                    right: counts.len(),
                });
            }
            Ok(groups
                .iter()
                .zip(counts)
                .map(|(g, &ndofs)| GroupShape::new(g.nelements, ndofs))
                .collect())
        }
    }
}

/// Group shapes read from the buffers of an existing grouped array.
///
/// Every group buffer must be rank 2.
pub fn group_shapes_of<B: Backend>(array: &GroupedArray<B>) -> Result<Vec<GroupShape>, ArrayError> {
    array
        .iter()
        .enumerate()
        .map(|(i, buffer)| {
            GroupShape::from_dims(buffer.shape()).ok_or_else(|| {
                ArrayError::type_error(format!(
                    "group {i} has shape {:?}, expected (nelements, ndofs_per_element)",
                    buffer.shape()
                ))
            })
        })
        .collect()
}
