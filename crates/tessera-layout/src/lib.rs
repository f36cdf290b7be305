//! Bijective layout codec between grouped arrays and flat buffers.
//!
//! [`flatten`] turns every grouped array in a structure into one
//! contiguous buffer; [`unflatten`] inverts it given the per-group shapes.
//! Ordering in the flat buffer is group-slowest, then element, then
//! intra-element dof:
//!
//! ```text
//! group 0: (3 elements × 2 dofs)   group 1: (2 elements × 3 dofs)
//! ┌──────────────────────────┬───────────────────────────┐
//! │ e0d0 e0d1 e1d0 … e2d1    │ e0d0 e0d1 e0d2 … e1d2     │
//! └──────────────────────────┴───────────────────────────┘
//! offset 0                   offset 6                    12
//! ```
//!
//! Offsets come from a [`LayoutOffsetTable`] derived per call. Group
//! shapes come from a [`Discretization`] or from an existing array.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod discretization;
pub mod offsets;

pub use codec::{flatten, flatten_array, unflatten, unflatten_buffer};
pub use discretization::{group_shapes, group_shapes_of, Discretization, ElementGroupInfo};
pub use offsets::LayoutOffsetTable;
