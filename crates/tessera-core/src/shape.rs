//! Buffer shapes and per-group layout shapes.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Dimensions of a buffer, row-major.
///
/// Uses `SmallVec<[usize; 2]>` since group buffers are two-dimensional
/// and flat buffers one-dimensional; neither touches the heap.
pub type Shape = SmallVec<[usize; 2]>;

/// Logical shape of one group: `(nelements, ndofs_per_element)`.
///
/// A group buffer with this shape holds `nelements * ndofs_per_element`
/// entries, element-major and dof-minor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupShape {
    /// Number of elements in the group.
    pub nelements: usize,
    /// Degrees of freedom attached to each element.
    pub ndofs_per_element: usize,
}

impl GroupShape {
    /// Create a group shape.
    pub fn new(nelements: usize, ndofs_per_element: usize) -> Self {
        Self {
            nelements,
            ndofs_per_element,
        }
    }

    /// Number of entries, or `None` on overflow.
    pub fn count(&self) -> Option<usize> {
        self.nelements.checked_mul(self.ndofs_per_element)
    }

    /// Interpret a rank-2 buffer shape as a group shape.
    ///
    /// Returns `None` for any other rank.
    pub fn from_dims(dims: &[usize]) -> Option<Self> {
        match *dims {
            [nelements, ndofs_per_element] => Some(Self::new(nelements, ndofs_per_element)),
            _ => None,
        }
    }

    /// The buffer dimensions for this group.
    pub fn dims(&self) -> Shape {
        smallvec::smallvec![self.nelements, self.ndofs_per_element]
    }
}

impl From<(usize, usize)> for GroupShape {
    fn from((nelements, ndofs_per_element): (usize, usize)) -> Self {
        Self::new(nelements, ndofs_per_element)
    }
}

impl fmt::Display for GroupShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.nelements, self.ndofs_per_element)
    }
}
