//! Per-group offsets into a flat buffer.

use std::ops::Range;

use smallvec::SmallVec;
use tessera_core::{ArrayError, GroupShape};

/// Cumulative entry offsets for a sequence of group shapes.
///
/// `starts[i]` is where group `i` begins in the flat buffer and
/// `starts[n]` is the total size. Derived per flatten/unflatten call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LayoutOffsetTable {
    starts: SmallVec<[usize; 5]>,
}

impl LayoutOffsetTable {
    /// Prefix-sum the entry counts of `shapes`.
    pub fn from_shapes(shapes: &[GroupShape]) -> Result<Self, ArrayError> {
        let mut starts = SmallVec::with_capacity(shapes.len() + 1);
        let mut offset = 0usize;
        starts.push(offset);
        for shape in shapes {
            offset = shape
                .count()
                .and_then(|count| offset.checked_add(count))
                .ok_or(ArrayError::LayoutOverflow)?;
            starts.push(offset);
        }
        Ok(Self { starts })
    }

    /// Start offset of every group, followed by the total.
    pub fn starts(&self) -> &[usize] {
        &self.starts
    }

    /// Entry range of group `i`.
    pub fn range(&self, i: usize) -> Option<Range<usize>> {
        let start = *self.starts.get(i)?;
        let end = *self.starts.get(i + 1)?;
        Some(start..end)
    }

    /// Total entries across all groups.
    pub fn total(&self) -> usize {
        self.starts.last().copied().unwrap_or(0)
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.starts.len() - 1
    }
}
