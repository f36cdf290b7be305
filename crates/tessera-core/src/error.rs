//! Error types for Tessera.
//!
//! [`ArrayError`] is the contract-violation taxonomy surfaced by the
//! container, traversal, layout, and persistence layers. [`BackendError`]
//! covers failures raised inside a backend while executing an operation.
//! All errors are fail-fast; nothing in the workspace retries.

use thiserror::Error;

use crate::dtype::DType;
use crate::op::BinaryOp;

/// Contract violations detected by the grouped-array layers.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ArrayError {
    /// Invalid buffers or backend at construction, or a value of the
    /// wrong kind where a specific one was required.
    #[error("type error: {reason}")]
    TypeError {
        /// Description of the mismatch.
        reason: String,
    },

    /// Two grouped arrays with differing group counts were combined.
    #[error("grouped arrays must have the same length: {left} != {right}")]
    LengthMismatch {
        /// Group count of the left-hand operand.
        left: usize,
        /// Group count of the right-hand operand.
        right: usize,
    },

    /// Zipped traversal over structurally incompatible containers.
    #[error("structure mismatch at depth {depth}: {reason}")]
    StructureMismatch {
        /// Nesting level at which the mismatch was found (0 = top).
        depth: usize,
        /// Description of the mismatch.
        reason: String,
    },

    /// A flat buffer does not hold the number of entries the group shapes require.
    #[error("array has size {actual}, expected {expected}")]
    SizeMismatch {
        /// Entries in the flat buffer.
        actual: usize,
        /// Sum of the per-group entry counts.
        expected: usize,
    },

    /// A recompose call did not receive every index in `0..len`.
    #[error("entries do not contain all indices: index {index} of {len} is missing")]
    MissingIndex {
        /// The first unfilled slot.
        index: usize,
        /// Number of slots expected.
        len: usize,
    },

    /// An ndarray-like operation was attempted on an array with no backend.
    #[error("{operation} requires an attached backend")]
    Detached {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// In-place arithmetic with an operand of an unsupported kind.
    #[error("operation not supported for operand of type {type_name}")]
    UnsupportedType {
        /// Name of the offending operand type.
        type_name: String,
    },

    /// A persistence context was entered while another is active on this thread.
    #[error("persistence context already active on this thread (backend '{active}')")]
    NestedContext {
        /// Name of the backend bound by the active context.
        active: String,
    },

    /// Persist or restore was attempted with no active context.
    #[error("{operation} requires an active persistence context")]
    NoActiveContext {
        /// `"persist"` or `"restore"`.
        operation: &'static str,
    },

    /// The active persistence context is bound to a different backend type.
    #[error("active persistence context uses backend type {active}, requested {requested}")]
    ContextBackendMismatch {
        /// Type name of the bound backend.
        active: &'static str,
        /// Type name the caller asked for.
        requested: &'static str,
    },

    /// A container type was registered twice.
    #[error("container type '{name}' is already registered")]
    DuplicateRegistration {
        /// Name of the container type.
        name: &'static str,
    },

    /// A composite of an unregistered container type was traversed.
    #[error("container type '{name}' is not registered")]
    UnregisteredContainer {
        /// Name of the container type.
        name: &'static str,
    },

    /// Group offsets overflow `usize`.
    #[error("layout size overflows usize")]
    LayoutOverflow,

    /// The backend failed while executing an operation.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),
}

impl ArrayError {
    /// Shorthand for [`ArrayError::TypeError`].
    pub fn type_error(reason: impl Into<String>) -> Self {
        Self::TypeError {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`ArrayError::StructureMismatch`].
    pub fn structure(depth: usize, reason: impl Into<String>) -> Self {
        Self::StructureMismatch {
            depth,
            reason: reason.into(),
        }
    }
}

/// Failures raised by a backend while executing an operation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The operator is not defined for the buffer's dtype.
    #[error("operator {op} not supported for dtype {dtype}")]
    UnsupportedOperation {
        /// The operator.
        op: BinaryOp,
        /// Dtype of the target buffer.
        dtype: DType,
    },

    /// A scalar or buffer operand cannot be applied without narrowing.
    #[error("operand of dtype {operand} cannot be applied to buffer of dtype {target}")]
    IncompatibleOperand {
        /// Dtype (or scalar kind) of the operand.
        operand: String,
        /// Dtype of the target buffer.
        target: DType,
    },

    /// Two buffers combined elementwise have different shapes.
    #[error("shape mismatch: {left:?} vs {right:?}")]
    ShapeMismatch {
        /// Shape of the target buffer.
        left: Vec<usize>,
        /// Shape of the operand buffer.
        right: Vec<usize>,
    },

    /// A copy range falls outside a buffer.
    #[error("range {offset}..{offset}+{count} out of bounds for buffer of size {size}")]
    OutOfBounds {
        /// Start of the range.
        offset: usize,
        /// Number of entries.
        count: usize,
        /// Size of the buffer.
        size: usize,
    },

    /// Source and destination of a copy have different dtypes.
    #[error("dtype mismatch: {expected} vs {actual}")]
    DtypeMismatch {
        /// Dtype of the destination.
        expected: DType,
        /// Dtype of the source.
        actual: DType,
    },

    /// Integer division or modulo by zero.
    #[error("integer division by zero")]
    DivisionByZero,

    /// An allocation exceeds the backend's configured limit.
    #[error("allocation of {requested} elements exceeds limit of {limit}")]
    AllocationTooLarge {
        /// Elements requested.
        requested: usize,
        /// Configured maximum.
        limit: usize,
    },

    /// A host value does not describe a well-formed array.
    #[error("malformed host array: {reason}")]
    MalformedHostArray {
        /// Description of the problem.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_mismatch_names_both_lengths() {
        let msg = ArrayError::LengthMismatch { left: 2, right: 3 }.to_string();
        assert!(msg.contains('2') && msg.contains('3'), "{msg}");
    }

    #[test]
    fn size_mismatch_reports_actual_and_expected() {
        let msg = ArrayError::SizeMismatch {
            actual: 10,
            expected: 12,
        }
        .to_string();
        assert_eq!(msg, "array has size 10, expected 12");
    }

    #[test]
    fn backend_error_converts() {
        let err: ArrayError = BackendError::DivisionByZero.into();
        assert!(matches!(err, ArrayError::Backend(BackendError::DivisionByZero)));
        assert_eq!(err.to_string(), "backend error: integer division by zero");
    }
}
