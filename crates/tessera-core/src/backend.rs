//! The backend capability contract.
//!
//! A [`Backend`] owns the actual storage and compute. The grouped-array
//! layers never touch element data directly: they allocate, copy ranges,
//! apply operators, and transfer to and from the host exclusively through
//! this trait. Backends are shared by reference (`Arc<B>`) across many
//! arrays; their lifetime is managed by the caller.
//!
//! # Implementing a backend
//!
//! ```ignore
//! impl Backend for MyBackend {
//!     type Buffer = MyBuffer;
//!     fn name(&self) -> &str { "my-backend" }
//!     fn allocate(&self, shape: &[usize], dtype: DType) -> Result<MyBuffer, BackendError> { .. }
//!     // ...
//! }
//! ```

use std::fmt;

use crate::dtype::{DType, Scalar};
use crate::error::BackendError;
use crate::host::HostArray;
use crate::op::BinaryOp;

/// Metadata every buffer exposes without forcing materialization.
pub trait BufferMeta {
    /// Element type.
    fn dtype(&self) -> DType;

    /// Dimensions, row-major.
    fn shape(&self) -> &[usize];

    /// Number of elements.
    fn size(&self) -> usize {
        self.shape().iter().product()
    }

    /// Number of dimensions.
    fn rank(&self) -> usize {
        self.shape().len()
    }
}

/// Right-hand side of an in-place buffer operation.
#[derive(Clone, Copy, Debug)]
pub enum BufferOperand<'a, T> {
    /// Another buffer of identical shape.
    Buffer(&'a T),
    /// A scalar applied to every element.
    Scalar(Scalar),
}

/// Compute and storage capability consumed by the grouped-array layers.
///
/// All operations are synchronous from the caller's point of view. Shape
/// and dtype are available through [`BufferMeta`]; data-dependent
/// operations may force materialization inside the backend.
pub trait Backend: Send + Sync + fmt::Debug + 'static {
    /// The backend's buffer handle.
    ///
    /// Cloning a handle must not copy data: clones refer to the same
    /// storage, and in-place mutation through one is visible through all.
    type Buffer: BufferMeta + Clone + fmt::Debug + Send + Sync + 'static;

    /// Human-readable name, used in diagnostics.
    fn name(&self) -> &str;

    /// Allocate a zero-initialized buffer.
    fn allocate(&self, shape: &[usize], dtype: DType) -> Result<Self::Buffer, BackendError>;

    /// Transfer a buffer out to host memory.
    fn to_host(&self, buffer: &Self::Buffer) -> Result<HostArray, BackendError>;

    /// Transfer a host value into a new buffer on this backend.
    fn from_host(&self, host: &HostArray) -> Result<Self::Buffer, BackendError>;

    /// Detach a buffer into backend-independent form.
    ///
    /// Defaults to a host transfer. Backends with a cheaper canonical form
    /// (e.g. device memory without a queue) override this.
    fn freeze(&self, buffer: &Self::Buffer) -> Result<HostArray, BackendError> {
        self.to_host(buffer)
    }

    /// Attach a canonical value to this backend.
    fn thaw(&self, frozen: &HostArray) -> Result<Self::Buffer, BackendError> {
        self.from_host(frozen)
    }

    /// Apply `op` elementwise to `target` in place. No broadcasting.
    fn apply(
        &self,
        op: BinaryOp,
        target: &Self::Buffer,
        operand: BufferOperand<'_, Self::Buffer>,
    ) -> Result<(), BackendError>;

    /// Copy `count` elements from `src[src_offset..]` to `dst[dst_offset..]`,
    /// using row-major linear offsets on both sides.
    fn copy_range(
        &self,
        src: &Self::Buffer,
        src_offset: usize,
        dst: &Self::Buffer,
        dst_offset: usize,
        count: usize,
    ) -> Result<(), BackendError>;

    /// Deep copy into fresh storage.
    fn copy(&self, buffer: &Self::Buffer) -> Result<Self::Buffer, BackendError>;

    /// Set every element to `value`.
    fn fill(&self, buffer: &Self::Buffer, value: Scalar) -> Result<(), BackendError>;

    /// Complex conjugate (a copy for real dtypes).
    fn conj(&self, buffer: &Self::Buffer) -> Result<Self::Buffer, BackendError>;

    /// Real part.
    fn real(&self, buffer: &Self::Buffer) -> Result<Self::Buffer, BackendError>;

    /// Imaginary part (zeros for real dtypes).
    fn imag(&self, buffer: &Self::Buffer) -> Result<Self::Buffer, BackendError>;
}
