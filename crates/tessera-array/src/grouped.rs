//! [`GroupedArray`]: one backend buffer per element group.
//!
//! A grouped array is an object-array-like container: the top level is a
//! fixed-length sequence of buffers, each holding the degrees of freedom
//! of one element group. Buffers are opaque handles; all data access goes
//! through the array's [`Backend`].
//!
//! Ndarray-like operations (size, copy, fill, in-place arithmetic) require
//! an attached backend and fail with [`ArrayError::Detached`] otherwise.
//! Group count, indexing and iteration are always available.

use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use smallvec::SmallVec;
use tessera_core::{ArrayError, Backend, BinaryOp, BufferMeta, BufferOperand, DType, Scalar};

use crate::node::Node;

/// Inline capacity for group buffers; most meshes have few groups.
type GroupBuffers<B> = SmallVec<[<B as Backend>::Buffer; 4]>;

/// A fixed-length sequence of backend buffers, one per element group.
///
/// Cloning a grouped array clones the buffer handles, not the data:
/// the clone aliases the original's storage.
pub struct GroupedArray<B: Backend> {
    backend: Option<Arc<B>>,
    data: GroupBuffers<B>,
}

/// Right-hand side of in-place grouped-array arithmetic.
pub enum Operand<'a, B: Backend> {
    /// Another grouped array of equal length, applied group-wise.
    Array(&'a GroupedArray<B>),
    /// A scalar broadcast over every group.
    Scalar(Scalar),
    /// A traversal node; only [`Node::Array`] is accepted.
    Node(&'a Node<B>),
}

impl<B: Backend> GroupedArray<B> {
    /// Build a grouped array, checking that every buffer has the same dtype.
    pub fn new(
        backend: Option<Arc<B>>,
        buffers: impl IntoIterator<Item = B::Buffer>,
    ) -> Result<Self, ArrayError> {
        let data: GroupBuffers<B> = buffers.into_iter().collect();
        if let Some(first) = data.first() {
            let dtype = first.dtype();
            if let Some((i, odd)) = data.iter().enumerate().find(|(_, b)| b.dtype() != dtype) {
                return Err(ArrayError::type_error(format!(
                    "grouped arrays must have a uniform dtype: group 0 is {dtype}, group {i} is {}",
                    odd.dtype()
                )));
            }
        }
        Ok(Self { backend, data })
    }

    /// Build a grouped array attached to `backend`.
    pub fn attached(
        backend: Arc<B>,
        buffers: impl IntoIterator<Item = B::Buffer>,
    ) -> Result<Self, ArrayError> {
        Self::new(Some(backend), buffers)
    }

    /// Build a grouped array with no backend.
    pub fn detached(buffers: impl IntoIterator<Item = B::Buffer>) -> Result<Self, ArrayError> {
        Self::new(None, buffers)
    }

    /// The attached backend, if any.
    pub fn backend(&self) -> Option<&Arc<B>> {
        self.backend.as_ref()
    }

    /// Whether a backend is attached.
    pub fn is_attached(&self) -> bool {
        self.backend.is_some()
    }

    /// Shared dtype of all groups; `None` when there are no groups.
    pub fn entry_dtype(&self) -> Option<DType> {
        self.data.first().map(BufferMeta::dtype)
    }

    /// Number of groups.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether there are no groups.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Buffer of group `i`.
    pub fn get(&self, i: usize) -> Option<&B::Buffer> {
        self.data.get(i)
    }

    /// Iterate over group buffers in order.
    pub fn iter(&self) -> std::slice::Iter<'_, B::Buffer> {
        self.data.iter()
    }

    /// All group buffers.
    pub fn buffers(&self) -> &[B::Buffer] {
        &self.data
    }

    /// The same buffers attached to `backend`.
    pub fn with_backend(&self, backend: Arc<B>) -> Self {
        Self {
            backend: Some(backend),
            data: self.data.clone(),
        }
    }

    /// The same buffers with no backend.
    pub fn detach(&self) -> Self {
        Self {
            backend: None,
            data: self.data.clone(),
        }
    }

    fn require_backend(&self, operation: &'static str) -> Result<&Arc<B>, ArrayError> {
        self.backend
            .as_ref()
            .ok_or(ArrayError::Detached { operation })
    }

    /// A new array on the same backend, built from per-group results.
    fn with_data(&self, data: Vec<B::Buffer>) -> Result<Self, ArrayError> {
        Self::new(self.backend.clone(), data)
    }

    // ── ndarray-like surface ──────────────────────────────────────

    /// One-dimensional shape: `[len]`.
    pub fn shape(&self) -> Result<[usize; 1], ArrayError> {
        self.require_backend("shape")?;
        Ok([self.len()])
    }

    /// Number of groups, matching [`shape`](Self::shape).
    pub fn size(&self) -> Result<usize, ArrayError> {
        self.require_backend("size")?;
        Ok(self.len())
    }

    /// Deep copy of every group into fresh storage.
    pub fn copy(&self) -> Result<Self, ArrayError> {
        let backend = self.require_backend("copy")?;
        let data = self
            .data
            .iter()
            .map(|b| backend.copy(b))
            .collect::<Result<Vec<_>, _>>()?;
        self.with_data(data)
    }

    /// Set every entry of every group to `value`.
    pub fn fill(&self, value: impl Into<Scalar>) -> Result<(), ArrayError> {
        let backend = self.require_backend("fill")?;
        let value = value.into();
        for b in &self.data {
            backend.fill(b, value)?;
        }
        Ok(())
    }

    /// Complex conjugate, group-wise.
    pub fn conj(&self) -> Result<Self, ArrayError> {
        let backend = self.require_backend("conj")?;
        let data = self
            .data
            .iter()
            .map(|b| backend.conj(b))
            .collect::<Result<Vec<_>, _>>()?;
        self.with_data(data)
    }

    /// Alias of [`conj`](Self::conj).
    pub fn conjugate(&self) -> Result<Self, ArrayError> {
        self.conj()
    }

    /// Real part, group-wise.
    pub fn real(&self) -> Result<Self, ArrayError> {
        let backend = self.require_backend("real")?;
        let data = self
            .data
            .iter()
            .map(|b| backend.real(b))
            .collect::<Result<Vec<_>, _>>()?;
        self.with_data(data)
    }

    /// Imaginary part, group-wise.
    pub fn imag(&self) -> Result<Self, ArrayError> {
        let backend = self.require_backend("imag")?;
        let data = self
            .data
            .iter()
            .map(|b| backend.imag(b))
            .collect::<Result<Vec<_>, _>>()?;
        self.with_data(data)
    }

    // ── in-place arithmetic ───────────────────────────────────────

    /// Apply `op` in place against `rhs`.
    ///
    /// A grouped array operand is applied group by group and must have the
    /// same length. A scalar is broadcast to every group. A [`Node`] is
    /// accepted only when it wraps a grouped array.
    ///
    /// Mutation happens through the buffer handles, so every alias of
    /// these buffers observes the result.
    pub fn apply_in_place<'a>(
        &mut self,
        op: BinaryOp,
        rhs: impl Into<Operand<'a, B>>,
    ) -> Result<&mut Self, ArrayError>
    where
        B: 'a,
    {
        match rhs.into() {
            Operand::Array(other) | Operand::Node(Node::Array(other)) => {
                if self.len() != other.len() {
                    return Err(ArrayError::LengthMismatch {
                        left: self.len(),
                        right: other.len(),
                    });
                }
                let backend = self.require_backend(op.symbol())?;
                for (target, source) in self.data.iter().zip(other.iter()) {
                    backend.apply(op, target, BufferOperand::Buffer(source))?;
                }
            }
            Operand::Scalar(value) => {
                let backend = self.require_backend(op.symbol())?;
                for target in &self.data {
                    backend.apply(op, target, BufferOperand::Scalar(value))?;
                }
            }
            Operand::Node(other) => {
                return Err(ArrayError::UnsupportedType {
                    type_name: other.type_name().to_string(),
                })
            }
        }
        Ok(self)
    }

    /// `self += rhs`.
    pub fn add_in_place<'a>(&mut self, rhs: impl Into<Operand<'a, B>>) -> Result<&mut Self, ArrayError>
    where
        B: 'a,
    {
        self.apply_in_place(BinaryOp::Add, rhs)
    }

    /// `self -= rhs`.
    pub fn sub_in_place<'a>(&mut self, rhs: impl Into<Operand<'a, B>>) -> Result<&mut Self, ArrayError>
    where
        B: 'a,
    {
        self.apply_in_place(BinaryOp::Sub, rhs)
    }

    /// `self *= rhs`.
    pub fn mul_in_place<'a>(&mut self, rhs: impl Into<Operand<'a, B>>) -> Result<&mut Self, ArrayError>
    where
        B: 'a,
    {
        self.apply_in_place(BinaryOp::Mul, rhs)
    }

    /// `self /= rhs`.
    pub fn div_in_place<'a>(&mut self, rhs: impl Into<Operand<'a, B>>) -> Result<&mut Self, ArrayError>
    where
        B: 'a,
    {
        self.apply_in_place(BinaryOp::Div, rhs)
    }

    /// `self %= rhs`.
    pub fn rem_in_place<'a>(&mut self, rhs: impl Into<Operand<'a, B>>) -> Result<&mut Self, ArrayError>
    where
        B: 'a,
    {
        self.apply_in_place(BinaryOp::Rem, rhs)
    }

    /// `self &= rhs`.
    pub fn bitand_in_place<'a>(
        &mut self,
        rhs: impl Into<Operand<'a, B>>,
    ) -> Result<&mut Self, ArrayError>
    where
        B: 'a,
    {
        self.apply_in_place(BinaryOp::BitAnd, rhs)
    }

    /// `self ^= rhs`.
    pub fn bitxor_in_place<'a>(
        &mut self,
        rhs: impl Into<Operand<'a, B>>,
    ) -> Result<&mut Self, ArrayError>
    where
        B: 'a,
    {
        self.apply_in_place(BinaryOp::BitXor, rhs)
    }

    /// `self |= rhs`.
    pub fn bitor_in_place<'a>(
        &mut self,
        rhs: impl Into<Operand<'a, B>>,
    ) -> Result<&mut Self, ArrayError>
    where
        B: 'a,
    {
        self.apply_in_place(BinaryOp::BitOr, rhs)
    }
}

impl<B: Backend> Clone for GroupedArray<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            data: self.data.clone(),
        }
    }
}

impl<B: Backend> Index<usize> for GroupedArray<B> {
    type Output = B::Buffer;

    fn index(&self, i: usize) -> &B::Buffer {
        &self.data[i]
    }
}

impl<'a, B: Backend> IntoIterator for &'a GroupedArray<B> {
    type Item = &'a B::Buffer;
    type IntoIter = std::slice::Iter<'a, B::Buffer>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl<B: Backend> fmt::Debug for GroupedArray<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupedArray")
            .field("backend", &self.backend.as_ref().map(|b| b.name()))
            .field("data", &self.data.as_slice())
            .finish()
    }
}

/// Renders as `GroupedArray(<g0>, <g1>, ...)`.
impl<B: Backend> fmt::Display for GroupedArray<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GroupedArray(")?;
        for (i, b) in self.data.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{b:?}")?;
        }
        f.write_str(")")
    }
}

impl<'a, B: Backend> From<&'a GroupedArray<B>> for Operand<'a, B> {
    fn from(array: &'a GroupedArray<B>) -> Self {
        Operand::Array(array)
    }
}

impl<'a, B: Backend> From<&'a Node<B>> for Operand<'a, B> {
    fn from(node: &'a Node<B>) -> Self {
        Operand::Node(node)
    }
}

impl<B: Backend> From<Scalar> for Operand<'_, B> {
    fn from(value: Scalar) -> Self {
        Operand::Scalar(value)
    }
}

impl<B: Backend> From<f64> for Operand<'_, B> {
    fn from(value: f64) -> Self {
        Operand::Scalar(Scalar::Float(value))
    }
}

impl<B: Backend> From<i64> for Operand<'_, B> {
    fn from(value: i64) -> Self {
        Operand::Scalar(Scalar::Int(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::BackendError;
    use tessera_host::{HostBackend, HostBuffer};

    fn backend() -> Arc<HostBackend> {
        Arc::new(HostBackend::default())
    }

    fn f64_groups(be: &Arc<HostBackend>, groups: &[&[f64]]) -> GroupedArray<HostBackend> {
        let bufs = groups
            .iter()
            .map(|g| HostBuffer::from_f64(&[g.len()], g.to_vec()).unwrap());
        GroupedArray::attached(be.clone(), bufs).unwrap()
    }

    #[test]
    fn mixed_dtypes_rejected() {
        let a = HostBuffer::from_f64(&[1], vec![1.0]).unwrap();
        let b = HostBuffer::from_i64(&[1], vec![1]).unwrap();
        let err = GroupedArray::<HostBackend>::detached([a, b]).unwrap_err();
        assert!(matches!(err, ArrayError::TypeError { .. }));
    }

    #[test]
    fn empty_array_has_no_dtype() {
        let arr = GroupedArray::<HostBackend>::new(Some(backend()), []).unwrap();
        assert!(arr.is_empty());
        assert_eq!(arr.entry_dtype(), None);
        assert_eq!(arr.size().unwrap(), 0);
    }

    #[test]
    fn size_and_shape() {
        let be = backend();
        let arr = f64_groups(&be, &[&[1.0, 2.0], &[3.0, 4.0, 5.0]]);
        assert_eq!(arr.shape().unwrap(), [2]);
        assert_eq!(arr.size().unwrap(), 2);
        assert_eq!(arr.size().unwrap(), arr.len());
        assert_eq!(arr.entry_dtype(), Some(DType::F64));
    }

    #[test]
    fn detached_structural_access_ok() {
        let be = backend();
        let arr = f64_groups(&be, &[&[1.0], &[2.0]]).detach();
        assert_eq!(arr.len(), 2);
        assert_eq!(arr[1].to_f64_vec(), Some(vec![2.0]));
        assert_eq!(arr.iter().count(), 2);
    }

    #[test]
    fn detached_ndarray_ops_fail() {
        let be = backend();
        let mut arr = f64_groups(&be, &[&[1.0]]).detach();
        assert_eq!(
            arr.size().unwrap_err(),
            ArrayError::Detached { operation: "size" }
        );
        assert!(matches!(arr.copy(), Err(ArrayError::Detached { .. })));
        assert!(matches!(arr.fill(0.0), Err(ArrayError::Detached { .. })));
        assert!(matches!(arr.real(), Err(ArrayError::Detached { .. })));
        assert!(matches!(
            arr.add_in_place(1.0),
            Err(ArrayError::Detached { .. })
        ));
    }

    #[test]
    fn add_pairwise() {
        let be = backend();
        let mut a = f64_groups(&be, &[&[1.0, 2.0], &[3.0]]);
        let b = f64_groups(&be, &[&[10.0, 20.0], &[30.0]]);
        a.add_in_place(&b).unwrap();
        assert_eq!(a[0].to_f64_vec(), Some(vec![11.0, 22.0]));
        assert_eq!(a[1].to_f64_vec(), Some(vec![33.0]));
    }

    #[test]
    fn scalar_broadcast_and_chaining() {
        let be = backend();
        let mut a = f64_groups(&be, &[&[1.0, 2.0], &[3.0]]);
        a.mul_in_place(2.0).unwrap().sub_in_place(1.0).unwrap();
        assert_eq!(a[0].to_f64_vec(), Some(vec![1.0, 3.0]));
        assert_eq!(a[1].to_f64_vec(), Some(vec![5.0]));
    }

    #[test]
    fn length_mismatch() {
        let be = backend();
        let mut a = f64_groups(&be, &[&[1.0], &[2.0]]);
        let b = f64_groups(&be, &[&[1.0], &[2.0], &[3.0]]);
        let err = a.sub_in_place(&b).unwrap_err();
        assert_eq!(err, ArrayError::LengthMismatch { left: 2, right: 3 });
        assert_eq!(
            err.to_string(),
            "grouped arrays must have the same length: 2 != 3"
        );
    }

    #[test]
    fn leaf_operand_unsupported() {
        let be = backend();
        let mut a = f64_groups(&be, &[&[1.0]]);
        let leaf = Node::<HostBackend>::Leaf(HostBuffer::from_f64(&[1], vec![1.0]).unwrap());
        let err = a.add_in_place(&leaf).unwrap_err();
        assert!(matches!(err, ArrayError::UnsupportedType { .. }));
    }

    #[test]
    fn node_wrapping_array_accepted() {
        let be = backend();
        let mut a = f64_groups(&be, &[&[1.0]]);
        let rhs = Node::Array(f64_groups(&be, &[&[4.0]]));
        a.add_in_place(&rhs).unwrap();
        assert_eq!(a[0].to_f64_vec(), Some(vec![5.0]));
    }

    #[test]
    fn integer_ops() {
        let be = backend();
        let buf = HostBuffer::from_i64(&[4], vec![7, -7, 12, 5]).unwrap();
        let mut a = GroupedArray::attached(be, [buf]).unwrap();
        a.rem_in_place(3i64).unwrap();
        assert_eq!(a[0].to_f64_vec(), Some(vec![1.0, 2.0, 0.0, 2.0]));
        a.bitor_in_place(4i64).unwrap();
        assert_eq!(a[0].to_f64_vec(), Some(vec![5.0, 6.0, 4.0, 6.0]));
    }

    #[test]
    fn backend_errors_propagate() {
        let be = backend();
        let mut a = f64_groups(&be, &[&[1.0]]);
        let err = a.bitand_in_place(1i64).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::Backend(BackendError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn copy_is_independent() {
        let be = backend();
        let a = f64_groups(&be, &[&[1.0, 2.0]]);
        let c = a.copy().unwrap();
        a.fill(0.0).unwrap();
        assert_eq!(c[0].to_f64_vec(), Some(vec![1.0, 2.0]));
        assert!(Arc::ptr_eq(c.backend().unwrap(), &be));
    }

    #[test]
    fn display_lists_groups() {
        let be = backend();
        let a = f64_groups(&be, &[&[1.0], &[2.0]]);
        let text = a.to_string();
        assert!(text.starts_with("GroupedArray("));
        assert!(text.ends_with(')'));
    }
}
