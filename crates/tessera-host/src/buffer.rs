//! Shared-handle host buffers.
//!
//! A [`HostBuffer`] pairs immutable metadata (shape, dtype) with a shared,
//! lock-protected element vector. Metadata reads never take the lock.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard};
use tessera_core::{BackendError, BufferMeta, DType, HostArray, HostData, Shape};

/// A row-major buffer owned by the host backend.
///
/// Cloning produces an alias of the same storage.
#[derive(Clone)]
pub struct HostBuffer {
    shape: Shape,
    dtype: DType,
    data: Arc<RwLock<HostData>>,
}

impl HostBuffer {
    /// Wrap a host array in a new buffer.
    pub fn from_host_array(array: HostArray) -> Self {
        let (shape, data) = array.into_parts();
        Self {
            shape,
            dtype: data.dtype(),
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Build a buffer from typed storage and a shape.
    pub fn new(shape: impl Into<Shape>, data: HostData) -> Result<Self, BackendError> {
        HostArray::new(shape, data).map(Self::from_host_array)
    }

    /// Build an `f64` buffer.
    pub fn from_f64(shape: &[usize], values: Vec<f64>) -> Result<Self, BackendError> {
        Self::new(Shape::from_slice(shape), HostData::F64(values))
    }

    /// Build an `i64` buffer.
    pub fn from_i64(shape: &[usize], values: Vec<i64>) -> Result<Self, BackendError> {
        Self::new(Shape::from_slice(shape), HostData::I64(values))
    }

    /// Snapshot the contents as a host array.
    pub fn to_host_array(&self) -> Result<HostArray, BackendError> {
        let data = self.data.read().clone();
        HostArray::new(self.shape.clone(), data)
    }

    /// Contents widened to `f64` (`None` for complex buffers).
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        self.to_host_array().ok()?.to_f64_vec()
    }

    /// Whether two handles alias the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, HostData> {
        self.data.read()
    }

    pub(crate) fn with_data_mut<R>(&self, f: impl FnOnce(&mut HostData) -> R) -> R {
        let mut guard = self.data.write();
        f(&mut guard)
    }
}

impl BufferMeta for HostBuffer {
    fn dtype(&self) -> DType {
        self.dtype
    }

    fn shape(&self) -> &[usize] {
        &self.shape
    }
}

impl fmt::Debug for HostBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostBuffer")
            .field("shape", &self.shape.as_slice())
            .field("dtype", &self.dtype)
            .field("data", &*self.data.read())
            .finish()
    }
}

impl fmt::Display for HostBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.data.read() {
            HostData::F32(v) => write!(f, "{v:?}"),
            HostData::F64(v) => write!(f, "{v:?}"),
            HostData::I64(v) => write!(f, "{v:?}"),
            HostData::C128(v) => write!(f, "{v:?}"),
        }
    }
}

/// Buffers compare by shape, dtype, and contents (not identity).
impl PartialEq for HostBuffer {
    fn eq(&self, other: &Self) -> bool {
        if self.shape != other.shape || self.dtype != other.dtype {
            return false;
        }
        if self.ptr_eq(other) {
            return true;
        }
        *self.data.read() == *other.data.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_alias_storage() {
        let a = HostBuffer::from_f64(&[2], vec![1.0, 2.0]).unwrap();
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        a.with_data_mut(|d| {
            if let HostData::F64(v) = d {
                v[0] = 10.0;
            }
        });
        assert_eq!(b.to_f64_vec(), Some(vec![10.0, 2.0]));
    }

    #[test]
    fn metadata_without_lock() {
        let a = HostBuffer::from_i64(&[3, 2], (0..6).collect()).unwrap();
        assert_eq!(a.shape(), &[3, 2]);
        assert_eq!(a.size(), 6);
        assert_eq!(a.rank(), 2);
        assert_eq!(a.dtype(), DType::I64);
    }

    #[test]
    fn equality_is_by_value() {
        let a = HostBuffer::from_f64(&[2], vec![1.0, 2.0]).unwrap();
        let b = HostBuffer::from_f64(&[2], vec![1.0, 2.0]).unwrap();
        let c = HostBuffer::from_f64(&[1, 2], vec![1.0, 2.0]).unwrap();
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert_ne!(a, c);
    }
}
