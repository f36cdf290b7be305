//! Backend-independent array form.
//!
//! A [`HostArray`] is what a backend produces when it transfers a buffer
//! out to the host or canonicalizes it, and what it consumes when
//! attaching data. It is also the per-group unit of the persisted form.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::dtype::DType;
use crate::error::BackendError;
use crate::shape::Shape;

/// Typed, row-major element storage of a [`HostArray`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum HostData {
    /// `f32` elements.
    F32(Vec<f32>),
    /// `f64` elements.
    F64(Vec<f64>),
    /// `i64` elements.
    I64(Vec<i64>),
    /// Complex elements.
    C128(Vec<Complex64>),
}

impl HostData {
    /// Zero-filled storage of `len` elements.
    pub fn zeros(dtype: DType, len: usize) -> Self {
        match dtype {
            DType::F32 => Self::F32(vec![0.0; len]),
            DType::F64 => Self::F64(vec![0.0; len]),
            DType::I64 => Self::I64(vec![0; len]),
            DType::C128 => Self::C128(vec![Complex64::new(0.0, 0.0); len]),
        }
    }

    /// Element type of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            Self::F32(_) => DType::F32,
            Self::F64(_) => DType::F64,
            Self::I64(_) => DType::I64,
            Self::C128(_) => DType::C128,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::F32(v) => v.len(),
            Self::F64(v) => v.len(),
            Self::I64(v) => v.len(),
            Self::C128(v) => v.len(),
        }
    }

    /// Whether the storage holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A canonical, backend-independent array: shape plus row-major data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HostArray {
    shape: Shape,
    data: HostData,
}

impl HostArray {
    /// Create a host array, checking that `data` fills `shape` exactly.
    pub fn new(shape: impl Into<Shape>, data: HostData) -> Result<Self, BackendError> {
        let shape = shape.into();
        let expected = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| BackendError::MalformedHostArray {
                reason: format!("shape {shape:?} overflows usize"),
            })?;
        if data.len() != expected {
            return Err(BackendError::MalformedHostArray {
                reason: format!(
                    "shape {:?} needs {expected} elements, data has {}",
                    shape.as_slice(),
                    data.len()
                ),
            });
        }
        Ok(Self { shape, data })
    }

    /// Zero-filled host array.
    pub fn zeros(shape: impl Into<Shape>, dtype: DType) -> Self {
        let shape = shape.into();
        let len = shape.iter().product();
        Self {
            shape,
            data: HostData::zeros(dtype, len),
        }
    }

    /// Dimensions, row-major.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Borrow the typed storage.
    pub fn data(&self) -> &HostData {
        &self.data
    }

    /// Split into shape and storage.
    pub fn into_parts(self) -> (Shape, HostData) {
        (self.shape, self.data)
    }

    /// Elements widened to `f64`, or `None` for complex data.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match &self.data {
            HostData::F32(v) => Some(v.iter().map(|&x| f64::from(x)).collect()),
            HostData::F64(v) => Some(v.clone()),
            HostData::I64(v) => Some(v.iter().map(|&x| x as f64).collect()),
            HostData::C128(_) => None,
        }
    }
}
