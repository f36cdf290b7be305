//! Element types and scalar operands.

use std::fmt;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Element type of a buffer.
///
/// Every per-group buffer inside one grouped array shares a single dtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
    /// 64-bit signed integer.
    I64,
    /// Complex number with two 64-bit float components.
    C128,
}

impl DType {
    /// Size of one element in bytes.
    pub fn item_size(self) -> usize {
        match self {
            Self::F32 => 4,
            Self::F64 | Self::I64 => 8,
            Self::C128 => 16,
        }
    }

    /// The broad numeric kind of this dtype.
    pub fn kind(self) -> ScalarKind {
        match self {
            Self::I64 => ScalarKind::Int,
            Self::F32 | Self::F64 => ScalarKind::Float,
            Self::C128 => ScalarKind::Complex,
        }
    }

    /// Short lowercase name, e.g. `"f64"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::I64 => "i64",
            Self::C128 => "c128",
        }
    }

    /// The real-valued counterpart (`C128` maps to `F64`, all others to themselves).
    pub fn real_part(self) -> Self {
        match self {
            Self::C128 => Self::F64,
            other => other,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric kind, ordered by how far values may be promoted.
///
/// A scalar of kind `k` can be applied to a buffer whose dtype kind is `>= k`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScalarKind {
    /// Integers.
    Int,
    /// Real floats.
    Float,
    /// Complex numbers.
    Complex,
}

/// A scalar operand for in-place arithmetic and `fill`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    /// Integer scalar.
    Int(i64),
    /// Real float scalar.
    Float(f64),
    /// Complex scalar.
    Complex(Complex64),
}

impl Scalar {
    /// The numeric kind of this scalar.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Int(_) => ScalarKind::Int,
            Self::Float(_) => ScalarKind::Float,
            Self::Complex(_) => ScalarKind::Complex,
        }
    }

    /// Whether this scalar can be applied to a buffer of `dtype` without narrowing.
    pub fn fits(&self, dtype: DType) -> bool {
        self.kind() <= dtype.kind()
    }

    /// Value as `i64`, if this is an integer scalar.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Value widened to `f64`, if this scalar is real.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(v as f64),
            Self::Float(v) => Some(v),
            Self::Complex(_) => None,
        }
    }

    /// Value widened to a complex number.
    pub fn as_complex(&self) -> Complex64 {
        match *self {
            Self::Int(v) => Complex64::new(v as f64, 0.0),
            Self::Float(v) => Complex64::new(v, 0.0),
            Self::Complex(v) => v,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Complex(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<Complex64> for Scalar {
    fn from(v: Complex64) -> Self {
        Self::Complex(v)
    }
}
