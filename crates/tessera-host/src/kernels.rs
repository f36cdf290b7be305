//! Elementwise kernels over [`HostData`].
//!
//! Every kernel validates dtypes up front and then runs a tight loop over
//! the typed vectors. Operand data is always snapshotted before the target
//! is locked for writing, so a buffer may be combined with an alias of
//! itself and two threads combining `a` with `b` and `b` with `a` cannot
//! deadlock.

use num_complex::Complex64;
use num_traits::Float;
use tessera_core::{BackendError, BinaryOp, DType, HostData, Scalar};

/// Right-hand side of a kernel, already typed.
enum Side<'a, T> {
    Slice(&'a [T]),
    Scalar(T),
}

type Kernel<T> = fn(T, T) -> Result<T, BackendError>;

fn zip<T: Copy>(target: &mut [T], rhs: Side<'_, T>, f: Kernel<T>) -> Result<(), BackendError> {
    match rhs {
        Side::Slice(other) => {
            for (t, &o) in target.iter_mut().zip(other) {
                *t = f(*t, o)?;
            }
        }
        Side::Scalar(s) => {
            for t in target.iter_mut() {
                *t = f(*t, s)?;
            }
        }
    }
    Ok(())
}

/// Modulo whose result takes the sign of the divisor.
fn floor_mod_float<T: Float>(a: T, b: T) -> T {
    let r = a % b;
    if r != T::zero() && ((r < T::zero()) != (b < T::zero())) {
        r + b
    } else {
        r
    }
}

fn float_kernel<T: Float>(op: BinaryOp, dtype: DType) -> Result<Kernel<T>, BackendError> {
    let f: Kernel<T> = match op {
        BinaryOp::Add => |a, b| Ok(a + b),
        BinaryOp::Sub => |a, b| Ok(a - b),
        BinaryOp::Mul => |a, b| Ok(a * b),
        BinaryOp::Div => |a, b| Ok(a / b),
        BinaryOp::Rem => |a, b| Ok(floor_mod_float(a, b)),
        BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr => {
            return Err(BackendError::UnsupportedOperation { op, dtype })
        }
    };
    Ok(f)
}

fn int_kernel(op: BinaryOp) -> Result<Kernel<i64>, BackendError> {
    let f: Kernel<i64> = match op {
        BinaryOp::Add => |a, b| Ok(a.wrapping_add(b)),
        BinaryOp::Sub => |a, b| Ok(a.wrapping_sub(b)),
        BinaryOp::Mul => |a, b| Ok(a.wrapping_mul(b)),
        BinaryOp::Rem => |a, b| {
            if b == 0 {
                return Err(BackendError::DivisionByZero);
            }
            let r = a.wrapping_rem(b);
            Ok(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r })
        },
        BinaryOp::BitAnd => |a, b| Ok(a & b),
        BinaryOp::BitXor => |a, b| Ok(a ^ b),
        BinaryOp::BitOr => |a, b| Ok(a | b),
        BinaryOp::Div => {
            return Err(BackendError::UnsupportedOperation {
                op,
                dtype: DType::I64,
            })
        }
    };
    Ok(f)
}

fn complex_kernel(op: BinaryOp) -> Result<Kernel<Complex64>, BackendError> {
    let f: Kernel<Complex64> = match op {
        BinaryOp::Add => |a, b| Ok(a + b),
        BinaryOp::Sub => |a, b| Ok(a - b),
        BinaryOp::Mul => |a, b| Ok(a * b),
        BinaryOp::Div => |a, b| Ok(a / b),
        BinaryOp::Rem | BinaryOp::BitAnd | BinaryOp::BitXor | BinaryOp::BitOr => {
            return Err(BackendError::UnsupportedOperation {
                op,
                dtype: DType::C128,
            })
        }
    };
    Ok(f)
}

/// Operand of [`apply`], detached from any lock.
pub(crate) enum Rhs {
    Data(HostData),
    Scalar(Scalar),
}

fn incompatible(operand: impl Into<String>, target: DType) -> BackendError {
    BackendError::IncompatibleOperand {
        operand: operand.into(),
        target,
    }
}

/// Apply `op` in place. Shapes are checked by the caller.
pub(crate) fn apply(op: BinaryOp, target: &mut HostData, rhs: &Rhs) -> Result<(), BackendError> {
    let dtype = target.dtype();
    if let Rhs::Scalar(s) = rhs {
        if !s.fits(dtype) {
            return Err(incompatible(format!("{:?}", s.kind()), dtype));
        }
    }
    match (target, rhs) {
        (HostData::F32(t), Rhs::Data(HostData::F32(o))) => zip(t.as_mut_slice(), Side::Slice(o.as_slice()), float_kernel(op, dtype)?),
        (HostData::F64(t), Rhs::Data(HostData::F64(o))) => zip(t.as_mut_slice(), Side::Slice(o.as_slice()), float_kernel(op, dtype)?),
        (HostData::I64(t), Rhs::Data(HostData::I64(o))) => zip(t.as_mut_slice(), Side::Slice(o.as_slice()), int_kernel(op)?),
        (HostData::C128(t), Rhs::Data(HostData::C128(o))) => zip(t.as_mut_slice(), Side::Slice(o.as_slice()), complex_kernel(op)?),
        (HostData::F32(t), Rhs::Scalar(s)) => {
            let v = s.as_f64().ok_or_else(|| incompatible("complex", dtype))? as f32;
            zip(t.as_mut_slice(), Side::Scalar(v), float_kernel(op, dtype)?)
        }
        (HostData::F64(t), Rhs::Scalar(s)) => {
            let v = s.as_f64().ok_or_else(|| incompatible("complex", dtype))?;
            zip(t.as_mut_slice(), Side::Scalar(v), float_kernel(op, dtype)?)
        }
        (HostData::I64(t), Rhs::Scalar(s)) => {
            let v = s.as_i64().ok_or_else(|| incompatible("float", dtype))?;
            zip(t.as_mut_slice(), Side::Scalar(v), int_kernel(op)?)
        }
        (HostData::C128(t), Rhs::Scalar(s)) => {
            zip(t.as_mut_slice(), Side::Scalar(s.as_complex()), complex_kernel(op)?)
        }
        (_, Rhs::Data(other)) => Err(incompatible(other.dtype().name(), dtype)),
    }
}

/// Set every element of `target` to `value`.
pub(crate) fn fill(target: &mut HostData, value: Scalar) -> Result<(), BackendError> {
    let dtype = target.dtype();
    if !value.fits(dtype) {
        return Err(incompatible(format!("{:?}", value.kind()), dtype));
    }
    match target {
        HostData::F32(t) => t.fill(value.as_f64().unwrap_or_default() as f32),
        HostData::F64(t) => t.fill(value.as_f64().unwrap_or_default()),
        HostData::I64(t) => t.fill(value.as_i64().unwrap_or_default()),
        HostData::C128(t) => t.fill(value.as_complex()),
    }
    Ok(())
}

/// Copy `count` elements starting at `offset` out of `data`.
pub(crate) fn slice_range(data: &HostData, offset: usize, count: usize) -> Result<HostData, BackendError> {
    let size = data.len();
    let end = offset
        .checked_add(count)
        .filter(|&end| end <= size)
        .ok_or(BackendError::OutOfBounds { offset, count, size })?;
    Ok(match data {
        HostData::F32(v) => HostData::F32(v[offset..end].to_vec()),
        HostData::F64(v) => HostData::F64(v[offset..end].to_vec()),
        HostData::I64(v) => HostData::I64(v[offset..end].to_vec()),
        HostData::C128(v) => HostData::C128(v[offset..end].to_vec()),
    })
}

/// Write `src` into `dst` starting at `offset`.
pub(crate) fn write_range(dst: &mut HostData, offset: usize, src: &HostData) -> Result<(), BackendError> {
    let size = dst.len();
    let count = src.len();
    let end = offset
        .checked_add(count)
        .filter(|&end| end <= size)
        .ok_or(BackendError::OutOfBounds { offset, count, size })?;
    match (dst, src) {
        (HostData::F32(d), HostData::F32(s)) => d[offset..end].copy_from_slice(s),
        (HostData::F64(d), HostData::F64(s)) => d[offset..end].copy_from_slice(s),
        (HostData::I64(d), HostData::I64(s)) => d[offset..end].copy_from_slice(s),
        (HostData::C128(d), HostData::C128(s)) => d[offset..end].copy_from_slice(s),
        (d, s) => {
            return Err(BackendError::DtypeMismatch {
                expected: d.dtype(),
                actual: s.dtype(),
            })
        }
    }
    Ok(())
}

pub(crate) fn conj(data: &HostData) -> HostData {
    match data {
        HostData::C128(v) => HostData::C128(v.iter().map(|z| z.conj()).collect()),
        other => other.clone(),
    }
}

pub(crate) fn real(data: &HostData) -> HostData {
    match data {
        HostData::C128(v) => HostData::F64(v.iter().map(|z| z.re).collect()),
        other => other.clone(),
    }
}

pub(crate) fn imag(data: &HostData) -> HostData {
    match data {
        HostData::C128(v) => HostData::F64(v.iter().map(|z| z.im).collect()),
        other => HostData::zeros(other.dtype(), other.len()),
    }
}
