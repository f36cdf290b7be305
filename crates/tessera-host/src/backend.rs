//! [`HostBackend`]: the in-memory implementation of the backend contract.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tessera_core::{
    Backend, BackendError, BinaryOp, BufferMeta, BufferOperand, DType, HostArray, HostData,
    Scalar, Shape,
};

use crate::buffer::HostBuffer;
use crate::config::HostConfig;
use crate::error::ConfigError;
use crate::kernels::{self, Rhs};

/// Counter for unique [`BackendInstanceId`] allocation.
static BACKEND_INSTANCE_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for a [`HostBackend`].
///
/// Two backends built from identical configs still get different IDs.
/// Every trace event the backend emits carries it as `instance`, so
/// same-named backends stay distinguishable in logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendInstanceId(u64);

impl BackendInstanceId {
    /// Allocate a fresh, unique instance ID. Thread-safe.
    pub fn next() -> Self {
        Self(BACKEND_INSTANCE_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for BackendInstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row-major, CPU-resident backend.
#[derive(Debug)]
pub struct HostBackend {
    config: HostConfig,
    instance: BackendInstanceId,
}

impl HostBackend {
    /// Create a backend from a validated config.
    pub fn new(config: HostConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            instance: BackendInstanceId::next(),
        })
    }

    /// Create a backend with default limits and the given name.
    pub fn named(name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(HostConfig::named(name))
    }

    /// This backend's configuration.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// This backend's instance ID.
    pub fn instance_id(&self) -> BackendInstanceId {
        self.instance
    }

    fn check_capacity(&self, requested: usize) -> Result<(), BackendError> {
        if requested > self.config.max_elements {
            return Err(BackendError::AllocationTooLarge {
                requested,
                limit: self.config.max_elements,
            });
        }
        Ok(())
    }

    fn derived(&self, buffer: &HostBuffer, f: fn(&HostData) -> HostData) -> Result<HostBuffer, BackendError> {
        let data = f(&*buffer.read());
        HostBuffer::new(Shape::from_slice(buffer.shape()), data)
    }
}

impl Default for HostBackend {
    fn default() -> Self {
        Self {
            config: HostConfig::default(),
            instance: BackendInstanceId::next(),
        }
    }
}

impl Backend for HostBackend {
    type Buffer = HostBuffer;

    fn name(&self) -> &str {
        &self.config.name
    }

    fn allocate(&self, shape: &[usize], dtype: DType) -> Result<HostBuffer, BackendError> {
        let len = shape
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or(BackendError::AllocationTooLarge {
                requested: usize::MAX,
                limit: self.config.max_elements,
            })?;
        self.check_capacity(len)?;
        tracing::trace!(
            backend = %self.config.name,
            instance = %self.instance,
            ?shape,
            %dtype,
            "allocate"
        );
        Ok(HostBuffer::from_host_array(HostArray::zeros(
            Shape::from_slice(shape),
            dtype,
        )))
    }

    fn to_host(&self, buffer: &HostBuffer) -> Result<HostArray, BackendError> {
        buffer.to_host_array()
    }

    fn from_host(&self, host: &HostArray) -> Result<HostBuffer, BackendError> {
        self.check_capacity(host.len())?;
        tracing::trace!(
            backend = %self.config.name,
            instance = %self.instance,
            len = host.len(),
            "from_host"
        );
        // Re-validate: deserialized host arrays bypass the constructor.
        HostBuffer::new(Shape::from_slice(host.shape()), host.data().clone())
    }

    fn apply(
        &self,
        op: BinaryOp,
        target: &HostBuffer,
        operand: BufferOperand<'_, HostBuffer>,
    ) -> Result<(), BackendError> {
        let rhs = match operand {
            BufferOperand::Buffer(other) => {
                if other.shape() != target.shape() {
                    return Err(BackendError::ShapeMismatch {
                        left: target.shape().to_vec(),
                        right: other.shape().to_vec(),
                    });
                }
                Rhs::Data(other.read().clone())
            }
            BufferOperand::Scalar(s) => Rhs::Scalar(s),
        };
        target.with_data_mut(|data| kernels::apply(op, data, &rhs))
    }

    fn copy_range(
        &self,
        src: &HostBuffer,
        src_offset: usize,
        dst: &HostBuffer,
        dst_offset: usize,
        count: usize,
    ) -> Result<(), BackendError> {
        if src.dtype() != dst.dtype() {
            return Err(BackendError::DtypeMismatch {
                expected: dst.dtype(),
                actual: src.dtype(),
            });
        }
        let chunk = kernels::slice_range(&*src.read(), src_offset, count)?;
        dst.with_data_mut(|data| kernels::write_range(data, dst_offset, &chunk))
    }

    fn copy(&self, buffer: &HostBuffer) -> Result<HostBuffer, BackendError> {
        self.derived(buffer, HostData::clone)
    }

    fn fill(&self, buffer: &HostBuffer, value: Scalar) -> Result<(), BackendError> {
        buffer.with_data_mut(|data| kernels::fill(data, value))
    }

    fn conj(&self, buffer: &HostBuffer) -> Result<HostBuffer, BackendError> {
        self.derived(buffer, kernels::conj)
    }

    fn real(&self, buffer: &HostBuffer) -> Result<HostBuffer, BackendError> {
        self.derived(buffer, kernels::real)
    }

    fn imag(&self, buffer: &HostBuffer) -> Result<HostBuffer, BackendError> {
        self.derived(buffer, kernels::imag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn f64_buffer(shape: &[usize], values: &[f64]) -> HostBuffer {
        HostBuffer::from_f64(shape, values.to_vec()).unwrap()
    }

    #[test]
    fn instance_ids_are_unique() {
        let a = HostBackend::default();
        let b = HostBackend::default();
        assert_ne!(a.instance_id(), b.instance_id());
    }

    #[test]
    fn invalid_config_rejected() {
        assert_eq!(HostBackend::named("").unwrap_err(), ConfigError::EmptyName);
    }

    #[test]
    fn allocate_zeroed() {
        let be = HostBackend::default();
        let buf = be.allocate(&[2, 3], DType::F64).unwrap();
        assert_eq!(buf.shape(), &[2, 3]);
        assert_eq!(buf.to_f64_vec(), Some(vec![0.0; 6]));
    }

    #[test]
    fn allocate_respects_limit() {
        let be = HostBackend::new(HostConfig {
            max_elements: 4,
            ..HostConfig::default()
        })
        .unwrap();
        let err = be.allocate(&[5], DType::F32).unwrap_err();
        assert_eq!(
            err,
            BackendError::AllocationTooLarge {
                requested: 5,
                limit: 4
            }
        );
    }

    #[test]
    fn apply_buffer_pairwise() {
        let be = HostBackend::default();
        let a = f64_buffer(&[3], &[1.0, 2.0, 3.0]);
        let b = f64_buffer(&[3], &[10.0, 20.0, 30.0]);
        be.apply(BinaryOp::Add, &a, BufferOperand::Buffer(&b)).unwrap();
        assert_eq!(a.to_f64_vec(), Some(vec![11.0, 22.0, 33.0]));
        assert_eq!(b.to_f64_vec(), Some(vec![10.0, 20.0, 30.0]));
    }

    #[test]
    fn apply_with_self_alias() {
        let be = HostBackend::default();
        let a = f64_buffer(&[2], &[1.5, 2.0]);
        let alias = a.clone();
        be.apply(BinaryOp::Mul, &a, BufferOperand::Buffer(&alias)).unwrap();
        assert_eq!(a.to_f64_vec(), Some(vec![2.25, 4.0]));
    }

    #[test]
    fn apply_shape_mismatch() {
        let be = HostBackend::default();
        let a = f64_buffer(&[2, 1], &[1.0, 2.0]);
        let b = f64_buffer(&[2], &[1.0, 2.0]);
        let err = be.apply(BinaryOp::Sub, &a, BufferOperand::Buffer(&b));
        assert!(matches!(err, Err(BackendError::ShapeMismatch { .. })));
    }

    #[test]
    fn copy_range_within_same_buffer() {
        let be = HostBackend::default();
        let a = f64_buffer(&[4], &[1.0, 2.0, 3.0, 4.0]);
        be.copy_range(&a, 0, &a, 2, 2).unwrap();
        assert_eq!(a.to_f64_vec(), Some(vec![1.0, 2.0, 1.0, 2.0]));
    }

    #[test]
    fn copy_is_deep() {
        let be = HostBackend::default();
        let a = f64_buffer(&[2], &[1.0, 2.0]);
        let c = be.copy(&a).unwrap();
        be.fill(&a, Scalar::Float(0.0)).unwrap();
        assert_eq!(c.to_f64_vec(), Some(vec![1.0, 2.0]));
        assert!(!c.ptr_eq(&a));
    }

    #[test]
    fn complex_real_imag() {
        let be = HostBackend::default();
        let z = HostBuffer::new(
            Shape::from_slice(&[2]),
            HostData::C128(vec![Complex64::new(1.0, 2.0), Complex64::new(-3.0, 0.5)]),
        )
        .unwrap();
        assert_eq!(be.real(&z).unwrap().to_f64_vec(), Some(vec![1.0, -3.0]));
        assert_eq!(be.imag(&z).unwrap().to_f64_vec(), Some(vec![2.0, 0.5]));
        assert_eq!(be.real(&z).unwrap().dtype(), DType::F64);
    }

    #[test]
    fn trace_events_carry_instance_id() {
        let capture = Capture::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(capture.clone())
            .finish();
        let first = HostBackend::default();
        let second = HostBackend::default();
        tracing::subscriber::with_default(subscriber, || {
            first.allocate(&[1], DType::F64).unwrap();
            second.allocate(&[1], DType::F64).unwrap();
        });
        let out = capture.contents();
        assert!(out.contains(&format!("instance={}", first.instance_id())), "{out}");
        assert!(out.contains(&format!("instance={}", second.instance_id())), "{out}");
    }

    #[derive(Clone, Default)]
    struct Capture(std::sync::Arc<parking_lot::Mutex<Vec<u8>>>);

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl std::io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn host_round_trip() {
        let be = HostBackend::default();
        let a = HostBuffer::from_i64(&[2, 2], vec![1, 2, 3, 4]).unwrap();
        let host = be.to_host(&a).unwrap();
        let back = be.from_host(&host).unwrap();
        assert_eq!(back, a);
        assert!(!back.ptr_eq(&a));
    }
}
