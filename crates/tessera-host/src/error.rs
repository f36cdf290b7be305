//! Host backend configuration errors.

use thiserror::Error;

/// Errors detected by [`HostConfig::validate`](crate::HostConfig::validate).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The backend name is empty or whitespace.
    #[error("backend name must not be empty")]
    EmptyName,
    /// `max_elements` is zero.
    #[error("max_elements must be at least 1")]
    ZeroCapacity,
}
