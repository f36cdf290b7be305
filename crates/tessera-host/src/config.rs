//! Host backend configuration.

use crate::error::ConfigError;

/// Configuration for [`HostBackend`](crate::HostBackend).
///
/// Validated at construction; immutable afterwards.
#[derive(Clone, Debug)]
pub struct HostConfig {
    /// Name reported by [`Backend::name`](tessera_core::Backend::name).
    ///
    /// Default: `"host"`. Must be non-empty.
    pub name: String,

    /// Largest single allocation, in elements.
    ///
    /// Default: 2^28 (2 GiB of `f64`). Must be at least 1.
    pub max_elements: usize,
}

impl HostConfig {
    /// Default backend name.
    pub const DEFAULT_NAME: &'static str = "host";

    /// Default allocation cap in elements.
    pub const DEFAULT_MAX_ELEMENTS: usize = 1 << 28;

    /// Config with the given name and default limits.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.max_elements == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: Self::DEFAULT_NAME.to_string(),
            max_elements: Self::DEFAULT_MAX_ELEMENTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = HostConfig::default();
        assert_eq!(config.name, "host");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        let config = HostConfig::named("  ");
        assert_eq!(config.validate(), Err(ConfigError::EmptyName));
    }

    #[test]
    fn zero_capacity_rejected() {
        let config = HostConfig {
            max_elements: 0,
            ..HostConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCapacity));
    }
}
