//! Store configuration.
//!
//! Provides configurable parameters for store naming, nested dispatch
//! limits and slow-reducer reporting.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use unistore_runtime::StoreConfig;
//!
//! let config = StoreConfig::default()
//!     .with_name("app")
//!     .with_max_dispatch_depth(16)
//!     .with_slow_reducer_threshold(Duration::from_millis(5));
//!
//! assert!(config.validate().is_ok());
//! ```

use crate::error::StoreError;
use std::time::Duration;

/// Environment variable overriding [`StoreConfig::name`]
pub const ENV_STORE_NAME: &str = "UNISTORE_STORE_NAME";

/// Environment variable overriding [`StoreConfig::max_dispatch_depth`]
pub const ENV_MAX_DISPATCH_DEPTH: &str = "UNISTORE_MAX_DISPATCH_DEPTH";

/// Environment variable overriding [`StoreConfig::slow_reducer_threshold`], in milliseconds
pub const ENV_SLOW_REDUCER_MS: &str = "UNISTORE_SLOW_REDUCER_MS";

/// Configuration for Store instances
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Name used in log spans and metric labels
    pub name: String,
    /// Maximum nesting of dispatches issued from middleware or listeners
    pub max_dispatch_depth: usize,
    /// Reductions slower than this are logged at warn level
    pub slow_reducer_threshold: Duration,
}

impl StoreConfig {
    /// Create a new configuration with custom values
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        max_dispatch_depth: usize,
        slow_reducer_threshold: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            max_dispatch_depth,
            slow_reducer_threshold,
        }
    }

    /// Set the store name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the maximum nested dispatch depth
    #[must_use]
    pub const fn with_max_dispatch_depth(mut self, depth: usize) -> Self {
        self.max_dispatch_depth = depth;
        self
    }

    /// Set the slow reducer threshold
    #[must_use]
    pub const fn with_slow_reducer_threshold(mut self, threshold: Duration) -> Self {
        self.slow_reducer_threshold = threshold;
        self
    }

    /// Load configuration from `UNISTORE_*` environment variables
    ///
    /// Variables that are not set keep their default values.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if a variable cannot be parsed or
    /// the resulting configuration fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(name) = lookup(ENV_STORE_NAME) {
            config.name = name;
        }

        if let Some(depth) = lookup(ENV_MAX_DISPATCH_DEPTH) {
            config.max_dispatch_depth = depth.trim().parse().map_err(|_| {
                StoreError::InvalidConfig(format!("{ENV_MAX_DISPATCH_DEPTH}={depth} is not a number"))
            })?;
        }

        if let Some(millis) = lookup(ENV_SLOW_REDUCER_MS) {
            let millis: u64 = millis.trim().parse().map_err(|_| {
                StoreError::InvalidConfig(format!("{ENV_SLOW_REDUCER_MS}={millis} is not a number"))
            })?;
            config.slow_reducer_threshold = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidConfig`] if the name is blank or the
    /// dispatch depth is zero (no dispatch could ever run).
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.name.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "store name must not be empty".to_string(),
            ));
        }

        if self.max_dispatch_depth == 0 {
            return Err(StoreError::InvalidConfig(
                "max_dispatch_depth must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: "store".to_string(),
            max_dispatch_depth: 32,
            slow_reducer_threshold: Duration::from_millis(50),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code can use unwrap

    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_is_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.name, "store");
        assert_eq!(config.max_dispatch_depth, 32);
    }

    #[test]
    fn test_lookup_overrides() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (ENV_STORE_NAME, "todos"),
            (ENV_MAX_DISPATCH_DEPTH, " 8 "),
            (ENV_SLOW_REDUCER_MS, "3"),
        ]))
        .unwrap();

        assert_eq!(config.name, "todos");
        assert_eq!(config.max_dispatch_depth, 8);
        assert_eq!(config.slow_reducer_threshold, Duration::from_millis(3));
    }

    #[test]
    fn test_lookup_missing_keys_keep_defaults() {
        let config = StoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, StoreConfig::default());
    }

    #[test]
    fn test_lookup_rejects_garbage() {
        let result = StoreConfig::from_lookup(lookup_from(&[(ENV_MAX_DISPATCH_DEPTH, "lots")]));
        assert!(matches!(result, Err(StoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_zero_depth() {
        let config = StoreConfig::default().with_max_dispatch_depth(0);
        assert!(matches!(config.validate(), Err(StoreError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let config = StoreConfig::default().with_name("   ");
        assert!(config.validate().is_err());
    }
}
