//! Quality profiler configuration.

use crate::adapters::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default number of tables profiled concurrently.
pub const DEFAULT_MAX_CONCURRENT_TABLES: usize = 4;

/// Default per-aggregate query timeout.
///
/// Longer than the default connection acquire timeout, see
/// [`ProfilerConfig::validate_for`].
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Quality profiler configuration.
///
/// # Example
/// ```rust
/// use datadict_core::profiling::ProfilerConfig;
/// use std::time::Duration;
///
/// let config = ProfilerConfig::new()
///     .with_max_concurrent_tables(8)
///     .with_query_timeout(Duration::from_secs(5));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilerConfig {
    /// Upper bound on tables profiled at once; further capped by the
    /// adapter's pool size
    pub max_concurrent_tables: usize,
    /// Timeout for a single aggregate query; an elapsed timeout degrades
    /// that metric
    pub query_timeout: Duration,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tables: DEFAULT_MAX_CONCURRENT_TABLES,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

impl ProfilerConfig {
    /// Creates a new profiler config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the concurrency bound.
    pub fn with_max_concurrent_tables(mut self, max: usize) -> Self {
        self.max_concurrent_tables = max;
        self
    }

    /// Builder method to set the per-aggregate timeout.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns a configuration error for a zero concurrency bound or timeout
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_concurrent_tables == 0 {
            return Err(crate::error::DataDictError::configuration(
                "max_concurrent_tables must be greater than 0",
            ));
        }
        if self.query_timeout.is_zero() {
            return Err(crate::error::DataDictError::configuration(
                "query_timeout must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Validates the configuration against the adapter's connection settings.
    ///
    /// The per-aggregate timeout also covers acquiring a pooled connection.
    /// It must outlast the pool's acquire timeout (`connect_timeout`) so that
    /// an unreachable backend surfaces as a fatal pool timeout instead of a
    /// degraded metric.
    ///
    /// # Errors
    /// Returns a configuration error if [`Self::validate`] fails or
    /// `query_timeout` does not exceed `connect_timeout`
    pub fn validate_for(&self, connection: &ConnectionConfig) -> crate::Result<()> {
        self.validate()?;
        if self.query_timeout <= connection.connect_timeout {
            return Err(crate::error::DataDictError::configuration(format!(
                "query_timeout ({:?}) must be greater than connect_timeout ({:?})",
                self.query_timeout, connection.connect_timeout
            )));
        }
        Ok(())
    }
}
