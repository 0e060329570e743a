//! Configuration Module - Collector Parameters
//!
//! Manages all configuration parameters for a statistics collector.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logging::EventLogConfig;
use crate::report::ReportFormat;

/// Upper bound on thread slots per collector
pub const MAX_THREADS: usize = 4096;

/// Main configuration for a statistics collector
///
/// Most parameters have sensible defaults.
///
/// # Examples
///
/// ```rust
/// use loopstat_runtime::CollectorConfig;
///
/// let config = CollectorConfig::default()
///     .with_threads(8)
///     .with_host_id(2);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Host id printed in the HOST column of local reports
    ///
    /// Distributed reports use the transport's host id instead.
    /// Default: 0
    pub host_id: u32,

    /// Number of thread slots
    ///
    /// One append-only record store is allocated per slot. Slot ids passed
    /// to `record` must be below this value.
    /// Default: number of logical CPUs
    pub threads: usize,

    /// Bounded wait for peer reports on the sink, in milliseconds
    ///
    /// 0 waits indefinitely: a peer that never reports blocks the sink.
    /// Any other value turns a missing peer into a labeled partial report.
    /// Default: 0
    pub gather_timeout_ms: u64,

    /// Report format used when a caller does not pick one
    ///
    /// Default: tabular
    pub format: ReportFormat,

    /// Event log settings
    pub events: EventLogConfig,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            host_id: 0,
            threads: num_cpus::get().clamp(1, MAX_THREADS),
            gather_timeout_ms: 0,
            format: ReportFormat::Tabular,
            events: EventLogConfig::default(),
        }
    }
}

impl CollectorConfig {
    /// Set the number of thread slots
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Set the host id
    pub fn with_host_id(mut self, host_id: u32) -> Self {
        self.host_id = host_id;
        self
    }

    /// Bound the sink's wait for peers
    pub fn with_gather_timeout(mut self, timeout: Duration) -> Self {
        self.gather_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Gather timeout, `None` when the sink waits indefinitely
    pub fn gather_timeout(&self) -> Option<Duration> {
        (self.gather_timeout_ms > 0).then(|| Duration::from_millis(self.gather_timeout_ms))
    }

    /// Validate configuration
    ///
    /// ```rust
    /// use loopstat_runtime::CollectorConfig;
    ///
    /// let config = CollectorConfig {
    ///     threads: 0,  // Invalid!
    ///     ..Default::default()
    /// };
    ///
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreads(
                "threads must be > 0".to_string(),
            ));
        }

        if self.threads > MAX_THREADS {
            return Err(ConfigError::InvalidThreads(format!(
                "threads must be <= {}",
                MAX_THREADS
            )));
        }

        Ok(())
    }

    /// Build configuration from environment variables
    ///
    /// Overrides defaults with environment variables:
    /// - LOOPSTAT_HOST_ID
    /// - LOOPSTAT_THREADS
    /// - LOOPSTAT_GATHER_TIMEOUT_MS
    /// - LOOPSTAT_FORMAT
    /// - LOOPSTAT_EVENTS_JSON
    ///
    /// Values that fail to parse are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("LOOPSTAT_HOST_ID") {
            if let Ok(id) = val.parse::<u32>() {
                config.host_id = id;
            }
        }

        if let Ok(val) = std::env::var("LOOPSTAT_THREADS") {
            if let Ok(threads) = val.parse::<usize>() {
                config.threads = threads;
            }
        }

        if let Ok(val) = std::env::var("LOOPSTAT_GATHER_TIMEOUT_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                config.gather_timeout_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("LOOPSTAT_FORMAT") {
            if let Ok(format) = val.parse::<ReportFormat>() {
                config.format = format;
            }
        }

        if let Ok(val) = std::env::var("LOOPSTAT_EVENTS_JSON") {
            config.events.json = val == "1" || val.eq_ignore_ascii_case("true");
        }

        config
    }
}

/// Error types for configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid thread count: {0}")]
    InvalidThreads(String),

    #[error("Invalid report format: {0}")]
    InvalidFormat(String),
}
