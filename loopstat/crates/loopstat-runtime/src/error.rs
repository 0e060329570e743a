//! Error Module - Runtime Error Types
//!
//! Defines all error types used by the statistics runtime.
//!
//! # Error Categories
//!
//! ## Recording Errors
//! - `ThreadOutOfRange` - slot id beyond the configured thread count
//! - `UnboundThread` - `record_local` from a thread with no slot binding
//!
//! ## Distributed Report Errors
//! - `Transport` - a frame could not be sent, flushed, or received
//! - `Codec` - an envelope failed to (de)serialize
//! - `GatherTimeout` - peers missing when the bounded wait expired
//!
//! ## Configuration Errors
//! - `Configuration` - invalid collector configuration
//! - `InvalidState` - internal state machine violation
//!
//! Unknown loop or category names are never an error: they are interned on
//! first use.

use loopstat_util::SymbolError;
use thiserror::Error;

use crate::config::ConfigError;

/// Main error type for all runtime operations
#[derive(Debug, Error)]
pub enum StatError {
    /// Thread slot id out of range
    ///
    /// **When returned:** `record` targets a slot the collector was not
    /// configured with
    ///
    /// **Recovery strategy:** Fix the caller, or size `threads` to the pool
    #[error("Thread slot {thread} out of range: collector has {slots} slots")]
    ThreadOutOfRange { thread: usize, slots: usize },

    /// Calling thread has no slot binding
    ///
    /// **When returned:** `record_local` from a thread that never called
    /// `bind_current_thread`
    #[error("Calling thread is not bound to a statistics slot")]
    UnboundThread,

    /// Configuration error
    ///
    /// **When returned:** `CollectorConfig::validate` rejected the settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Symbol table error
    #[error("Symbol error: {0}")]
    Symbol(#[from] SymbolError),

    /// Transport error
    ///
    /// **When returned:** Peer endpoint gone, or destination host unknown
    ///
    /// **Recovery strategy:** None for this report; the sink will time out
    /// or block depending on `gather_timeout_ms`
    #[error("Transport error: {0}")]
    Transport(String),

    /// Envelope encoding error
    #[error("Codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Report sink write failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bounded gather wait expired
    ///
    /// **When returned:** `GatherSummary::into_result` on a partial report
    ///
    /// **Recovery strategy:** Report is still usable; missing hosts are listed
    #[error("Timed out after {waited_ms}ms waiting for hosts {missing:?}")]
    GatherTimeout { missing: Vec<u32>, waited_ms: u64 },

    /// Invalid state
    ///
    /// **When returned:** Report state machine violation
    ///
    /// **Recovery strategy:** Cannot recover - indicates bug
    #[error("Invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },
}

impl StatError {
    /// Check if this error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StatError::GatherTimeout { .. } | StatError::Transport(_) | StatError::Io(_)
        )
    }

    /// Check if this error indicates a bug in the code
    pub fn is_bug(&self) -> bool {
        matches!(self, StatError::InvalidState { .. })
    }
}

impl From<ConfigError> for StatError {
    fn from(err: ConfigError) -> Self {
        StatError::Configuration(err.to_string())
    }
}

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, StatError>;
