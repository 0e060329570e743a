//! Error handling module for the loopstat CLI.
//!
//! This module provides custom error types using `thiserror` for structured
//! error handling throughout the application.

use loopstat_runtime::StatError;
use thiserror::Error;

/// Main error type for the loopstat CLI application.
#[derive(Error, Debug)]
pub enum CliError {
    /// Error when a configuration file is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error when command-line input validation fails.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Error when a simulated host fails outright.
    #[error("Host {host} failed: {reason}")]
    HostFailed { host: u32, reason: String },

    /// Error raised by the statistics runtime.
    #[error(transparent)]
    Stats(#[from] StatError),

    /// Error when IO operations fail.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error when JSON serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error when a TOML configuration file cannot be parsed.
    #[error("Failed to parse configuration: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Error when a configuration cannot be written as TOML.
    #[error("Failed to serialize configuration: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

/// Result type alias using CliError.
pub type Result<T> = std::result::Result<T, CliError>;
