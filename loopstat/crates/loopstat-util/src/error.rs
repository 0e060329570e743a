//! Core error types for loopstat-util crate
//!
//! This module defines error types used throughout the util crate.

use thiserror::Error;

/// Error type for symbol table operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SymbolError {
    /// Handle does not belong to this table
    #[error("Symbol not found: index {index}")]
    NotFound { index: u32 },

    /// Table ran out of 32-bit handles
    #[error("Symbol table exhausted after {count} entries")]
    Exhausted { count: usize },
}

/// Result type alias for symbol operations
pub type SymbolResult<T> = std::result::Result<T, SymbolError>;
