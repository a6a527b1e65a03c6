//! Error types for the Seine library.
//!
//! All fallible operations in this crate return [`Result`], whose error type
//! is the [`SeineError`] enum. Partition-level search failures are recovered
//! inside the engine and never surface through this type; what does surface
//! is orchestration-level failure (bad configuration, whole-request timeout,
//! serialization problems).

use std::io;

use thiserror::Error;

/// The main error type for Seine operations.
#[derive(Error, Debug)]
pub enum SeineError {
    /// I/O errors (network transport, file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors reported by the external index backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// Query construction errors
    #[error("Query error: {0}")]
    Query(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Cache store errors
    #[error("Cache error: {0}")]
    Cache(String),

    /// A search exceeded its time budget
    #[error("Timeout: {0}")]
    Timeout(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with SeineError.
pub type Result<T> = std::result::Result<T, SeineError>;

impl SeineError {
    /// Create a new backend error.
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        SeineError::Backend(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        SeineError::Query(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        SeineError::Config(msg.into())
    }

    /// Create a new cache error.
    pub fn cache<S: Into<String>>(msg: S) -> Self {
        SeineError::Cache(msg.into())
    }

    /// Create a new timeout error.
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        SeineError::Timeout(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SeineError::Other(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        SeineError::Other(format!("Internal error: {}", msg.into()))
    }
}
