//! Unified error types for the curtailment pipeline
//!
//! This module provides a common error type [`CurtailError`] that can
//! represent errors from any stage of the pipeline. Domain-specific failures
//! (a required column that no alias resolves, a run that produced no data)
//! get dedicated variants so callers can distinguish fatal-abort conditions
//! from wrapped external errors.

use thiserror::Error;

/// Unified error type for all curtailment operations.
///
/// Fatal conditions per the error-handling policy: [`CurtailError::MissingColumn`]
/// and [`CurtailError::NoData`] abort a run before anything is persisted.
/// Row-level problems never surface here; they are absorbed into dropped-row
/// counts by the normalizer.
#[derive(Error, Debug)]
pub enum CurtailError {
    /// I/O errors (file access, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding/decoding errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Parsing/deserialization errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// A required logical field matched none of its column aliases
    #[error("missing required column '{field}' (tried aliases: {})", tried.join(", "))]
    MissingColumn { field: String, tried: Vec<String> },

    /// A full run obtained no usable data for any period
    #[error("no data obtained for any period")]
    NoData,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using CurtailError.
pub type CurtailResult<T> = Result<T, CurtailError>;

impl From<anyhow::Error> for CurtailError {
    fn from(err: anyhow::Error) -> Self {
        CurtailError::Other(err.to_string())
    }
}

impl From<String> for CurtailError {
    fn from(s: String) -> Self {
        CurtailError::Other(s)
    }
}

impl From<&str> for CurtailError {
    fn from(s: &str) -> Self {
        CurtailError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for CurtailError {
    fn from(err: serde_json::Error) -> Self {
        CurtailError::Parse(err.to_string())
    }
}
