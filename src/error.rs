//! Error types for the Palaver library.
//!
//! This module provides error handling for all Palaver operations. All errors
//! are represented by the [`PalaverError`] enum, which carries enough context
//! to decide whether a failure is the caller's fault, an upstream outage, or
//! an internal bug.
//!
//! # Examples
//!
//! ```
//! use palaver::error::{PalaverError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(PalaverError::invalid_input("message must not be empty"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;
use std::time::Duration;

use anyhow;
use thiserror::Error;

/// The main error type for Palaver operations.
///
/// This enum represents all possible errors that can occur in the Palaver
/// library. It uses the `thiserror` crate for automatic `Error` trait
/// implementation and provides convenient constructor methods for creating
/// specific error types.
#[derive(Error, Debug)]
pub enum PalaverError {
    /// I/O errors (file operations, directory scans, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// CSV parsing/writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Dataset-related errors (missing columns, no usable files, etc.)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Model-related errors (training, prediction, artifact problems)
    #[error("Model error: {0}")]
    Model(String),

    /// Artifact serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid caller input (empty message, bad upload, etc.)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Remote generative-API failures other than timeouts
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Remote generative-API call exceeded its deadline
    #[error("Upstream timeout after {0:?}")]
    UpstreamTimeout(Duration),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with PalaverError.
pub type Result<T> = std::result::Result<T, PalaverError>;

impl PalaverError {
    /// Create a new dataset error.
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        PalaverError::Dataset(msg.into())
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        PalaverError::Model(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        PalaverError::Serialization(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        PalaverError::Config(msg.into())
    }

    /// Create a new invalid input error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        PalaverError::InvalidInput(msg.into())
    }

    /// Create a new upstream error.
    pub fn upstream<S: Into<String>>(msg: S) -> Self {
        PalaverError::Upstream(msg.into())
    }

    /// True for failures of the remote generative API, timeout or otherwise.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            PalaverError::Upstream(_) | PalaverError::UpstreamTimeout(_)
        )
    }
}

impl From<reqwest::Error> for PalaverError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // The client-level deadline is the only timeout source.
            PalaverError::UpstreamTimeout(crate::ai::REQUEST_TIMEOUT)
        } else {
            PalaverError::Upstream(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PalaverError::dataset("no CSV files found");
        assert_eq!(err.to_string(), "Dataset error: no CSV files found");

        let err = PalaverError::invalid_input("empty message");
        assert_eq!(err.to_string(), "Invalid input: empty message");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: PalaverError = io_err.into();
        assert!(matches!(err, PalaverError::Io(_)));
    }

    #[test]
    fn test_upstream_classification() {
        assert!(PalaverError::upstream("boom").is_upstream());
        assert!(PalaverError::UpstreamTimeout(Duration::from_secs(15)).is_upstream());
        assert!(!PalaverError::model("bad weights").is_upstream());
    }
}
