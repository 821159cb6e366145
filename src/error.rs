//! Error handling for flight fact assembly.
//!
//! Provides error types with context for extract parsing, record
//! coercion, time dimension integrity and output failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Extract directory not found at path: {path}")]
    ExtractDirNotFound { path: PathBuf },

    #[error("Time dimension snapshot not found at path: {path}")]
    SnapshotNotFound { path: PathBuf },

    #[error("Malformed record in {path} at line {line}, column '{column}': {reason}")]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        column: String,
        reason: String,
    },

    #[error("Data integrity violation: {reason}")]
    DataIntegrity { reason: String },

    #[error("Source parse error in {path}: {reason}")]
    SourceParse { path: PathBuf, reason: String },

    #[error("Unknown month: '{value}'")]
    InvalidMonth { value: String },

    #[error("Processing failed for file: {path} - {reason}")]
    ProcessingFailed { path: PathBuf, reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl EtlError {
    /// Create a data integrity error
    pub fn data_integrity(reason: impl Into<String>) -> Self {
        Self::DataIntegrity {
            reason: reason.into(),
        }
    }

    /// Create a source parse error for a given file
    pub fn source_parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SourceParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed record error
    pub fn malformed_record(
        path: impl Into<PathBuf>,
        line: usize,
        column: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedRecord {
            path: path.into(),
            line,
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
