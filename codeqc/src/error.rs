//! Error types for the quality gate.
//!
//! `QcError` never escapes [`crate::QualityGate::run`]: inside the pipeline
//! every error is folded into a failing step, gate or check that carries the
//! message. Only configuration loading returns it to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for gate operations
pub type QcResult<T> = Result<T, QcError>;

#[derive(Error, Debug)]
pub enum QcError {
    /// Config file could not be read
    #[error("Failed to read config {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`crate::QcConfig`]
    #[error("Invalid config {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// An externally supplied tool result is internally inconsistent
    #[error("Malformed {field} result: {message}")]
    MalformedInput { field: String, message: String },

    /// A rule engine scan panicked
    #[error("Rule engine {scan} scan failed on {path}: {message}")]
    RuleEngine {
        scan: String,
        path: String,
        message: String,
    },
}

impl QcError {
    pub fn malformed(field: &str, message: impl Into<String>) -> Self {
        Self::MalformedInput {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
