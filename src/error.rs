//! Error types for the tabcost pipeline

use std::path::Path;
use thiserror::Error;

/// Result type alias for tabcost operations
pub type Result<T> = std::result::Result<T, TabError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum TabError {
    #[error("File error: {path}: {reason}")]
    FileError { path: String, reason: String },

    #[error("Parse error: {path}: {reason}")]
    ParseError { path: String, reason: String },

    #[error("Schema error: {0}")]
    SchemaError(String),

    #[error("Leakage violation: {0}")]
    LeakageViolation(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Not fitted")]
    NotFitted,

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Data error: {0}")]
    Data(String),
}

impl TabError {
    pub(crate) fn file(path: &Path, reason: impl ToString) -> Self {
        TabError::FileError {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn parse(path: &Path, reason: impl ToString) -> Self {
        TabError::ParseError {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid(name: &str, value: impl ToString, reason: &str) -> Self {
        TabError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for TabError {
    fn from(err: polars::error::PolarsError) -> Self {
        TabError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for TabError {
    fn from(err: serde_json::Error) -> Self {
        TabError::Serialization(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TabError {
    fn from(err: ndarray::ShapeError) -> Self {
        TabError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
