//! Error types for dataset access.

use std::path::PathBuf;

use geostack_common::GeoStackError;
use thiserror::Error;

/// Result type for dataset operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Error types for dataset backends.
#[derive(Error, Debug)]
pub enum SourceError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The dataset does not exist
    #[error("Dataset not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Variable missing from the dataset
    #[error("Variable not found: {0}")]
    MissingVariable(String),

    /// Dimension missing from the dataset
    #[error("Dimension not found: {0}")]
    MissingDimension(String),

    /// Variable defined but holds no values
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format or layout
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SourceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }
}

impl From<SourceError> for GeoStackError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::IoError(e) => GeoStackError::Io(e),
            SourceError::NotFound(path) => GeoStackError::FileNotFound(path),
            SourceError::MissingVariable(name) => GeoStackError::MissingVariable(name),
            SourceError::MissingDimension(name) => GeoStackError::MissingDimension(name),
            other => GeoStackError::Dataset(other.to_string()),
        }
    }
}
