//! Error types for geostack.

use std::path::PathBuf;

use thiserror::Error;

use crate::values::DataType;

/// Result type alias using GeoStackError.
pub type GeoStackResult<T> = Result<T, GeoStackError>;

/// Broad class of a [`GeoStackError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad input or file layout; fatal for the requested object.
    Configuration,
    /// A mode could not be converted or interpreted.
    ModeConversion,
    /// Stack layers disagree on a shared dimension.
    MergeConflict,
    /// The dataset backend failed.
    Backend,
}

/// Primary error type for geostack operations.
#[derive(Debug, Error)]
pub enum GeoStackError {
    // === Configuration Errors ===
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Bounds variable '{bounds}' referenced by dimension '{dim}' does not exist")]
    MissingBoundsVariable { dim: String, bounds: String },

    #[error("Element type {0} has no representable fill value")]
    NoFillValue(DataType),

    #[error("Variable not found: {0}")]
    MissingVariable(String),

    #[error("Dimension not found: {0}")]
    MissingDimension(String),

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    #[error("Duplicate layer key: {0}")]
    DuplicateLayer(String),

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // === Mode Errors ===
    #[error("Reprojection support unavailable: cannot convert {from} mode to {to}")]
    ReprojectionUnavailable { from: String, to: String },

    #[error("Reprojection failed: {0}")]
    ReprojectionFailed(String),

    #[error("{mode} mode has no {property}")]
    NotSampled { mode: String, property: String },

    // === Merge Errors ===
    #[error("Dimension '{label}' conflicts between layers: {reason}")]
    MergeConflict { label: String, reason: String },

    // === Backend Errors ===
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GeoStackError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            GeoStackError::FileNotFound(_)
            | GeoStackError::MissingBoundsVariable { .. }
            | GeoStackError::NoFillValue(_)
            | GeoStackError::MissingVariable(_)
            | GeoStackError::MissingDimension(_)
            | GeoStackError::LayerNotFound(_)
            | GeoStackError::DuplicateLayer(_)
            | GeoStackError::ShapeMismatch(_)
            | GeoStackError::InvalidConfig(_) => ErrorCategory::Configuration,

            GeoStackError::ReprojectionUnavailable { .. }
            | GeoStackError::ReprojectionFailed(_)
            | GeoStackError::NotSampled { .. } => ErrorCategory::ModeConversion,

            GeoStackError::MergeConflict { .. } => ErrorCategory::MergeConflict,

            GeoStackError::Dataset(_) | GeoStackError::Io(_) => ErrorCategory::Backend,
        }
    }

    /// Create a MergeConflict error.
    pub fn merge_conflict(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MergeConflict {
            label: label.into(),
            reason: reason.into(),
        }
    }

    /// Create a NotSampled error.
    pub fn not_sampled(mode: impl Into<String>, property: impl Into<String>) -> Self {
        Self::NotSampled {
            mode: mode.into(),
            property: property.into(),
        }
    }

    /// Create a MissingVariable error.
    pub fn missing_variable(name: impl Into<String>) -> Self {
        Self::MissingVariable(name.into())
    }

    /// Create a ShapeMismatch error.
    pub fn shape_mismatch(msg: impl Into<String>) -> Self {
        Self::ShapeMismatch(msg.into())
    }

    /// Create a Dataset error.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }
}

impl From<serde_json::Error> for GeoStackError {
    fn from(err: serde_json::Error) -> Self {
        GeoStackError::Dataset(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            GeoStackError::FileNotFound("a.nc".into()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            GeoStackError::NoFillValue(DataType::Bool).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(
            GeoStackError::not_sampled("Categorical", "span").category(),
            ErrorCategory::ModeConversion
        );
        assert_eq!(
            GeoStackError::merge_conflict("X", "length 3 != 4").category(),
            ErrorCategory::MergeConflict
        );
    }

    #[test]
    fn test_messages() {
        let err = GeoStackError::ReprojectionUnavailable {
            from: "Projected".into(),
            to: "Mapped".into(),
        };
        assert!(err.to_string().starts_with("Reprojection support unavailable"));

        let err = GeoStackError::MissingBoundsVariable {
            dim: "lat".into(),
            bounds: "lat_bnds".into(),
        };
        assert!(err.to_string().contains("lat_bnds"));
    }
}
