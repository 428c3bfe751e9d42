//! The reprojection capability consumed by mode conversion.

use geostack_common::{Crs, GeoStackError};
use thiserror::Error;

/// Result type for projection operations.
pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// Error types for projection operations.
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// No transform is known between the two systems
    #[error("Unsupported transform from {from} to {to}")]
    Unsupported { from: String, to: String },

    /// A coordinate lies outside the projection's valid domain
    #[error("Coordinate {value} is outside the domain of {crs}")]
    OutOfDomain { value: f64, crs: String },
}

impl From<ProjectionError> for GeoStackError {
    fn from(err: ProjectionError) -> Self {
        GeoStackError::ReprojectionFailed(err.to_string())
    }
}

/// Which coordinate of a point an index holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    /// Longitude / easting
    X,
    /// Latitude / northing
    Y,
}

/// Transforms single-axis coordinate arrays between reference systems.
///
/// Implementations must return one output value per input value, in order.
pub trait Reprojector {
    /// Whether a transform from `source` to `target` is available.
    fn supports(&self, source: &Crs, target: &Crs) -> bool;

    /// Transform `values` along `axis` from `source` to `target`.
    fn reproject(
        &self,
        source: &Crs,
        target: &Crs,
        axis: AxisKind,
        values: &[f64],
    ) -> ProjectionResult<Vec<f64>>;
}
