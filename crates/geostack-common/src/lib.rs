//! Common types and utilities shared across all geostack crates.

pub mod crs;
pub mod error;
pub mod metadata;
pub mod period;
pub mod values;

pub use crs::{Crs, CrsParseError};
pub use error::{ErrorCategory, GeoStackError, GeoStackResult};
pub use metadata::{AttrValue, Metadata};
pub use period::{Period, PeriodUnit};
pub use values::{Coordinates, DataType, RasterData, Scalar};
