//! Coordinate reference system transformations.
//!
//! Dimension mode conversion only ever needs to move a single axis of
//! coordinates from one CRS to another, so the capability is expressed as the
//! [`Reprojector`] trait. [`WebMercator`] implements it for the common
//! EPSG:4326 <-> EPSG:3857 pair; other projections plug in through the same
//! trait.

pub mod mercator;
pub mod reproject;

pub use mercator::WebMercator;
pub use reproject::{AxisKind, ProjectionError, ProjectionResult, Reprojector};
