//! Spherical Web Mercator projection (EPSG:3857).
//!
//! Maps WGS84 longitude/latitude onto a plane in meters. Each axis transforms
//! independently of the other:
//! - x = R * lon
//! - y = R * ln(tan(pi/4 + lat/2))
//!
//! which is what makes it usable for per-dimension reprojection.

use std::f64::consts::PI;

use geostack_common::Crs;
use tracing::debug;

use crate::reproject::{AxisKind, ProjectionError, ProjectionResult, Reprojector};

/// Sphere radius used by EPSG:3857 (the WGS84 semi-major axis, meters).
const EARTH_RADIUS: f64 = 6378137.0;

/// Web Mercator <-> WGS84 transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    pub fn new() -> Self {
        Self
    }

    /// Longitude (degrees) to easting (meters).
    pub fn lon_to_x(lon_deg: f64) -> f64 {
        EARTH_RADIUS * lon_deg.to_radians()
    }

    /// Easting (meters) to longitude (degrees).
    pub fn x_to_lon(x: f64) -> f64 {
        (x / EARTH_RADIUS).to_degrees()
    }

    /// Latitude (degrees) to northing (meters). `None` at or beyond the poles.
    pub fn lat_to_y(lat_deg: f64) -> Option<f64> {
        if !(lat_deg.abs() < 90.0) {
            return None;
        }
        let lat = lat_deg.to_radians();
        Some(EARTH_RADIUS * (PI / 4.0 + lat / 2.0).tan().ln())
    }

    /// Northing (meters) to latitude (degrees).
    pub fn y_to_lat(y: f64) -> f64 {
        (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0).to_degrees()
    }

    fn forward(axis: AxisKind, values: &[f64]) -> ProjectionResult<Vec<f64>> {
        values
            .iter()
            .map(|&v| match axis {
                AxisKind::X => Ok(Self::lon_to_x(v)),
                AxisKind::Y => Self::lat_to_y(v).ok_or(ProjectionError::OutOfDomain {
                    value: v,
                    crs: Crs::WEB_MERCATOR.to_string(),
                }),
            })
            .collect()
    }

    fn inverse(axis: AxisKind, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .map(|&v| match axis {
                AxisKind::X => Self::x_to_lon(v),
                AxisKind::Y => Self::y_to_lat(v),
            })
            .collect()
    }
}

impl Reprojector for WebMercator {
    fn supports(&self, source: &Crs, target: &Crs) -> bool {
        let known = |crs: &Crs| *crs == Crs::WGS84 || *crs == Crs::WEB_MERCATOR;
        known(source) && known(target)
    }

    fn reproject(
        &self,
        source: &Crs,
        target: &Crs,
        axis: AxisKind,
        values: &[f64],
    ) -> ProjectionResult<Vec<f64>> {
        if !self.supports(source, target) {
            return Err(ProjectionError::Unsupported {
                from: source.to_string(),
                to: target.to_string(),
            });
        }
        debug!(%source, %target, ?axis, n = values.len(), "Web Mercator reprojection");

        if source == target {
            Ok(values.to_vec())
        } else if *source == Crs::WGS84 {
            Self::forward(axis, values)
        } else {
            Ok(Self::inverse(axis, values))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_points() {
        assert!((WebMercator::lon_to_x(180.0) - 20037508.342789244).abs() < 1e-6);
        assert!(WebMercator::lat_to_y(0.0).unwrap().abs() < 1e-9);
        assert!((WebMercator::lat_to_y(85.051128779806).unwrap() - 20037508.342789244).abs() < 1e-3);
        assert!(WebMercator::lat_to_y(90.0).is_none());
    }

    #[test]
    fn test_roundtrip() {
        let merc = WebMercator::new();
        let lats = vec![-60.0, -10.5, 0.0, 33.3, 70.0];
        let ys = merc
            .reproject(&Crs::WGS84, &Crs::WEB_MERCATOR, AxisKind::Y, &lats)
            .unwrap();
        let back = merc
            .reproject(&Crs::WEB_MERCATOR, &Crs::WGS84, AxisKind::Y, &ys)
            .unwrap();
        for (a, b) in lats.iter().zip(&back) {
            assert!((a - b).abs() < 1e-9, "latitude mismatch: {} vs {}", a, b);
        }
    }

    #[test]
    fn test_unsupported() {
        let merc = WebMercator::new();
        let result = merc.reproject(&Crs::Epsg(32633), &Crs::WGS84, AxisKind::X, &[0.0]);
        assert!(matches!(result, Err(ProjectionError::Unsupported { .. })));
    }

    #[test]
    fn test_pole_is_out_of_domain() {
        let merc = WebMercator::new();
        let result = merc.reproject(&Crs::WGS84, &Crs::WEB_MERCATOR, AxisKind::Y, &[10.0, 90.0]);
        assert!(matches!(result, Err(ProjectionError::OutOfDomain { .. })));
    }
}
