//! Shared test utilities for the geostack workspace.
//!
//! Generators build coordinate axes and raster values; fixtures build
//! complete in-memory datasets for the backends. Pull it in as a
//! dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod logs;

pub use fixtures::*;
pub use generators::*;
pub use logs::capture_warnings;

/// Assert two numbers differ by at most `tol`.
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(WebMercator::x_to_lon(x), 135.0, 1e-9);
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($got:expr, $want:expr, $tol:expr) => {{
        let (got, want, tol) = ($got as f64, $want as f64, $tol as f64);
        assert!(
            (got - want).abs() <= tol,
            "assertion failed: {} is not within {} of {} (off by {})",
            got,
            tol,
            want,
            (got - want).abs()
        );
    }};
}

/// Assert two coordinate slices have the same length and agree element-wise within `tol`.
#[macro_export]
macro_rules! assert_coords_approx_eq {
    ($got:expr, $want:expr, $tol:expr) => {{
        let got: &[f64] = $got;
        let want: &[f64] = $want;
        assert_eq!(got.len(), want.len(), "coordinate lengths differ");
        for (g, w) in got.iter().zip(want) {
            $crate::assert_approx_eq!(*g, *w, $tol);
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_within_tolerance() {
        assert_approx_eq!(0.1 + 0.2, 0.3, 1e-12);
        assert_approx_eq!(-1.0e6, -1.0e6 - 0.5, 1.0);
    }

    #[test]
    #[should_panic(expected = "is not within")]
    fn test_outside_tolerance() {
        assert_approx_eq!(2.0, 1.0, 0.5);
    }

    #[test]
    fn test_coordinate_slices() {
        assert_coords_approx_eq!(&[0.5, 1.5, 2.5], &[0.5, 1.5, 2.5000001], 1e-6);
    }

    #[test]
    #[should_panic(expected = "coordinate lengths differ")]
    fn test_coordinate_length_mismatch() {
        assert_coords_approx_eq!(&[1.0], &[1.0, 2.0], 0.001);
    }
}
