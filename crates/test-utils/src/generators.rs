//! Generators for coordinate axes and raster values.
//!
//! These create predictable, verifiable patterns that can be used across the
//! test suite.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use geostack_common::RasterData;

/// `n` evenly spaced values starting at `start`.
///
/// # Example
///
/// ```
/// use test_utils::regular_coords;
///
/// assert_eq!(regular_coords(10.0, -2.5, 3), vec![10.0, 7.5, 5.0]);
/// ```
pub fn regular_coords(start: f64, step: f64, n: usize) -> Vec<f64> {
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Cell centres of a regular grid covering `[min, max]` with `n` cells.
pub fn cell_centers(min: f64, max: f64, n: usize) -> Vec<f64> {
    let step = (max - min) / n.max(1) as f64;
    regular_coords(min + step / 2.0, step, n)
}

/// Values whose steps grow by one each time: `start, start+1, start+3, start+6, ...`
pub fn irregular_coords(start: f64, n: usize) -> Vec<f64> {
    let mut values = Vec::with_capacity(n);
    let mut current = start;
    for i in 0..n {
        values.push(current);
        current += (i + 1) as f64;
    }
    values
}

/// Cell bounds `[lo, hi]` for centres of a regular axis, row-major `(n, 2)`.
pub fn cell_bounds(centers: &[f64]) -> Vec<f64> {
    let half = match centers {
        [a, b, ..] => (b - a).abs() / 2.0,
        _ => 0.5,
    };
    centers
        .iter()
        .flat_map(|c| [c - half, c + half])
        .collect()
}

/// `n` daily timestamps starting at `year-month-day 00:00`.
pub fn daily_times(year: i32, month: u32, day: u32, n: usize) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid start date");
    (0..n)
        .map(|i| start + Duration::days(i as i64))
        .collect()
}

/// Creates a test grid with predictable values.
///
/// Each cell value is `col * 1000 + row`, so it is easy to check that a
/// window was read from the right place.
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Creates a temperature-like grid in Kelvin, 250K top-left to 310K bottom-right.
pub fn create_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x_factor = col as f32 / width.max(1) as f32;
            let y_factor = row as f32 / height.max(1) as f32;
            data.push(250.0 + (x_factor * 30.0) + (y_factor * 30.0));
        }
    }
    data
}

/// A `(height, width)` f32 raster from [`create_test_grid`].
pub fn test_raster(width: usize, height: usize) -> RasterData {
    RasterData::from_shape_vec(&[height, width], create_test_grid(width, height))
        .expect("grid values fit the grid shape")
}

/// A temperature raster with every `nth` cell set to NaN.
pub fn masked_raster(width: usize, height: usize, nth: usize) -> RasterData {
    let mut values = create_temperature_grid(width, height);
    for (i, v) in values.iter_mut().enumerate() {
        if nth > 0 && i % nth == 0 {
            *v = f32::NAN;
        }
    }
    RasterData::from_shape_vec(&[height, width], values).expect("grid values fit the grid shape")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regular_coords() {
        assert_eq!(regular_coords(0.0, 1.0, 4), vec![0.0, 1.0, 2.0, 3.0]);
        assert!(regular_coords(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_cell_centers() {
        assert_eq!(cell_centers(0.0, 10.0, 5), vec![1.0, 3.0, 5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_irregular_coords() {
        assert_eq!(irregular_coords(0.0, 4), vec![0.0, 1.0, 3.0, 6.0]);
    }

    #[test]
    fn test_cell_bounds() {
        assert_eq!(cell_bounds(&[0.5, 1.5]), vec![0.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn test_daily_times() {
        let times = daily_times(2020, 1, 31, 2);
        assert_eq!(times[1].date(), NaiveDate::from_ymd_opt(2020, 2, 1).unwrap());
    }

    #[test]
    fn test_masked_raster() {
        let raster = masked_raster(4, 3, 5);
        assert_eq!(raster.shape(), vec![3, 4]);
        assert_eq!(raster.count_nan(), 3);
    }

    #[test]
    fn test_test_raster_layout() {
        let raster = test_raster(3, 2);
        assert_eq!(raster.get_f64(&[1, 2]), Some(2001.0));
    }
}
