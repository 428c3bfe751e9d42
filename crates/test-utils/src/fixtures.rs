//! In-memory dataset fixtures.
//!
//! Each fixture is a complete [`MemoryDataset`] that can be inserted into a
//! `MemoryBackend` or saved with the JSON backend.

use geostack_common::{Coordinates, Metadata, RasterData};
use netcdf_source::{JsonBackend, MemoryDataset};
use std::path::{Path, PathBuf};

use crate::generators::{cell_bounds, cell_centers, create_temperature_grid, daily_times, regular_coords};

/// Common axis definitions for testing.
pub mod axes {
    /// Longitude cell centres of a 4-cell 90 degree grid.
    pub const LON_4: [f64; 4] = [-135.0, -45.0, 45.0, 135.0];

    /// Latitude cell centres, north to south.
    pub const LAT_3: [f64; 3] = [60.0, 0.0, -60.0];

    /// Irregular pressure levels in hPa.
    pub const LEVELS: [f64; 4] = [1000.0, 850.0, 500.0, 250.0];
}

/// Fill value used by the fixtures' float layers.
pub const FIXTURE_FILL: f64 = -9999.0;

/// A `(time, lat, lon)` dataset with two layers.
///
/// - `tmax`: f32 temperatures with `_FillValue`
/// - `mask`: i16 land mask over `(lat, lon)` only
///
/// `lon` carries explicit cell bounds in `lon_bnds`; `time` has a daily `delta_t`.
pub fn climate_dataset() -> MemoryDataset {
    let (nt, ny, nx) = (2, axes::LAT_3.len(), axes::LON_4.len());

    let mut tmax = Vec::with_capacity(nt * ny * nx);
    for t in 0..nt {
        tmax.extend(create_temperature_grid(nx, ny).into_iter().map(|v| v + t as f32));
    }
    tmax[0] = FIXTURE_FILL as f32;
    let tmax = raster(&[nt, ny, nx], tmax);
    let lon_bnds = raster(&[nx, 2], cell_bounds(&axes::LON_4));
    let mask = raster(&[ny, nx], vec![0i16, 1, 1, 0, 1, 1, 0, 0, 0, 0, 1, 1]);

    MemoryDataset::new()
        .with_coordinate(
            "time",
            Coordinates::Time(daily_times(2000, 1, 1, nt)),
            Metadata::new().with("delta_t", "0000-00-01 00:00:00"),
        )
        .and_then(|ds| {
            ds.with_coordinate(
                "lat",
                Coordinates::Numeric(axes::LAT_3.to_vec()),
                Metadata::new().with("units", "degrees_north"),
            )
        })
        .and_then(|ds| {
            ds.with_coordinate(
                "lon",
                Coordinates::Numeric(axes::LON_4.to_vec()),
                Metadata::new()
                    .with("units", "degrees_east")
                    .with("bounds", "lon_bnds"),
            )
        })
        .and_then(|ds| ds.with_dimension("bnds", 2))
        .and_then(|ds| {
            ds.with_variable(
                "lon_bnds",
                &["lon", "bnds"],
                lon_bnds,
                Metadata::new(),
            )
        })
        .and_then(|ds| {
            ds.with_variable(
                "tmax",
                &["time", "lat", "lon"],
                tmax,
                Metadata::new()
                    .with("units", "K")
                    .with("_FillValue", FIXTURE_FILL),
            )
        })
        .and_then(|ds| {
            ds.with_variable(
                "mask",
                &["lat", "lon"],
                mask,
                Metadata::new(),
            )
        })
        .map(|ds| ds.with_attributes(Metadata::new().with("title", "climate fixture")))
        .expect("climate fixture is consistent")
}

/// A projected `(y, x)` dataset in Web Mercator metres, no crs attributes.
pub fn mercator_dataset(nx: usize, ny: usize) -> MemoryDataset {
    let x = cell_centers(-2.0e6, 2.0e6, nx);
    let y = regular_coords(1.0e6, -1.0e5, ny);
    let elevation = raster(&[ny, nx], create_temperature_grid(nx, ny));
    MemoryDataset::new()
        .with_coordinate("x", Coordinates::Numeric(x), Metadata::new())
        .and_then(|ds| ds.with_coordinate("y", Coordinates::Numeric(y), Metadata::new()))
        .and_then(|ds| {
            ds.with_variable(
                "elevation",
                &["y", "x"],
                elevation,
                Metadata::new(),
            )
        })
        .expect("mercator fixture is consistent")
}

/// A dataset with a layer over a dimension that has no coordinate variable.
pub fn positional_dataset() -> MemoryDataset {
    let spread = raster(&[3, 4], (0..12).map(|v| v as f64).collect::<Vec<_>>());
    MemoryDataset::new()
        .with_dimension("member", 3)
        .and_then(|ds| ds.with_coordinate("lev", Coordinates::Numeric(axes::LEVELS.to_vec()), Metadata::new()))
        .and_then(|ds| {
            ds.with_variable(
                "spread",
                &["member", "lev"],
                spread,
                Metadata::new(),
            )
        })
        .expect("positional fixture is consistent")
}

fn raster<T>(shape: &[usize], values: Vec<T>) -> RasterData
where
    ndarray::ArrayD<T>: Into<RasterData>,
{
    RasterData::from_shape_vec(shape, values).expect("fixture values fit their shape")
}

/// Save `dataset` as JSON under `dir` and return its path.
pub fn save_json_fixture(dir: &Path, name: &str, dataset: &MemoryDataset) -> PathBuf {
    let path = dir.join(format!("{}.json", name));
    JsonBackend::save(&path, dataset).expect("fixture can be written");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcdf_source::Dataset;

    #[test]
    fn test_climate_dataset_layout() {
        let ds = climate_dataset();
        assert_eq!(ds.variable_dimensions("tmax").unwrap(), vec!["time", "lat", "lon"]);
        assert_eq!(ds.dimension_len("bnds").unwrap(), 2);
        assert_eq!(ds.read("tmax", None).unwrap().get_f64(&[0, 0, 0]), Some(FIXTURE_FILL));
        assert_eq!(ds.global_attributes().get_str("title"), Some("climate fixture"));
    }

    #[test]
    fn test_mercator_dataset_layout() {
        let ds = mercator_dataset(4, 2);
        assert_eq!(
            ds.coordinate("x").unwrap(),
            Coordinates::Numeric(vec![-1.5e6, -0.5e6, 0.5e6, 1.5e6])
        );
    }

    #[test]
    fn test_save_json_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_json_fixture(dir.path(), "positional", &positional_dataset());
        let loaded = JsonBackend::load(&path).unwrap();
        assert_eq!(loaded, positional_dataset());
    }
}
