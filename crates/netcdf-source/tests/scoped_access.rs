//! Scoped open/create through the backends.

use std::path::Path;

use geostack_common::{
    Coordinates, DataType, ErrorCategory, GeoStackError, GeoStackResult, Metadata, RasterData,
};
use netcdf_source::{
    with_dataset, with_new_dataset, Dataset, DatasetBackend, JsonBackend, MemoryBackend,
    MemoryDataset,
};

fn write_grid(backend: &dyn DatasetBackend, path: &Path) -> GeoStackResult<()> {
    with_new_dataset(backend, path, |w| {
        w.define_dimension("x", 3)?;
        w.define_variable("x", DataType::F64, &["x".to_string()], &Metadata::new())?;
        w.write_coordinates("x", &Coordinates::Numeric(vec![0.5, 1.5, 2.5]))?;
        w.define_variable(
            "elevation",
            DataType::I16,
            &["x".to_string()],
            &Metadata::new().with("_FillValue", -9999i64),
        )?;
        w.write_data(
            "elevation",
            &RasterData::from_shape_vec(&[3], vec![10i16, 20, -9999])?,
        )?;
        Ok(())
    })
}

#[test]
fn memory_handles_released_on_error() {
    let backend = MemoryBackend::new();
    let path = Path::new("grid.nc");
    write_grid(&backend, path).unwrap();
    assert_eq!(backend.open_handles(), 0);

    let result: GeoStackResult<RasterData> =
        with_dataset(&backend, path, |ds| Ok(ds.read("missing", None)?));
    assert!(matches!(result, Err(GeoStackError::MissingVariable(_))));
    assert_eq!(backend.open_handles(), 0);

    let coords = with_dataset(&backend, path, |ds| Ok(ds.coordinate("x")?)).unwrap();
    assert_eq!(coords, Coordinates::Numeric(vec![0.5, 1.5, 2.5]));
    assert_eq!(backend.open_handles(), 0);
}

#[test]
fn missing_dataset_is_configuration_error() {
    let backend = MemoryBackend::new();
    let err = with_dataset(&backend, Path::new("nope.nc"), |ds| Ok(ds.variable_names()))
        .unwrap_err();
    assert!(matches!(err, GeoStackError::FileNotFound(_)));
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn json_round_trip_through_writer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("grid.json");
    let backend = JsonBackend::new();
    write_grid(&backend, &path).unwrap();

    let (dims, attrs, data) = with_dataset(&backend, &path, |ds| {
        Ok((
            ds.variable_dimensions("elevation")?,
            ds.attributes("elevation")?,
            ds.read("elevation", Some(&[1..3]))?,
        ))
    })
    .unwrap();
    assert_eq!(dims, vec!["x"]);
    assert_eq!(attrs.get_f64("_FillValue"), Some(-9999.0));
    assert_eq!(data.shape(), vec![2]);
    assert_eq!(data.get_f64(&[0]), Some(20.0));
}

#[test]
fn failed_write_is_not_flushed() {
    let backend = MemoryBackend::new();
    let path = Path::new("partial.nc");
    let result: GeoStackResult<()> = with_new_dataset(&backend, path, |w| {
        w.define_dimension("x", 2)?;
        w.define_variable("v", DataType::F32, &["y".to_string()], &Metadata::new())?;
        Ok(())
    });
    assert!(matches!(result, Err(GeoStackError::MissingDimension(_))));
    assert!(!backend.exists(path));
    assert_eq!(backend.open_handles(), 0);
}

#[test]
fn bounds_matrix_shape_checked() {
    let ds = MemoryDataset::new()
        .with_dimension("x", 2)
        .unwrap()
        .with_dimension("bnds", 2)
        .unwrap()
        .with_variable(
            "x_bnds",
            &["x", "bnds"],
            RasterData::from_shape_vec(&[2, 2], vec![0.0f64, 1.0, 1.0, 2.0]).unwrap(),
            Metadata::new(),
        )
        .unwrap();
    let bounds = ds.bounds_matrix("x_bnds").unwrap();
    assert_eq!(bounds[[1, 0]], 1.0);

    let ds = ds
        .with_dimension("three", 3)
        .unwrap()
        .with_variable(
            "bad_bnds",
            &["three"],
            RasterData::from_shape_vec(&[3], vec![0.0f64; 3]).unwrap(),
            Metadata::new(),
        )
        .unwrap();
    assert!(ds.bounds_matrix("bad_bnds").is_err());
}
