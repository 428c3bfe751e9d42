//! Opening, slicing and writing arrays and stacks through the dataset backends.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dimensions::{DimLabel, IndexMode, ModeClass, Span, Step};
use geostack_common::{
    Coordinates, Crs, DataType, ErrorCategory, GeoStackError, Period, RasterData, Scalar,
};
use geostack_raster::{
    open_array, open_stack, open_stack_files, write_array_with, write_stack, write_stack_with,
    MissingValue, OpenOptions, RasterConfig, Selector, FILL_VALUE_ATTR,
};
use netcdf_source::{Dataset, JsonBackend, MemoryBackend, MemoryDataset};
use projection::WebMercator;
use test_utils::{
    assert_approx_eq, axes, climate_dataset, mercator_dataset, positional_dataset,
    save_json_fixture, FIXTURE_FILL,
};

fn memory_options(path: &str, dataset: MemoryDataset) -> (MemoryBackend, OpenOptions) {
    let backend = MemoryBackend::new();
    backend.insert(path, dataset);
    let options = OpenOptions::new().backend(Arc::new(backend.clone()));
    (backend, options)
}

#[test]
fn open_stack_discovers_layers_and_modes() {
    let (backend, options) = memory_options("climate.nc", climate_dataset());
    let stack = open_stack("climate.nc", &options).unwrap();
    assert_eq!(backend.open_handles(), 0);

    assert_eq!(stack.keys(), &["tmax".to_string(), "mask".to_string()]);
    assert_eq!(stack.layerdims("mask").unwrap(), &[DimLabel::Y, DimLabel::X]);
    assert_eq!(stack.metadata().get_str("title"), Some("climate fixture"));
    assert_eq!(
        stack.layermissingval("tmax").unwrap(),
        &MissingValue::Value(Scalar::F32(FIXTURE_FILL as f32))
    );
    assert_eq!(stack.layermissingval("mask").unwrap(), &MissingValue::None);

    let lon = stack.dim(&DimLabel::X).unwrap();
    assert!(matches!(lon.mode(), IndexMode::Mapped(_)));
    assert!(matches!(lon.mode().span().unwrap(), Span::Explicit(_)));
    assert_eq!(lon.bounds(), Some((-180.0, 180.0)));

    let lat = stack.dim(&DimLabel::Y).unwrap();
    assert_eq!(lat.mode().crs(), Some(&Crs::WGS84));
    assert!(lat.mode().order().unwrap().is_reverse_index());

    let time = stack.dim(&DimLabel::Time).unwrap();
    assert_eq!(
        time.mode().span().unwrap(),
        &Span::Regular(Step::Period(Period::parse("0000-00-01 00:00:00").unwrap()))
    );
}

#[test]
fn layer_select_reads_lazily() {
    let (backend, options) = memory_options("climate.nc", climate_dataset());
    let stack = open_stack("climate.nc", &options).unwrap();

    let tmax = stack.layer("tmax").unwrap();
    assert!(tmax.is_disk());
    let first = tmax.select(&DimLabel::Time, Selector::At(1)).unwrap();
    assert_eq!(first.shape(), vec![axes::LAT_3.len(), axes::LON_4.len()]);
    assert_eq!(first.refdims()[0].label(), &DimLabel::Time);
    assert_eq!(backend.open_handles(), 0);

    let corner = first
        .select(&DimLabel::Y, Selector::Range(0..1))
        .unwrap()
        .select(&DimLabel::X, Selector::Range(2..4))
        .unwrap()
        .read()
        .unwrap();
    let values = corner.values().unwrap();
    assert_eq!(values.shape(), vec![1, 2]);
    assert_eq!(values.get_f64(&[0, 0]), Some(250.0 + 15.0 + 1.0));
    assert_eq!(backend.open_handles(), 0);
    assert_eq!(corner.dim(&DimLabel::X).unwrap().len(), 2);
}

#[test]
fn open_array_by_name_and_override_missingval() {
    let (_, options) = memory_options("climate.nc", climate_dataset());
    let array = open_array("climate.nc", &options.clone().name("mask")).unwrap();
    assert_eq!(array.name(), "mask");
    assert_eq!(array.shape(), vec![3, 4]);

    let array = open_array(
        "climate.nc",
        &options.missingval(MissingValue::Value(Scalar::I16(0))),
    )
    .unwrap();
    assert_eq!(array.name(), "tmax");
    assert_eq!(array.missingval(), &MissingValue::Value(Scalar::I16(0)));
}

#[test]
fn positional_dimensions() {
    let (_, options) = memory_options("ens.nc", positional_dataset());
    let array = open_array("ens.nc", &options).unwrap();
    let member = array.dim(&DimLabel::Named("member".to_string())).unwrap();
    assert!(member.index().is_positional());
    assert_eq!(member.mode(), &IndexMode::NoIndex);

    let lev = array.dim(&DimLabel::Z).unwrap();
    assert!(matches!(lev.mode().span().unwrap(), Span::Irregular(Some(_))));
}

#[test]
fn two_names_for_one_axis_rejected() {
    let dataset = MemoryDataset::new()
        .with_coordinate("lat", Coordinates::Numeric(vec![10.0, 20.0]), Default::default())
        .unwrap()
        .with_coordinate("y", Coordinates::Numeric(vec![0.0, 1.0, 2.0]), Default::default())
        .unwrap()
        .with_variable(
            "v",
            &["lat", "y"],
            RasterData::from_shape_vec(&[2, 3], vec![0.0f64; 6]).unwrap(),
            Default::default(),
        )
        .unwrap();
    let (_, options) = memory_options("dup.nc", dataset);
    let err = open_array("dup.nc", &options).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Configuration);
    let err = open_stack("dup.nc", &options).unwrap_err();
    assert!(matches!(err, GeoStackError::InvalidConfig(_)));
}

#[test]
fn missing_file_is_configuration_error() {
    let options = OpenOptions::new().backend(Arc::new(MemoryBackend::new()));
    let err = open_stack("absent.nc", &options).unwrap_err();
    assert!(matches!(err, GeoStackError::FileNotFound(_)));
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn stack_round_trip_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = save_json_fixture(dir.path(), "climate", &climate_dataset());
    let stack = open_stack(&input, &OpenOptions::new()).unwrap();

    let output = dir.path().join("written.json");
    write_stack(&output, &stack).unwrap();

    let written = JsonBackend::load(&output).unwrap();
    assert_eq!(written.variable_dimensions("tmax").unwrap(), vec!["time", "y", "x"]);
    assert_eq!(written.attributes("x").unwrap().get_str("bounds"), Some("x_bnds"));
    assert_eq!(
        written.attributes("tmax").unwrap().get_f64(FILL_VALUE_ATTR),
        Some(FIXTURE_FILL)
    );
    assert_eq!(written.global_attributes().get_str("title"), Some("climate fixture"));

    let reopened = open_stack(&output, &OpenOptions::new()).unwrap();
    assert_eq!(reopened.keys(), stack.keys());
    for (a, b) in reopened.dims().iter().zip(stack.dims()) {
        assert!(a.index().approx_eq(b.index()), "{} index changed", a.label());
        assert!(a.mode().approx_eq(b.mode()), "{} mode changed", a.label());
    }
    let tmax = reopened.layer("tmax").unwrap().values().unwrap();
    assert_eq!(tmax, stack.layer("tmax").unwrap().values().unwrap());
}

#[test]
fn subset_drops_unused_dimensions() {
    let dir = tempfile::tempdir().unwrap();
    let input = save_json_fixture(dir.path(), "climate", &climate_dataset());
    let stack = open_stack(&input, &OpenOptions::new()).unwrap();

    let mask_only = stack.subset(&["mask"]).unwrap();
    assert!(mask_only.dim(&DimLabel::Time).is_none());
    assert!(matches!(
        mask_only.layer("tmax"),
        Err(GeoStackError::LayerNotFound(_))
    ));

    let output = dir.path().join("mask.json");
    write_stack(&output, &mask_only).unwrap();
    let written = JsonBackend::load(&output).unwrap();
    assert_eq!(written.variable_names(), vec!["y", "x", "x_bnds", "mask"]);
}

#[test]
fn stack_files_merge_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let a = save_json_fixture(dir.path(), "a", &mercator_dataset(4, 2));
    let b = save_json_fixture(dir.path(), "b", &mercator_dataset(4, 2));
    let c = save_json_fixture(dir.path(), "c", &mercator_dataset(5, 2));

    let paths: Vec<(String, PathBuf)> = vec![("a".into(), a.clone()), ("b".into(), b)];
    let stack = open_stack_files(&paths, &OpenOptions::new()).unwrap();
    assert_eq!(stack.len(), 2);
    assert_eq!(stack.layer("b").unwrap().shape(), vec![2, 4]);

    let paths: Vec<(String, PathBuf)> = vec![("a".into(), a), ("c".into(), c)];
    let err = open_stack_files(&paths, &OpenOptions::new()).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::MergeConflict);
}

#[test]
fn convert_array_between_projected_and_mapped() {
    let (_, options) = memory_options("climate.nc", climate_dataset());
    let array = open_array("climate.nc", &options.crs(Crs::WEB_MERCATOR)).unwrap();
    assert_eq!(array.crs(), Some(&Crs::WEB_MERCATOR));

    let err = array.convert_mode(ModeClass::Projected, None).unwrap_err();
    assert!(matches!(err, GeoStackError::ReprojectionUnavailable { .. }));

    let projected = array
        .convert_mode(ModeClass::Projected, Some(&WebMercator::new()))
        .unwrap();
    let x = projected.dim(&DimLabel::X).unwrap();
    assert!(matches!(x.mode(), IndexMode::Projected(_)));
    let metres = x.index().as_numeric().unwrap();
    assert_approx_eq!(metres[3], WebMercator::lon_to_x(135.0), 1e-6);

    let mapped = projected
        .convert_mode(ModeClass::Mapped, Some(&WebMercator::new()))
        .unwrap();
    let degrees = mapped.dim(&DimLabel::X).unwrap().index().as_numeric().unwrap().to_vec();
    for (got, want) in degrees.iter().zip(axes::LON_4) {
        assert_approx_eq!(*got, want, 1e-9);
    }
}

#[test]
fn projected_stack_is_written_mapped() {
    let (_, options) = memory_options("climate.nc", climate_dataset());
    let options = options.crs(Crs::WEB_MERCATOR);
    let projected = open_stack("climate.nc", &options)
        .unwrap()
        .convert_mode(ModeClass::Projected, Some(&WebMercator::new()))
        .unwrap();
    assert!(matches!(
        projected.dim(&DimLabel::X).unwrap().mode(),
        IndexMode::Projected(_)
    ));

    let out = MemoryBackend::new();
    let err = write_stack_with(&out, Path::new("p.nc"), &projected, &RasterConfig::default(), None)
        .unwrap_err();
    assert!(matches!(err, GeoStackError::ReprojectionUnavailable { .. }));
    assert!(!netcdf_source::DatasetBackend::exists(&out, Path::new("p.nc")));

    write_stack_with(
        &out,
        Path::new("p.nc"),
        &projected,
        &RasterConfig::default(),
        Some(&WebMercator::new()),
    )
    .unwrap();
    let reopened = open_stack(
        "p.nc",
        &OpenOptions::new().crs(Crs::WEB_MERCATOR).backend(Arc::new(out)),
    )
    .unwrap();
    let x = reopened.dim(&DimLabel::X).unwrap();
    assert!(matches!(x.mode(), IndexMode::Mapped(_)));
    for (got, want) in x.index().as_numeric().unwrap().iter().zip(axes::LON_4) {
        assert_approx_eq!(*got, want, 1e-6);
    }
    let y = reopened.dim(&DimLabel::Y).unwrap();
    for (got, want) in y.index().as_numeric().unwrap().iter().zip(axes::LAT_3) {
        assert_approx_eq!(*got, want, 1e-6);
    }
}

#[test]
fn write_masked_array_fills_nan() {
    let backend = MemoryBackend::new();
    let (_, options) = memory_options("m.nc", mercator_dataset(3, 2));
    let array = open_array("m.nc", &options).unwrap().read().unwrap();

    let values = test_utils::masked_raster(3, 2, 2);
    let masked = geostack_raster::Array::new(
        values,
        array.dims().to_vec(),
        "elevation",
        array.metadata().clone(),
        MissingValue::Masked,
    )
    .unwrap();
    write_array_with(&backend, Path::new("out.nc"), &masked, &RasterConfig::default(), None).unwrap();

    let written = backend.get(Path::new("out.nc")).unwrap();
    let data = written.read("elevation", None).unwrap();
    assert_eq!(data.count_nan(), 0);
    let fill = DataType::F32.default_fill().unwrap().as_f64();
    assert_eq!(data.get_f64(&[0, 0]), Some(fill));
    assert_eq!(written.attributes("elevation").unwrap().get_f64(FILL_VALUE_ATTR), Some(fill));
}

#[test]
fn bool_layer_without_fill_value_cannot_be_masked() {
    let backend = MemoryBackend::new();
    let (_, options) = memory_options("m.nc", mercator_dataset(2, 1));
    let array = open_array("m.nc", &options).unwrap();
    let flags = geostack_raster::Array::new(
        RasterData::from_shape_vec(&[1, 2], vec![true, false]).unwrap(),
        array.dims().to_vec(),
        "flags",
        Default::default(),
        MissingValue::Masked,
    )
    .unwrap();
    let err = write_array_with(&backend, Path::new("f.nc"), &flags, &RasterConfig::default(), None)
        .unwrap_err();
    assert!(matches!(err, GeoStackError::NoFillValue(DataType::Bool)));
    assert!(!netcdf_source::DatasetBackend::exists(&backend, Path::new("f.nc")));
}
