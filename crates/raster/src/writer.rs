//! Writing arrays and stacks back to datasets.
//!
//! Each dimension becomes a disk dimension named by its lowercased label.
//! Indexed dimensions get a coordinate variable of the same name; explicit
//! spans add a `<name>_bnds` variable over `(<name>, bnds)`. Missing values
//! are written as `_FillValue`.
//!
//! Projected X/Y dimensions that know their mappedcrs are written in mapped
//! coordinates, so files always hold the coordinates they are reopened with.

use std::path::Path;

use dimensions::{convert_mode, shift_to_center, Dimension, IndexMode, ModeClass, Span};
use geostack_common::{DataType, GeoStackResult, Metadata, RasterData};
use netcdf_source::{with_new_dataset, DatasetBackend, DatasetWriter, BOUNDS_ATTR};
use projection::Reprojector;
use tracing::{debug, info};

use crate::array::{Array, UNNAMED};
use crate::config::RasterConfig;
use crate::missing::{apply_missingval, MissingValue};
use crate::source::backend_for_path;
use crate::stack::Stack;

/// Disk dimension holding the two edges of a cell.
pub const BNDS_DIM: &str = "bnds";

fn prepare_dims(
    dims: &[Dimension],
    config: &RasterConfig,
    reprojector: Option<&dyn Reprojector>,
) -> GeoStackResult<Vec<Dimension>> {
    dims.iter()
        .map(|dim| {
            if !dim.label().is_spatial() {
                return Ok(dim.clone());
            }
            let dim = if config.shift_locus {
                shift_to_center(dim)
            } else {
                dim.clone()
            };
            match dim.mode() {
                IndexMode::Projected(p) if p.mappedcrs().is_some() => {
                    debug!(dim = %dim.label(), "Mapping projected dimension for write");
                    convert_mode(ModeClass::Mapped, &dim, reprojector)
                }
                _ => Ok(dim),
            }
        })
        .collect()
}

fn define_dimensions(w: &mut dyn DatasetWriter, dims: &[Dimension]) -> GeoStackResult<()> {
    let mut defined: Vec<String> = Vec::new();
    for dim in dims {
        let name = dim.label().disk_name();
        if defined.contains(&name) {
            continue;
        }
        w.define_dimension(&name, dim.len())?;
        defined.push(name.clone());

        let Some(coords) = dim.index().to_coordinates() else {
            continue;
        };
        let mut attrs = dim.metadata().clone().without(BOUNDS_ATTR);
        let explicit = match dim.mode().span() {
            Ok(Span::Explicit(bounds)) => Some(bounds),
            _ => None,
        };
        let bounds_name = format!("{}_bnds", name);
        if explicit.is_some() {
            attrs = attrs.with(BOUNDS_ATTR, bounds_name.as_str());
        }

        w.define_variable(&name, coords.dtype(), &[name.clone()], &attrs)?;
        w.write_coordinates(&name, &coords)?;

        if let Some(bounds) = explicit {
            if !defined.iter().any(|d| d == BNDS_DIM) {
                w.define_dimension(BNDS_DIM, 2)?;
                defined.push(BNDS_DIM.to_string());
            }
            w.define_variable(
                &bounds_name,
                DataType::F64,
                &[name.clone(), BNDS_DIM.to_string()],
                &Metadata::new(),
            )?;
            w.write_data(&bounds_name, &RasterData::from(bounds.clone().into_dyn()))?;
        }
        debug!(dim = %name, len = dim.len(), bounds = explicit.is_some(), "Defined dimension");
    }
    Ok(())
}

fn write_variable(
    w: &mut dyn DatasetWriter,
    name: &str,
    data: &RasterData,
    dims: &[Dimension],
    metadata: &Metadata,
    missingval: &MissingValue,
) -> GeoStackResult<()> {
    let (filled, attrs) = apply_missingval(data, metadata, missingval)?;
    let dim_names: Vec<String> = dims.iter().map(|d| d.label().disk_name()).collect();
    w.define_variable(name, filled.dtype(), &dim_names, &attrs)?;
    w.write_data(name, &filled)?;
    Ok(())
}

fn variable_name(name: &str) -> &str {
    if name.is_empty() {
        UNNAMED
    } else {
        name
    }
}

/// Write an array with the backend chosen by extension and default config.
///
/// No reprojection is available, so projected X/Y with a different
/// mappedcrs fail with `ReprojectionUnavailable`.
pub fn write_array(path: impl AsRef<Path>, array: &Array) -> GeoStackResult<()> {
    let path = path.as_ref();
    let backend = backend_for_path(path)?;
    write_array_with(backend.as_ref(), path, array, &RasterConfig::default(), None)
}

/// Write an array as a single data variable plus its coordinates.
pub fn write_array_with(
    backend: &dyn DatasetBackend,
    path: &Path,
    array: &Array,
    config: &RasterConfig,
    reprojector: Option<&dyn Reprojector>,
) -> GeoStackResult<()> {
    let dims = prepare_dims(array.dims(), config, reprojector)?;
    let data = array.values()?;
    let name = variable_name(array.name());

    with_new_dataset(backend, path, |w| {
        define_dimensions(w, &dims)?;
        write_variable(w, name, &data, &dims, array.metadata(), array.missingval())
    })?;
    info!(path = %path.display(), var = name, "Wrote array");
    Ok(())
}

/// Write a stack with the backend chosen by extension and default config.
pub fn write_stack(path: impl AsRef<Path>, stack: &Stack) -> GeoStackResult<()> {
    let path = path.as_ref();
    let backend = backend_for_path(path)?;
    write_stack_with(backend.as_ref(), path, stack, &RasterConfig::default(), None)
}

/// Write every layer of a stack into one dataset.
///
/// Layer values are read before the output is created, so a stack may be
/// written over the file it was opened from.
pub fn write_stack_with(
    backend: &dyn DatasetBackend,
    path: &Path,
    stack: &Stack,
    config: &RasterConfig,
    reprojector: Option<&dyn Reprojector>,
) -> GeoStackResult<()> {
    let dims = prepare_dims(stack.dims(), config, reprojector)?;
    let layers = stack
        .keys()
        .iter()
        .map(|key| {
            let layer = stack.layer(key)?;
            let layer_dims = prepare_dims(layer.dims(), config, reprojector)?;
            let data = layer.values()?;
            Ok((layer, layer_dims, data))
        })
        .collect::<GeoStackResult<Vec<_>>>()?;

    with_new_dataset(backend, path, |w| {
        w.set_global_attributes(stack.metadata())?;
        define_dimensions(w, &dims)?;
        for (layer, layer_dims, data) in &layers {
            write_variable(
                w,
                variable_name(layer.name()),
                data,
                layer_dims,
                layer.metadata(),
                layer.missingval(),
            )?;
        }
        Ok(())
    })?;
    info!(path = %path.display(), layers = layers.len(), "Wrote stack");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dimensions::{CrsHints, DimIndex, DimLabel, IndexMode, Locus, Order, SampledMode, Sampling};
    use geostack_common::Crs;
    use netcdf_source::{Dataset, MemoryBackend};

    fn start_locus_x() -> Dimension {
        let mode = IndexMode::projected(
            SampledMode::new(
                Order::forward(),
                Span::regular(1.0),
                Sampling::Intervals(Locus::Start),
            ),
            Some(Crs::WGS84),
            None,
        );
        Dimension::new(
            DimLabel::X,
            DimIndex::Numeric(vec![0.0, 1.0, 2.0]),
            mode,
            Metadata::new(),
        )
    }

    #[test]
    fn test_unnamed_array_and_locus_shift() {
        let data = RasterData::from_shape_vec(&[3], vec![1.0f64, f64::NAN, 3.0]).unwrap();
        let array = Array::new(data, vec![start_locus_x()], "", Metadata::new(), MissingValue::Masked)
            .unwrap();
        let backend = MemoryBackend::new();
        write_array_with(&backend, Path::new("out.nc"), &array, &RasterConfig::default(), None).unwrap();

        let ds = backend.get(Path::new("out.nc")).unwrap();
        assert!(ds.has_variable(UNNAMED));
        assert_eq!(
            ds.coordinate("x").unwrap(),
            geostack_common::Coordinates::Numeric(vec![0.5, 1.5, 2.5])
        );
        assert_eq!(ds.read(UNNAMED, None).unwrap().count_nan(), 0);
        assert!(ds.attributes(UNNAMED).unwrap().contains_key("_FillValue"));
    }

    #[test]
    fn test_no_shift_when_disabled() {
        let data = RasterData::from_shape_vec(&[3], vec![1i32, 2, 3]).unwrap();
        let array = Array::new(data, vec![start_locus_x()], "v", Metadata::new(), MissingValue::None)
            .unwrap();
        let backend = MemoryBackend::new();
        let config = RasterConfig {
            shift_locus: false,
            ..Default::default()
        };
        write_array_with(&backend, Path::new("out.nc"), &array, &config, None).unwrap();

        let ds = backend.get(Path::new("out.nc")).unwrap();
        assert_eq!(
            ds.coordinate("x").unwrap(),
            geostack_common::Coordinates::Numeric(vec![0.0, 1.0, 2.0])
        );
        assert!(!ds.attributes("v").unwrap().contains_key("_FillValue"));
    }

    #[test]
    fn test_explicit_bounds_written() {
        let bounds = ndarray::array![[0.0, 1.0], [1.0, 3.0]];
        let y = Dimension::infer(
            DimLabel::Y,
            DimIndex::Numeric(vec![0.5, 2.0]),
            Some(bounds.clone()),
            Metadata::new(),
            &CrsHints::new(None, None),
        );
        let data = RasterData::from_shape_vec(&[2], vec![1.0f32, 2.0]).unwrap();
        let array = Array::new(data, vec![y], "v", Metadata::new(), MissingValue::None).unwrap();
        let backend = MemoryBackend::new();
        write_array_with(&backend, Path::new("out.nc"), &array, &RasterConfig::default(), None).unwrap();

        let ds = backend.get(Path::new("out.nc")).unwrap();
        assert_eq!(ds.attributes("y").unwrap().get_str(BOUNDS_ATTR), Some("y_bnds"));
        assert_eq!(ds.variable_dimensions("y_bnds").unwrap(), vec!["y", BNDS_DIM]);
        assert_eq!(ds.bounds_matrix("y_bnds").unwrap(), bounds);
    }
}
