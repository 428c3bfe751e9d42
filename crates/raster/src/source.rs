//! Mapping dataset variables and attributes to arrays and stacks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dimensions::{CrsHints, DimIndex, DimLabel, Dimension};
use geostack_common::{GeoStackError, GeoStackResult};
use netcdf_source::{with_dataset, Dataset, DatasetBackend, JsonBackend, BOUNDS_ATTR};
use tracing::{debug, info};

use crate::array::{Array, DiskSource};
use crate::config::OpenOptions;
use crate::missing::discover_missingval;
use crate::stack::{Stack, StackLayer, StackSource};

/// Pick a backend from the file extension.
///
/// `.json` files use the JSON backend; `.nc` / `.nc4` need the `netcdf`
/// feature.
pub fn backend_for_path(path: &Path) -> GeoStackResult<Arc<dyn DatasetBackend>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "json" => Ok(Arc::new(JsonBackend::new())),
        #[cfg(feature = "netcdf")]
        "nc" | "nc4" => Ok(Arc::new(netcdf_source::NetCdfBackend::new())),
        _ => Err(GeoStackError::InvalidConfig(format!(
            "no dataset backend for '{}'",
            path.display()
        ))),
    }
}

fn resolve_backend(path: &Path, options: &OpenOptions) -> GeoStackResult<Arc<dyn DatasetBackend>> {
    match &options.backend {
        Some(backend) => Ok(Arc::clone(backend)),
        None => backend_for_path(path),
    }
}

fn is_coordinate_variable(ds: &dyn Dataset, name: &str) -> bool {
    ds.has_variable(name)
        && ds
            .variable_dimensions(name)
            .map(|dims| dims.len() == 1 && dims[0] == name)
            .unwrap_or(false)
}

/// Data variables of a dataset, in definition order.
///
/// Coordinate variables and variables named by a `bounds` attribute are not
/// layers.
pub fn layer_names(ds: &dyn Dataset) -> GeoStackResult<Vec<String>> {
    let names = ds.variable_names();
    let mut bounds_vars = Vec::new();
    for name in &names {
        if let Some(bounds) = ds.attributes(name)?.get_str(BOUNDS_ATTR) {
            bounds_vars.push(bounds.to_string());
        }
    }
    Ok(names
        .into_iter()
        .filter(|name| !is_coordinate_variable(ds, name) && !bounds_vars.contains(name))
        .collect())
}

/// Build the dimension for a dataset dimension.
///
/// Without a coordinate variable the dimension is positional.
pub fn read_dimension(ds: &dyn Dataset, name: &str, hints: &CrsHints) -> GeoStackResult<Dimension> {
    let label = DimLabel::from_name(name);
    if !is_coordinate_variable(ds, name) {
        let len = ds.dimension_len(name)?;
        debug!(dim = name, len, "No coordinate variable, using positional index");
        return Ok(Dimension::positional(label, len));
    }

    let attrs = ds.attributes(name)?;
    let bounds = match attrs.get_str(BOUNDS_ATTR) {
        Some(bounds_var) if !ds.has_variable(bounds_var) => {
            return Err(GeoStackError::MissingBoundsVariable {
                dim: name.to_string(),
                bounds: bounds_var.to_string(),
            })
        }
        Some(bounds_var) => Some(ds.bounds_matrix(bounds_var)?),
        None => None,
    };
    let index = DimIndex::from(ds.coordinate(name)?);
    Ok(Dimension::infer(label, index, bounds, attrs, hints))
}

fn read_layer(
    ds: &dyn Dataset,
    key: &str,
    var: &str,
    options: &OpenOptions,
    hints: &CrsHints,
) -> GeoStackResult<StackLayer> {
    let dims = ds
        .variable_dimensions(var)?
        .iter()
        .map(|name| read_dimension(ds, name, hints))
        .collect::<GeoStackResult<Vec<_>>>()?;
    let metadata = ds.attributes(var)?;
    let missingval = match options.missingval {
        Some(missingval) => missingval,
        None => discover_missingval(&metadata, ds.variable_dtype(var)?, options.verify_missingval),
    };
    Ok(StackLayer {
        key: key.to_string(),
        var: var.to_string(),
        dims,
        metadata,
        missingval,
    })
}

fn select_layer(ds: &dyn Dataset, name: Option<&str>) -> GeoStackResult<String> {
    match name {
        Some(name) if ds.has_variable(name) => Ok(name.to_string()),
        Some(name) => Err(GeoStackError::missing_variable(name)),
        None => layer_names(ds)?
            .into_iter()
            .next()
            .ok_or_else(|| GeoStackError::missing_variable("<any data variable>")),
    }
}

/// Open one variable of a dataset as a lazy array.
///
/// The variable is `options.name`, or the first layer of the dataset.
pub fn open_array(path: impl AsRef<Path>, options: &OpenOptions) -> GeoStackResult<Array> {
    let path = path.as_ref();
    let backend = resolve_backend(path, options)?;
    let hints = CrsHints::new(options.crs.clone(), options.mappedcrs.clone());

    let layer = with_dataset(backend.as_ref(), path, |ds| {
        let var = select_layer(ds, options.name.as_deref())?;
        read_layer(ds, &var, &var, options, &hints)
    })?;

    info!(path = %path.display(), var = %layer.var, dims = layer.dims.len(), "Opened array");
    let shape: Vec<usize> = layer.dims.iter().map(Dimension::len).collect();
    let source = DiskSource::new(backend, path, layer.var.clone(), &shape);
    Array::from_disk(source, layer.dims, layer.key, layer.metadata, layer.missingval)
}

/// Open every layer of a dataset as a stack.
pub fn open_stack(path: impl AsRef<Path>, options: &OpenOptions) -> GeoStackResult<Stack> {
    let path = path.as_ref();
    let backend = resolve_backend(path, options)?;
    let hints = CrsHints::new(options.crs.clone(), options.mappedcrs.clone());

    let (layers, metadata) = with_dataset(backend.as_ref(), path, |ds| {
        let layers = layer_names(ds)?
            .iter()
            .map(|var| read_layer(ds, var, var, options, &hints))
            .collect::<GeoStackResult<Vec<_>>>()?;
        Ok((layers, ds.global_attributes()))
    })?;

    info!(path = %path.display(), layers = layers.len(), "Opened stack");
    let source = StackSource::SingleFile {
        backend,
        path: path.to_path_buf(),
    };
    Stack::from_layers(source, layers, metadata)
}

/// Open a stack with one dataset per layer key.
///
/// Each file contributes `options.name`, or its first layer. The backend is
/// chosen from the first path unless `options.backend` is set.
pub fn open_stack_files(paths: &[(String, PathBuf)], options: &OpenOptions) -> GeoStackResult<Stack> {
    let Some((_, first)) = paths.first() else {
        return Err(GeoStackError::InvalidConfig(
            "a stack needs at least one file".to_string(),
        ));
    };
    let backend = resolve_backend(first, options)?;
    let hints = CrsHints::new(options.crs.clone(), options.mappedcrs.clone());

    let mut layers = Vec::with_capacity(paths.len());
    let mut files = BTreeMap::new();
    for (key, path) in paths {
        let layer = with_dataset(backend.as_ref(), path, |ds| {
            let var = select_layer(ds, options.name.as_deref())?;
            read_layer(ds, key, &var, options, &hints)
        })?;
        debug!(key = %key, path = %path.display(), var = %layer.var, "Read layer");
        layers.push(layer);
        files.insert(key.clone(), path.clone());
    }

    info!(layers = layers.len(), "Opened stack from files");
    let source = StackSource::Files {
        backend,
        paths: files,
    };
    Stack::from_layers(source, layers, Default::default())
}
