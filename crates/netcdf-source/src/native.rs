//! Native NetCDF backend using the netcdf library.
//!
//! Values of every numeric type are read into the matching [`RasterData`]
//! variant. Coordinate variables whose `units` attribute is a CF time unit
//! (`"days since 1970-01-01"`) are decoded to timestamps, and time
//! coordinates are encoded the same way on write.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Once;

use geostack_common::{AttrValue, Coordinates, DataType, Metadata, RasterData};
use netcdf::types::{FloatType, IntType, NcVariableType};
use netcdf::AttributeValue;
use tracing::{debug, info};

use crate::cftime::{TimeUnits, DEFAULT_TIME_UNITS};
use crate::dataset::{Dataset, DatasetBackend, DatasetWriter};
use crate::error::{SourceError, SourceResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// HDF5 prints diagnostics even for errors that are handled, such as probing
/// for optional attributes. Call once early in `main()`; repeated calls are
/// no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 with null handlers is a documented way to
        // disable error printing and is thread-safe.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

fn nc_err(err: netcdf::Error) -> SourceError {
    SourceError::InvalidFormat(err.to_string())
}

fn dtype_of(var: &netcdf::Variable) -> SourceResult<DataType> {
    Ok(match var.vartype() {
        NcVariableType::Int(IntType::I8) => DataType::I8,
        NcVariableType::Int(IntType::I16) => DataType::I16,
        NcVariableType::Int(IntType::I32) => DataType::I32,
        NcVariableType::Int(IntType::I64) => DataType::I64,
        NcVariableType::Int(IntType::U8) => DataType::U8,
        NcVariableType::Int(IntType::U16) => DataType::U16,
        NcVariableType::Int(IntType::U32) => DataType::U32,
        NcVariableType::Int(IntType::U64) => DataType::U64,
        NcVariableType::Float(FloatType::F32) => DataType::F32,
        NcVariableType::Float(FloatType::F64) => DataType::F64,
        NcVariableType::String | NcVariableType::Char => DataType::Text,
        other => {
            return Err(SourceError::invalid(format!(
                "unsupported type {:?} of variable '{}'",
                other,
                var.name()
            )))
        }
    })
}

fn to_attr_value(value: AttributeValue) -> Option<AttrValue> {
    Some(match value {
        AttributeValue::Uchar(v) => AttrValue::Int(v as i64),
        AttributeValue::Schar(v) => AttrValue::Int(v as i64),
        AttributeValue::Ushort(v) => AttrValue::Int(v as i64),
        AttributeValue::Short(v) => AttrValue::Int(v as i64),
        AttributeValue::Uint(v) => AttrValue::Int(v as i64),
        AttributeValue::Int(v) => AttrValue::Int(v as i64),
        AttributeValue::Ulonglong(v) => AttrValue::Int(i64::try_from(v).ok()?),
        AttributeValue::Longlong(v) => AttrValue::Int(v),
        AttributeValue::Float(v) => AttrValue::Float(v as f64),
        AttributeValue::Double(v) => AttrValue::Float(v),
        AttributeValue::Str(v) => AttrValue::Text(v),
        AttributeValue::Shorts(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
        AttributeValue::Ints(v) => AttrValue::Ints(v.into_iter().map(i64::from).collect()),
        AttributeValue::Longlongs(v) => AttrValue::Ints(v),
        AttributeValue::Floats(v) => AttrValue::Floats(v.into_iter().map(f64::from).collect()),
        AttributeValue::Doubles(v) => AttrValue::Floats(v),
        AttributeValue::Strs(v) => AttrValue::Text(v.join(",")),
        _ => return None,
    })
}

fn read_attributes<'a>(attrs: impl Iterator<Item = netcdf::Attribute<'a>>) -> Metadata {
    attrs
        .filter_map(|attr| {
            let name = attr.name().to_string();
            let value = to_attr_value(attr.value().ok()?)?;
            Some((name, value))
        })
        .collect()
}

macro_rules! read_typed {
    ($var:expr, $extents:expr, $shape:expr, $t:ty) => {{
        let values: Vec<$t> = $var.get_values::<$t, _>($extents).map_err(nc_err)?;
        RasterData::from_shape_vec(&$shape, values)
            .map_err(|e| SourceError::invalid(e.to_string()))?
    }};
}

/// An open NetCDF file.
pub struct NetCdfDataset {
    file: netcdf::File,
    path: PathBuf,
}

impl NetCdfDataset {
    fn var(&self, name: &str) -> SourceResult<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| SourceError::MissingVariable(name.to_string()))
    }
}

impl Drop for NetCdfDataset {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "Closing NetCDF file");
    }
}

impl Dataset for NetCdfDataset {
    fn variable_names(&self) -> Vec<String> {
        self.file.variables().map(|v| v.name()).collect()
    }

    fn dimension_names(&self) -> Vec<String> {
        self.file.dimensions().map(|d| d.name()).collect()
    }

    fn dimension_len(&self, name: &str) -> SourceResult<usize> {
        self.file
            .dimension(name)
            .map(|d| d.len())
            .ok_or_else(|| SourceError::MissingDimension(name.to_string()))
    }

    fn variable_dimensions(&self, var: &str) -> SourceResult<Vec<String>> {
        Ok(self.var(var)?.dimensions().iter().map(|d| d.name()).collect())
    }

    fn variable_dtype(&self, var: &str) -> SourceResult<DataType> {
        dtype_of(&self.var(var)?)
    }

    fn attributes(&self, var: &str) -> SourceResult<Metadata> {
        Ok(read_attributes(self.var(var)?.attributes()))
    }

    fn global_attributes(&self) -> Metadata {
        read_attributes(self.file.attributes())
    }

    fn coordinate(&self, name: &str) -> SourceResult<Coordinates> {
        let var = self.var(name)?;
        if var.dimensions().len() != 1 {
            return Err(SourceError::invalid(format!(
                "coordinate variable '{}' has {} dimensions",
                name,
                var.dimensions().len()
            )));
        }
        if dtype_of(&var)? == DataType::Text {
            let len = var.dimensions()[0].len();
            let labels = (0..len)
                .map(|i| var.get_string([i]).map_err(nc_err))
                .collect::<SourceResult<Vec<_>>>()?;
            return Ok(Coordinates::Text(labels));
        }

        let values: Vec<f64> = var.get_values::<f64, _>(..).map_err(nc_err)?;
        let units = read_attributes(var.attributes())
            .get_str("units")
            .and_then(TimeUnits::parse);
        match units {
            Some(units) => Ok(Coordinates::Time(
                values
                    .into_iter()
                    .map(|v| units.decode(v))
                    .collect::<SourceResult<_>>()?,
            )),
            None => Ok(Coordinates::Numeric(values)),
        }
    }

    fn read(&self, name: &str, window: Option<&[Range<usize>]>) -> SourceResult<RasterData> {
        let var = self.var(name)?;
        let (extents, shape): (netcdf::Extents, Vec<usize>) = match window {
            Some(ranges) => (
                ranges.to_vec().into(),
                ranges.iter().map(|r| r.len()).collect(),
            ),
            None => ((..).into(), var.dimensions().iter().map(|d| d.len()).collect()),
        };
        Ok(match dtype_of(&var)? {
            DataType::I8 => read_typed!(var, extents, shape, i8),
            DataType::I16 => read_typed!(var, extents, shape, i16),
            DataType::I32 => read_typed!(var, extents, shape, i32),
            DataType::I64 => read_typed!(var, extents, shape, i64),
            DataType::U8 => read_typed!(var, extents, shape, u8),
            DataType::U16 => read_typed!(var, extents, shape, u16),
            DataType::U32 => read_typed!(var, extents, shape, u32),
            DataType::U64 => read_typed!(var, extents, shape, u64),
            DataType::F32 => read_typed!(var, extents, shape, f32),
            DataType::F64 => read_typed!(var, extents, shape, f64),
            DataType::Bool | DataType::Text => {
                return Err(SourceError::invalid(format!(
                    "variable '{}' is not numeric",
                    name
                )))
            }
        })
    }
}

fn put_attributes(var: &mut netcdf::VariableMut<'_>, attributes: &Metadata) -> SourceResult<()> {
    for (name, value) in attributes.iter() {
        let result = match value {
            AttrValue::Int(v) => var.put_attribute(name, *v),
            AttrValue::Float(v) => var.put_attribute(name, *v),
            AttrValue::Text(v) => var.put_attribute(name, v.as_str()),
            AttrValue::Ints(v) => var.put_attribute(name, v.clone()),
            AttrValue::Floats(v) => var.put_attribute(name, v.clone()),
        };
        result.map_err(nc_err)?;
    }
    Ok(())
}

/// A NetCDF file being written. Closed when dropped.
pub struct NetCdfWriter {
    file: Option<netcdf::FileMut>,
    path: PathBuf,
}

impl NetCdfWriter {
    fn file(&mut self) -> SourceResult<&mut netcdf::FileMut> {
        self.file
            .as_mut()
            .ok_or_else(|| SourceError::invalid(format!("{} already closed", self.path.display())))
    }

    fn var_mut(&mut self, name: &str) -> SourceResult<netcdf::VariableMut<'_>> {
        self.file()?
            .variable_mut(name)
            .ok_or_else(|| SourceError::MissingVariable(name.to_string()))
    }
}

macro_rules! put_typed {
    ($var:expr, $array:expr) => {{
        let values: Vec<_> = $array.iter().copied().collect();
        $var.put_values(&values, ..).map_err(nc_err)?
    }};
}

impl DatasetWriter for NetCdfWriter {
    fn define_dimension(&mut self, name: &str, len: usize) -> SourceResult<()> {
        self.file()?.add_dimension(name, len).map_err(nc_err)?;
        Ok(())
    }

    fn define_variable(
        &mut self,
        name: &str,
        dtype: DataType,
        dims: &[String],
        attributes: &Metadata,
    ) -> SourceResult<()> {
        let dims: Vec<&str> = dims.iter().map(String::as_str).collect();
        let file = self.file()?;
        let mut var = match dtype {
            DataType::I8 => file.add_variable::<i8>(name, &dims),
            DataType::I16 => file.add_variable::<i16>(name, &dims),
            DataType::I32 => file.add_variable::<i32>(name, &dims),
            DataType::I64 => file.add_variable::<i64>(name, &dims),
            DataType::U8 => file.add_variable::<u8>(name, &dims),
            DataType::U16 => file.add_variable::<u16>(name, &dims),
            DataType::U32 => file.add_variable::<u32>(name, &dims),
            DataType::U64 => file.add_variable::<u64>(name, &dims),
            DataType::F32 => file.add_variable::<f32>(name, &dims),
            DataType::F64 => file.add_variable::<f64>(name, &dims),
            DataType::Text => file.add_string_variable(name, &dims),
            DataType::Bool => {
                return Err(SourceError::invalid(format!(
                    "NetCDF has no boolean type for variable '{}'",
                    name
                )))
            }
        }
        .map_err(nc_err)?;
        put_attributes(&mut var, attributes)
    }

    fn write_data(&mut self, name: &str, data: &RasterData) -> SourceResult<()> {
        let mut var = self.var_mut(name)?;
        match data {
            RasterData::I8(a) => put_typed!(var, a),
            RasterData::I16(a) => put_typed!(var, a),
            RasterData::I32(a) => put_typed!(var, a),
            RasterData::I64(a) => put_typed!(var, a),
            RasterData::U8(a) => put_typed!(var, a),
            RasterData::U16(a) => put_typed!(var, a),
            RasterData::U32(a) => put_typed!(var, a),
            RasterData::U64(a) => put_typed!(var, a),
            RasterData::F32(a) => put_typed!(var, a),
            RasterData::F64(a) => put_typed!(var, a),
            RasterData::Bool(_) => {
                return Err(SourceError::invalid(format!(
                    "NetCDF has no boolean type for variable '{}'",
                    name
                )))
            }
        }
        Ok(())
    }

    fn write_coordinates(&mut self, name: &str, coords: &Coordinates) -> SourceResult<()> {
        let mut var = self.var_mut(name)?;
        match coords {
            Coordinates::Numeric(values) => var.put_values(values, ..).map_err(nc_err)?,
            Coordinates::Text(labels) => {
                for (i, label) in labels.iter().enumerate() {
                    var.put_string(label, [i]).map_err(nc_err)?;
                }
            }
            Coordinates::Time(times) => {
                let declared = read_attributes(var.attributes())
                    .get_str("units")
                    .and_then(TimeUnits::parse);
                let units = match declared {
                    Some(units) => units,
                    None => {
                        var.put_attribute("units", DEFAULT_TIME_UNITS).map_err(nc_err)?;
                        TimeUnits::parse(DEFAULT_TIME_UNITS).ok_or_else(|| {
                            SourceError::invalid("default time units failed to parse")
                        })?
                    }
                };
                let values: Vec<f64> = times.iter().map(|t| units.encode(*t)).collect();
                var.put_values(&values, ..).map_err(nc_err)?;
            }
        }
        Ok(())
    }

    fn set_global_attributes(&mut self, attributes: &Metadata) -> SourceResult<()> {
        let file = self.file()?;
        for (name, value) in attributes.iter() {
            let result = match value {
                AttrValue::Int(v) => file.add_attribute(name, *v),
                AttrValue::Float(v) => file.add_attribute(name, *v),
                AttrValue::Text(v) => file.add_attribute(name, v.as_str()),
                AttrValue::Ints(v) => file.add_attribute(name, v.clone()),
                AttrValue::Floats(v) => file.add_attribute(name, v.clone()),
            };
            result.map_err(nc_err)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> SourceResult<()> {
        if let Some(file) = self.file.take() {
            drop(file);
            info!(path = %self.path.display(), "Wrote NetCDF file");
        }
        Ok(())
    }
}

/// Backend for `.nc` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetCdfBackend;

impl NetCdfBackend {
    pub fn new() -> Self {
        silence_hdf5_errors();
        Self
    }
}

impl DatasetBackend for NetCdfBackend {
    fn name(&self) -> &'static str {
        "netcdf"
    }

    fn open(&self, path: &Path) -> SourceResult<Box<dyn Dataset>> {
        if !path.exists() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        let file = netcdf::open(path)
            .map_err(|e| SourceError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;
        Ok(Box::new(NetCdfDataset {
            file,
            path: path.to_path_buf(),
        }))
    }

    fn create(&self, path: &Path) -> SourceResult<Box<dyn DatasetWriter>> {
        let file = netcdf::create(path)
            .map_err(|e| SourceError::InvalidFormat(format!("Failed to create NetCDF: {}", e)))?;
        Ok(Box::new(NetCdfWriter {
            file: Some(file),
            path: path.to_path_buf(),
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
