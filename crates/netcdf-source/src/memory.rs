//! In-memory datasets and a shared in-process backend.

use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use geostack_common::{Coordinates, DataType, Metadata, RasterData};
use ndarray::{ArrayD, IxDyn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::dataset::{Dataset, DatasetBackend, DatasetWriter};
use crate::error::{SourceError, SourceResult};

/// Values held by a variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariableValues {
    /// Defined but not yet written.
    Empty,
    Data(RasterData),
    /// One-dimensional coordinate values, including time and text.
    Coordinates(Coordinates),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionDef {
    pub name: String,
    pub len: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDef {
    pub name: String,
    pub dtype: DataType,
    pub dimensions: Vec<String>,
    pub attributes: Metadata,
    pub values: VariableValues,
}

/// A complete dataset held in memory.
///
/// Serves as the storage model of the memory and JSON backends, and as a
/// builder for test fixtures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDataset {
    dimensions: Vec<DimensionDef>,
    variables: Vec<VariableDef>,
    attributes: Metadata,
}

impl MemoryDataset {
    pub fn new() -> Self {
        Self::default()
    }

    fn variable(&self, name: &str) -> SourceResult<&VariableDef> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| SourceError::MissingVariable(name.to_string()))
    }

    fn variable_mut(&mut self, name: &str) -> SourceResult<&mut VariableDef> {
        self.variables
            .iter_mut()
            .find(|v| v.name == name)
            .ok_or_else(|| SourceError::MissingVariable(name.to_string()))
    }

    fn expected_shape(&self, var: &VariableDef) -> SourceResult<Vec<usize>> {
        var.dimensions
            .iter()
            .map(|d| self.dimension_len(d))
            .collect()
    }

    pub fn define_dimension(&mut self, name: &str, len: usize) -> SourceResult<()> {
        match self.dimensions.iter().find(|d| d.name == name) {
            Some(existing) if existing.len == len => Ok(()),
            Some(existing) => Err(SourceError::invalid(format!(
                "dimension '{}' already defined with length {}",
                name, existing.len
            ))),
            None => {
                self.dimensions.push(DimensionDef {
                    name: name.to_string(),
                    len,
                });
                Ok(())
            }
        }
    }

    pub fn define_variable(
        &mut self,
        name: &str,
        dtype: DataType,
        dims: &[String],
        attributes: &Metadata,
    ) -> SourceResult<()> {
        if self.variables.iter().any(|v| v.name == name) {
            return Err(SourceError::invalid(format!("variable '{}' already defined", name)));
        }
        for dim in dims {
            self.dimension_len(dim)?;
        }
        self.variables.push(VariableDef {
            name: name.to_string(),
            dtype,
            dimensions: dims.to_vec(),
            attributes: attributes.clone(),
            values: VariableValues::Empty,
        });
        Ok(())
    }

    pub fn write_data(&mut self, name: &str, data: &RasterData) -> SourceResult<()> {
        let var = self.variable(name)?;
        let expected = self.expected_shape(var)?;
        if data.shape() != expected {
            return Err(SourceError::invalid(format!(
                "data of shape {:?} written to '{}' of shape {:?}",
                data.shape(),
                name,
                expected
            )));
        }
        if data.dtype() != var.dtype {
            return Err(SourceError::invalid(format!(
                "{} data written to {} variable '{}'",
                data.dtype(),
                var.dtype,
                name
            )));
        }
        self.variable_mut(name)?.values = VariableValues::Data(data.clone());
        Ok(())
    }

    pub fn write_coordinates(&mut self, name: &str, coords: &Coordinates) -> SourceResult<()> {
        let var = self.variable(name)?;
        let expected = self.expected_shape(var)?;
        if expected != [coords.len()] {
            return Err(SourceError::invalid(format!(
                "{} coordinate values written to '{}' of shape {:?}",
                coords.len(),
                name,
                expected
            )));
        }
        self.variable_mut(name)?.values = VariableValues::Coordinates(coords.clone());
        Ok(())
    }

    pub fn set_global_attributes(&mut self, attributes: &Metadata) {
        self.attributes = attributes.clone();
    }

    /// Builder: add a dimension.
    pub fn with_dimension(mut self, name: &str, len: usize) -> SourceResult<Self> {
        self.define_dimension(name, len)?;
        Ok(self)
    }

    /// Builder: add a one-dimensional coordinate variable over the dimension of the same name.
    ///
    /// The dimension is defined when missing.
    pub fn with_coordinate(
        mut self,
        name: &str,
        coords: Coordinates,
        attributes: Metadata,
    ) -> SourceResult<Self> {
        self.define_dimension(name, coords.len())?;
        self.define_variable(name, coords.dtype(), &[name.to_string()], &attributes)?;
        self.write_coordinates(name, &coords)?;
        Ok(self)
    }

    /// Builder: add a data variable.
    pub fn with_variable(
        mut self,
        name: &str,
        dims: &[&str],
        data: RasterData,
        attributes: Metadata,
    ) -> SourceResult<Self> {
        let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
        self.define_variable(name, data.dtype(), &dims, &attributes)?;
        self.write_data(name, &data)?;
        Ok(self)
    }

    /// Builder: set the global attributes.
    pub fn with_attributes(mut self, attributes: Metadata) -> Self {
        self.attributes = attributes;
        self
    }

    /// Number of NaN cells across all data variables.
    pub fn count_nan(&self) -> usize {
        self.variables
            .iter()
            .map(|v| match &v.values {
                VariableValues::Data(d) => d.count_nan(),
                VariableValues::Coordinates(Coordinates::Numeric(c)) => {
                    c.iter().filter(|x| x.is_nan()).count()
                }
                _ => 0,
            })
            .sum()
    }
}

impl Dataset for MemoryDataset {
    fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|v| v.name.clone()).collect()
    }

    fn dimension_names(&self) -> Vec<String> {
        self.dimensions.iter().map(|d| d.name.clone()).collect()
    }

    fn dimension_len(&self, name: &str) -> SourceResult<usize> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.len)
            .ok_or_else(|| SourceError::MissingDimension(name.to_string()))
    }

    fn variable_dimensions(&self, var: &str) -> SourceResult<Vec<String>> {
        Ok(self.variable(var)?.dimensions.clone())
    }

    fn variable_dtype(&self, var: &str) -> SourceResult<DataType> {
        Ok(self.variable(var)?.dtype)
    }

    fn attributes(&self, var: &str) -> SourceResult<Metadata> {
        Ok(self.variable(var)?.attributes.clone())
    }

    fn global_attributes(&self) -> Metadata {
        self.attributes.clone()
    }

    fn coordinate(&self, var: &str) -> SourceResult<Coordinates> {
        let def = self.variable(var)?;
        match &def.values {
            VariableValues::Coordinates(c) => Ok(c.clone()),
            VariableValues::Data(d) if d.ndim() == 1 => {
                Ok(Coordinates::Numeric(d.to_f64_array().iter().copied().collect()))
            }
            VariableValues::Data(d) => Err(SourceError::invalid(format!(
                "coordinate variable '{}' has {} dimensions",
                var,
                d.ndim()
            ))),
            VariableValues::Empty => Err(SourceError::MissingData(var.to_string())),
        }
    }

    fn read(&self, var: &str, window: Option<&[Range<usize>]>) -> SourceResult<RasterData> {
        let def = self.variable(var)?;
        let data = match &def.values {
            VariableValues::Data(d) => d.clone(),
            VariableValues::Coordinates(Coordinates::Numeric(values)) => RasterData::F64(
                ArrayD::from_shape_vec(IxDyn(&[values.len()]), values.clone())
                    .map_err(|e| SourceError::invalid(e.to_string()))?,
            ),
            VariableValues::Coordinates(_) => {
                return Err(SourceError::invalid(format!(
                    "variable '{}' holds non-numeric coordinates",
                    var
                )))
            }
            VariableValues::Empty => return Err(SourceError::MissingData(var.to_string())),
        };
        match window {
            Some(ranges) => data
                .window(ranges)
                .map_err(|e| SourceError::invalid(e.to_string())),
            None => Ok(data),
        }
    }
}

/// Tracks how many dataset handles are currently open.
#[derive(Debug)]
struct HandleGuard(Arc<AtomicUsize>);

impl HandleGuard {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A read handle on a snapshot of a registered dataset.
struct MemoryHandle {
    dataset: MemoryDataset,
    _guard: HandleGuard,
}

impl Dataset for MemoryHandle {
    fn variable_names(&self) -> Vec<String> {
        self.dataset.variable_names()
    }

    fn dimension_names(&self) -> Vec<String> {
        self.dataset.dimension_names()
    }

    fn dimension_len(&self, name: &str) -> SourceResult<usize> {
        self.dataset.dimension_len(name)
    }

    fn variable_dimensions(&self, var: &str) -> SourceResult<Vec<String>> {
        self.dataset.variable_dimensions(var)
    }

    fn variable_dtype(&self, var: &str) -> SourceResult<DataType> {
        self.dataset.variable_dtype(var)
    }

    fn attributes(&self, var: &str) -> SourceResult<Metadata> {
        self.dataset.attributes(var)
    }

    fn global_attributes(&self) -> Metadata {
        self.dataset.global_attributes()
    }

    fn coordinate(&self, var: &str) -> SourceResult<Coordinates> {
        self.dataset.coordinate(var)
    }

    fn read(&self, var: &str, window: Option<&[Range<usize>]>) -> SourceResult<RasterData> {
        self.dataset.read(var, window)
    }
}

/// Collects writes and registers the dataset on finish.
struct MemoryWriter {
    path: PathBuf,
    dataset: MemoryDataset,
    registry: Arc<RwLock<HashMap<PathBuf, MemoryDataset>>>,
    _guard: HandleGuard,
}

impl DatasetWriter for MemoryWriter {
    fn define_dimension(&mut self, name: &str, len: usize) -> SourceResult<()> {
        self.dataset.define_dimension(name, len)
    }

    fn define_variable(
        &mut self,
        name: &str,
        dtype: DataType,
        dims: &[String],
        attributes: &Metadata,
    ) -> SourceResult<()> {
        self.dataset.define_variable(name, dtype, dims, attributes)
    }

    fn write_data(&mut self, name: &str, data: &RasterData) -> SourceResult<()> {
        self.dataset.write_data(name, data)
    }

    fn write_coordinates(&mut self, name: &str, coords: &Coordinates) -> SourceResult<()> {
        self.dataset.write_coordinates(name, coords)
    }

    fn set_global_attributes(&mut self, attributes: &Metadata) -> SourceResult<()> {
        self.dataset.set_global_attributes(attributes);
        Ok(())
    }

    fn finish(&mut self) -> SourceResult<()> {
        self.registry
            .write()
            .insert(self.path.clone(), self.dataset.clone());
        Ok(())
    }
}

/// A backend keeping datasets in a process-wide registry keyed by path.
///
/// Clones share the same registry.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    registry: Arc<RwLock<HashMap<PathBuf, MemoryDataset>>>,
    open_handles: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset under `path`, replacing any existing one.
    pub fn insert(&self, path: impl Into<PathBuf>, dataset: MemoryDataset) {
        self.registry.write().insert(path.into(), dataset);
    }

    /// A copy of the dataset registered under `path`.
    pub fn get(&self, path: &Path) -> Option<MemoryDataset> {
        self.registry.read().get(path).cloned()
    }

    /// Number of handles that have been opened and not yet released.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }
}

impl DatasetBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn open(&self, path: &Path) -> SourceResult<Box<dyn Dataset>> {
        let dataset = self
            .get(path)
            .ok_or_else(|| SourceError::NotFound(path.to_path_buf()))?;
        Ok(Box::new(MemoryHandle {
            dataset,
            _guard: HandleGuard::acquire(&self.open_handles),
        }))
    }

    fn create(&self, path: &Path) -> SourceResult<Box<dyn DatasetWriter>> {
        Ok(Box::new(MemoryWriter {
            path: path.to_path_buf(),
            dataset: MemoryDataset::new(),
            registry: Arc::clone(&self.registry),
            _guard: HandleGuard::acquire(&self.open_handles),
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        self.registry.read().contains_key(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> MemoryDataset {
        MemoryDataset::new()
            .with_coordinate("x", Coordinates::Numeric(vec![0.0, 1.0, 2.0]), Metadata::new())
            .unwrap()
            .with_coordinate("y", Coordinates::Numeric(vec![10.0, 20.0]), Metadata::new())
            .unwrap()
            .with_variable(
                "temp",
                &["y", "x"],
                RasterData::from_shape_vec(&[2, 3], vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0])
                    .unwrap(),
                Metadata::new().with("units", "K"),
            )
            .unwrap()
    }

    #[test]
    fn test_read_window() {
        let ds = grid();
        let window = ds.read("temp", Some(&[1..2, 0..2])).unwrap();
        assert_eq!(window.shape(), vec![1, 2]);
        assert_eq!(window.get_f64(&[0, 1]), Some(5.0));
        assert_eq!(ds.variable_dimensions("temp").unwrap(), vec!["y", "x"]);
    }

    #[test]
    fn test_write_validation() {
        let mut ds = grid();
        let wrong = RasterData::from_shape_vec(&[3, 2], vec![0.0f32; 6]).unwrap();
        assert!(ds.write_data("temp", &wrong).is_err());
        assert!(ds.define_dimension("x", 4).is_err());
        assert!(matches!(
            ds.define_variable("v", DataType::F32, &["z".to_string()], &Metadata::new()),
            Err(SourceError::MissingDimension(_))
        ));
    }

    #[test]
    fn test_handles_are_released() {
        let backend = MemoryBackend::new();
        backend.insert("grid.nc", grid());
        {
            let ds = backend.open(Path::new("grid.nc")).unwrap();
            assert_eq!(backend.open_handles(), 1);
            assert!(ds.has_variable("temp"));
        }
        assert_eq!(backend.open_handles(), 0);
        assert!(matches!(
            backend.open(Path::new("missing.nc")),
            Err(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_writer_registers_on_finish() {
        let backend = MemoryBackend::new();
        let mut writer = backend.create(Path::new("out.nc")).unwrap();
        writer.define_dimension("x", 2).unwrap();
        writer
            .define_variable("x", DataType::F64, &["x".to_string()], &Metadata::new())
            .unwrap();
        writer
            .write_coordinates("x", &Coordinates::Numeric(vec![1.0, 2.0]))
            .unwrap();
        assert!(!backend.exists(Path::new("out.nc")));
        writer.finish().unwrap();
        drop(writer);
        assert!(backend.exists(Path::new("out.nc")));
        assert_eq!(backend.open_handles(), 0);
    }
}
