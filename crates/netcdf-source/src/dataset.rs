//! The dataset capability: read and write access to a multi-variable file.
//!
//! Backends implement [`DatasetBackend`], which hands out [`Dataset`] handles
//! for reading and [`DatasetWriter`] handles for writing. Handles release
//! their resources when dropped; use [`crate::scoped`] to keep their lifetime
//! to a single operation.

use std::ops::Range;
use std::path::Path;

use geostack_common::{Coordinates, DataType, Metadata, RasterData};
use ndarray::{Array2, Ix2};

use crate::error::{SourceError, SourceResult};

/// Name of the attribute linking a coordinate variable to its cell bounds.
pub const BOUNDS_ATTR: &str = "bounds";

/// Read access to an open dataset.
pub trait Dataset {
    /// Variable names, in definition order.
    fn variable_names(&self) -> Vec<String>;

    /// Dimension names, in definition order.
    fn dimension_names(&self) -> Vec<String>;

    fn dimension_len(&self, name: &str) -> SourceResult<usize>;

    /// Dimension names of a variable, outermost first.
    fn variable_dimensions(&self, var: &str) -> SourceResult<Vec<String>>;

    fn variable_dtype(&self, var: &str) -> SourceResult<DataType>;

    /// Attributes of a variable.
    fn attributes(&self, var: &str) -> SourceResult<Metadata>;

    fn global_attributes(&self) -> Metadata;

    /// Values of a one-dimensional coordinate variable.
    fn coordinate(&self, var: &str) -> SourceResult<Coordinates>;

    /// Read a variable, or a window of it with one range per dimension.
    fn read(&self, var: &str, window: Option<&[Range<usize>]>) -> SourceResult<RasterData>;

    fn has_variable(&self, var: &str) -> bool {
        self.variable_names().iter().any(|name| name == var)
    }

    /// Read a two-dimensional `(n, 2)` cell bounds variable.
    fn bounds_matrix(&self, var: &str) -> SourceResult<Array2<f64>> {
        let data = self.read(var, None)?;
        let shape = data.shape();
        if shape.len() != 2 || shape[1] != 2 {
            return Err(SourceError::invalid(format!(
                "bounds variable '{}' has shape {:?}, expected (n, 2)",
                var, shape
            )));
        }
        data.to_f64_array()
            .into_dimensionality::<Ix2>()
            .map_err(|e| SourceError::invalid(e.to_string()))
    }
}

/// Write access to a dataset being created.
///
/// Dimensions must be defined before the variables that use them. Nothing is
/// guaranteed to be persisted until [`DatasetWriter::finish`] succeeds.
pub trait DatasetWriter {
    fn define_dimension(&mut self, name: &str, len: usize) -> SourceResult<()>;

    fn define_variable(
        &mut self,
        name: &str,
        dtype: DataType,
        dims: &[String],
        attributes: &Metadata,
    ) -> SourceResult<()>;

    fn write_data(&mut self, name: &str, data: &RasterData) -> SourceResult<()>;

    fn write_coordinates(&mut self, name: &str, coords: &Coordinates) -> SourceResult<()>;

    fn set_global_attributes(&mut self, attributes: &Metadata) -> SourceResult<()>;

    /// Flush everything written so far.
    fn finish(&mut self) -> SourceResult<()>;
}

/// A storage backend that opens and creates datasets by path.
pub trait DatasetBackend: Send + Sync + std::fmt::Debug {
    /// Short backend name for logging.
    fn name(&self) -> &'static str;

    fn open(&self, path: &Path) -> SourceResult<Box<dyn Dataset>>;

    /// Create a dataset at `path`, replacing any existing one.
    fn create(&self, path: &Path) -> SourceResult<Box<dyn DatasetWriter>>;

    fn exists(&self, path: &Path) -> bool;
}
