//! Scoped acquisition of dataset handles.
//!
//! Every disk access opens the dataset, runs one operation and releases the
//! handle again, whatever the outcome. Nothing is cached between calls.

use std::path::Path;

use geostack_common::{GeoStackError, GeoStackResult};
use tracing::debug;

use crate::dataset::{Dataset, DatasetBackend, DatasetWriter};

/// Open `path`, run `f` on the dataset and close it.
pub fn with_dataset<T, F>(backend: &dyn DatasetBackend, path: &Path, f: F) -> GeoStackResult<T>
where
    F: FnOnce(&dyn Dataset) -> GeoStackResult<T>,
{
    debug!(backend = backend.name(), path = %path.display(), "Opening dataset");
    if !backend.exists(path) {
        return Err(GeoStackError::FileNotFound(path.to_path_buf()));
    }
    let dataset = backend.open(path)?;
    let result = f(dataset.as_ref());
    drop(dataset);
    debug!(path = %path.display(), "Released dataset");
    result
}

/// Create `path`, run `f` on the writer and flush it.
///
/// The writer is only flushed when `f` succeeds.
pub fn with_new_dataset<T, F>(backend: &dyn DatasetBackend, path: &Path, f: F) -> GeoStackResult<T>
where
    F: FnOnce(&mut dyn DatasetWriter) -> GeoStackResult<T>,
{
    debug!(backend = backend.name(), path = %path.display(), "Creating dataset");
    let mut writer = backend.create(path)?;
    let value = f(writer.as_mut())?;
    writer.finish()?;
    debug!(path = %path.display(), "Flushed dataset");
    Ok(value)
}
