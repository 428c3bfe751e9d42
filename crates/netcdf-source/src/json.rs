//! Datasets stored on disk as JSON documents.
//!
//! The whole dataset is loaded on open and written out on finish. JSON has no
//! representation for NaN, so datasets holding NaN cells are rejected on
//! write; give the array a missing value so masked cells are filled first.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use geostack_common::{Coordinates, DataType, Metadata, RasterData};
use tracing::{debug, info};

use crate::dataset::{Dataset, DatasetBackend, DatasetWriter};
use crate::error::{SourceError, SourceResult};
use crate::memory::MemoryDataset;

/// Backend reading and writing `.json` dataset files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBackend;

impl JsonBackend {
    pub fn new() -> Self {
        Self
    }

    /// Load a dataset file.
    pub fn load(path: &Path) -> SourceResult<MemoryDataset> {
        if !path.exists() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let dataset = serde_json::from_reader(reader)?;
        debug!(path = %path.display(), "Loaded JSON dataset");
        Ok(dataset)
    }

    /// Write a dataset file, replacing any existing one.
    pub fn save(path: &Path, dataset: &MemoryDataset) -> SourceResult<()> {
        let nan = dataset.count_nan();
        if nan > 0 {
            return Err(SourceError::invalid(format!(
                "{} NaN cells cannot be stored in a JSON dataset",
                nan
            )));
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, dataset)?;
        info!(path = %path.display(), "Wrote JSON dataset");
        Ok(())
    }
}

struct JsonWriter {
    path: PathBuf,
    dataset: MemoryDataset,
}

impl DatasetWriter for JsonWriter {
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
        JsonBackend::save(&self.path, &self.dataset)
    }
}

impl DatasetBackend for JsonBackend {
    fn name(&self) -> &'static str {
        "json"
    }

    fn open(&self, path: &Path) -> SourceResult<Box<dyn Dataset>> {
        Ok(Box::new(Self::load(path)?))
    }

    fn create(&self, path: &Path) -> SourceResult<Box<dyn DatasetWriter>> {
        Ok(Box::new(JsonWriter {
            path: path.to_path_buf(),
            dataset: MemoryDataset::new(),
        }))
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
