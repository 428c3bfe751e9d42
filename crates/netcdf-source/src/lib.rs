//! Dataset access for geostack.
//!
//! Everything above this crate talks to files through the [`Dataset`],
//! [`DatasetWriter`] and [`DatasetBackend`] traits:
//!
//! - [`MemoryBackend`]: datasets in a shared in-process registry
//! - [`JsonBackend`]: a dataset serialized as one JSON document
//! - `NetCdfBackend`: native NetCDF files (requires the `netcdf` feature and
//!   libnetcdf / libhdf5)
//!
//! Disk access goes through [`with_dataset`] / [`with_new_dataset`] so a
//! handle never outlives the operation that needed it.

pub mod cftime;
pub mod dataset;
pub mod error;
pub mod json;
pub mod memory;
#[cfg(feature = "netcdf")]
pub mod native;
pub mod scoped;

pub use dataset::{Dataset, DatasetBackend, DatasetWriter, BOUNDS_ATTR};
pub use error::{SourceError, SourceResult};
pub use json::JsonBackend;
pub use memory::{MemoryBackend, MemoryDataset, VariableValues};
#[cfg(feature = "netcdf")]
pub use native::{silence_hdf5_errors, NetCdfBackend};
pub use scoped::{with_dataset, with_new_dataset};
