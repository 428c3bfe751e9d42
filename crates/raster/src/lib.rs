//! Labelled raster arrays and multi-layer stacks.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   open_array / open_stack   ┌─────────────┐
//! │   Dataset    │ ──────────────────────────► │ Array/Stack │
//! │  (backend)   │ ◄────────────────────────── │             │
//! └──────────────┘   write_array / write_stack └─────────────┘
//!        ▲                                            │
//!        │ scoped read of a window                    │ layer / select
//!        └─────────────── DiskSource ◄────────────────┘
//! ```
//!
//! Arrays opened from a dataset are lazy: they hold a [`DiskSource`] and
//! read the selected window each time their values are requested. Stacks
//! keep per-layer dimension labels, metadata and missing values and hand
//! out layers as arrays.
//!
//! # Example
//!
//! ```ignore
//! use geostack_raster::{open_stack, OpenOptions};
//!
//! let stack = open_stack("climate.json", &OpenOptions::new())?;
//! let tmax = stack.layer("tmax")?.read()?;
//! ```

pub mod array;
pub mod config;
pub mod missing;
pub mod source;
pub mod stack;
pub mod writer;

pub use array::{Array, ArrayData, DiskSource, Selector, UNNAMED};
pub use config::{OpenOptions, RasterConfig};
pub use missing::{apply_missingval, discover_missingval, MissingValue, FILL_VALUE_ATTR};
pub use source::{backend_for_path, layer_names, open_array, open_stack, open_stack_files, read_dimension};
pub use stack::{Stack, StackLayer, StackSource};
pub use writer::{write_array, write_array_with, write_stack, write_stack_with};
