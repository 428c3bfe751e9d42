//! Labelled raster arrays, in memory or backed by a dataset variable.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dimensions::{check_unique_labels, convert_dims, DimLabel, Dimension, ModeClass};
use geostack_common::{Crs, GeoStackError, GeoStackResult, Metadata, RasterData};
use netcdf_source::{with_dataset, DatasetBackend};
use projection::Reprojector;
use tracing::debug;

use crate::missing::MissingValue;

/// Name used for arrays written without a name.
pub const UNNAMED: &str = "unnamed";

/// A lazy reference to a window of a dataset variable.
///
/// `window` has one range per disk dimension of the variable. `axes` lists
/// the disk axes that remain array axes; the others were selected down to a
/// single index and are dropped after reading.
#[derive(Debug, Clone)]
pub struct DiskSource {
    backend: Arc<dyn DatasetBackend>,
    path: PathBuf,
    var: String,
    window: Vec<Range<usize>>,
    axes: Vec<usize>,
}

impl DiskSource {
    pub fn new(
        backend: Arc<dyn DatasetBackend>,
        path: impl Into<PathBuf>,
        var: impl Into<String>,
        shape: &[usize],
    ) -> Self {
        Self {
            backend,
            path: path.into(),
            var: var.into(),
            window: shape.iter().map(|&n| 0..n).collect(),
            axes: (0..shape.len()).collect(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn var(&self) -> &str {
        &self.var
    }

    pub fn window(&self) -> &[Range<usize>] {
        &self.window
    }

    /// Open the dataset, read the window and release it.
    pub fn read(&self) -> GeoStackResult<RasterData> {
        debug!(path = %self.path.display(), var = %self.var, window = ?self.window, "Reading window");
        let mut data = with_dataset(self.backend.as_ref(), &self.path, |ds| {
            Ok(ds.read(&self.var, Some(self.window.as_slice()))?)
        })?;
        for axis in (0..self.window.len()).rev() {
            if !self.axes.contains(&axis) {
                data = data.remove_axis(axis)?;
            }
        }
        Ok(data)
    }

    fn narrow(&self, axis: usize, range: Range<usize>, drop_axis: bool) -> DiskSource {
        let disk_axis = self.axes[axis];
        let start = self.window[disk_axis].start;
        let mut window = self.window.clone();
        window[disk_axis] = start + range.start..start + range.end;
        let mut axes = self.axes.clone();
        if drop_axis {
            axes.remove(axis);
        }
        DiskSource {
            backend: Arc::clone(&self.backend),
            path: self.path.clone(),
            var: self.var.clone(),
            window,
            axes,
        }
    }
}

/// Where the values of an array live.
#[derive(Debug, Clone)]
pub enum ArrayData {
    InMemory(RasterData),
    Disk(DiskSource),
}

/// Index selection along one dimension.
#[derive(Debug, Clone, PartialEq)]
pub enum Selector {
    /// A single position; the dimension moves to the array's `refdims`.
    At(usize),
    /// A contiguous range of positions.
    Range(Range<usize>),
}

/// An n-dimensional raster with labelled dimensions.
///
/// `dims` follow the axis order of the data. `refdims` keep the length-1
/// dimensions this array was selected from.
#[derive(Debug, Clone)]
pub struct Array {
    data: ArrayData,
    dims: Vec<Dimension>,
    refdims: Vec<Dimension>,
    name: String,
    metadata: Metadata,
    missingval: MissingValue,
}

fn check_shape(shape: &[usize], dims: &[Dimension]) -> GeoStackResult<()> {
    check_unique_labels(dims)?;
    let dim_lens: Vec<usize> = dims.iter().map(Dimension::len).collect();
    if shape != dim_lens.as_slice() {
        return Err(GeoStackError::shape_mismatch(format!(
            "data shape {:?} does not match dimension lengths {:?}",
            shape, dim_lens
        )));
    }
    Ok(())
}

impl Array {
    /// An in-memory array. Data shape must match the dimension lengths.
    pub fn new(
        data: RasterData,
        dims: Vec<Dimension>,
        name: impl Into<String>,
        metadata: Metadata,
        missingval: MissingValue,
    ) -> GeoStackResult<Self> {
        check_shape(&data.shape(), &dims)?;
        Ok(Self {
            data: ArrayData::InMemory(data),
            dims,
            refdims: Vec::new(),
            name: name.into(),
            metadata,
            missingval,
        })
    }

    /// A lazy array over a dataset variable.
    pub fn from_disk(
        source: DiskSource,
        dims: Vec<Dimension>,
        name: impl Into<String>,
        metadata: Metadata,
        missingval: MissingValue,
    ) -> GeoStackResult<Self> {
        let shape: Vec<usize> = source.window.iter().map(|r| r.len()).collect();
        check_shape(&shape, &dims)?;
        Ok(Self {
            data: ArrayData::Disk(source),
            dims,
            refdims: Vec::new(),
            name: name.into(),
            metadata,
            missingval,
        })
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn refdims(&self) -> &[Dimension] {
        &self.refdims
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn missingval(&self) -> &MissingValue {
        &self.missingval
    }

    pub fn is_disk(&self) -> bool {
        matches!(self.data, ArrayData::Disk(_))
    }

    pub fn shape(&self) -> Vec<usize> {
        self.dims.iter().map(Dimension::len).collect()
    }

    /// Axis position of the dimension labelled `label`.
    pub fn axis(&self, label: &DimLabel) -> Option<usize> {
        self.dims.iter().position(|d| d.label() == label)
    }

    pub fn dim(&self, label: &DimLabel) -> Option<&Dimension> {
        self.dims.iter().find(|d| d.label() == label)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_missingval(mut self, missingval: MissingValue) -> Self {
        self.missingval = missingval;
        self
    }

    /// Replace the dimensions, keeping their lengths.
    pub fn with_dims(&self, dims: Vec<Dimension>) -> GeoStackResult<Self> {
        check_shape(&self.shape(), &dims)?;
        Ok(Self {
            dims,
            ..self.clone()
        })
    }

    /// CRS the X/Y coordinates are stored in, from the first spatial dimension.
    pub fn crs(&self) -> Option<&Crs> {
        self.dims
            .iter()
            .filter(|d| d.label().is_spatial())
            .find_map(|d| d.mode().crs())
    }

    /// CRS the X/Y coordinates map to, from the first spatial dimension.
    pub fn mappedcrs(&self) -> Option<&Crs> {
        self.dims
            .iter()
            .filter(|d| d.label().is_spatial())
            .find_map(|d| d.mode().mappedcrs())
    }

    /// Select along the dimension labelled `label`.
    ///
    /// Disk arrays stay lazy and narrow their read window.
    pub fn select(&self, label: &DimLabel, selector: Selector) -> GeoStackResult<Array> {
        let axis = self
            .axis(label)
            .ok_or_else(|| GeoStackError::MissingDimension(label.to_string()))?;
        let dim = &self.dims[axis];
        let out_of_bounds = |selection: String| {
            GeoStackError::shape_mismatch(format!(
                "selection {} out of bounds for {} of length {}",
                selection,
                label,
                dim.len()
            ))
        };
        let (range, drop_axis) = match selector {
            Selector::At(i) if i < dim.len() => (i..i + 1, true),
            Selector::At(i) => return Err(out_of_bounds(i.to_string())),
            Selector::Range(r) => (r, false),
        };
        if range.start > range.end || range.end > dim.len() {
            return Err(out_of_bounds(format!("{:?}", range)));
        }
        let narrowed = dim.slice(range.clone())?;

        let data = match &self.data {
            ArrayData::Disk(source) => ArrayData::Disk(source.narrow(axis, range, drop_axis)),
            ArrayData::InMemory(data) => {
                let mut window: Vec<Range<usize>> = self.shape().iter().map(|&n| 0..n).collect();
                window[axis] = range;
                let mut out = data.window(&window)?;
                if drop_axis {
                    out = out.remove_axis(axis)?;
                }
                ArrayData::InMemory(out)
            }
        };

        let mut dims = self.dims.clone();
        let mut refdims = self.refdims.clone();
        if drop_axis {
            dims.remove(axis);
            refdims.push(narrowed);
        } else {
            dims[axis] = narrowed;
        }
        Ok(Array {
            data,
            dims,
            refdims,
            name: self.name.clone(),
            metadata: self.metadata.clone(),
            missingval: self.missingval,
        })
    }

    /// The values of the array, reading from disk when needed.
    pub fn values(&self) -> GeoStackResult<RasterData> {
        match &self.data {
            ArrayData::InMemory(data) => Ok(data.clone()),
            ArrayData::Disk(source) => source.read(),
        }
    }

    /// An in-memory copy of this array.
    pub fn read(&self) -> GeoStackResult<Array> {
        let values = self.values()?;
        check_shape(&values.shape(), &self.dims)?;
        Ok(Array {
            data: ArrayData::InMemory(values),
            ..self.clone()
        })
    }

    /// Convert every X/Y dimension to `target`.
    pub fn convert_mode(
        &self,
        target: ModeClass,
        reprojector: Option<&dyn Reprojector>,
    ) -> GeoStackResult<Array> {
        let dims = convert_dims(target, &self.dims, reprojector)?;
        let refdims = convert_dims(target, &self.refdims, reprojector)?;
        Ok(Array {
            dims,
            refdims,
            ..self.clone()
        })
    }
}
