//! Stacks: named layers sharing dimensions.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use dimensions::{combine_dims, convert_dims, layer_labels, DimLabel, Dimension, ModeClass};
use geostack_common::{GeoStackError, GeoStackResult, Metadata, RasterData};
use netcdf_source::DatasetBackend;
use projection::Reprojector;
use tracing::debug;

use crate::array::{Array, DiskSource};
use crate::missing::MissingValue;

/// Where the layers of a stack are read from.
#[derive(Debug, Clone)]
pub enum StackSource {
    /// All layers are variables of one dataset.
    SingleFile {
        backend: Arc<dyn DatasetBackend>,
        path: PathBuf,
    },
    /// One dataset per layer key.
    Files {
        backend: Arc<dyn DatasetBackend>,
        paths: BTreeMap<String, PathBuf>,
    },
    /// Layer values held in memory.
    InMemory(BTreeMap<String, RasterData>),
}

impl StackSource {
    fn retain(&self, keys: &[String]) -> StackSource {
        match self {
            StackSource::SingleFile { .. } => self.clone(),
            StackSource::Files { backend, paths } => StackSource::Files {
                backend: Arc::clone(backend),
                paths: paths
                    .iter()
                    .filter(|(k, _)| keys.contains(k))
                    .map(|(k, p)| (k.clone(), p.clone()))
                    .collect(),
            },
            StackSource::InMemory(data) => StackSource::InMemory(
                data.iter()
                    .filter(|(k, _)| keys.contains(k))
                    .map(|(k, d)| (k.clone(), d.clone()))
                    .collect(),
            ),
        }
    }
}

/// Everything a stack records about one layer.
#[derive(Debug, Clone)]
pub struct StackLayer {
    pub key: String,
    /// Variable holding the layer in its dataset.
    pub var: String,
    pub dims: Vec<Dimension>,
    pub metadata: Metadata,
    pub missingval: MissingValue,
}

/// A collection of layers whose shared dimensions agree.
#[derive(Debug, Clone)]
pub struct Stack {
    source: StackSource,
    keys: Vec<String>,
    dims: Vec<Dimension>,
    layerdims: BTreeMap<String, Vec<DimLabel>>,
    metadata: Metadata,
    layermetadata: BTreeMap<String, Metadata>,
    layermissingval: BTreeMap<String, MissingValue>,
    layervars: BTreeMap<String, String>,
}

impl Stack {
    /// Build a stack from its layers. Keys must be unique and shared
    /// dimensions must agree.
    pub fn from_layers(
        source: StackSource,
        layers: Vec<StackLayer>,
        metadata: Metadata,
    ) -> GeoStackResult<Self> {
        let mut keys: Vec<String> = Vec::with_capacity(layers.len());
        for layer in &layers {
            if keys.contains(&layer.key) {
                return Err(GeoStackError::DuplicateLayer(layer.key.clone()));
            }
            keys.push(layer.key.clone());
        }

        let dims = combine_dims(layers.iter().map(|l| l.dims.as_slice()))?;
        debug!(layers = keys.len(), dims = dims.len(), "Combined stack dimensions");

        let mut stack = Stack {
            source,
            keys,
            dims,
            layerdims: BTreeMap::new(),
            metadata,
            layermetadata: BTreeMap::new(),
            layermissingval: BTreeMap::new(),
            layervars: BTreeMap::new(),
        };
        for layer in layers {
            stack.layerdims.insert(layer.key.clone(), layer_labels(&layer.dims));
            stack.layermetadata.insert(layer.key.clone(), layer.metadata);
            stack.layermissingval.insert(layer.key.clone(), layer.missingval);
            stack.layervars.insert(layer.key, layer.var);
        }
        Ok(stack)
    }

    /// An in-memory stack keyed by array name.
    pub fn from_arrays(arrays: &[Array], metadata: Metadata) -> GeoStackResult<Self> {
        let mut data = BTreeMap::new();
        let mut layers = Vec::with_capacity(arrays.len());
        for array in arrays {
            let key = array.name().to_string();
            if data.contains_key(&key) {
                return Err(GeoStackError::DuplicateLayer(key));
            }
            data.insert(key.clone(), array.values()?);
            layers.push(StackLayer {
                var: key.clone(),
                key,
                dims: array.dims().to_vec(),
                metadata: array.metadata().clone(),
                missingval: *array.missingval(),
            });
        }
        Self::from_layers(StackSource::InMemory(data), layers, metadata)
    }

    pub fn source(&self) -> &StackSource {
        &self.source
    }

    /// Layer keys in stack order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Union of the layer dimensions.
    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn dim(&self, label: &DimLabel) -> Option<&Dimension> {
        self.dims.iter().find(|d| d.label() == label)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Ordered labels of the dimensions a layer uses.
    pub fn layerdims(&self, key: &str) -> GeoStackResult<&[DimLabel]> {
        self.layerdims
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| GeoStackError::LayerNotFound(key.to_string()))
    }

    pub fn layermetadata(&self, key: &str) -> GeoStackResult<&Metadata> {
        self.layermetadata
            .get(key)
            .ok_or_else(|| GeoStackError::LayerNotFound(key.to_string()))
    }

    pub fn layermissingval(&self, key: &str) -> GeoStackResult<&MissingValue> {
        self.layermissingval
            .get(key)
            .ok_or_else(|| GeoStackError::LayerNotFound(key.to_string()))
    }

    fn layer_dims(&self, key: &str) -> GeoStackResult<Vec<Dimension>> {
        self.layerdims(key)?
            .iter()
            .map(|label| {
                self.dim(label)
                    .cloned()
                    .ok_or_else(|| GeoStackError::MissingDimension(label.to_string()))
            })
            .collect()
    }

    /// The layer `key` as an array. Disk layers stay lazy.
    pub fn layer(&self, key: &str) -> GeoStackResult<Array> {
        let dims = self.layer_dims(key)?;
        let metadata = self.layermetadata(key)?.clone();
        let missingval = *self.layermissingval(key)?;
        let var = self
            .layervars
            .get(key)
            .ok_or_else(|| GeoStackError::LayerNotFound(key.to_string()))?;
        let shape: Vec<usize> = dims.iter().map(Dimension::len).collect();

        match &self.source {
            StackSource::InMemory(data) => {
                let values = data
                    .get(key)
                    .ok_or_else(|| GeoStackError::LayerNotFound(key.to_string()))?;
                Array::new(values.clone(), dims, key, metadata, missingval)
            }
            StackSource::SingleFile { backend, path } => {
                let source = DiskSource::new(Arc::clone(backend), path.clone(), var.clone(), &shape);
                Array::from_disk(source, dims, key, metadata, missingval)
            }
            StackSource::Files { backend, paths } => {
                let path = paths
                    .get(key)
                    .ok_or_else(|| GeoStackError::LayerNotFound(key.to_string()))?;
                let source = DiskSource::new(Arc::clone(backend), path.clone(), var.clone(), &shape);
                Array::from_disk(source, dims, key, metadata, missingval)
            }
        }
    }

    /// A new stack with only `keys`, in the order given.
    ///
    /// Dimensions are recomputed over the kept layers, so dimensions used
    /// only by dropped layers disappear.
    pub fn subset(&self, keys: &[&str]) -> GeoStackResult<Stack> {
        let mut layers = Vec::with_capacity(keys.len());
        for &key in keys {
            layers.push(StackLayer {
                key: key.to_string(),
                var: self
                    .layervars
                    .get(key)
                    .cloned()
                    .ok_or_else(|| GeoStackError::LayerNotFound(key.to_string()))?,
                dims: self.layer_dims(key)?,
                metadata: self.layermetadata(key)?.clone(),
                missingval: *self.layermissingval(key)?,
            });
        }
        let kept: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        Self::from_layers(self.source.retain(&kept), layers, self.metadata.clone())
    }

    /// Convert every X/Y dimension of the stack to `target`.
    pub fn convert_mode(
        &self,
        target: ModeClass,
        reprojector: Option<&dyn Reprojector>,
    ) -> GeoStackResult<Stack> {
        Ok(Stack {
            dims: convert_dims(target, &self.dims, reprojector)?,
            ..self.clone()
        })
    }
}
