//! Printable summaries of stacks.

use std::fmt::Write as _;

use dimensions::Dimension;
use geostack_common::{GeoStackResult, Metadata};
use geostack_raster::{MissingValue, Stack};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DimSummary {
    pub label: String,
    pub len: usize,
    pub mode: String,
    pub crs: Option<String>,
    pub mappedcrs: Option<String>,
    pub bounds: Option<(f64, f64)>,
}

impl From<&Dimension> for DimSummary {
    fn from(dim: &Dimension) -> Self {
        Self {
            label: dim.label().to_string(),
            len: dim.len(),
            mode: dim.mode().to_string(),
            crs: dim.mode().crs().map(ToString::to_string),
            mappedcrs: dim.mode().mappedcrs().map(ToString::to_string),
            bounds: dim.bounds(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LayerSummary {
    pub key: String,
    pub dims: Vec<String>,
    pub missingval: MissingValue,
}

#[derive(Debug, Serialize)]
pub struct StackSummary {
    pub dims: Vec<DimSummary>,
    pub layers: Vec<LayerSummary>,
    pub metadata: Metadata,
}

impl StackSummary {
    pub fn new(stack: &Stack) -> GeoStackResult<Self> {
        let layers = stack
            .keys()
            .iter()
            .map(|key| {
                Ok(LayerSummary {
                    key: key.clone(),
                    dims: stack.layerdims(key)?.iter().map(ToString::to_string).collect(),
                    missingval: *stack.layermissingval(key)?,
                })
            })
            .collect::<GeoStackResult<Vec<_>>>()?;
        Ok(Self {
            dims: stack.dims().iter().map(DimSummary::from).collect(),
            layers,
            metadata: stack.metadata().clone(),
        })
    }

    /// Human readable listing.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Dimensions:");
        for dim in &self.dims {
            let _ = write!(out, "  {:<8} {:>6}  {}", dim.label, dim.len, dim.mode);
            if let Some(crs) = &dim.crs {
                let _ = write!(out, "  crs={}", crs);
            }
            if let Some(crs) = &dim.mappedcrs {
                let _ = write!(out, "  mappedcrs={}", crs);
            }
            if let Some((lo, hi)) = dim.bounds {
                let _ = write!(out, "  [{}, {}]", lo, hi);
            }
            out.push('\n');
        }
        let _ = writeln!(out, "Layers:");
        for layer in &self.layers {
            let missing = match layer.missingval {
                MissingValue::None => "-".to_string(),
                MissingValue::Masked => "masked".to_string(),
                MissingValue::Value(v) => v.to_string(),
            };
            let _ = writeln!(out, "  {:<12} ({})  missing={}", layer.key, layer.dims.join(", "), missing);
        }
        if !self.metadata.is_empty() {
            let _ = writeln!(out, "Attributes:");
            for (key, value) in self.metadata.iter() {
                let _ = writeln!(out, "  {} = {:?}", key, value);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geostack_raster::{open_stack, OpenOptions};
    use netcdf_source::{MemoryBackend, MemoryDataset};
    use geostack_common::{Coordinates, RasterData};
    use std::sync::Arc;

    fn stack() -> Stack {
        let backend = MemoryBackend::new();
        backend.insert(
            "s.nc",
            MemoryDataset::new()
                .with_coordinate("lon", Coordinates::Numeric(vec![0.0, 10.0]), Metadata::new())
                .unwrap()
                .with_variable(
                    "pr",
                    &["lon"],
                    RasterData::from_shape_vec(&[2], vec![0.5f32, 1.5]).unwrap(),
                    Metadata::new().with("_FillValue", -1.0),
                )
                .unwrap()
                .with_attributes(Metadata::new().with("source", "test")),
        );
        open_stack("s.nc", &OpenOptions::new().backend(Arc::new(backend))).unwrap()
    }

    #[test]
    fn test_summary_text() {
        let summary = StackSummary::new(&stack()).unwrap();
        let text = summary.to_text();
        assert!(text.contains("Mapped"));
        assert!(text.contains("crs=EPSG:4326"));
        assert!(text.contains("pr"));
        assert!(text.contains("missing=-1"));
        assert!(text.contains("source"));
    }

    #[test]
    fn test_summary_json() {
        let summary = StackSummary::new(&stack()).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["dims"][0]["label"], "X");
        assert_eq!(json["dims"][0]["len"], 2);
        assert_eq!(json["layers"][0]["key"], "pr");
        assert_eq!(json["metadata"]["source"], "test");
    }
}
