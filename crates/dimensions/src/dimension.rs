//! A labelled axis: label, index values, mode and attributes.

use std::ops::Range;

use geostack_common::{GeoStackResult, Metadata};
use ndarray::{s, Array2};
use serde::{Deserialize, Serialize};

use crate::index::DimIndex;
use crate::inference::{infer_mode, infer_span, CrsHints};
use crate::label::DimLabel;
use crate::mode::IndexMode;
use crate::order::Order;
use crate::sampling::Sampling;
use crate::span::{Span, Step};

/// One axis of an array.
///
/// Dimensions are immutable. Every `with_*` and [`Dimension::slice`] builds a
/// new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    label: DimLabel,
    index: DimIndex,
    mode: IndexMode,
    metadata: Metadata,
}

impl Dimension {
    pub fn new(label: DimLabel, index: DimIndex, mode: IndexMode, metadata: Metadata) -> Self {
        Self {
            label,
            index,
            mode,
            metadata,
        }
    }

    /// A dimension with no coordinate values, indexed by position.
    pub fn positional(label: DimLabel, len: usize) -> Self {
        Self::new(label, DimIndex::Positional(len), IndexMode::NoIndex, Metadata::new())
    }

    /// Build a dimension, inferring its mode from the index and attributes.
    pub fn infer(
        label: DimLabel,
        index: DimIndex,
        bounds: Option<Array2<f64>>,
        metadata: Metadata,
        hints: &CrsHints,
    ) -> Self {
        let mode = infer_mode(&label, &index, bounds, &metadata, hints);
        Self::new(label, index, mode, metadata)
    }

    pub fn label(&self) -> &DimLabel {
        &self.label
    }

    pub fn index(&self) -> &DimIndex {
        &self.index
    }

    pub fn mode(&self) -> &IndexMode {
        &self.mode
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn with_mode(&self, mode: IndexMode) -> Self {
        Self::new(self.label.clone(), self.index.clone(), mode, self.metadata.clone())
    }

    pub fn with_index(&self, index: DimIndex, mode: IndexMode) -> Self {
        Self::new(self.label.clone(), index, mode, self.metadata.clone())
    }

    pub fn with_metadata(&self, metadata: Metadata) -> Self {
        Self::new(self.label.clone(), self.index.clone(), self.mode.clone(), metadata)
    }

    /// Outer numeric extent of the axis, cell edges included for intervals.
    ///
    /// `None` for time, text and positional indices.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        let values = self.index.as_numeric()?;
        let sampled = self.mode.sampled()?;
        let (lo, hi) = min_max(values.iter().copied())?;
        match (&sampled.span, sampled.sampling) {
            (Span::Explicit(bounds), _) => min_max(bounds.iter().copied()),
            (Span::Irregular(Some(bounds)), _) => Some(*bounds),
            (Span::Irregular(None), _) => Some((lo, hi)),
            (Span::Regular(_), Sampling::Points) => Some((lo, hi)),
            (Span::Regular(Step::Numeric(step)), Sampling::Intervals(locus)) => {
                let offset = step * locus.center_offset();
                let half = step.abs() / 2.0;
                Some((lo + offset - half, hi + offset + half))
            }
            (Span::Regular(Step::Period(_)), _) => None,
        }
    }

    /// Narrow the dimension to `range`, re-deriving the span where it
    /// depends on the values.
    pub fn slice(&self, range: Range<usize>) -> GeoStackResult<Dimension> {
        let index = self.index.slice(range.clone())?;
        let mode = match self.mode.sampled() {
            Some(sampled) => {
                let span = match (&sampled.span, &index) {
                    (Span::Explicit(bounds), _) => {
                        Span::Explicit(bounds.slice(s![range.start..range.end, ..]).to_owned())
                    }
                    (Span::Irregular(_), DimIndex::Numeric(values)) if values.len() > 1 => {
                        infer_span(values, &sampled.order)
                    }
                    (Span::Irregular(_), DimIndex::Numeric(_)) => self
                        .index
                        .as_numeric()
                        .and_then(|parent| cell_bounds(parent, range.start, &sampled.order))
                        .map_or_else(|| sampled.span.clone(), |b| Span::Irregular(Some(b))),
                    (span, _) => span.clone(),
                };
                let mut narrowed = sampled.clone();
                narrowed.span = span;
                self.mode.with_sampled(narrowed)
            }
            None => self.mode.clone(),
        };
        Ok(self.with_index(index, mode))
    }

    /// Equality with a relative tolerance on index values and span.
    pub fn approx_eq(&self, other: &Dimension) -> bool {
        self.label == other.label
            && self.index.approx_eq(&other.index)
            && self.mode.approx_eq(&other.mode)
    }
}

/// Edges of cell `i`, half way to each neighbour.
///
/// The first and last cells reuse their one neighbouring step.
fn cell_bounds(values: &[f64], i: usize, order: &Order) -> Option<(f64, f64)> {
    let v = *values.get(i)?;
    let prev = i.checked_sub(1).and_then(|j| values.get(j)).map(|p| (v - p).abs() / 2.0);
    let next = values.get(i + 1).map(|n| (n - v).abs() / 2.0);
    let (prev, next) = match (prev, next) {
        (Some(p), Some(n)) => (p, n),
        (Some(p), None) => (p, p),
        (None, Some(n)) => (n, n),
        (None, None) => return None,
    };
    if order.is_reverse_index() {
        Some((v - next, v + prev))
    } else {
        Some((v - prev, v + next))
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;
    use crate::sampling::Locus;
    use crate::mode::SampledMode;
    use geostack_common::Crs;
    use ndarray::array;

    fn lon(values: Vec<f64>) -> Dimension {
        Dimension::infer(
            DimLabel::X,
            DimIndex::Numeric(values),
            None,
            Metadata::new(),
            &CrsHints::new(None, Some(Crs::WGS84)),
        )
    }

    #[test]
    fn test_point_bounds() {
        assert_eq!(lon(vec![0.0, 10.0, 20.0]).bounds(), Some((0.0, 20.0)));
        assert_eq!(lon(vec![0.0, 1.0, 3.0, 4.0]).bounds(), Some((-0.5, 4.5)));
    }

    #[test]
    fn test_interval_bounds() {
        let sampled = SampledMode::new(
            Order::forward(),
            Span::regular(10.0),
            Sampling::Intervals(Locus::Start),
        );
        let dim = Dimension::new(
            DimLabel::X,
            DimIndex::Numeric(vec![0.0, 10.0, 20.0]),
            IndexMode::Sampled(sampled),
            Metadata::new(),
        );
        assert_eq!(dim.bounds(), Some((0.0, 30.0)));
    }

    #[test]
    fn test_explicit_bounds_and_slice() {
        let bounds = array![[0.0, 1.0], [1.0, 3.0], [3.0, 6.0]];
        let dim = Dimension::infer(
            DimLabel::Z,
            DimIndex::Numeric(vec![0.5, 2.0, 4.5]),
            Some(bounds),
            Metadata::new(),
            &CrsHints::default(),
        );
        assert_eq!(dim.bounds(), Some((0.0, 6.0)));

        let narrowed = dim.slice(1..3).unwrap();
        assert_eq!(narrowed.len(), 2);
        assert_eq!(narrowed.bounds(), Some((1.0, 6.0)));
    }

    #[test]
    fn test_slice_rederives_irregular_span() {
        let dim = lon(vec![0.0, 1.0, 2.0, 5.0]);
        assert!(!dim.mode().span().unwrap().is_regular());
        let narrowed = dim.slice(0..3).unwrap();
        assert_eq!(narrowed.mode().span().unwrap(), &Span::regular(1.0));
        assert!(matches!(narrowed.mode(), IndexMode::Mapped(_)));
    }

    #[test]
    fn test_single_cell_slice_narrows_bounds() {
        let dim = lon(vec![0.0, 1.0, 3.0, 4.0]);
        assert_eq!(dim.slice(2..3).unwrap().bounds(), Some((2.0, 3.5)));
        assert_eq!(dim.slice(0..1).unwrap().bounds(), Some((-0.5, 0.5)));
        assert_eq!(dim.slice(3..4).unwrap().bounds(), Some((3.5, 4.5)));

        let reversed = lon(vec![4.0, 3.0, 1.0, 0.0]);
        assert_eq!(reversed.slice(1..2).unwrap().bounds(), Some((2.0, 3.5)));
    }

    #[test]
    fn test_positional() {
        let dim = Dimension::positional(DimLabel::Named("member".into()), 3);
        assert_eq!(dim.len(), 3);
        assert_eq!(dim.mode(), &IndexMode::NoIndex);
        assert_eq!(dim.bounds(), None);
    }
}
