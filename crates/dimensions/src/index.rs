//! Index values of a dimension.

use std::ops::Range;

use chrono::NaiveDateTime;
use geostack_common::{Coordinates, GeoStackError, GeoStackResult};
use serde::{Deserialize, Serialize};

use crate::span::approx_eq;

/// The lookup values along one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DimIndex {
    Numeric(Vec<f64>),
    Time(Vec<NaiveDateTime>),
    Text(Vec<String>),
    /// No coordinate values, only a length. Positions are `0..len`.
    Positional(usize),
}

impl DimIndex {
    pub fn len(&self) -> usize {
        match self {
            DimIndex::Numeric(v) => v.len(),
            DimIndex::Time(v) => v.len(),
            DimIndex::Text(v) => v.len(),
            DimIndex::Positional(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, DimIndex::Positional(_))
    }

    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            DimIndex::Numeric(v) => Some(v),
            _ => None,
        }
    }

    /// Narrow the index to `range`.
    pub fn slice(&self, range: Range<usize>) -> GeoStackResult<DimIndex> {
        if range.start > range.end || range.end > self.len() {
            return Err(GeoStackError::shape_mismatch(format!(
                "index range {:?} out of bounds for length {}",
                range,
                self.len()
            )));
        }
        Ok(match self {
            DimIndex::Numeric(v) => DimIndex::Numeric(v[range].to_vec()),
            DimIndex::Time(v) => DimIndex::Time(v[range].to_vec()),
            DimIndex::Text(v) => DimIndex::Text(v[range].to_vec()),
            DimIndex::Positional(_) => DimIndex::Positional(range.len()),
        })
    }

    /// Equality with a relative tolerance on numeric values.
    pub fn approx_eq(&self, other: &DimIndex) -> bool {
        match (self, other) {
            (DimIndex::Numeric(a), DimIndex::Numeric(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| approx_eq(*x, *y))
            }
            _ => self == other,
        }
    }

    /// Coordinate values for writing. `None` for positional indices.
    pub fn to_coordinates(&self) -> Option<Coordinates> {
        match self {
            DimIndex::Numeric(v) => Some(Coordinates::Numeric(v.clone())),
            DimIndex::Time(v) => Some(Coordinates::Time(v.clone())),
            DimIndex::Text(v) => Some(Coordinates::Text(v.clone())),
            DimIndex::Positional(_) => None,
        }
    }
}

impl From<Coordinates> for DimIndex {
    fn from(coords: Coordinates) -> Self {
        match coords {
            Coordinates::Numeric(v) => DimIndex::Numeric(v),
            Coordinates::Time(v) => DimIndex::Time(v),
            Coordinates::Text(v) => DimIndex::Text(v),
        }
    }
}
