//! Semantic axis labels.

use std::fmt;

use projection::AxisKind;
use serde::{Deserialize, Serialize};

/// The semantic kind of a dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DimLabel {
    X,
    Y,
    Z,
    Time,
    Band,
    /// Any other dimension, by its dataset name.
    Named(String),
}

/// Dataset dimension names with a known semantic label.
const NAME_TABLE: &[(&str, DimLabel)] = &[
    ("lat", DimLabel::Y),
    ("latitude", DimLabel::Y),
    ("y", DimLabel::Y),
    ("lon", DimLabel::X),
    ("long", DimLabel::X),
    ("longitude", DimLabel::X),
    ("x", DimLabel::X),
    ("time", DimLabel::Time),
    ("lev", DimLabel::Z),
    ("level", DimLabel::Z),
    ("mlev", DimLabel::Z),
    ("vertical", DimLabel::Z),
    ("z", DimLabel::Z),
    ("band", DimLabel::Band),
];

impl DimLabel {
    /// Map a dataset dimension name to its label.
    ///
    /// Matching is exact; unknown names become [`DimLabel::Named`].
    pub fn from_name(name: &str) -> Self {
        NAME_TABLE
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, label)| label.clone())
            .unwrap_or_else(|| DimLabel::Named(name.to_string()))
    }

    /// Name used for the disk dimension and coordinate variable.
    pub fn disk_name(&self) -> String {
        match self {
            DimLabel::X => "x".to_string(),
            DimLabel::Y => "y".to_string(),
            DimLabel::Z => "z".to_string(),
            DimLabel::Time => "time".to_string(),
            DimLabel::Band => "band".to_string(),
            DimLabel::Named(name) => name.to_lowercase(),
        }
    }

    /// X and Y carry projection modes.
    pub fn is_spatial(&self) -> bool {
        matches!(self, DimLabel::X | DimLabel::Y)
    }

    pub fn axis_kind(&self) -> Option<AxisKind> {
        match self {
            DimLabel::X => Some(AxisKind::X),
            DimLabel::Y => Some(AxisKind::Y),
            _ => None,
        }
    }
}

impl fmt::Display for DimLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimLabel::X => write!(f, "X"),
            DimLabel::Y => write!(f, "Y"),
            DimLabel::Z => write!(f, "Z"),
            DimLabel::Time => write!(f, "Time"),
            DimLabel::Band => write!(f, "Band"),
            DimLabel::Named(name) => write!(f, "{}", name),
        }
    }
}
