//! Point or interval sampling of an axis.

use serde::{Deserialize, Serialize};

/// Where inside its cell a stored interval coordinate sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locus {
    Start,
    Center,
    End,
}

impl Locus {
    /// Offset from this locus to the cell centre, in units of the signed step.
    pub fn center_offset(&self) -> f64 {
        match self {
            Locus::Start => 0.5,
            Locus::Center => 0.0,
            Locus::End => -0.5,
        }
    }
}

/// Whether index values are discrete points or represent cell intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sampling {
    Points,
    Intervals(Locus),
}

impl Sampling {
    pub fn locus(&self) -> Option<Locus> {
        match self {
            Sampling::Points => None,
            Sampling::Intervals(locus) => Some(*locus),
        }
    }

    pub fn is_intervals(&self) -> bool {
        matches!(self, Sampling::Intervals(_))
    }
}
