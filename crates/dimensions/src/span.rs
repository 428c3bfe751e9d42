//! Cell spacing of an axis.

use geostack_common::Period;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Relative tolerance for comparing coordinate steps (square root of machine epsilon).
pub const STEP_RTOL: f64 = 1.4901161193847656e-8;

/// Approximate float equality with relative tolerance [`STEP_RTOL`].
pub fn approx_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= STEP_RTOL * a.abs().max(b.abs())
}

/// Spacing of a regular axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Step {
    /// A numeric step in index units, negative for descending axes.
    Numeric(f64),
    /// A calendar period for time axes.
    Period(Period),
}

impl Step {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Step::Numeric(v) => Some(*v),
            Step::Period(_) => None,
        }
    }

    pub fn approx_eq(&self, other: &Step) -> bool {
        match (self, other) {
            (Step::Numeric(a), Step::Numeric(b)) => approx_eq(*a, *b),
            (Step::Period(a), Step::Period(b)) => a == b,
            _ => false,
        }
    }
}

/// Spacing of an axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Span {
    /// Constant spacing.
    Regular(Step),
    /// Variable spacing, with outer `(min, max)` bounds when known.
    Irregular(Option<(f64, f64)>),
    /// Per-cell bounds, one `[min, max]` row per index value.
    Explicit(Array2<f64>),
}

impl Span {
    /// A regular numeric span.
    pub fn regular(step: f64) -> Self {
        Span::Regular(Step::Numeric(step))
    }

    pub fn is_regular(&self) -> bool {
        matches!(self, Span::Regular(_))
    }

    /// The numeric step of a regular span.
    pub fn step(&self) -> Option<f64> {
        match self {
            Span::Regular(step) => step.as_f64(),
            _ => None,
        }
    }

    pub fn approx_eq(&self, other: &Span) -> bool {
        match (self, other) {
            (Span::Regular(a), Span::Regular(b)) => a.approx_eq(b),
            (Span::Irregular(None), Span::Irregular(None)) => true,
            (Span::Irregular(Some(a)), Span::Irregular(Some(b))) => {
                approx_eq(a.0, b.0) && approx_eq(a.1, b.1)
            }
            (Span::Explicit(a), Span::Explicit(b)) => {
                a.shape() == b.shape() && a.iter().zip(b.iter()).all(|(x, y)| approx_eq(*x, *y))
            }
            _ => false,
        }
    }
}
