//! Index modes: how the values of a dimension index are to be interpreted.
//!
//! ```text
//!   Sampled      order + span + sampling
//!   Categorical  unordered labels
//!   NoIndex      positions only
//!   Projected    sampled, stored in `crs`, optionally mappable to `mappedcrs`
//!   Mapped       sampled, stored in `mappedcrs`, with the native `crs` remembered
//! ```

use std::fmt;

use geostack_common::{Crs, GeoStackError, GeoStackResult};
use serde::{Deserialize, Serialize};

use crate::order::Order;
use crate::sampling::Sampling;
use crate::span::{Span, Step};

/// Order, span and sampling of a sampled axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledMode {
    pub order: Order,
    pub span: Span,
    pub sampling: Sampling,
}

impl SampledMode {
    pub fn new(order: Order, span: Span, sampling: Sampling) -> Self {
        Self {
            order,
            span,
            sampling,
        }
    }

    fn approx_eq(&self, other: &SampledMode) -> bool {
        self.order == other.order
            && self.sampling == other.sampling
            && self.span.approx_eq(&other.span)
    }
}

/// A sampled axis that carries coordinate reference systems.
///
/// Build through [`ProjectedMode::new`] so the crs default is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedMode {
    sampled: SampledMode,
    crs: Option<Crs>,
    mappedcrs: Option<Crs>,
}

impl ProjectedMode {
    pub fn new(sampled: SampledMode, crs: Option<Crs>, mappedcrs: Option<Crs>) -> Self {
        let crs = default_crs(&sampled.span, crs, mappedcrs.as_ref());
        Self {
            sampled,
            crs,
            mappedcrs,
        }
    }

    pub fn sampled(&self) -> &SampledMode {
        &self.sampled
    }

    pub fn crs(&self) -> Option<&Crs> {
        self.crs.as_ref()
    }

    pub fn mappedcrs(&self) -> Option<&Crs> {
        self.mappedcrs.as_ref()
    }

    /// Same crs pair with different sampled properties.
    pub fn with_sampled(&self, sampled: SampledMode) -> Self {
        Self::new(sampled, self.crs.clone(), self.mappedcrs.clone())
    }

    fn approx_eq(&self, other: &ProjectedMode) -> bool {
        self.crs == other.crs
            && self.mappedcrs == other.mappedcrs
            && self.sampled.approx_eq(&other.sampled)
    }
}

/// A regular span with no crs of its own is stored in its mapped crs.
///
/// This is the only place the default is applied.
fn default_crs(span: &Span, crs: Option<Crs>, mappedcrs: Option<&Crs>) -> Option<Crs> {
    match (crs, span) {
        (Some(crs), _) => Some(crs),
        (None, Span::Regular(_)) => mappedcrs.cloned(),
        (None, _) => None,
    }
}

/// Projection class of a mode, used as a conversion target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModeClass {
    Projected,
    Mapped,
}

impl fmt::Display for ModeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeClass::Projected => write!(f, "Projected"),
            ModeClass::Mapped => write!(f, "Mapped"),
        }
    }
}

impl std::str::FromStr for ModeClass {
    type Err = GeoStackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "projected" => Ok(ModeClass::Projected),
            "mapped" => Ok(ModeClass::Mapped),
            other => Err(GeoStackError::InvalidConfig(format!(
                "unknown mode class '{}', expected 'projected' or 'mapped'",
                other
            ))),
        }
    }
}

/// How a dimension's index values are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum IndexMode {
    Sampled(SampledMode),
    Categorical,
    NoIndex,
    Projected(ProjectedMode),
    Mapped(ProjectedMode),
}

impl IndexMode {
    pub fn projected(sampled: SampledMode, crs: Option<Crs>, mappedcrs: Option<Crs>) -> Self {
        IndexMode::Projected(ProjectedMode::new(sampled, crs, mappedcrs))
    }

    pub fn mapped(sampled: SampledMode, crs: Option<Crs>, mappedcrs: Option<Crs>) -> Self {
        IndexMode::Mapped(ProjectedMode::new(sampled, crs, mappedcrs))
    }

    pub fn name(&self) -> &'static str {
        match self {
            IndexMode::Sampled(_) => "Sampled",
            IndexMode::Categorical => "Categorical",
            IndexMode::NoIndex => "NoIndex",
            IndexMode::Projected(_) => "Projected",
            IndexMode::Mapped(_) => "Mapped",
        }
    }

    /// The projection class, if this is a projection mode.
    pub fn class(&self) -> Option<ModeClass> {
        match self {
            IndexMode::Projected(_) => Some(ModeClass::Projected),
            IndexMode::Mapped(_) => Some(ModeClass::Mapped),
            _ => None,
        }
    }

    pub fn sampled(&self) -> Option<&SampledMode> {
        match self {
            IndexMode::Sampled(s) => Some(s),
            IndexMode::Projected(p) | IndexMode::Mapped(p) => Some(p.sampled()),
            IndexMode::Categorical | IndexMode::NoIndex => None,
        }
    }

    fn require_sampled(&self, property: &str) -> GeoStackResult<&SampledMode> {
        self.sampled()
            .ok_or_else(|| GeoStackError::not_sampled(self.name(), property))
    }

    pub fn order(&self) -> GeoStackResult<Order> {
        Ok(self.require_sampled("order")?.order)
    }

    pub fn span(&self) -> GeoStackResult<&Span> {
        Ok(&self.require_sampled("span")?.span)
    }

    pub fn sampling(&self) -> GeoStackResult<Sampling> {
        Ok(self.require_sampled("sampling")?.sampling)
    }

    pub fn crs(&self) -> Option<&Crs> {
        match self {
            IndexMode::Projected(p) | IndexMode::Mapped(p) => p.crs(),
            _ => None,
        }
    }

    pub fn mappedcrs(&self) -> Option<&Crs> {
        match self {
            IndexMode::Projected(p) | IndexMode::Mapped(p) => p.mappedcrs(),
            _ => None,
        }
    }

    /// The crs the index values are stored in.
    pub fn stored_crs(&self) -> Option<&Crs> {
        match self {
            IndexMode::Projected(p) => p.crs(),
            IndexMode::Mapped(p) => p.mappedcrs(),
            _ => None,
        }
    }

    /// Replace the sampled properties, keeping the variant and crs.
    pub fn with_sampled(&self, sampled: SampledMode) -> IndexMode {
        match self {
            IndexMode::Sampled(_) => IndexMode::Sampled(sampled),
            IndexMode::Projected(p) => IndexMode::Projected(p.with_sampled(sampled)),
            IndexMode::Mapped(p) => IndexMode::Mapped(p.with_sampled(sampled)),
            other => other.clone(),
        }
    }

    /// Equality with a relative tolerance on span steps and bounds.
    pub fn approx_eq(&self, other: &IndexMode) -> bool {
        match (self, other) {
            (IndexMode::Sampled(a), IndexMode::Sampled(b)) => a.approx_eq(b),
            (IndexMode::Projected(a), IndexMode::Projected(b))
            | (IndexMode::Mapped(a), IndexMode::Mapped(b)) => a.approx_eq(b),
            _ => self == other,
        }
    }
}

impl fmt::Display for IndexMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(sampled) = self.sampled() else {
            return write!(f, "{}", self.name());
        };
        let span = match &sampled.span {
            Span::Regular(step) => match step {
                Step::Numeric(v) => format!("Regular({})", v),
                Step::Period(p) => format!("Regular({})", p),
            },
            Span::Irregular(Some((lo, hi))) => format!("Irregular({}, {})", lo, hi),
            Span::Irregular(None) => "Irregular".to_string(),
            Span::Explicit(bounds) => format!("Explicit({} cells)", bounds.nrows()),
        };
        write!(
            f,
            "{}({:?}, {}, {:?}",
            self.name(),
            sampled.order.index,
            span,
            sampled.sampling
        )?;
        if let Some(crs) = self.crs() {
            write!(f, ", crs={}", crs)?;
        }
        if let Some(mappedcrs) = self.mappedcrs() {
            write!(f, ", mappedcrs={}", mappedcrs)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::Locus;

    fn regular() -> SampledMode {
        SampledMode::new(Order::forward(), Span::regular(1.0), Sampling::Intervals(Locus::Center))
    }

    #[test]
    fn test_regular_span_defaults_crs_to_mappedcrs() {
        let mode = IndexMode::projected(regular(), None, Some(Crs::WGS84));
        assert_eq!(mode.crs(), Some(&Crs::WGS84));
        assert_eq!(mode.mappedcrs(), Some(&Crs::WGS84));
    }

    #[test]
    fn test_irregular_span_keeps_crs_unset() {
        let sampled = SampledMode::new(Order::forward(), Span::Irregular(None), Sampling::Points);
        let mode = IndexMode::mapped(sampled, None, Some(Crs::WGS84));
        assert_eq!(mode.crs(), None);
        assert_eq!(mode.stored_crs(), Some(&Crs::WGS84));
    }

    #[test]
    fn test_explicit_crs_wins() {
        let mode = IndexMode::projected(regular(), Some(Crs::WEB_MERCATOR), Some(Crs::WGS84));
        assert_eq!(mode.crs(), Some(&Crs::WEB_MERCATOR));
    }

    #[test]
    fn test_non_sampled_properties_error() {
        let err = IndexMode::Categorical.span().unwrap_err();
        assert!(matches!(err, GeoStackError::NotSampled { .. }));
        assert_eq!(err.category(), geostack_common::ErrorCategory::ModeConversion);
        assert!(IndexMode::NoIndex.order().is_err());
        assert!(IndexMode::NoIndex.sampling().is_err());
    }

    #[test]
    fn test_mode_class_from_str() {
        assert_eq!("Mapped".parse::<ModeClass>().unwrap(), ModeClass::Mapped);
        assert_eq!("projected".parse::<ModeClass>().unwrap(), ModeClass::Projected);
        assert!("sampled".parse::<ModeClass>().is_err());
    }
}
