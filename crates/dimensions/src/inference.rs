//! Inference of order, span, sampling and mode from raw coordinate data.
//!
//! Priority for span and sampling:
//! 1. a bounds matrix gives `Explicit` + `Intervals(Center)`
//! 2. time coordinates use the `delta_t` / `avg_period` attributes
//! 3. numeric coordinates are checked for a constant step
//!
//! X and Y dimensions then get a projection mode, other labels `Sampled`.
//! Text coordinates are `Categorical` and positional indices `NoIndex`.

use geostack_common::{Crs, Metadata, Period};
use ndarray::Array2;
use tracing::debug;

use crate::index::DimIndex;
use crate::label::DimLabel;
use crate::mode::{IndexMode, SampledMode};
use crate::order::Order;
use crate::sampling::{Locus, Sampling};
use crate::span::{approx_eq, Span, Step};

/// Attribute holding the spacing of point-sampled time axes.
pub const DELTA_T_ATTR: &str = "delta_t";

/// Attribute holding the averaging period of interval time axes.
pub const AVG_PERIOD_ATTR: &str = "avg_period";

/// Coordinate reference systems known for the dimensions being inferred.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrsHints {
    pub crs: Option<Crs>,
    pub mappedcrs: Option<Crs>,
}

impl CrsHints {
    pub fn new(crs: Option<Crs>, mappedcrs: Option<Crs>) -> Self {
        Self { crs, mappedcrs }
    }
}

/// Forward when the last value is greater than the first, reverse otherwise.
///
/// A single value therefore gives the reverse order.
pub fn infer_order<T: PartialOrd>(values: &[T]) -> Order {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) if last > first => Order::forward(),
        _ => Order::reverse(),
    }
}

/// Outer bounds of an irregular axis, from its first and last steps only.
pub fn irregular_bounds(values: &[f64], order: &Order) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let (first, last) = (values[0], values[n - 1]);
    let first_step = (values[1] - values[0]).abs();
    let last_step = (values[n - 1] - values[n - 2]).abs();
    if order.is_reverse_index() {
        Some((last - last_step / 2.0, first + first_step / 2.0))
    } else {
        Some((first - first_step / 2.0, last + last_step / 2.0))
    }
}

/// Regular when every consecutive difference matches the first, irregular otherwise.
pub fn infer_span(values: &[f64], order: &Order) -> Span {
    match values {
        [] => Span::Irregular(None),
        [_] => Span::regular(0.0),
        [a, b, ..] => {
            let step = b - a;
            let regular = values.windows(2).all(|w| approx_eq(w[1] - w[0], step));
            if regular {
                Span::regular(step)
            } else {
                Span::Irregular(irregular_bounds(values, order))
            }
        }
    }
}

/// Span and sampling of a time axis from its period attributes.
///
/// `delta_t` takes precedence over `avg_period`. An unparsable `delta_t`
/// does not fall through.
pub fn infer_time_span(metadata: &Metadata) -> (Span, Sampling) {
    let irregular = (Span::Irregular(None), Sampling::Points);
    if let Some(delta_t) = metadata.get(DELTA_T_ATTR) {
        return match delta_t.as_str().and_then(Period::parse) {
            Some(period) => (Span::Regular(Step::Period(period)), Sampling::Points),
            None => {
                debug!(value = ?delta_t, "Unparsable delta_t, time axis is irregular");
                irregular
            }
        };
    }
    if let Some(avg_period) = metadata.get(AVG_PERIOD_ATTR) {
        return match avg_period.as_str().and_then(Period::parse) {
            Some(period) => (
                Span::Regular(Step::Period(period)),
                Sampling::Intervals(Locus::Center),
            ),
            None => {
                debug!(value = ?avg_period, "Unparsable avg_period, time axis is irregular");
                irregular
            }
        };
    }
    irregular
}

/// Build the mode of a dimension from its index, optional bounds matrix and
/// coordinate attributes.
pub fn infer_mode(
    label: &DimLabel,
    index: &DimIndex,
    bounds: Option<Array2<f64>>,
    metadata: &Metadata,
    hints: &CrsHints,
) -> IndexMode {
    let sampled = match index {
        DimIndex::Positional(_) => return IndexMode::NoIndex,
        DimIndex::Text(_) => return IndexMode::Categorical,
        DimIndex::Numeric(values) => {
            let order = infer_order(values);
            match bounds {
                Some(bounds) => {
                    SampledMode::new(order, Span::Explicit(bounds), Sampling::Intervals(Locus::Center))
                }
                None => SampledMode::new(order, infer_span(values, &order), Sampling::Points),
            }
        }
        DimIndex::Time(values) => {
            let order = infer_order(values);
            match bounds {
                Some(bounds) => {
                    SampledMode::new(order, Span::Explicit(bounds), Sampling::Intervals(Locus::Center))
                }
                None => {
                    let (span, sampling) = infer_time_span(metadata);
                    SampledMode::new(order, span, sampling)
                }
            }
        }
    };

    let mode = if label.is_spatial() {
        if hints.mappedcrs.is_some() {
            IndexMode::mapped(sampled, hints.crs.clone(), hints.mappedcrs.clone())
        } else {
            IndexMode::projected(sampled, hints.crs.clone(), None)
        }
    } else {
        IndexMode::Sampled(sampled)
    };
    debug!(%label, len = index.len(), mode = %mode, "Inferred index mode");
    mode
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::{ArrayOrder, IndexOrder, Relation};
    use chrono::NaiveDate;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_order() {
        let fwd = infer_order(&[1.0, 2.0, 3.0]);
        assert_eq!(fwd.index, IndexOrder::ForwardIndex);
        assert_eq!(fwd.array, ArrayOrder::ForwardArray);
        assert_eq!(fwd.relation, Relation::ForwardRelation);

        let rev = infer_order(&[3.0, 2.0, 1.0]);
        assert_eq!(rev.index, IndexOrder::ReverseIndex);
        assert_eq!(rev.array, ArrayOrder::ReverseArray);
        assert_eq!(rev.relation, Relation::ForwardRelation);

        assert_eq!(infer_order(&[5.0]), Order::reverse());
    }

    #[test]
    fn test_single_value_is_regular_zero() {
        assert_eq!(infer_span(&[42.0], &Order::reverse()), Span::regular(0.0));
    }

    #[test]
    fn test_irregular_bounds() {
        let values = [0.0, 1.0, 3.0, 4.0];
        let span = infer_span(&values, &infer_order(&values));
        assert_eq!(span, Span::Irregular(Some((-0.5, 4.5))));

        let reversed = [4.0, 3.0, 1.0, 0.0];
        let span = infer_span(&reversed, &infer_order(&reversed));
        assert_eq!(span, Span::Irregular(Some((-0.5, 4.5))));

        // only the outer steps count
        let values = [0.0, 2.0, 3.0, 7.0];
        let span = infer_span(&values, &infer_order(&values));
        assert_eq!(span, Span::Irregular(Some((-1.0, 9.0))));
    }

    #[test]
    fn test_time_delta_t() {
        let meta = Metadata::new().with(DELTA_T_ATTR, "0000-00-00 00:01:00");
        let (span, sampling) = infer_time_span(&meta);
        assert_eq!(
            span,
            Span::Regular(Step::Period(Period::new(geostack_common::PeriodUnit::Minute, 1)))
        );
        assert_eq!(sampling, Sampling::Points);
    }

    #[test]
    fn test_time_avg_period() {
        let meta = Metadata::new().with(AVG_PERIOD_ATTR, "0000-01-00 00:00:00");
        let (span, sampling) = infer_time_span(&meta);
        assert!(span.is_regular());
        assert_eq!(sampling, Sampling::Intervals(Locus::Center));
    }

    #[test]
    fn test_unparsable_delta_t_does_not_fall_through() {
        let meta = Metadata::new()
            .with(DELTA_T_ATTR, "daily")
            .with(AVG_PERIOD_ATTR, "0000-01-00 00:00:00");
        assert_eq!(infer_time_span(&meta), (Span::Irregular(None), Sampling::Points));
        assert_eq!(
            infer_time_span(&Metadata::new()),
            (Span::Irregular(None), Sampling::Points)
        );
    }

    #[test]
    fn test_infer_mode_spatial() {
        let index = DimIndex::Numeric(vec![10.0, 20.0, 30.0]);
        let hints = CrsHints::new(None, Some(Crs::WGS84));
        let mode = infer_mode(&DimLabel::X, &index, None, &Metadata::new(), &hints);
        assert!(matches!(mode, IndexMode::Mapped(_)));
        assert_eq!(mode.crs(), Some(&Crs::WGS84));

        let hints = CrsHints::new(Some(Crs::WEB_MERCATOR), None);
        let mode = infer_mode(&DimLabel::Y, &index, None, &Metadata::new(), &hints);
        assert!(matches!(mode, IndexMode::Projected(_)));
        assert_eq!(mode.crs(), Some(&Crs::WEB_MERCATOR));
    }

    #[test]
    fn test_infer_mode_other_labels() {
        let hints = CrsHints::default();
        let text = DimIndex::Text(vec!["a".into(), "b".into()]);
        let mode = infer_mode(&DimLabel::Band, &text, None, &Metadata::new(), &hints);
        assert_eq!(mode, IndexMode::Categorical);

        let mode = infer_mode(
            &DimLabel::Named("member".into()),
            &DimIndex::Positional(4),
            None,
            &Metadata::new(),
            &hints,
        );
        assert_eq!(mode, IndexMode::NoIndex);

        let levels = DimIndex::Numeric(vec![1000.0, 850.0, 500.0]);
        let mode = infer_mode(&DimLabel::Z, &levels, None, &Metadata::new(), &hints);
        assert!(matches!(mode, IndexMode::Sampled(_)));
        assert!(mode.order().unwrap().is_reverse_index());
    }

    #[test]
    fn test_bounds_matrix_is_explicit() {
        let bounds = array![[0.0, 1.0], [1.0, 2.0]];
        let index = DimIndex::Numeric(vec![0.5, 1.5]);
        let mode = infer_mode(&DimLabel::Z, &index, Some(bounds.clone()), &Metadata::new(), &CrsHints::default());
        assert_eq!(mode.span().unwrap(), &Span::Explicit(bounds));
        assert_eq!(mode.sampling().unwrap(), Sampling::Intervals(Locus::Center));
    }

    #[test]
    fn test_time_mode() {
        let t0 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let t1 = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let meta = Metadata::new().with(DELTA_T_ATTR, "0000-00-01 00:00:00");
        let mode = infer_mode(&DimLabel::Time, &DimIndex::Time(vec![t0, t1]), None, &meta, &CrsHints::default());
        assert!(matches!(mode, IndexMode::Sampled(_)));
        assert_eq!(mode.order().unwrap(), Order::forward());
        assert!(mode.span().unwrap().is_regular());
    }

    proptest! {
        #[test]
        fn constant_step_is_regular(
            start in -1000.0f64..1000.0,
            step in prop_oneof![0.1f64..100.0, -100.0f64..-0.1],
            n in 2usize..50,
        ) {
            let values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            let span = infer_span(&values, &infer_order(&values));
            let found = span.step();
            prop_assert!(found.is_some(), "expected regular span, got {:?}", span);
            prop_assert!((found.unwrap() - step).abs() < 1e-9 * step.abs().max(1.0));
        }

        #[test]
        fn irregular_bounds_enclose_values(
            mut values in proptest::collection::vec(-1000.0f64..1000.0, 3..30),
        ) {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap());
            values.dedup();
            prop_assume!(values.len() >= 2);
            let order = infer_order(&values);
            let (lo, hi) = irregular_bounds(&values, &order).unwrap();
            prop_assert!(lo <= values[0]);
            prop_assert!(hi >= values[values.len() - 1]);
        }
    }
}
