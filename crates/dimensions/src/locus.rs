//! Shifting interval coordinates to cell centres.

use tracing::warn;

use crate::dimension::Dimension;
use crate::index::DimIndex;
use crate::sampling::{Locus, Sampling};
use crate::span::{Span, Step};

/// Rewrite a regular interval dimension so each coordinate sits at its cell centre.
///
/// Start-locus values move by `+step/2`, end-locus values by `-step/2` (signed
/// step), and the locus becomes `Center`. Point sampling and irregular or
/// explicit spans are returned unchanged. Time coordinates are never shifted;
/// a regular time span with a start or end locus logs a warning.
pub fn shift_to_center(dim: &Dimension) -> Dimension {
    let Some(sampled) = dim.mode().sampled() else {
        return dim.clone();
    };
    let locus = match sampled.sampling {
        Sampling::Intervals(locus) if locus != Locus::Center => locus,
        _ => return dim.clone(),
    };

    match (&sampled.span, dim.index()) {
        (Span::Regular(Step::Numeric(step)), DimIndex::Numeric(values)) => {
            let offset = step * locus.center_offset();
            let shifted = values.iter().map(|v| v + offset).collect();
            let mut centred = sampled.clone();
            centred.sampling = Sampling::Intervals(Locus::Center);
            dim.with_index(DimIndex::Numeric(shifted), dim.mode().with_sampled(centred))
        }
        (Span::Regular(Step::Period(_)), DimIndex::Time(_)) => {
            warn!(
                label = %dim.label(),
                ?locus,
                "Cannot shift time coordinates to cell centre, leaving them unchanged"
            );
            dim.clone()
        }
        _ => dim.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::DimLabel;
    use crate::mode::{IndexMode, SampledMode};
    use crate::order::Order;
    use chrono::NaiveDate;
    use geostack_common::{Metadata, Period, PeriodUnit};

    fn interval_dim(values: Vec<f64>, step: f64, locus: Locus) -> Dimension {
        let sampled = SampledMode::new(
            Order::forward(),
            Span::regular(step),
            Sampling::Intervals(locus),
        );
        Dimension::new(
            DimLabel::X,
            DimIndex::Numeric(values),
            IndexMode::Sampled(sampled),
            Metadata::new(),
        )
    }

    #[test]
    fn test_start_and_end_shift() {
        let start = shift_to_center(&interval_dim(vec![0.0, 10.0], 10.0, Locus::Start));
        assert_eq!(start.index(), &DimIndex::Numeric(vec![5.0, 15.0]));
        assert_eq!(start.mode().sampling().unwrap(), Sampling::Intervals(Locus::Center));

        let end = shift_to_center(&interval_dim(vec![10.0, 0.0], -10.0, Locus::End));
        assert_eq!(end.index(), &DimIndex::Numeric(vec![15.0, 5.0]));
    }

    #[test]
    fn test_centred_is_unchanged() {
        let dim = interval_dim(vec![0.5, 1.5, 2.5], 1.0, Locus::Center);
        assert_eq!(shift_to_center(&dim), dim);
    }

    #[test]
    fn test_points_unchanged() {
        let sampled = SampledMode::new(Order::forward(), Span::regular(1.0), Sampling::Points);
        let dim = Dimension::new(
            DimLabel::Y,
            DimIndex::Numeric(vec![0.0, 1.0]),
            IndexMode::Sampled(sampled),
            Metadata::new(),
        );
        assert_eq!(shift_to_center(&dim), dim);
    }

    #[test]
    fn test_time_is_not_shifted() {
        let t0 = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let sampled = SampledMode::new(
            Order::forward(),
            Span::Regular(Step::Period(Period::new(PeriodUnit::Month, 1))),
            Sampling::Intervals(Locus::Start),
        );
        let dim = Dimension::new(
            DimLabel::Time,
            DimIndex::Time(vec![t0]),
            IndexMode::Sampled(sampled),
            Metadata::new(),
        );
        let (shifted, logs) = test_utils::capture_warnings(|| shift_to_center(&dim));
        assert_eq!(shifted, dim);
        assert!(logs.contains("Cannot shift time coordinates"));
    }

    #[test]
    fn test_irregular_time_is_left_quietly() {
        let t0 = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let sampled = SampledMode::new(
            Order::forward(),
            Span::Irregular(None),
            Sampling::Intervals(Locus::Start),
        );
        let dim = Dimension::new(
            DimLabel::Time,
            DimIndex::Time(vec![t0]),
            IndexMode::Sampled(sampled),
            Metadata::new(),
        );
        let (shifted, logs) = test_utils::capture_warnings(|| shift_to_center(&dim));
        assert_eq!(shifted, dim);
        assert!(logs.is_empty());
    }
}
