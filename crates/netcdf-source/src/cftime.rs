//! CF `units` strings for time coordinates, e.g. `"days since 1970-01-01"`.
//!
//! Only the standard (proleptic Gregorian) calendar is supported.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::error::{SourceError, SourceResult};

/// Units used when writing time coordinates.
pub const DEFAULT_TIME_UNITS: &str = "days since 1970-01-01 00:00:00";

/// A parsed `<unit> since <epoch>` string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeUnits {
    seconds_per_unit: f64,
    epoch: NaiveDateTime,
}

impl TimeUnits {
    /// Parse a CF time units string. `None` when it is not one.
    pub fn parse(units: &str) -> Option<TimeUnits> {
        let (unit, epoch) = units.trim().split_once(" since ")?;
        let seconds_per_unit = match unit.trim().to_lowercase().as_str() {
            "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
            "minutes" | "minute" | "mins" | "min" => 60.0,
            "hours" | "hour" | "hrs" | "hr" | "h" => 3600.0,
            "days" | "day" | "d" => 86400.0,
            _ => return None,
        };
        Some(TimeUnits {
            seconds_per_unit,
            epoch: parse_epoch(epoch.trim())?,
        })
    }

    pub fn decode(&self, value: f64) -> SourceResult<NaiveDateTime> {
        let millis = (value * self.seconds_per_unit * 1000.0).round();
        if !millis.is_finite() || millis.abs() > i64::MAX as f64 {
            return Err(SourceError::invalid(format!("time value {} out of range", value)));
        }
        self.epoch
            .checked_add_signed(Duration::milliseconds(millis as i64))
            .ok_or_else(|| SourceError::invalid(format!("time value {} out of range", value)))
    }

    pub fn encode(&self, time: NaiveDateTime) -> f64 {
        let millis = (time - self.epoch).num_milliseconds() as f64;
        millis / 1000.0 / self.seconds_per_unit
    }
}

fn parse_epoch(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim_end_matches('Z').trim_end_matches(" UTC");
    const FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
