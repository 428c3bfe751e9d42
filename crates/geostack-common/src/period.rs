//! Calendar periods used as the step of regular time axes.
//!
//! Climate datasets describe their time step with attributes like
//! `delta_t = "0000-00-01 00:00:00"` (one day between samples) or
//! `avg_period = "0000-01-00 00:00:00"` (values are monthly means). The
//! string is a compound duration, one field per calendar unit.

use std::fmt;
use std::sync::OnceLock;

use chrono::{Duration, Months, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A calendar unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PeriodUnit {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl PeriodUnit {
    const ALL: [PeriodUnit; 6] = [
        PeriodUnit::Year,
        PeriodUnit::Month,
        PeriodUnit::Day,
        PeriodUnit::Hour,
        PeriodUnit::Minute,
        PeriodUnit::Second,
    ];

    fn name(&self) -> &'static str {
        match self {
            PeriodUnit::Year => "year",
            PeriodUnit::Month => "month",
            PeriodUnit::Day => "day",
            PeriodUnit::Hour => "hour",
            PeriodUnit::Minute => "minute",
            PeriodUnit::Second => "second",
        }
    }
}

/// A (possibly compound) calendar period such as "1 month" or "1 day, 6 hours".
///
/// Only non-zero parts are stored, ordered from years down to seconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    parts: Vec<(PeriodUnit, i64)>,
}

fn period_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{4})-(\d{2})-(\d{2}) (\d{2}):(\d{2}):(\d{2})")
            .expect("period pattern is a valid regex")
    })
}

impl Period {
    /// A period of `amount` units.
    pub fn new(unit: PeriodUnit, amount: i64) -> Self {
        let parts = if amount == 0 { Vec::new() } else { vec![(unit, amount)] };
        Self { parts }
    }

    /// Parse a `YYYY-MM-DD HH:MM:SS` compound period.
    ///
    /// The pattern may appear anywhere in the string. Returns `None` when it
    /// does not match.
    pub fn parse(s: &str) -> Option<Period> {
        let caps = period_regex().captures(s)?;
        let mut parts = Vec::new();
        for (i, unit) in PeriodUnit::ALL.iter().enumerate() {
            let amount: i64 = caps.get(i + 1)?.as_str().parse().ok()?;
            if amount != 0 {
                parts.push((*unit, amount));
            }
        }
        Some(Period { parts })
    }

    /// The non-zero parts of this period.
    pub fn parts(&self) -> &[(PeriodUnit, i64)] {
        &self.parts
    }

    /// The unit and amount when the period is made of exactly one unit.
    pub fn single_unit(&self) -> Option<(PeriodUnit, i64)> {
        match self.parts.as_slice() {
            [single] => Some(*single),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.parts.is_empty()
    }

    /// Fixed-length equivalent. `None` when years or months are involved.
    pub fn to_duration(&self) -> Option<Duration> {
        let mut total = Duration::zero();
        for &(unit, amount) in &self.parts {
            total = total
                + match unit {
                    PeriodUnit::Year | PeriodUnit::Month => return None,
                    PeriodUnit::Day => Duration::days(amount),
                    PeriodUnit::Hour => Duration::hours(amount),
                    PeriodUnit::Minute => Duration::minutes(amount),
                    PeriodUnit::Second => Duration::seconds(amount),
                };
        }
        Some(total)
    }

    /// Add this period to a timestamp using calendar arithmetic.
    pub fn add_to(&self, time: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut out = time;
        for &(unit, amount) in &self.parts {
            out = match unit {
                PeriodUnit::Year | PeriodUnit::Month => {
                    let months = if unit == PeriodUnit::Year { amount * 12 } else { amount };
                    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
                    if months >= 0 {
                        out.checked_add_months(magnitude)?
                    } else {
                        out.checked_sub_months(magnitude)?
                    }
                }
                PeriodUnit::Day => out.checked_add_signed(Duration::days(amount))?,
                PeriodUnit::Hour => out.checked_add_signed(Duration::hours(amount))?,
                PeriodUnit::Minute => out.checked_add_signed(Duration::minutes(amount))?,
                PeriodUnit::Second => out.checked_add_signed(Duration::seconds(amount))?,
            };
        }
        Some(out)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.parts.is_empty() {
            return write!(f, "empty period");
        }
        let rendered: Vec<String> = self
            .parts
            .iter()
            .map(|(unit, amount)| {
                let plural = if *amount == 1 { "" } else { "s" };
                format!("{} {}{}", amount, unit.name(), plural)
            })
            .collect();
        write!(f, "{}", rendered.join(", "))
    }
}
