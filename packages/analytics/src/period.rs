//! Period label parsing.
//!
//! Labels are kept verbatim everywhere; parsing is only used to check that
//! a release lists its periods in the order it claims to.

use chrono::NaiveDate;

/// How often a release publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Cadence {
    /// Labels like `Jan-22`.
    Monthly,
    /// Labels like `2021 Q3`.
    Quarterly,
}

/// The first day of a parsed period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodStart {
    pub cadence: Cadence,
    pub date: NaiveDate,
}

/// Parses `Mon-YY` (e.g. `Jan-22`) or `YYYY Qn` (e.g. `2021 Q3`).
///
/// Returns `None` for anything else.
#[must_use]
pub fn parse_period(label: &str) -> Option<PeriodStart> {
    let label = label.trim();
    parse_month(label)
        .map(|date| PeriodStart {
            cadence: Cadence::Monthly,
            date,
        })
        .or_else(|| {
            parse_quarter(label).map(|date| PeriodStart {
                cadence: Cadence::Quarterly,
                date,
            })
        })
}

fn parse_month(label: &str) -> Option<NaiveDate> {
    // %y needs a full date to parse against.
    NaiveDate::parse_from_str(&format!("01-{label}"), "%d-%b-%y").ok()
}

fn parse_quarter(label: &str) -> Option<NaiveDate> {
    let (year, quarter) = label.split_once(' ')?;
    let year: i32 = year.parse().ok()?;
    let quarter: u32 = quarter.trim().strip_prefix('Q')?.parse().ok()?;
    if !(1..=4).contains(&quarter) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, (quarter - 1) * 3 + 1, 1)
}
