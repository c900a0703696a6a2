#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Result types for period indexing and period-over-period comparisons.

use serde::{Deserialize, Serialize};

/// One stop on a period range slider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodMark {
    /// Ordinal index; 0 is the most recent period.
    pub index: usize,
    /// Period label shown under the mark.
    pub label: String,
}

/// Why a `(region, period)` lookup did not yield exactly one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoRecordKind {
    /// No record matched.
    Missing,
    /// This many records matched.
    Ambiguous(usize),
}

impl std::fmt::Display for NoRecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "no record"),
            Self::Ambiguous(n) => write!(f, "{n} records"),
        }
    }
}

/// Change in a region's metric between two periods.
///
/// `absolute_delta` is `older - newer` after the older value has been
/// clamped to at least 1, and `percent_delta` divides it by the newer value
/// clamped to at least 1, rounded half to even. Both clamps keep the
/// computation defined for zero counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeltaResult {
    pub region_code: String,
    pub region_name: String,
    /// Label of the newer period (the smaller index).
    pub period_start_label: String,
    /// Label of the older period (the larger index).
    pub period_end_label: String,
    pub newer_value: i64,
    pub older_value: i64,
    pub absolute_delta: i64,
    pub percent_delta: i64,
}

impl DeltaResult {
    /// Short description of the compared window, e.g.
    /// `"Jan-22 - Oct-21 Hartlepool"`.
    #[must_use]
    pub fn window_description(&self) -> String {
        format!(
            "{} - {} {}",
            self.period_start_label, self.period_end_label, self.region_name
        )
    }
}
