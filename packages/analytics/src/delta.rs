//! Period-over-period change for one region.

use ev_map_analytics_models::{DeltaResult, NoRecordKind};
use ev_map_tidy_models::{MetricRecord, TidyTable};

use crate::AnalyticsError;
use crate::date_index::DateIndex;

/// Finds the single record for `region_code` in `period_label`.
///
/// # Errors
///
/// Returns [`AnalyticsError::NoRecord`] if zero or several records match.
pub fn lookup<'a>(
    table: &'a TidyTable,
    region_code: &str,
    period_label: &str,
) -> Result<&'a MetricRecord, AnalyticsError> {
    unique_record(table.records(), region_code, period_label)
}

/// A [`TidyTable`] never holds two records with the same key, but a plain
/// record slice can.
fn unique_record<'a>(
    records: &'a [MetricRecord],
    region_code: &str,
    period_label: &str,
) -> Result<&'a MetricRecord, AnalyticsError> {
    let mut matches = records
        .iter()
        .filter(|r| r.region_code == region_code && r.period_label == period_label);

    let no_record = |kind| AnalyticsError::NoRecord {
        region_code: region_code.to_string(),
        period_label: period_label.to_string(),
        kind,
    };

    let first = matches.next().ok_or_else(|| no_record(NoRecordKind::Missing))?;
    let extra = matches.count();
    if extra > 0 {
        return Err(no_record(NoRecordKind::Ambiguous(extra + 1)));
    }
    Ok(first)
}

/// Returns `(absolute_delta, percent_delta)` for a newer and an older value.
///
/// The older value is clamped to at least 1 before subtracting, and the
/// newer value to at least 1 before dividing, so zero counts never divide
/// by zero. The percentage is rounded half to even.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn percent_change(newer: i64, older: i64) -> (i64, i64) {
    let absolute = older.max(1).saturating_sub(newer);
    let percent = (absolute as f64 / newer.max(1) as f64 * 100.0).round_ties_even();
    (absolute, percent as i64)
}

/// Computes the change for `region_code` between the periods at
/// `start_index` (newer) and `end_index` (older).
///
/// # Errors
///
/// * [`AnalyticsError::InvalidRange`] if `start_index > end_index`.
/// * [`AnalyticsError::IndexOutOfRange`] if either index is past the last
///   period.
/// * [`AnalyticsError::NoRecord`] if the region does not have exactly one
///   record in either period.
pub fn delta(
    table: &TidyTable,
    index: &DateIndex,
    region_code: &str,
    start_index: usize,
    end_index: usize,
) -> Result<DeltaResult, AnalyticsError> {
    if start_index > end_index {
        return Err(AnalyticsError::InvalidRange {
            lo: start_index,
            hi: end_index,
        });
    }

    let start_label = index.index_to_label(start_index)?;
    let end_label = index.index_to_label(end_index)?;

    let newer = lookup(table, region_code, start_label)?;
    let older = lookup(table, region_code, end_label)?;
    let (absolute_delta, percent_delta) = percent_change(newer.metric_value, older.metric_value);

    log::debug!(
        "{} {region_code} {start_label}..{end_label}: {} -> {} ({absolute_delta}, {percent_delta}%)",
        table.metric(),
        older.metric_value,
        newer.metric_value
    );

    Ok(DeltaResult {
        region_code: region_code.to_string(),
        region_name: newer.region_name.clone(),
        period_start_label: start_label.to_string(),
        period_end_label: end_label.to_string(),
        newer_value: newer.metric_value,
        older_value: older.metric_value,
        absolute_delta,
        percent_delta,
    })
}
