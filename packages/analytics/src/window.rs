//! Inclusive period-range filtering by ordinal index.

use std::collections::BTreeSet;

use ev_map_tidy_models::TidyTable;

use crate::AnalyticsError;
use crate::date_index::DateIndex;

/// Checks `lo <= hi < len` and returns the labels in `[lo, hi]`, most
/// recent first.
///
/// # Errors
///
/// * [`AnalyticsError::IndexOutOfRange`] if `hi` is past the last period.
/// * [`AnalyticsError::InvalidRange`] if `lo > hi`.
pub fn window_labels(index: &DateIndex, lo: usize, hi: usize) -> Result<&[String], AnalyticsError> {
    if hi >= index.len() {
        return Err(AnalyticsError::IndexOutOfRange {
            index: hi,
            len: index.len(),
        });
    }
    if lo > hi {
        return Err(AnalyticsError::InvalidRange { lo, hi });
    }
    Ok(&index.labels()[lo..=hi])
}

/// Returns a new table holding only the records whose period index lies in
/// `[lo, hi]`. The input table is left untouched.
///
/// # Errors
///
/// Same as [`window_labels`].
pub fn filter_by_index_range(
    table: &TidyTable,
    index: &DateIndex,
    lo: usize,
    hi: usize,
) -> Result<TidyTable, AnalyticsError> {
    let keep: BTreeSet<&str> = window_labels(index, lo, hi)?
        .iter()
        .map(String::as_str)
        .collect();
    let filtered = table.filtered(|r| keep.contains(r.period_label.as_str()));
    log::debug!(
        "Filtered {} to periods [{lo}, {hi}]: {} of {} records",
        table.metric(),
        filtered.len(),
        table.len()
    );
    Ok(filtered)
}
