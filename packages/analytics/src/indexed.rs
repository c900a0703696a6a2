//! A tidy table paired with its period index.

use std::path::Path;

use ev_map_analytics_models::DeltaResult;
use ev_map_tidy::{csv_io, names_match, normalize_name};
use ev_map_tidy_models::{MetricRecord, TidyTable};

use crate::AnalyticsError;
use crate::date_index::DateIndex;
use crate::{delta, window};

/// A [`TidyTable`] and the [`DateIndex`] built from it.
///
/// The index is built once on construction and never rebuilt, so both are
/// always consistent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedTable {
    table: TidyTable,
    index: DateIndex,
}

impl IndexedTable {
    #[must_use]
    pub fn new(table: TidyTable) -> Self {
        let index = DateIndex::from_table(&table);
        Self { table, index }
    }

    /// Reads a tidy CSV and indexes it.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::Table`] if the file cannot be read or is
    /// not a complete tidy table.
    pub fn from_csv_path(path: &Path, metric: &str) -> Result<Self, AnalyticsError> {
        Ok(Self::new(csv_io::read_tidy_path(path, metric)?))
    }

    #[must_use]
    pub const fn table(&self) -> &TidyTable {
        &self.table
    }

    #[must_use]
    pub const fn index(&self) -> &DateIndex {
        &self.index
    }

    #[must_use]
    pub fn metric(&self) -> &str {
        self.table.metric()
    }

    /// See [`window::filter_by_index_range`].
    ///
    /// # Errors
    ///
    /// Same as [`window::filter_by_index_range`].
    pub fn filter(&self, lo: usize, hi: usize) -> Result<TidyTable, AnalyticsError> {
        window::filter_by_index_range(&self.table, &self.index, lo, hi)
    }

    /// See [`delta::delta`].
    ///
    /// # Errors
    ///
    /// Same as [`delta::delta`].
    pub fn delta(
        &self,
        region_code: &str,
        start_index: usize,
        end_index: usize,
    ) -> Result<DeltaResult, AnalyticsError> {
        delta::delta(&self.table, &self.index, region_code, start_index, end_index)
    }

    /// Value of `region_code` in the period at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::IndexOutOfRange`] or
    /// [`AnalyticsError::NoRecord`].
    pub fn record_at(&self, region_code: &str, index: usize) -> Result<&MetricRecord, AnalyticsError> {
        let label = self.index.index_to_label(index)?;
        delta::lookup(&self.table, region_code, label)
    }

    /// Resolves a display name to its region code, comparing normalized
    /// names. The first matching record wins.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::UnknownRegion`] if no record carries the
    /// name.
    pub fn region_code_for_name(&self, name: &str) -> Result<&str, AnalyticsError> {
        let wanted = normalize_name(name);
        self.table
            .records()
            .iter()
            .find(|r| names_match(&r.region_name, &wanted))
            .map(|r| r.region_code.as_str())
            .ok_or_else(|| AnalyticsError::UnknownRegion {
                name: name.to_string(),
            })
    }

    /// Accepts either a region code or a display name.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::UnknownRegion`] if the input is neither.
    pub fn resolve_region(&self, code_or_name: &str) -> Result<&str, AnalyticsError> {
        let trimmed = code_or_name.trim();
        if let Some(code) = self.table.region_codes().into_iter().find(|c| *c == trimmed) {
            return Ok(code);
        }
        self.region_code_for_name(trimmed)
    }
}
