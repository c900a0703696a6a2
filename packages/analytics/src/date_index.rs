//! Ordinal index over a table's period labels.

use std::collections::BTreeMap;

use ev_map_analytics_models::PeriodMark;
use ev_map_tidy_models::TidyTable;

use crate::AnalyticsError;
use crate::period::parse_period;

/// A place where two consecutive labels are not strictly newest-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChronologyViolation {
    /// Index of the later label in the pair.
    pub index: usize,
    pub previous: String,
    pub label: String,
}

/// Bijective map between period labels and ordinal positions.
///
/// Position 0 is the first label seen in the source, which is the most
/// recent period in DfT releases. The order is taken from the source as is;
/// labels that parse as dates are only checked, never re-sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateIndex {
    labels: Vec<String>,
    positions: BTreeMap<String, usize>,
    violations: Vec<ChronologyViolation>,
}

impl DateIndex {
    /// Builds an index from labels in source order, keeping the first
    /// occurrence of each.
    pub fn build<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ordered = Vec::new();
        let mut positions = BTreeMap::new();
        for label in labels {
            let label = label.as_ref();
            if !positions.contains_key(label) {
                positions.insert(label.to_string(), ordered.len());
                ordered.push(label.to_string());
            }
        }

        let violations = find_violations(&ordered);
        for v in &violations {
            log::warn!(
                "Period {:?} at index {} is not older than {:?}; keeping source order",
                v.label,
                v.index,
                v.previous
            );
        }

        Self {
            labels: ordered,
            positions,
            violations,
        }
    }

    /// Builds the index of a table's period labels.
    #[must_use]
    pub fn from_table(table: &TidyTable) -> Self {
        let index = Self::build(table.period_labels());
        log::debug!(
            "Indexed {} periods for {} ({:?} .. {:?})",
            index.len(),
            table.metric(),
            index.most_recent(),
            index.oldest()
        );
        index
    }

    /// Returns the ordinal position of `label`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::UnknownPeriod`] if the label is not indexed.
    pub fn label_to_index(&self, label: &str) -> Result<usize, AnalyticsError> {
        self.positions
            .get(label)
            .copied()
            .ok_or_else(|| AnalyticsError::UnknownPeriod {
                label: label.to_string(),
            })
    }

    /// Returns the label at ordinal position `index`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyticsError::IndexOutOfRange`] if `index >= len()`.
    pub fn index_to_label(&self, index: usize) -> Result<&str, AnalyticsError> {
        self.labels
            .get(index)
            .map(String::as_str)
            .ok_or(AnalyticsError::IndexOutOfRange {
                index,
                len: self.labels.len(),
            })
    }

    /// Labels in index order (most recent first).
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label at index 0.
    #[must_use]
    pub fn most_recent(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }

    /// Label at the highest index.
    #[must_use]
    pub fn oldest(&self) -> Option<&str> {
        self.labels.last().map(String::as_str)
    }

    /// Slider marks, one per period, in index order.
    #[must_use]
    pub fn marks(&self) -> Vec<PeriodMark> {
        self.labels
            .iter()
            .enumerate()
            .map(|(index, label)| PeriodMark {
                index,
                label: label.clone(),
            })
            .collect()
    }

    /// Labels from oldest to most recent.
    #[must_use]
    pub fn chronological_labels(&self) -> Vec<&str> {
        self.labels.iter().rev().map(String::as_str).collect()
    }

    /// Consecutive label pairs that parse as dates but are not strictly
    /// descending.
    #[must_use]
    pub fn chronology_violations(&self) -> &[ChronologyViolation] {
        &self.violations
    }
}

fn find_violations(labels: &[String]) -> Vec<ChronologyViolation> {
    labels
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| {
            let prev = parse_period(&pair[0])?;
            let cur = parse_period(&pair[1])?;
            (prev.cadence == cur.cadence && cur.date >= prev.date).then(|| ChronologyViolation {
                index: i + 1,
                previous: pair[0].clone(),
                label: pair[1].clone(),
            })
        })
        .collect()
}
