#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Tidy metric tables and the raw sheet shapes they are built from.
//!
//! A [`TidyTable`] holds one row per region × period for a single metric
//! (e.g. `ULEVRegistrations`). Tables are immutable once built: every
//! filter produces a new table, so they can be shared read-only between
//! any number of consumers.

pub mod schema;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Header of the region code column in tidy CSV files.
pub const REGION_CODE_COLUMN: &str = "LA/RegionCode";

/// Header of the region name column in tidy CSV files.
pub const REGION_NAME_COLUMN: &str = "LA/RegionName";

/// Header of the period label column in tidy CSV files.
pub const DATE_COLUMN: &str = "Date";

/// Header of the optional value-origin column in tidy CSV files.
pub const ORIGIN_COLUMN: &str = "ValueOrigin";

/// A single spreadsheet cell as handed over by whatever read the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    /// Free text, including numbers exported as text.
    Text(String),
    /// A typed numeric cell.
    Number(f64),
    /// No value at all.
    Empty,
}

impl Cell {
    /// Builds a cell from CSV text, treating blank text as [`Cell::Empty`].
    #[must_use]
    pub fn from_text(raw: &str) -> Self {
        if raw.trim().is_empty() {
            Self::Empty
        } else {
            Self::Text(raw.to_string())
        }
    }

    /// Returns the cell rendered as text (empty string for [`Cell::Empty`]).
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Empty => String::new(),
        }
    }
}

/// A wide, spreadsheet-shaped table: named columns and rows of cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Column headers, in sheet order.
    pub columns: Vec<String>,
    /// Data rows. Rows shorter than `columns` are padded with empty cells
    /// when read.
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Returns the position of the named column.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the cell at `(row, column)`, or [`Cell::Empty`] when the row
    /// is ragged.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(&Cell::Empty)
    }
}

/// Where a record's value came from.
///
/// Suppressed small counts and blank cells are both filled with a number
/// when coerced; the origin keeps them distinguishable from a true reading.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ValueOrigin {
    /// The cell held a number.
    #[default]
    Observed,
    /// The cell held a configured sentinel token (e.g. `c` or `-`).
    Suppressed,
    /// The cell was blank.
    Missing,
}

/// One observation: a metric value for a region in a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricRecord {
    /// Administrative area code (e.g. `"E06000001"`). Exact-match key.
    pub region_code: String,
    /// Normalized display name (e.g. `"Hartlepool"`).
    pub region_name: String,
    /// Period label as it appears in the source (e.g. `"Jan-22"`, `"2021 Q3"`).
    pub period_label: String,
    /// The metric value.
    pub metric_value: i64,
    /// Whether the value was read or substituted.
    #[serde(default)]
    pub origin: ValueOrigin,
}

/// Errors raised when a table's structural invariants do not hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Two records share the same `(region_code, period_label)` key.
    DuplicateKey {
        /// Metric of the offending table.
        metric: String,
        /// Region code of the duplicated key.
        region_code: String,
        /// Period label of the duplicated key.
        period_label: String,
    },
    /// A region is missing periods that other regions have.
    IncompleteCoverage {
        /// Metric of the offending table.
        metric: String,
        /// First region found with a gap.
        region_code: String,
        /// Labels that region lacks, in table order.
        missing: Vec<String>,
    },
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKey {
                metric,
                region_code,
                period_label,
            } => write!(
                f,
                "duplicate key ({region_code}, {period_label}) in {metric}"
            ),
            Self::IncompleteCoverage {
                metric,
                region_code,
                missing,
            } => write!(
                f,
                "{metric}: region {region_code} is missing periods {}",
                missing.join(", ")
            ),
        }
    }
}

impl std::error::Error for TableError {}

/// An ordered set of [`MetricRecord`]s sharing one metric name, with
/// unique `(region_code, period_label)` keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TidyTable {
    metric: String,
    records: Vec<MetricRecord>,
}

impl TidyTable {
    /// Builds a table, rejecting duplicate `(region_code, period_label)`
    /// keys.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::DuplicateKey`] on the first repeated key.
    pub fn new(metric: impl Into<String>, records: Vec<MetricRecord>) -> Result<Self, TableError> {
        let metric = metric.into();
        let mut seen = BTreeSet::new();
        for record in &records {
            if !seen.insert((record.region_code.as_str(), record.period_label.as_str())) {
                return Err(TableError::DuplicateKey {
                    metric,
                    region_code: record.region_code.clone(),
                    period_label: record.period_label.clone(),
                });
            }
        }
        Ok(Self { metric, records })
    }

    /// Metric name shared by every record (e.g. `"TotalDevices"`).
    #[must_use]
    pub fn metric(&self) -> &str {
        &self.metric
    }

    #[must_use]
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct period labels in the order they first appear.
    #[must_use]
    pub fn period_labels(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.period_label.as_str()))
    }

    /// Distinct region codes in the order they first appear.
    #[must_use]
    pub fn region_codes(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.region_code.as_str()))
    }

    /// Distinct region names in the order they first appear.
    #[must_use]
    pub fn region_names(&self) -> Vec<&str> {
        distinct(self.records.iter().map(|r| r.region_name.as_str()))
    }

    /// Records for one period, in table order.
    ///
    /// The records borrow from the table, not from `period_label`.
    pub fn records_for_period<'a, 'b>(
        &'a self,
        period_label: &'b str,
    ) -> impl Iterator<Item = &'a MetricRecord> + use<'a, 'b> {
        self.records
            .iter()
            .filter(move |r| r.period_label == period_label)
    }

    /// Returns a new table holding only the records matching `keep`.
    ///
    /// A subset of unique keys is still unique, so no validation is needed.
    #[must_use]
    pub fn filtered(&self, keep: impl Fn(&MetricRecord) -> bool) -> Self {
        Self {
            metric: self.metric.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    /// Checks that every region has a record for every period in the table.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::IncompleteCoverage`] naming the first region
    /// (in table order) with a gap.
    pub fn check_coverage(&self) -> Result<(), TableError> {
        let periods = self.period_labels();
        let mut by_region: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for record in &self.records {
            by_region
                .entry(record.region_code.as_str())
                .or_default()
                .insert(record.period_label.as_str());
        }

        for code in self.region_codes() {
            let Some(present) = by_region.get(code) else {
                continue;
            };
            if present.len() == periods.len() {
                continue;
            }
            let missing: Vec<String> = periods
                .iter()
                .filter(|p| !present.contains(*p))
                .map(|p| (*p).to_string())
                .collect();
            return Err(TableError::IncompleteCoverage {
                metric: self.metric.clone(),
                region_code: code.to_string(),
                missing,
            });
        }

        Ok(())
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    values.filter(|v| seen.insert(*v)).collect()
}
