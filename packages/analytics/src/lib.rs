#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Temporal indexing and period-over-period analysis for tidy tables.
//!
//! Source releases list periods newest first. A [`DateIndex`] preserves
//! that order as ordinal positions (0 = most recent), which the range
//! filter and delta calculator use to address periods. Everything here is
//! pure: inputs are borrowed and results are new values.

pub mod date_index;
pub mod delta;
pub mod indexed;
pub mod period;
pub mod window;

pub use date_index::DateIndex;
pub use delta::{delta, percent_change};
pub use indexed::IndexedTable;
pub use window::filter_by_index_range;

use ev_map_analytics_models::NoRecordKind;
use ev_map_tidy::TidyError;
use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A period label is not in the index.
    #[error("Unknown period {label:?}")]
    UnknownPeriod {
        /// The label that was looked up.
        label: String,
    },

    /// An index lies outside `[0, len - 1]`.
    #[error("Index {index} out of range for {len} periods")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of periods in the index.
        len: usize,
    },

    /// A range's bounds are in the wrong order.
    #[error("Invalid range: {lo} > {hi}")]
    InvalidRange {
        /// Lower (newer) bound.
        lo: usize,
        /// Upper (older) bound.
        hi: usize,
    },

    /// A `(region, period)` lookup did not yield exactly one record.
    #[error("Expected one record for {region_code} in {period_label}, found {kind}")]
    NoRecord {
        region_code: String,
        period_label: String,
        kind: NoRecordKind,
    },

    /// No record carries the given region name.
    #[error("Unknown region {name:?}")]
    UnknownRegion {
        /// The name that was looked up.
        name: String,
    },

    /// Loading or validating the underlying table failed.
    #[error(transparent)]
    Table(#[from] TidyError),
}
