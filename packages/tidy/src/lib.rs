#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Turns wide government spreadsheet releases into tidy tables.
//!
//! DfT publishes vehicle registrations and charge point counts as wide
//! sheets with one column per reporting period. This crate unpivots those
//! sheets into [`TidyTable`]s (one row per region × period), normalizes
//! region names, and coerces suppressed or blank cells according to a
//! configurable [`SentinelPolicy`]. Sheet layouts are described by TOML
//! definitions embedded at compile time (see [`registry`]).
//!
//! [`TidyTable`]: ev_map_tidy_models::TidyTable
//! [`SentinelPolicy`]: ev_map_tidy_models::schema::SentinelPolicy

pub mod coerce;
pub mod csv_io;
pub mod normalize;
pub mod registry;
pub mod reshape;

pub use coerce::{Reading, classify, coerce};
pub use normalize::{names_match, normalize_name};
pub use reshape::{pivot_wide, reshape};

use ev_map_tidy_models::TableError;
use thiserror::Error;

/// Errors that can occur while reshaping or reading sheet data.
#[derive(Debug, Error)]
pub enum TidyError {
    /// Column naming does not match the expected pattern.
    #[error("Schema mismatch: {message}")]
    SchemaMismatch {
        /// Description of what went wrong.
        message: String,
    },

    /// Two rows share a `(region_code, period_label)` key within one table.
    #[error("Duplicate key ({region_code}, {period_label}) in {metric}")]
    DuplicateKey {
        /// Metric of the table being built.
        metric: String,
        /// Region code of the duplicated key.
        region_code: String,
        /// Period label of the duplicated key.
        period_label: String,
    },

    /// A region lacks periods that other regions have.
    #[error("Incomplete coverage in {metric}: {region_code} is missing {}", .missing.join(", "))]
    IncompleteCoverage {
        /// Metric of the offending table.
        metric: String,
        /// First region found with a gap.
        region_code: String,
        /// Labels that region lacks.
        missing: Vec<String>,
    },

    /// A cell could not be coerced to an integer.
    #[error("Invalid value {raw:?} at row {row}, column {column:?}")]
    InvalidValue {
        /// Zero-based data row.
        row: usize,
        /// Column header.
        column: String,
        /// The offending cell text.
        raw: String,
    },

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A sheet definition could not be parsed.
    #[error("Config error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },
}

impl From<TableError> for TidyError {
    fn from(e: TableError) -> Self {
        match e {
            TableError::DuplicateKey {
                metric,
                region_code,
                period_label,
            } => Self::DuplicateKey {
                metric,
                region_code,
                period_label,
            },
            TableError::IncompleteCoverage {
                metric,
                region_code,
                missing,
            } => Self::IncompleteCoverage {
                metric,
                region_code,
                missing,
            },
        }
    }
}
