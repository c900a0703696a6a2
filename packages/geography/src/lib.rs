#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Local authority boundaries and metric-to-geometry joins.
//!
//! Loads boundary polygons from `GeoJSON` (reprojecting British National
//! Grid files to WGS84), joins one period of a tidy table to them by region
//! code, and exports the result as a `GeoJSON` `FeatureCollection` for map
//! rendering.

pub mod boundaries;
pub mod export;
pub mod join;
pub mod reproject;

pub use join::{join, snapshot_at};

use ev_map_geography_models::{ExcludedRow, UnsupportedCrsError};
use thiserror::Error;

/// Errors that can occur during geography operations.
#[derive(Debug, Error)]
pub enum GeoError {
    /// No region survived the join.
    #[error("No rows for {metric} in {period_label} ({excluded} regions excluded)")]
    EmptySnapshot {
        metric: String,
        period_label: String,
        /// Number of regions left out.
        excluded: usize,
    },

    /// The join left regions out under [`JoinPolicy::Reject`].
    ///
    /// [`JoinPolicy::Reject`]: ev_map_geography_models::JoinPolicy::Reject
    #[error("Incomplete join for {metric} in {period_label}: {} regions excluded", .excluded.len())]
    IncompleteJoin {
        metric: String,
        period_label: String,
        /// Every region that would have been left out.
        excluded: Vec<ExcludedRow>,
    },

    /// A boundary feature is unusable.
    #[error("Invalid boundary feature {feature}: {message}")]
    InvalidGeometry {
        /// Region code, or the feature's position when it has none.
        feature: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Coordinate transformation failed.
    #[error("Projection error: {message}")]
    Projection {
        /// Description of what went wrong.
        message: String,
    },

    /// The boundary file uses a CRS with no known transformation.
    #[error(transparent)]
    UnsupportedCrs(#[from] UnsupportedCrsError),

    /// `GeoJSON` parsing or conversion failed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
