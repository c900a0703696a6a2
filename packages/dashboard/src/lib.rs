#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! View models for the electric vehicle dashboard.
//!
//! A [`DashboardContext`] loads every tidy table and the boundary polygons
//! once. The functions in [`views`] turn user selections (dataset,
//! locations, period window) into the data behind each panel: dropdown
//! options, slider marks, chart series, change stamps, and map snapshots.
//! Rendering is left to the caller.

pub mod catalog;
pub mod config;
pub mod context;
pub mod views;

pub use catalog::{Dataset, Timeline, ViewKind, ViewSpec};
pub use config::DashboardConfig;
pub use context::DashboardContext;

use ev_map_analytics::AnalyticsError;
use ev_map_geography::GeoError;
use ev_map_tidy::TidyError;
use thiserror::Error;

/// Errors that can occur while building dashboard views.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Tidy(#[from] TidyError),

    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    #[error(transparent)]
    Geo(#[from] GeoError),

    /// The configuration is inconsistent.
    #[error("Config error: {message}")]
    Config {
        /// Description of what went wrong.
        message: String,
    },

    /// A selected location is not in the dataset.
    #[error("Unknown location {name:?}")]
    UnknownLocation {
        /// The name that was selected.
        name: String,
    },

    /// The context holds no table for a dataset.
    #[error("Dataset {dataset} is not loaded")]
    MissingDataset { dataset: Dataset },

    /// The dashboard does not offer this view of the dataset.
    #[error("No {kind} view for {dataset}")]
    NoView { dataset: Dataset, kind: ViewKind },

    /// A map was requested but no boundaries are loaded.
    #[error("No boundaries loaded; set `boundaries` in the dashboard config")]
    NoBoundaries,

    /// TOML parsing failed.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
