#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Administrative boundary and map snapshot types.
//!
//! A [`GeoFeature`] is one local authority polygon keyed by its region
//! code. A [`JoinedSnapshot`] pairs those polygons with one period's metric
//! values, ready to colour a choropleth map.

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Coordinate reference systems boundary files are accepted in.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum Crs {
    /// WGS84 longitude/latitude in degrees (EPSG:4326, also `CRS84`).
    Wgs84 = 4326,
    /// OSGB36 British National Grid eastings/northings in metres
    /// (EPSG:27700), used by ONS boundary downloads.
    BritishNationalGrid = 27700,
}

impl Crs {
    /// Returns the EPSG code.
    #[must_use]
    pub const fn epsg(self) -> u32 {
        self as u32
    }

    /// Looks up a CRS by EPSG code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is not supported.
    pub const fn from_epsg(code: u32) -> Result<Self, UnsupportedCrsError> {
        match code {
            4326 => Ok(Self::Wgs84),
            27700 => Ok(Self::BritishNationalGrid),
            _ => Err(UnsupportedCrsError { code }),
        }
    }

    /// Parses a GeoJSON `crs` name such as `"urn:ogc:def:crs:EPSG::27700"`,
    /// `"EPSG:4326"` or `"urn:ogc:def:crs:OGC:1.3:CRS84"`.
    ///
    /// Returns `None` if the name carries no recognizable code.
    #[must_use]
    pub fn from_crs_name(name: &str) -> Option<Result<Self, UnsupportedCrsError>> {
        let name = name.trim();
        if name.ends_with("CRS84") {
            return Some(Ok(Self::Wgs84));
        }
        let code: u32 = name.rsplit(':').next()?.parse().ok()?;
        Some(Self::from_epsg(code))
    }
}

/// Error returned when a boundary file uses an EPSG code with no known
/// transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnsupportedCrsError {
    /// The EPSG code that was provided.
    pub code: u32,
}

impl std::fmt::Display for UnsupportedCrsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unsupported CRS EPSG:{}: expected EPSG:4326 or EPSG:27700",
            self.code
        )
    }
}

impl std::error::Error for UnsupportedCrsError {}

/// A boundary polygon with its identifying properties.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoFeature {
    /// Area code (e.g. `"E06000001"`), matched exactly against tidy tables.
    pub region_code: String,
    /// Normalized display name.
    pub region_name: String,
    /// Outline in WGS84 lon/lat degrees.
    pub geometry: MultiPolygon<f64>,
}

/// What to do with features and records that do not pair up.
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
pub enum JoinPolicy {
    /// Leave them out and only count them.
    #[default]
    Drop,
    /// Leave them out, list them in the snapshot, and log a warning.
    Report,
    /// Fail the join if anything would be left out.
    Reject,
}

/// Why a region is missing from a snapshot.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum ExclusionReason {
    /// The boundary has no record for the period.
    MissingValue,
    /// The record has no boundary.
    UnmatchedGeometry,
}

/// A region left out of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedRow {
    pub region_code: String,
    pub region_name: String,
    pub reason: ExclusionReason,
}

/// One region's polygon and metric value.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub region_code: String,
    pub region_name: String,
    pub geometry: MultiPolygon<f64>,
    pub metric_value: i64,
}

/// One period of one metric joined to boundary polygons.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedSnapshot {
    /// Metric name, also used as the value property on export.
    pub metric: String,
    pub period_label: String,
    /// Joined rows, in boundary file order.
    pub rows: Vec<SnapshotRow>,
    /// Number of regions left out, whatever the policy.
    pub excluded_count: usize,
    /// The left-out regions; only filled under [`JoinPolicy::Report`].
    pub excluded: Vec<ExcludedRow>,
}

impl JoinedSnapshot {
    /// Smallest and largest metric value, for a colour scale.
    #[must_use]
    pub fn value_range(&self) -> Option<(i64, i64)> {
        let values = self.rows.iter().map(|r| r.metric_value);
        Some((values.clone().min()?, values.max()?))
    }
}
