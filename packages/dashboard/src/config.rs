//! Dashboard configuration, read from TOML.
//!
//! ```toml
//! data_dir = "data"
//! boundaries = "Local_Authority_Districts_(December_2020)_UK_BFC_v1.2.geojson"
//! source_epsg = 27700
//! join_policy = "report"
//!
//! [files]
//! ulev = "ulev_2022.csv"
//! ```
//!
//! Every field is optional. Relative paths are resolved against the
//! directory holding the config file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr as _;

use ev_map_geography::boundaries::{BoundaryOptions, DEFAULT_CODE_PROPERTY, DEFAULT_NAME_PROPERTY};
use ev_map_geography_models::{Crs, JoinPolicy};
use serde::{Deserialize, Serialize};

use crate::DashboardError;
use crate::catalog::Dataset;

/// Boundary file the dashboard was built against.
pub const DEFAULT_BOUNDARIES_FILE: &str =
    "Local_Authority_Districts_(December_2020)_UK_BFC_v1.2.geojson";

/// Location selected when the dashboard opens.
pub const DEFAULT_LOCATION: &str = "Great Britain";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Directory holding the tidy CSVs.
    pub data_dir: PathBuf,
    /// Per-dataset file name overrides, relative to `data_dir`, keyed by
    /// dataset id (`ulev`, `total_per100k`, ...).
    pub files: BTreeMap<String, String>,
    /// Boundary `GeoJSON`. Maps are unavailable without one.
    pub boundaries: Option<PathBuf>,
    pub code_property: String,
    pub name_property: String,
    /// Forces the boundary CRS instead of reading it from the file.
    pub source_epsg: Option<u32>,
    pub join_policy: JoinPolicy,
    pub default_locations: Vec<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            files: BTreeMap::new(),
            boundaries: None,
            code_property: DEFAULT_CODE_PROPERTY.to_string(),
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
            source_epsg: None,
            join_policy: JoinPolicy::default(),
            default_locations: vec![DEFAULT_LOCATION.to_string()],
        }
    }
}

impl DashboardConfig {
    /// Parses a config from TOML text. Paths are left as written.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Toml`] if the text does not parse,
    /// [`DashboardError::Config`] if `[files]` names an unknown dataset, or
    /// [`DashboardError::Geo`] if `source_epsg` is not a supported CRS.
    pub fn parse(text: &str) -> Result<Self, DashboardError> {
        let config: Self = toml::de::from_str(text)?;
        if let Some(key) = config.files.keys().find(|k| Dataset::from_str(k).is_err()) {
            return Err(DashboardError::Config {
                message: format!("unknown dataset {key:?} in [files]"),
            });
        }
        config.source_crs()?;
        Ok(config)
    }

    /// Reads a config file and resolves its relative paths against the
    /// file's directory.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Io`] if the file cannot be read, or any
    /// error from [`Self::parse`].
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&text)?;
        if let Some(base) = path.parent() {
            config.data_dir = base.join(&config.data_dir);
            config.boundaries = config.boundaries.map(|b| base.join(b));
        }
        log::debug!("Loaded dashboard config from {}", path.display());
        Ok(config)
    }

    /// Path of a dataset's tidy CSV.
    #[must_use]
    pub fn dataset_path(&self, dataset: Dataset) -> PathBuf {
        match self.files.get(dataset.as_ref()) {
            Some(file) => self.data_dir.join(file),
            None => self.data_dir.join(dataset.default_file_name()),
        }
    }

    /// The configured CRS override, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Geo`] if `source_epsg` is not supported.
    pub fn source_crs(&self) -> Result<Option<Crs>, DashboardError> {
        self.source_epsg
            .map(Crs::from_epsg)
            .transpose()
            .map_err(|e| DashboardError::Geo(e.into()))
    }

    /// Options for reading the boundary file.
    ///
    /// # Errors
    ///
    /// Same as [`Self::source_crs`].
    pub fn boundary_options(&self) -> Result<BoundaryOptions, DashboardError> {
        Ok(BoundaryOptions {
            code_property: self.code_property.clone(),
            name_property: self.name_property.clone(),
            source_crs: self.source_crs()?,
        })
    }
}
