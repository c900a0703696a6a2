//! Sheet schema types.
//!
//! A [`SheetDefinition`] describes one worksheet of a government release:
//! where the data starts and ends, which columns identify a region, how
//! period columns are named, and which sentinel tokens stand in for
//! suppressed values. Definitions are deserialized from TOML.

use serde::{Deserialize, Serialize};

use crate::{REGION_CODE_COLUMN, REGION_NAME_COLUMN};

/// Default width of the period suffix in composite column names
/// (`"TotalDevicesJan-22"` → `"Jan-22"`).
pub const DEFAULT_SUFFIX_LEN: usize = 6;

/// Which columns identify a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierColumns {
    /// Column holding the region code.
    pub code: String,
    /// Column holding the free-text region name.
    pub name: String,
}

impl Default for IdentifierColumns {
    fn default() -> Self {
        Self {
            code: REGION_CODE_COLUMN.to_string(),
            name: REGION_NAME_COLUMN.to_string(),
        }
    }
}

/// How period columns are laid out in the wide sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReshapeMode {
    /// Every non-identifier column is one period of a single metric.
    Simple {
        /// Metric name of the produced table (e.g. `"ULEVRegistrations"`).
        value_name: String,
        /// Optional prefix every period column must carry; the label is
        /// what follows it.
        #[serde(default)]
        column_prefix: Option<String>,
    },
    /// Each period contributes one column per metric family, named
    /// `<family><period-suffix>`.
    Composite {
        /// Metric families, in output order.
        families: Vec<String>,
        /// Width of the trailing period token, in characters.
        #[serde(default = "default_suffix_len")]
        suffix_len: usize,
    },
}

impl ReshapeMode {
    /// Metric names of the tables this mode produces, in output order.
    #[must_use]
    pub fn metrics(&self) -> Vec<&str> {
        match self {
            Self::Simple { value_name, .. } => vec![value_name.as_str()],
            Self::Composite { families, .. } => families.iter().map(String::as_str).collect(),
        }
    }
}

const fn default_suffix_len() -> usize {
    DEFAULT_SUFFIX_LEN
}

/// Which raw values count as "no number here" and what they become.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentinelPolicy {
    /// Tokens standing in for suppressed values, compared after trimming.
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Value substituted for sentinels (and blanks, when allowed).
    #[serde(default)]
    pub fill_value: i64,
    /// Whether a blank cell is filled like a sentinel or rejected.
    #[serde(default = "default_true")]
    pub missing_is_sentinel: bool,
}

const fn default_true() -> bool {
    true
}

impl SentinelPolicy {
    /// Vehicle registration sheets mark small counts with `c`.
    #[must_use]
    pub fn registrations() -> Self {
        Self {
            tokens: vec!["c".to_string()],
            fill_value: 0,
            missing_is_sentinel: true,
        }
    }

    /// Charge point sheets mark absent values with `-`.
    #[must_use]
    pub fn charge_points() -> Self {
        Self {
            tokens: vec!["-".to_string()],
            fill_value: 0,
            missing_is_sentinel: true,
        }
    }

    /// No sentinels and no blanks: every cell must hold a number.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            tokens: Vec::new(),
            fill_value: 0,
            missing_is_sentinel: false,
        }
    }
}

impl Default for SentinelPolicy {
    fn default() -> Self {
        Self {
            tokens: Vec::new(),
            fill_value: 0,
            missing_is_sentinel: true,
        }
    }
}

/// Everything the reshaper needs to turn one wide table into tidy tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReshapeSchema {
    #[serde(default)]
    pub identifiers: IdentifierColumns,
    pub mode: ReshapeMode,
    #[serde(default)]
    pub sentinels: SentinelPolicy,
}

/// One tidy CSV written for a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetOutput {
    /// Metric (table) written to this file.
    pub metric: String,
    /// Output file name (e.g. `"charge_points_devices_total.csv"`).
    pub file_name: String,
}

/// A worksheet in a published release, deserialized from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetDefinition {
    /// Unique identifier (e.g. `"evcd_01a"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Publication the sheet belongs to (e.g. `"veh0132"`).
    pub release: String,
    /// Worksheet name inside the release (e.g. `"EVCD_01a"`).
    pub sheet_name: String,
    /// Preamble rows before the header row.
    #[serde(default)]
    pub skip_rows: usize,
    /// Notes rows after the last data row.
    #[serde(default)]
    pub skip_footer: usize,
    /// Period labels in sheet order (most recent first). When set, the
    /// sheet's own header is replaced by names built from this list.
    #[serde(default)]
    pub periods: Vec<String>,
    /// Tidy files produced from this sheet.
    pub outputs: Vec<SheetOutput>,
    pub schema: ReshapeSchema,
}

impl SheetDefinition {
    /// Returns the output file configured for `metric`.
    #[must_use]
    pub fn output_for(&self, metric: &str) -> Option<&SheetOutput> {
        self.outputs.iter().find(|o| o.metric == metric)
    }

    /// Column names to use instead of the sheet's header row, when the
    /// definition lists its periods.
    ///
    /// Composite sheets interleave families per period
    /// (`TotalDevicesJan-22, Per100kPopulationJan-22, TotalDevicesOct-21, ...`).
    #[must_use]
    pub fn header_override(&self) -> Option<Vec<String>> {
        if self.periods.is_empty() {
            return None;
        }

        let ids = &self.schema.identifiers;
        let mut names = vec![ids.code.clone(), ids.name.clone()];
        match &self.schema.mode {
            ReshapeMode::Simple { column_prefix, .. } => {
                let prefix = column_prefix.as_deref().unwrap_or("");
                names.extend(self.periods.iter().map(|p| format!("{prefix}{p}")));
            }
            ReshapeMode::Composite { families, .. } => {
                for period in &self.periods {
                    names.extend(families.iter().map(|f| format!("{f}{period}")));
                }
            }
        }
        Some(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPOSITE: &str = r#"
id = "evcd_01a"
name = "Total charging devices"
release = "evcd-jan-2022"
sheet_name = "EVCD_01a"
skip_rows = 7
skip_footer = 13
periods = ["Jan-22", "Oct-21"]

[[outputs]]
metric = "TotalDevices"
file_name = "charge_points_devices_total.csv"

[schema.mode]
type = "composite"
families = ["TotalDevices", "Per100kPopulation"]

[schema.sentinels]
tokens = ["-"]
"#;

    #[test]
    fn parses_composite_sheet() {
        let def: SheetDefinition = toml::de::from_str(COMPOSITE).unwrap();
        assert_eq!(def.skip_rows, 7);
        assert_eq!(def.schema.identifiers, IdentifierColumns::default());
        assert_eq!(
            def.schema.mode,
            ReshapeMode::Composite {
                families: vec!["TotalDevices".to_string(), "Per100kPopulation".to_string()],
                suffix_len: DEFAULT_SUFFIX_LEN,
            }
        );
        assert!(def.schema.sentinels.missing_is_sentinel);
        assert_eq!(def.schema.sentinels.tokens, vec!["-".to_string()]);
    }

    #[test]
    fn composite_header_interleaves_families() {
        let def: SheetDefinition = toml::de::from_str(COMPOSITE).unwrap();
        assert_eq!(
            def.header_override().unwrap(),
            vec![
                "LA/RegionCode",
                "LA/RegionName",
                "TotalDevicesJan-22",
                "Per100kPopulationJan-22",
                "TotalDevicesOct-21",
                "Per100kPopulationOct-21",
            ]
        );
    }

    #[test]
    fn no_periods_means_no_override() {
        let mut def: SheetDefinition = toml::de::from_str(COMPOSITE).unwrap();
        def.periods.clear();
        assert!(def.header_override().is_none());
    }

    #[test]
    fn composite_mode_lists_families_as_metrics() {
        let def: SheetDefinition = toml::de::from_str(COMPOSITE).unwrap();
        assert_eq!(
            def.schema.mode.metrics(),
            vec!["TotalDevices", "Per100kPopulation"]
        );
        assert!(def.output_for("TotalDevices").is_some());
        assert!(def.output_for("Per100kPopulation").is_none());
    }
}
