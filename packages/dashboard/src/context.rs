//! Everything the dashboard reads, loaded once at startup.

use std::collections::BTreeMap;

use ev_map_analytics::IndexedTable;
use ev_map_geography::boundaries::load_boundaries;
use ev_map_geography_models::GeoFeature;
use ev_map_tidy_models::TidyTable;

use crate::DashboardError;
use crate::catalog::Dataset;
use crate::config::DashboardConfig;

/// Indexed tables for every dataset plus the boundary polygons.
///
/// Built once and shared by reference; nothing in it changes afterwards.
#[derive(Debug, Clone)]
pub struct DashboardContext {
    config: DashboardConfig,
    tables: BTreeMap<Dataset, IndexedTable>,
    features: Vec<GeoFeature>,
}

impl DashboardContext {
    /// Loads every dataset's tidy CSV and, if configured, the boundaries.
    ///
    /// # Errors
    ///
    /// * [`DashboardError::Analytics`] if a table cannot be read or is not
    ///   a complete tidy table.
    /// * [`DashboardError::Geo`] if the boundaries cannot be loaded.
    pub fn load(config: DashboardConfig) -> Result<Self, DashboardError> {
        let mut tables = BTreeMap::new();
        for dataset in Dataset::all() {
            let path = config.dataset_path(dataset);
            log::info!("Loading {dataset} from {}", path.display());
            tables.insert(dataset, IndexedTable::from_csv_path(&path, dataset.metric())?);
        }

        let features = match &config.boundaries {
            Some(path) => load_boundaries(path, &config.boundary_options()?)?,
            None => {
                log::warn!("No boundaries configured; map views are unavailable");
                Vec::new()
            }
        };

        Ok(Self {
            config,
            tables,
            features,
        })
    }

    /// Builds a context from tables already in memory.
    ///
    /// Datasets not listed are absent, and views of them fail with
    /// [`DashboardError::MissingDataset`].
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::Config`] if a table's metric is not the
    /// one its dataset expects.
    pub fn from_tables(
        config: DashboardConfig,
        tables: impl IntoIterator<Item = (Dataset, TidyTable)>,
        features: Vec<GeoFeature>,
    ) -> Result<Self, DashboardError> {
        let mut indexed = BTreeMap::new();
        for (dataset, table) in tables {
            if table.metric() != dataset.metric() {
                return Err(DashboardError::Config {
                    message: format!(
                        "{dataset} expects metric {}, got {}",
                        dataset.metric(),
                        table.metric()
                    ),
                });
            }
            indexed.insert(dataset, IndexedTable::new(table));
        }
        Ok(Self {
            config,
            tables: indexed,
            features,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// # Errors
    ///
    /// Returns [`DashboardError::MissingDataset`] if the dataset was not
    /// loaded.
    pub fn table(&self, dataset: Dataset) -> Result<&IndexedTable, DashboardError> {
        self.tables
            .get(&dataset)
            .ok_or(DashboardError::MissingDataset { dataset })
    }

    /// Boundary polygons, empty when none are configured.
    #[must_use]
    pub fn features(&self) -> &[GeoFeature] {
        &self.features
    }
}

#[cfg(test)]
mod tests {
    use ev_map_tidy_models::{MetricRecord, ValueOrigin};

    use super::*;

    fn table(metric: &str) -> TidyTable {
        TidyTable::new(
            metric,
            vec![MetricRecord {
                region_code: "K03000001".to_string(),
                region_name: "Great Britain".to_string(),
                period_label: "2021 Q3".to_string(),
                metric_value: 10,
                origin: ValueOrigin::Observed,
            }],
        )
        .unwrap()
    }

    #[test]
    fn from_tables_checks_metric() {
        let ctx = DashboardContext::from_tables(
            DashboardConfig::default(),
            [(Dataset::Ulev, table("ULEVRegistrations"))],
            Vec::new(),
        )
        .unwrap();
        assert_eq!(ctx.table(Dataset::Ulev).unwrap().index().len(), 1);
        assert!(matches!(
            ctx.table(Dataset::Bev),
            Err(DashboardError::MissingDataset { dataset: Dataset::Bev })
        ));
        assert!(ctx.features().is_empty());

        assert!(matches!(
            DashboardContext::from_tables(
                DashboardConfig::default(),
                [(Dataset::Bev, table("ULEVRegistrations"))],
                Vec::new(),
            ),
            Err(DashboardError::Config { .. })
        ));
    }

    #[test]
    fn load_reports_missing_files() {
        let config = DashboardConfig {
            data_dir: std::env::temp_dir().join("ev_map_no_such_dir"),
            ..DashboardConfig::default()
        };
        assert!(matches!(
            DashboardContext::load(config),
            Err(DashboardError::Analytics(_))
        ));
    }

    #[test]
    fn load_reads_every_dataset() {
        let dir = std::env::temp_dir().join(format!("ev_map_context_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        for dataset in Dataset::all() {
            let csv = format!(
                "LA/RegionCode,LA/RegionName,Date,{}\nK03000001,Great Britain,Jan-22,7\n",
                dataset.metric()
            );
            std::fs::write(dir.join(dataset.default_file_name()), csv).unwrap();
        }

        let config = DashboardConfig {
            data_dir: dir.clone(),
            ..DashboardConfig::default()
        };
        let ctx = DashboardContext::load(config).unwrap();
        for dataset in Dataset::all() {
            let t = ctx.table(dataset).unwrap();
            assert_eq!(t.metric(), dataset.metric());
            assert_eq!(t.table().records()[0].metric_value, 7);
        }

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
