//! The data behind each dashboard panel.
//!
//! Windows are `(lo, hi)` index pairs on a dataset's [`DateIndex`], with
//! `lo` the newer bound. Location selections are display names and are
//! compared after normalization.
//!
//! [`DateIndex`]: ev_map_analytics::DateIndex

use ev_map_analytics::AnalyticsError;
use ev_map_analytics_models::PeriodMark;
use ev_map_geography::snapshot_at;
use ev_map_geography_models::JoinedSnapshot;
use ev_map_tidy::{names_match, normalize_name};
use serde::Serialize;

use crate::DashboardError;
use crate::catalog::{Dataset, Timeline, ViewKind, ViewSpec, view_spec, views_of};
use crate::context::DashboardContext;

/// Shown in every stamp field when no location is selected.
pub const PLACEHOLDER: &str = "-";

/// One entry of a dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: String,
}

impl DropdownOption {
    fn same(text: &str) -> Self {
        Self {
            label: text.to_string(),
            value: text.to_string(),
        }
    }
}

/// Range slider over one timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slider {
    pub min: usize,
    pub max: usize,
    pub marks: Vec<PeriodMark>,
    /// The whole timeline, newest to oldest.
    pub default_window: (usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub index: usize,
    pub period_label: String,
    pub value: i64,
}

/// One line of a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub location: String,
    /// In index order, so newest first.
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub title: String,
    pub metric: String,
    /// Points run newest first, so the x axis is drawn reversed to read
    /// left-to-right in time.
    pub x_axis_reversed: bool,
    pub series: Vec<Series>,
}

/// The pair of change stamps under a chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StampView {
    pub total_title: String,
    pub percent_title: String,
    /// Absolute change, e.g. `"20"`.
    pub total: String,
    /// Percentage change, e.g. `"25%"`.
    pub percent: String,
    /// Compared window, e.g. `"2021 Q3 - 2021 Q1 Great Britain"`.
    pub info: String,
}

impl StampView {
    fn placeholder() -> Self {
        Self {
            total_title: PLACEHOLDER.to_string(),
            percent_title: PLACEHOLDER.to_string(),
            total: PLACEHOLDER.to_string(),
            percent: PLACEHOLDER.to_string(),
            info: PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    pub title: String,
    pub snapshot: JoinedSnapshot,
}

/// What the dashboard shows when it first opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub map: Dataset,
    pub map_period: String,
    pub registrations_chart: Dataset,
    pub registrations_window: (usize, usize),
    pub charge_points_chart: Dataset,
    pub charge_points_window: (usize, usize),
    pub locations: Vec<String>,
}

impl Selection {
    /// The first map and chart of each kind, the most recent map period,
    /// full windows, and the configured default locations.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError::MissingDataset`] if a default dataset is
    /// not loaded, or [`DashboardError::Analytics`] if it has no periods.
    pub fn initial(ctx: &DashboardContext) -> Result<Self, DashboardError> {
        let map = Dataset::Ulev;
        Ok(Self {
            map,
            map_period: default_period(ctx, map)?.to_string(),
            registrations_chart: Dataset::Ulev,
            registrations_window: slider(ctx, Timeline::Registrations)?.default_window,
            charge_points_chart: Dataset::TotalDevices,
            charge_points_window: slider(ctx, Timeline::ChargePoints)?.default_window,
            locations: ctx.config().default_locations.clone(),
        })
    }
}

fn spec_for(dataset: Dataset, kind: ViewKind) -> Result<&'static ViewSpec, DashboardError> {
    view_spec(dataset, kind).ok_or(DashboardError::NoView { dataset, kind })
}

/// Location dropdown: distinct names of the ULEV table in first-seen order.
///
/// # Errors
///
/// Returns [`DashboardError::MissingDataset`] if ULEV is not loaded.
pub fn location_options(ctx: &DashboardContext) -> Result<Vec<DropdownOption>, DashboardError> {
    Ok(ctx
        .table(Dataset::Ulev)?
        .table()
        .region_names()
        .into_iter()
        .map(DropdownOption::same)
        .collect())
}

/// Period dropdown for a timeline, newest first.
///
/// # Errors
///
/// Returns [`DashboardError::MissingDataset`] if the timeline's reference
/// dataset is not loaded.
pub fn period_options(
    ctx: &DashboardContext,
    timeline: Timeline,
) -> Result<Vec<DropdownOption>, DashboardError> {
    Ok(ctx
        .table(timeline.reference_dataset())?
        .index()
        .labels()
        .iter()
        .map(|l| DropdownOption::same(l))
        .collect())
}

/// Map selector entries, valued by dataset id.
#[must_use]
pub fn map_options() -> Vec<DropdownOption> {
    options_of(views_of(ViewKind::Map))
}

/// Chart selector entries for one timeline, valued by dataset id.
#[must_use]
pub fn chart_options(timeline: Timeline) -> Vec<DropdownOption> {
    options_of(views_of(ViewKind::Chart).filter(|s| s.dataset.timeline() == timeline))
}

fn options_of<'a>(specs: impl Iterator<Item = &'a ViewSpec>) -> Vec<DropdownOption> {
    specs
        .filter_map(|s| {
            s.option_label.map(|label| DropdownOption {
                label: label.to_string(),
                value: s.dataset.to_string(),
            })
        })
        .collect()
}

/// Range slider for a timeline, marked with its reference dataset's
/// periods.
///
/// # Errors
///
/// * [`DashboardError::MissingDataset`] if the reference dataset is not
///   loaded.
/// * [`DashboardError::Analytics`] if it has no periods.
pub fn slider(ctx: &DashboardContext, timeline: Timeline) -> Result<Slider, DashboardError> {
    let index = ctx.table(timeline.reference_dataset())?.index();
    let max = index
        .len()
        .checked_sub(1)
        .ok_or(AnalyticsError::IndexOutOfRange { index: 0, len: 0 })?;
    Ok(Slider {
        min: 0,
        max,
        marks: index.marks(),
        default_window: (0, max),
    })
}

/// Most recent period of a dataset.
///
/// # Errors
///
/// * [`DashboardError::MissingDataset`] if the dataset is not loaded.
/// * [`DashboardError::Analytics`] if it has no periods.
pub fn default_period(ctx: &DashboardContext, dataset: Dataset) -> Result<&str, DashboardError> {
    let index = ctx.table(dataset)?.index();
    Ok(index
        .most_recent()
        .ok_or(AnalyticsError::IndexOutOfRange { index: 0, len: 0 })?)
}

/// Chart series for each selected location within `[lo, hi]`.
///
/// A location with no records in the dataset gets an empty series.
///
/// # Errors
///
/// * [`DashboardError::NoView`] if the dataset has no chart.
/// * [`DashboardError::Analytics`] if the window is invalid.
pub fn chart(
    ctx: &DashboardContext,
    dataset: Dataset,
    locations: &[String],
    lo: usize,
    hi: usize,
) -> Result<ChartView, DashboardError> {
    let spec = spec_for(dataset, ViewKind::Chart)?;
    let table = ctx.table(dataset)?;
    let window = table.filter(lo, hi)?;

    let mut series = Vec::with_capacity(locations.len());
    for location in locations {
        let wanted = normalize_name(location);
        let mut points = window
            .records()
            .iter()
            .filter(|r| names_match(&r.region_name, &wanted))
            .map(|r| {
                Ok(SeriesPoint {
                    index: table.index().label_to_index(&r.period_label)?,
                    period_label: r.period_label.clone(),
                    value: r.metric_value,
                })
            })
            .collect::<Result<Vec<_>, AnalyticsError>>()?;
        points.sort_by_key(|p| p.index);

        if points.is_empty() {
            log::debug!("No {dataset} records for {location:?} in window [{lo}, {hi}]");
        }
        series.push(Series {
            location: location.clone(),
            points,
        });
    }

    Ok(ChartView {
        title: spec.title.to_string(),
        metric: table.metric().to_string(),
        x_axis_reversed: true,
        series,
    })
}

/// Change stamps for the first selected location between the window's
/// ends.
///
/// With no location selected every field, titles included, is
/// [`PLACEHOLDER`].
///
/// # Errors
///
/// * [`DashboardError::NoView`] if the dataset has no stamps.
/// * [`DashboardError::UnknownLocation`] if the location is not in the
///   dataset.
/// * [`DashboardError::Analytics`] if the window is invalid or a value is
///   missing.
pub fn stamps(
    ctx: &DashboardContext,
    dataset: Dataset,
    locations: &[String],
    lo: usize,
    hi: usize,
) -> Result<StampView, DashboardError> {
    let total_spec = spec_for(dataset, ViewKind::StampTotal)?;
    let percent_spec = spec_for(dataset, ViewKind::StampPercent)?;
    let Some(location) = locations.first() else {
        return Ok(StampView::placeholder());
    };

    let table = ctx.table(dataset)?;
    let code = table.region_code_for_name(location).map_err(|e| match e {
        AnalyticsError::UnknownRegion { name } => DashboardError::UnknownLocation { name },
        other => other.into(),
    })?;
    let delta = table.delta(code, lo, hi)?;

    Ok(StampView {
        total_title: total_spec.title.to_string(),
        percent_title: percent_spec.title.to_string(),
        total: delta.absolute_delta.to_string(),
        percent: format!("{}%", delta.percent_delta),
        info: delta.window_description(),
    })
}

/// Map snapshot of a dataset at `period_label`, or at its most recent
/// period.
///
/// # Errors
///
/// * [`DashboardError::NoBoundaries`] if no boundaries are loaded.
/// * [`DashboardError::Geo`] if the join is empty or rejected.
pub fn map(
    ctx: &DashboardContext,
    dataset: Dataset,
    period_label: Option<&str>,
) -> Result<MapView, DashboardError> {
    let spec = spec_for(dataset, ViewKind::Map)?;
    if ctx.features().is_empty() {
        return Err(DashboardError::NoBoundaries);
    }
    let period = match period_label {
        Some(label) => label,
        None => default_period(ctx, dataset)?,
    };
    let table = ctx.table(dataset)?;
    let snapshot = snapshot_at(table.table(), period, ctx.features(), ctx.config().join_policy)?;
    Ok(MapView {
        title: spec.title.to_string(),
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use ev_map_geography::GeoError;
    use ev_map_geography::boundaries::{BoundaryOptions, parse_boundaries};
    use ev_map_geography_models::{GeoFeature, JoinPolicy};
    use ev_map_tidy_models::{MetricRecord, TidyTable, ValueOrigin};

    use super::*;
    use crate::config::DashboardConfig;

    fn square(code: &str, name: &str) -> GeoFeature {
        let text = format!(
            r#"{{"type": "FeatureCollection", "features": [{{"type": "Feature",
            "properties": {{"LAD20CD": "{code}", "LAD20NM": "{name}"}},
            "geometry": {{"type": "Polygon", "coordinates":
            [[[-1.3, 54.6], [-1.1, 54.6], [-1.1, 54.7], [-1.3, 54.6]]]}}}}]}}"#
        );
        parse_boundaries(&text, &BoundaryOptions::default())
            .unwrap()
            .remove(0)
    }

    fn records(rows: &[(&str, &str, &str, i64)]) -> Vec<MetricRecord> {
        rows.iter()
            .map(|(code, name, period, value)| MetricRecord {
                region_code: (*code).to_string(),
                region_name: (*name).to_string(),
                period_label: (*period).to_string(),
                metric_value: *value,
                origin: ValueOrigin::Observed,
            })
            .collect()
    }

    fn ulev() -> TidyTable {
        TidyTable::new(
            "ULEVRegistrations",
            records(&[
                ("K03000001", "Great Britain", "2021 Q3", 80),
                ("E06000001", "Hartlepool", "2021 Q3", 5),
                ("K03000001", "Great Britain", "2021 Q2", 90),
                ("E06000001", "Hartlepool", "2021 Q2", 4),
                ("K03000001", "Great Britain", "2021 Q1", 100),
                ("E06000001", "Hartlepool", "2021 Q1", 3),
            ]),
        )
        .unwrap()
    }

    fn devices() -> TidyTable {
        TidyTable::new(
            "TotalDevices",
            records(&[
                ("E06000001", "Hartlepool", "Jan-22", 28),
                ("E06000001", "Hartlepool", "Oct-21", 0),
            ]),
        )
        .unwrap()
    }

    fn context(policy: JoinPolicy, features: Vec<GeoFeature>) -> DashboardContext {
        let config = DashboardConfig {
            join_policy: policy,
            ..DashboardConfig::default()
        };
        DashboardContext::from_tables(
            config,
            [(Dataset::Ulev, ulev()), (Dataset::TotalDevices, devices())],
            features,
        )
        .unwrap()
    }

    fn gb() -> Vec<String> {
        vec!["Great Britain".to_string()]
    }

    #[test]
    fn dropdowns() {
        let ctx = context(JoinPolicy::Drop, Vec::new());
        let locations: Vec<String> = location_options(&ctx)
            .unwrap()
            .into_iter()
            .map(|o| o.value)
            .collect();
        assert_eq!(locations, vec!["Great Britain", "Hartlepool"]);

        let periods: Vec<String> = period_options(&ctx, Timeline::ChargePoints)
            .unwrap()
            .into_iter()
            .map(|o| o.label)
            .collect();
        assert_eq!(periods, vec!["Jan-22", "Oct-21"]);

        let maps = map_options();
        assert_eq!(maps.len(), 7);
        assert_eq!(maps[0].label, "Map 1: Total ULEVs");
        assert_eq!(maps[6].value, "rapid_per100k");

        let charts = chart_options(Timeline::ChargePoints);
        assert_eq!(
            charts.iter().map(|o| o.label.as_str()).collect::<Vec<_>>(),
            vec!["EVCP Chart 1: Total Devices", "EVCP Chart 2: Rapid Devices"]
        );
        assert_eq!(chart_options(Timeline::Registrations).len(), 3);
    }

    #[test]
    fn slider_covers_whole_timeline() {
        let ctx = context(JoinPolicy::Drop, Vec::new());
        let s = slider(&ctx, Timeline::Registrations).unwrap();
        assert_eq!((s.min, s.max), (0, 2));
        assert_eq!(s.default_window, (0, 2));
        assert_eq!(s.marks[0].label, "2021 Q3");
        assert_eq!(s.marks[2].label, "2021 Q1");
    }

    #[test]
    fn initial_selection() {
        let ctx = context(JoinPolicy::Drop, Vec::new());
        let sel = Selection::initial(&ctx).unwrap();
        assert_eq!(sel.map, Dataset::Ulev);
        assert_eq!(sel.map_period, "2021 Q3");
        assert_eq!(sel.registrations_window, (0, 2));
        assert_eq!(sel.charge_points_window, (0, 1));
        assert_eq!(sel.locations, gb());
    }

    #[test]
    fn stamp_text_follows_sign_convention() {
        let ctx = context(JoinPolicy::Drop, Vec::new());
        let view = stamps(&ctx, Dataset::Ulev, &gb(), 0, 2).unwrap();
        assert_eq!(view.total, "20");
        assert_eq!(view.percent, "25%");
        assert_eq!(view.info, "2021 Q3 - 2021 Q1 Great Britain");
        assert_eq!(view.total_title, "ULEV Registrations Change - Total");
        assert_eq!(view.percent_title, "ULEV Registrations Change - %");
    }

    #[test]
    fn stamp_uses_first_location_and_clamps_zero() {
        let ctx = context(JoinPolicy::Drop, Vec::new());
        let locations = vec!["HARTLEPOOL".to_string(), "Great Britain".to_string()];
        let view = stamps(&ctx, Dataset::TotalDevices, &locations, 0, 1).unwrap();
        // Oct-21 had no devices: 1 - 28 over 28.
        assert_eq!(view.total, "-27");
        assert_eq!(view.percent, "-96%");
        assert_eq!(view.info, "Jan-22 - Oct-21 Hartlepool");
    }

    #[test]
    fn stamp_without_location_is_all_placeholders() {
        let ctx = context(JoinPolicy::Drop, Vec::new());
        let view = stamps(&ctx, Dataset::Ulev, &[], 0, 2).unwrap();
        assert_eq!(view, StampView::placeholder());
        assert_eq!(view.total_title, "-");
    }

    #[test]
    fn stamp_errors() {
        let ctx = context(JoinPolicy::Drop, Vec::new());
        assert!(matches!(
            stamps(&ctx, Dataset::Ulev, &["Atlantis".to_string()], 0, 1),
            Err(DashboardError::UnknownLocation { ref name }) if name == "Atlantis"
        ));
        assert!(matches!(
            stamps(&ctx, Dataset::Ulev, &gb(), 2, 0),
            Err(DashboardError::Analytics(AnalyticsError::InvalidRange { lo: 2, hi: 0 }))
        ));
        assert!(matches!(
            stamps(&ctx, Dataset::TotalPer100k, &gb(), 0, 1),
            Err(DashboardError::NoView { .. })
        ));
        assert!(matches!(
            stamps(&ctx, Dataset::Bev, &gb(), 0, 1),
            Err(DashboardError::MissingDataset { dataset: Dataset::Bev })
        ));
    }

    #[test]
    fn chart_series_within_window() {
        let ctx = context(JoinPolicy::Drop, Vec::new());
        let locations = vec!["hartlepool".to_string(), "Atlantis".to_string()];
        let view = chart(&ctx, Dataset::Ulev, &locations, 1, 2).unwrap();
        assert_eq!(view.title, "ULEV Registrations by Location, Quarter and Year");
        assert_eq!(view.metric, "ULEVRegistrations");
        assert!(view.x_axis_reversed);
        assert_eq!(view.series.len(), 2);

        let points: Vec<(usize, &str, i64)> = view.series[0]
            .points
            .iter()
            .map(|p| (p.index, p.period_label.as_str(), p.value))
            .collect();
        assert_eq!(points, vec![(1, "2021 Q2", 4), (2, "2021 Q1", 3)]);
        assert!(view.series[1].points.is_empty());
    }

    #[test]
    fn chart_serializes_for_the_front_end() {
        let ctx = context(JoinPolicy::Drop, Vec::new());
        let view = chart(&ctx, Dataset::Ulev, &gb(), 0, 0).unwrap();
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["xAxisReversed"], serde_json::json!(true));
        assert_eq!(json["series"][0]["points"][0]["periodLabel"], "2021 Q3");
    }

    #[test]
    fn map_defaults_to_most_recent_period() {
        let ctx = context(JoinPolicy::Report, vec![square("E06000001", "Hartlepool")]);
        let view = map(&ctx, Dataset::Ulev, None).unwrap();
        assert_eq!(view.title, "Total ULEV Registrations by LAD, Quarter and Year");
        assert_eq!(view.snapshot.period_label, "2021 Q3");
        assert_eq!(view.snapshot.rows.len(), 1);
        assert_eq!(view.snapshot.rows[0].metric_value, 5);
        // Great Britain has no polygon.
        assert_eq!(view.snapshot.excluded_count, 1);
        assert_eq!(view.snapshot.excluded[0].region_code, "K03000001");

        let older = map(&ctx, Dataset::Ulev, Some("2021 Q1")).unwrap();
        assert_eq!(older.snapshot.rows[0].metric_value, 3);
    }

    #[test]
    fn map_follows_configured_policy() {
        let ctx = context(JoinPolicy::Reject, vec![square("E06000001", "Hartlepool")]);
        assert!(matches!(
            map(&ctx, Dataset::Ulev, None),
            Err(DashboardError::Geo(GeoError::IncompleteJoin { .. }))
        ));
        assert!(map(&ctx, Dataset::TotalDevices, None).is_ok());
    }

    #[test]
    fn map_needs_boundaries() {
        let ctx = context(JoinPolicy::Drop, Vec::new());
        assert!(matches!(
            map(&ctx, Dataset::Ulev, None),
            Err(DashboardError::NoBoundaries)
        ));
    }
}
