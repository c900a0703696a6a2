//! Joining one period of a tidy table to boundary polygons.

use std::collections::{BTreeMap, BTreeSet};

use ev_map_geography_models::{
    ExcludedRow, ExclusionReason, GeoFeature, JoinPolicy, JoinedSnapshot, SnapshotRow,
};
use ev_map_tidy_models::{MetricRecord, TidyTable};

use crate::GeoError;

/// Joins the records of `period_label` to `features` by exact region code.
///
/// Rows follow feature order. A feature with no record for the period is
/// excluded as [`ExclusionReason::MissingValue`]; a record with no feature
/// is excluded as [`ExclusionReason::UnmatchedGeometry`]. What happens to
/// exclusions depends on `policy`.
///
/// # Errors
///
/// * [`GeoError::EmptySnapshot`] if no row survives.
/// * [`GeoError::IncompleteJoin`] if anything was excluded under
///   [`JoinPolicy::Reject`].
pub fn join(
    table: &TidyTable,
    period_label: &str,
    features: &[GeoFeature],
    policy: JoinPolicy,
) -> Result<JoinedSnapshot, GeoError> {
    let records: BTreeMap<&str, &MetricRecord> = table
        .records_for_period(period_label)
        .map(|r| (r.region_code.as_str(), r))
        .collect();

    let mut rows = Vec::with_capacity(features.len());
    let mut excluded = Vec::new();
    let mut matched = BTreeSet::new();

    for feature in features {
        if let Some(record) = records.get(feature.region_code.as_str()) {
            matched.insert(feature.region_code.as_str());
            rows.push(SnapshotRow {
                region_code: feature.region_code.clone(),
                region_name: feature.region_name.clone(),
                geometry: feature.geometry.clone(),
                metric_value: record.metric_value,
            });
        } else {
            excluded.push(ExcludedRow {
                region_code: feature.region_code.clone(),
                region_name: feature.region_name.clone(),
                reason: ExclusionReason::MissingValue,
            });
        }
    }

    // Records in table order, so the report is stable.
    excluded.extend(
        table
            .records_for_period(period_label)
            .filter(|r| !matched.contains(r.region_code.as_str()))
            .map(|r| ExcludedRow {
                region_code: r.region_code.clone(),
                region_name: r.region_name.clone(),
                reason: ExclusionReason::UnmatchedGeometry,
            }),
    );

    let metric = table.metric().to_string();
    let excluded_count = excluded.len();

    if rows.is_empty() {
        return Err(GeoError::EmptySnapshot {
            metric,
            period_label: period_label.to_string(),
            excluded: excluded_count,
        });
    }

    let excluded = match policy {
        JoinPolicy::Drop => {
            for row in &excluded {
                log::debug!("Dropped {} from {metric} {period_label}: {}", row.region_code, row.reason);
            }
            Vec::new()
        }
        JoinPolicy::Report => {
            if excluded_count > 0 {
                log::warn!(
                    "{excluded_count} regions excluded from {metric} {period_label}: {}",
                    excluded
                        .iter()
                        .map(|r| format!("{} ({})", r.region_code, r.reason))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
            }
            excluded
        }
        JoinPolicy::Reject => {
            if excluded_count > 0 {
                return Err(GeoError::IncompleteJoin {
                    metric,
                    period_label: period_label.to_string(),
                    excluded,
                });
            }
            excluded
        }
    };

    log::info!(
        "Joined {metric} {period_label}: {} rows, {excluded_count} excluded",
        rows.len()
    );

    Ok(JoinedSnapshot {
        metric,
        period_label: period_label.to_string(),
        rows,
        excluded_count,
        excluded,
    })
}

/// Alias of [`join`] under the name map views use.
///
/// # Errors
///
/// Same as [`join`].
pub fn snapshot_at(
    table: &TidyTable,
    period_label: &str,
    features: &[GeoFeature],
    policy: JoinPolicy,
) -> Result<JoinedSnapshot, GeoError> {
    join(table, period_label, features, policy)
}

#[cfg(test)]
mod tests {
    use ev_map_tidy_models::ValueOrigin;
    use geo::{LineString, MultiPolygon, Polygon};

    use super::*;

    fn square(x: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(x, 54.0), (x + 0.1, 54.0), (x + 0.1, 54.1), (x, 54.0)]),
            vec![],
        )])
    }

    fn feature(code: &str, x: f64) -> GeoFeature {
        GeoFeature {
            region_code: code.to_string(),
            region_name: format!("Area {code}"),
            geometry: square(x),
        }
    }

    fn table() -> TidyTable {
        let mut records = Vec::new();
        for (period, bump) in [("Jan-22", 10), ("Oct-21", 0)] {
            for (code, value) in [("E1", 5), ("E2", 7), ("E3", 9)] {
                records.push(MetricRecord {
                    region_code: code.to_string(),
                    region_name: format!("Area {code}"),
                    period_label: period.to_string(),
                    metric_value: value + bump,
                    origin: ValueOrigin::Observed,
                });
            }
        }
        TidyTable::new("TotalDevices", records).unwrap()
    }

    #[test]
    fn complete_join_keeps_feature_order() {
        let features = vec![feature("E3", 0.0), feature("E1", 1.0), feature("E2", 2.0)];
        let snapshot = join(&table(), "Jan-22", &features, JoinPolicy::Reject).unwrap();
        let codes: Vec<&str> = snapshot.rows.iter().map(|r| r.region_code.as_str()).collect();
        assert_eq!(codes, vec!["E3", "E1", "E2"]);
        assert_eq!(snapshot.rows[0].metric_value, 19);
        assert_eq!(snapshot.rows[0].geometry, square(0.0));
        assert_eq!(snapshot.excluded_count, 0);
        assert_eq!(snapshot.value_range(), Some((15, 19)));
    }

    #[test]
    fn rows_plus_excluded_cover_every_region() {
        // E3 has no boundary; E4 has no record.
        let features = vec![feature("E1", 0.0), feature("E2", 1.0), feature("E4", 2.0)];
        let snapshot = join(&table(), "Oct-21", &features, JoinPolicy::Report).unwrap();
        assert_eq!(snapshot.rows.len(), 2);
        assert_eq!(snapshot.excluded_count, 2);
        assert_eq!(
            snapshot.excluded,
            vec![
                ExcludedRow {
                    region_code: "E4".to_string(),
                    region_name: "Area E4".to_string(),
                    reason: ExclusionReason::MissingValue,
                },
                ExcludedRow {
                    region_code: "E3".to_string(),
                    region_name: "Area E3".to_string(),
                    reason: ExclusionReason::UnmatchedGeometry,
                },
            ]
        );
    }

    #[test]
    fn drop_counts_but_does_not_list() {
        let features = vec![feature("E1", 0.0), feature("E4", 2.0)];
        let snapshot = join(&table(), "Oct-21", &features, JoinPolicy::Drop).unwrap();
        assert_eq!(snapshot.rows.len(), 1);
        assert_eq!(snapshot.excluded_count, 3);
        assert!(snapshot.excluded.is_empty());
    }

    #[test]
    fn reject_fails_on_any_exclusion() {
        let features = vec![feature("E1", 0.0), feature("E2", 1.0)];
        let err = join(&table(), "Jan-22", &features, JoinPolicy::Reject).unwrap_err();
        assert!(
            matches!(err, GeoError::IncompleteJoin { ref excluded, .. } if excluded.len() == 1 && excluded[0].region_code == "E3"),
            "{err}"
        );
    }

    #[test]
    fn codes_match_case_sensitively() {
        let features = vec![feature("e1", 0.0)];
        assert!(matches!(
            join(&table(), "Jan-22", &features, JoinPolicy::Drop),
            Err(GeoError::EmptySnapshot { excluded: 4, .. })
        ));
    }

    #[test]
    fn unknown_period_is_empty_snapshot() {
        let features = vec![feature("E1", 0.0)];
        let err = snapshot_at(&table(), "Apr-22", &features, JoinPolicy::Report).unwrap_err();
        assert!(
            matches!(err, GeoError::EmptySnapshot { ref period_label, excluded: 1, .. } if period_label == "Apr-22"),
            "{err}"
        );
    }
}
