//! `GeoJSON` export of joined snapshots.

use std::io::Write;

use ev_map_geography_models::JoinedSnapshot;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue};

use crate::GeoError;

/// Property carrying the period label on every exported feature.
pub const PERIOD_PROPERTY: &str = "period";

/// Converts a snapshot into a `FeatureCollection`.
///
/// Each feature carries `region_code`, `region_name`, the period label, and
/// the metric value under the metric's own name, so a map layer can colour
/// by it directly. The feature `id` is the region code.
#[must_use]
pub fn to_feature_collection(snapshot: &JoinedSnapshot) -> FeatureCollection {
    let features = snapshot
        .rows
        .iter()
        .map(|row| {
            let mut properties = JsonObject::new();
            properties.insert("region_code".to_string(), JsonValue::from(row.region_code.as_str()));
            properties.insert("region_name".to_string(), JsonValue::from(row.region_name.as_str()));
            properties.insert(
                PERIOD_PROPERTY.to_string(),
                JsonValue::from(snapshot.period_label.as_str()),
            );
            properties.insert(snapshot.metric.clone(), JsonValue::from(row.metric_value));

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&row.geometry))),
                id: Some(geojson::feature::Id::String(row.region_code.clone())),
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Writes a snapshot as a `GeoJSON` document.
///
/// # Errors
///
/// Returns [`GeoError::Json`] if serialization or writing fails.
pub fn write_geojson(writer: impl Write, snapshot: &JoinedSnapshot) -> Result<(), GeoError> {
    let doc = GeoJson::from(to_feature_collection(snapshot));
    serde_json::to_writer(writer, &doc)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use ev_map_geography_models::SnapshotRow;
    use geo::{LineString, MultiPolygon, Polygon};

    use super::*;

    fn snapshot() -> JoinedSnapshot {
        let geometry = MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(-1.3, 54.6), (-1.1, 54.6), (-1.1, 54.7), (-1.3, 54.6)]),
            vec![],
        )]);
        JoinedSnapshot {
            metric: "TotalDevices".to_string(),
            period_label: "Jan-22".to_string(),
            rows: vec![SnapshotRow {
                region_code: "E06000001".to_string(),
                region_name: "Hartlepool".to_string(),
                geometry,
                metric_value: 28,
            }],
            excluded_count: 0,
            excluded: Vec::new(),
        }
    }

    #[test]
    fn features_carry_metric_property() {
        let collection = to_feature_collection(&snapshot());
        assert_eq!(collection.features.len(), 1);
        let feature = &collection.features[0];
        assert_eq!(feature.property("TotalDevices"), Some(&JsonValue::from(28)));
        assert_eq!(feature.property("region_name"), Some(&JsonValue::from("Hartlepool")));
        assert_eq!(feature.property(PERIOD_PROPERTY), Some(&JsonValue::from("Jan-22")));
    }

    #[test]
    fn written_document_parses_back() {
        let mut out = Vec::new();
        write_geojson(&mut out, &snapshot()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let doc: GeoJson = text.parse().unwrap();
        let GeoJson::FeatureCollection(collection) = doc else {
            panic!("expected a FeatureCollection: {text}");
        };
        let geometry: geo::Geometry<f64> = collection.features[0]
            .geometry
            .clone()
            .unwrap()
            .try_into()
            .unwrap();
        assert!(matches!(geometry, geo::Geometry::MultiPolygon(_)));
    }
}
