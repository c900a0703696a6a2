//! Boundary loading from `GeoJSON` feature collections.
//!
//! ONS publishes local authority boundaries as `GeoJSON` with `LAD<yy>CD`
//! and `LAD<yy>NM` properties, in either British National Grid or WGS84.
//! The CRS is read from the collection's legacy `crs` member unless the
//! caller overrides it; files without one are taken to be WGS84, as the
//! `GeoJSON` standard requires.

use std::collections::BTreeSet;
use std::path::Path;

use ev_map_geography_models::{Crs, GeoFeature};
use ev_map_tidy::normalize_name;
use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson};

use crate::GeoError;
use crate::reproject::Reprojector;

/// Default property holding the area code (2020 local authority districts).
pub const DEFAULT_CODE_PROPERTY: &str = "LAD20CD";

/// Default property holding the area name.
pub const DEFAULT_NAME_PROPERTY: &str = "LAD20NM";

/// How to read a boundary file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryOptions {
    pub code_property: String,
    pub name_property: String,
    /// Forces the source CRS, ignoring whatever the file declares.
    pub source_crs: Option<Crs>,
}

impl Default for BoundaryOptions {
    fn default() -> Self {
        Self {
            code_property: DEFAULT_CODE_PROPERTY.to_string(),
            name_property: DEFAULT_NAME_PROPERTY.to_string(),
            source_crs: None,
        }
    }
}

/// Reads the CRS a feature collection declares, if any.
///
/// # Errors
///
/// Returns [`GeoError::UnsupportedCrs`] if it names a CRS with no known
/// transformation.
pub fn declared_crs(collection: &FeatureCollection) -> Result<Option<Crs>, GeoError> {
    let name = collection
        .foreign_members
        .as_ref()
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(|name| name.as_str());

    match name.and_then(Crs::from_crs_name) {
        Some(crs) => Ok(Some(crs?)),
        None => Ok(None),
    }
}

/// Parses boundary features from a `GeoJSON` string.
///
/// Features are returned in file order with names normalized and
/// geometries in WGS84. A repeated region code keeps its first feature.
///
/// # Errors
///
/// * [`GeoError::GeoJson`] if the text is not a `FeatureCollection`.
/// * [`GeoError::InvalidGeometry`] if a feature lacks the code property or
///   is not a polygon.
/// * [`GeoError::UnsupportedCrs`] / [`GeoError::Projection`] if the
///   coordinates cannot be brought to WGS84.
pub fn parse_boundaries(text: &str, options: &BoundaryOptions) -> Result<Vec<GeoFeature>, GeoError> {
    let collection = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection,
        other => {
            return Err(GeoError::InvalidGeometry {
                feature: "document".to_string(),
                message: format!("expected a FeatureCollection, found {}", geojson_kind(&other)),
            });
        }
    };

    let crs = match options.source_crs {
        Some(crs) => crs,
        None => declared_crs(&collection)?.unwrap_or(Crs::Wgs84),
    };
    let reprojector = Reprojector::to_wgs84(crs)?;
    if crs != Crs::Wgs84 {
        log::info!("Reprojecting boundaries from EPSG:{} to EPSG:4326", crs.epsg());
    }

    let mut seen = BTreeSet::new();
    let mut features = Vec::with_capacity(collection.features.len());
    for (position, feature) in collection.features.into_iter().enumerate() {
        let parsed = parse_feature(position, feature, options, &reprojector)?;
        if !seen.insert(parsed.region_code.clone()) {
            log::warn!(
                "Duplicate boundary for {} at feature {position}; keeping the first",
                parsed.region_code
            );
            continue;
        }
        features.push(parsed);
    }

    log::info!("Loaded {} boundary features", features.len());
    Ok(features)
}

/// Reads and parses a boundary file.
///
/// # Errors
///
/// Returns [`GeoError::Io`] if the file cannot be read, or any error from
/// [`parse_boundaries`].
pub fn load_boundaries(path: &Path, options: &BoundaryOptions) -> Result<Vec<GeoFeature>, GeoError> {
    log::debug!("Reading boundaries from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    parse_boundaries(&text, options)
}

fn parse_feature(
    position: usize,
    feature: Feature,
    options: &BoundaryOptions,
    reprojector: &Reprojector,
) -> Result<GeoFeature, GeoError> {
    let string_property = |name: &str| {
        feature
            .property(name)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let region_code =
        string_property(&options.code_property).ok_or_else(|| GeoError::InvalidGeometry {
            feature: format!("#{position}"),
            message: format!("missing {:?} property", options.code_property),
        })?;
    let region_name = string_property(&options.name_property)
        .map(|n| normalize_name(&n))
        .unwrap_or_default();

    let invalid = |message: String| GeoError::InvalidGeometry {
        feature: region_code.clone(),
        message,
    };

    let geometry = feature
        .geometry
        .ok_or_else(|| invalid("feature has no geometry".to_string()))?;
    let shape: geo::Geometry<f64> = geometry.try_into()?;
    let shape = match shape {
        geo::Geometry::MultiPolygon(mp) => mp,
        geo::Geometry::Polygon(p) => MultiPolygon(vec![p]),
        other => {
            return Err(invalid(format!(
                "expected a Polygon or MultiPolygon, found {}",
                geometry_kind(&other)
            )));
        }
    };

    Ok(GeoFeature {
        geometry: reprojector.multi_polygon(&shape)?,
        region_code,
        region_name,
    })
}

const fn geojson_kind(doc: &GeoJson) -> &'static str {
    match doc {
        GeoJson::Geometry(_) => "Geometry",
        GeoJson::Feature(_) => "Feature",
        GeoJson::FeatureCollection(_) => "FeatureCollection",
    }
}

const fn geometry_kind(shape: &geo::Geometry<f64>) -> &'static str {
    match shape {
        geo::Geometry::Point(_) => "Point",
        geo::Geometry::Line(_) => "Line",
        geo::Geometry::LineString(_) => "LineString",
        geo::Geometry::Polygon(_) => "Polygon",
        geo::Geometry::MultiPoint(_) => "MultiPoint",
        geo::Geometry::MultiLineString(_) => "MultiLineString",
        geo::Geometry::MultiPolygon(_) => "MultiPolygon",
        geo::Geometry::GeometryCollection(_) => "GeometryCollection",
        geo::Geometry::Rect(_) => "Rect",
        geo::Geometry::Triangle(_) => "Triangle",
    }
}
