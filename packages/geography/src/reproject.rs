//! Coordinate reprojection to WGS84.

use ev_map_geography_models::Crs;
use geo::{Coord, MapCoords as _, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};

use crate::GeoError;

const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs +type=crs";

/// OSGB36 / British National Grid with the OSGB36→WGS84 Helmert parameters
/// (about 5 m accuracy).
const BNG_PROJ4: &str = "+proj=tmerc +lat_0=49 +lon_0=-2 +k=0.9996012717 +x_0=400000 +y_0=-100000 +ellps=airy +towgs84=446.448,-125.157,542.06,0.15,0.247,0.842,-20.489 +units=m +no_defs +type=crs";

const fn proj4_string(crs: Crs) -> &'static str {
    match crs {
        Crs::Wgs84 => WGS84_PROJ4,
        Crs::BritishNationalGrid => BNG_PROJ4,
    }
}

/// Transforms geometries from one CRS into WGS84 lon/lat degrees.
pub struct Reprojector {
    source: Crs,
    from: Proj,
    to: Proj,
}

impl Reprojector {
    /// Builds a transformation from `source` to WGS84.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Projection`] if a PROJ.4 definition is rejected.
    pub fn to_wgs84(source: Crs) -> Result<Self, GeoError> {
        let build = |s: &str| {
            Proj::from_proj_string(s).map_err(|e| GeoError::Projection {
                message: format!("failed to build PROJ.4 {s:?}: {e}"),
            })
        };
        Ok(Self {
            source,
            from: build(proj4_string(source))?,
            to: build(WGS84_PROJ4)?,
        })
    }

    #[must_use]
    pub const fn source(&self) -> Crs {
        self.source
    }

    /// Transforms one coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Projection`] if the point cannot be transformed.
    pub fn coord(&self, coord: Coord<f64>) -> Result<Coord<f64>, GeoError> {
        if self.source == Crs::Wgs84 {
            return Ok(coord);
        }
        // Geographic CRSs take radians in; projected ones take metres.
        let mut point = match self.source {
            Crs::Wgs84 => (coord.x.to_radians(), coord.y.to_radians(), 0.0),
            Crs::BritishNationalGrid => (coord.x, coord.y, 0.0),
        };
        transform(&self.from, &self.to, &mut point).map_err(|e| GeoError::Projection {
            message: format!("({}, {}) from EPSG:{}: {e}", coord.x, coord.y, self.source.epsg()),
        })?;
        Ok(Coord {
            x: point.0.to_degrees(),
            y: point.1.to_degrees(),
        })
    }

    /// Transforms every coordinate of a multipolygon.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Projection`] on the first point that fails.
    pub fn multi_polygon(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeoError> {
        if self.source == Crs::Wgs84 {
            return Ok(shape.clone());
        }
        shape.try_map_coords(|c| self.coord(c))
    }
}
