//! CRS transformation

use geo::{
    Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint, MultiPolygon,
    Point, Polygon,
};
use geoproc_core::error::{GeoprocError, Result};
use geoproc_core::models::Crs;
use proj::Proj;

/// Latitude limit of the Web Mercator domain
pub const WEB_MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Reprojects geometries between two CRS
pub struct Reprojector {
    proj: Option<Proj>,
    source: Crs,
    target: Crs,
    clamp_latitude: bool,
}

impl Reprojector {
    pub fn new(source: &Crs, target: &Crs) -> Result<Self> {
        let proj = if source.same_as(target) {
            None
        } else {
            let from = source.to_proj_definition();
            let to = target.to_proj_definition();
            let proj = Proj::new_known_crs(&from, &to, None).map_err(|e| {
                GeoprocError::InvalidCrs {
                    code: target.to_string(),
                    reason: format!(
                        "Failed to create projection from {} to {}: {}",
                        source, target, e
                    ),
                }
            })?;
            Some(proj)
        };

        Ok(Self {
            proj,
            source: source.clone(),
            target: target.clone(),
            clamp_latitude: source.is_geographic() && target.is_web_mercator(),
        })
    }

    pub fn source(&self) -> &Crs {
        &self.source
    }

    pub fn target(&self) -> &Crs {
        &self.target
    }

    pub fn is_identity(&self) -> bool {
        self.proj.is_none()
    }

    pub fn convert_coord(&self, coord: Coord) -> Result<Coord> {
        let Some(proj) = &self.proj else {
            return Ok(coord);
        };
        let y = if self.clamp_latitude {
            coord.y.clamp(-WEB_MERCATOR_MAX_LAT, WEB_MERCATOR_MAX_LAT)
        } else {
            coord.y
        };
        let (x, y) = proj.convert((coord.x, y)).map_err(|e| {
            GeoprocError::projection(format!(
                "({}, {}) from {} to {}: {}",
                coord.x, coord.y, self.source, self.target, e
            ))
        })?;
        if !x.is_finite() || !y.is_finite() {
            return Err(GeoprocError::projection(format!(
                "({}, {}) is outside the domain of {}",
                coord.x, coord.y, self.target
            )));
        }
        Ok(Coord { x, y })
    }

    fn convert_line(&self, line: &LineString) -> Result<LineString> {
        line.0
            .iter()
            .map(|c| self.convert_coord(*c))
            .collect::<Result<Vec<_>>>()
            .map(LineString::from)
    }

    fn convert_polygon(&self, polygon: &Polygon) -> Result<Polygon> {
        let exterior = self.convert_line(polygon.exterior())?;
        let interiors = polygon
            .interiors()
            .iter()
            .map(|ring| self.convert_line(ring))
            .collect::<Result<Vec<_>>>()?;
        Ok(Polygon::new(exterior, interiors))
    }

    pub fn transform_geometry(&self, geometry: &Geometry) -> Result<Geometry> {
        if self.is_identity() {
            return Ok(geometry.clone());
        }

        let transformed = match geometry {
            Geometry::Point(p) => Geometry::Point(Point::from(self.convert_coord(p.0)?)),
            Geometry::Line(line) => Geometry::LineString(
                self.convert_line(&LineString::from(vec![line.start, line.end]))?,
            ),
            Geometry::LineString(ls) => Geometry::LineString(self.convert_line(ls)?),
            Geometry::Polygon(poly) => Geometry::Polygon(self.convert_polygon(poly)?),
            Geometry::MultiPoint(mp) => Geometry::MultiPoint(MultiPoint(
                mp.0.iter()
                    .map(|p| self.convert_coord(p.0).map(Point::from))
                    .collect::<Result<Vec<_>>>()?,
            )),
            Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString(
                mls.0.iter().map(|ls| self.convert_line(ls)).collect::<Result<Vec<_>>>()?,
            )),
            Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon(
                mp.0.iter().map(|p| self.convert_polygon(p)).collect::<Result<Vec<_>>>()?,
            )),
            Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(GeometryCollection(
                gc.0.iter().map(|g| self.transform_geometry(g)).collect::<Result<Vec<_>>>()?,
            )),
            Geometry::Rect(rect) => Geometry::Polygon(self.convert_polygon(&rect.to_polygon())?),
            Geometry::Triangle(tri) => {
                Geometry::Polygon(self.convert_polygon(&tri.to_polygon())?)
            }
        };

        Ok(transformed)
    }
}

/// Reproject a geometry from one CRS to another
pub fn reproject_geometry(geometry: &Geometry, from_crs: &Crs, to_crs: &Crs) -> Result<Geometry> {
    Reprojector::new(from_crs, to_crs)?.transform_geometry(geometry)
}

/// Whether a CRS string names something the projection engine can use.
///
/// Never fails; unparseable or unknown definitions yield `false`.
pub fn validate_crs(code: &str) -> bool {
    match Crs::parse(code) {
        Ok(crs) => Proj::new_known_crs(&crs.to_proj_definition(), "EPSG:4326", None).is_ok(),
        Err(_) => false,
    }
}
