//! Buffer method selection and geodesic buffer construction.
//!
//! A metric radius can be applied planarly in a projected working CRS when the extent
//! is small and sits in one UTM zone. Everything else is buffered on the ellipsoid.

use crate::metrics::{lon_extent, normalize_lon, KM_PER_DEGREE};
use crate::transform::Reprojector;
use crate::wkt::azimuthal_equidistant;
use geo::{
    BooleanOps, BoundingRect, Buffer, Coord, Destination, Distance, Geodesic, Geometry,
    LineString, MapCoords, MultiPolygon, Point, Polygon, Rect, Translate,
};
use geoproc_core::config::DecisionThresholds;
use geoproc_core::error::Result;
use geoproc_core::models::{BBoxMetrics, BoundingBox, Crs};
use serde::{Deserialize, Serialize};

/// Fewest vertices of a geodesic circle
pub const MIN_CIRCLE_VERTICES: usize = 32;
/// Most vertices of a geodesic circle
pub const MAX_CIRCLE_VERTICES: usize = 180;

/// How a buffer radius is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BufferMethod {
    /// Euclidean buffer in a projected working CRS
    Planar,
    /// Buffer on the WGS 84 ellipsoid
    Geodesic,
}

impl BufferMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            BufferMethod::Planar => "planar",
            BufferMethod::Geodesic => "geodesic",
        }
    }
}

/// Pick planar or geodesic buffering for an extent and radius.
///
/// Criteria in order: antimeridian, UTM zone span, polar, non-local extent, large
/// radius. The first that applies selects geodesic; planar otherwise.
pub fn choose_buffer_method(
    radius_meters: f64,
    metrics: &BBoxMetrics,
    thresholds: &DecisionThresholds,
) -> (BufferMethod, String) {
    if metrics.crosses_antimeridian {
        return (BufferMethod::Geodesic, "Extent crosses the antimeridian".to_string());
    }
    if metrics.utm_zone_span > 1 {
        return (
            BufferMethod::Geodesic,
            format!("Extent spans {} UTM zones", metrics.utm_zone_span),
        );
    }
    if metrics.is_polar {
        return (BufferMethod::Geodesic, "High latitude".to_string());
    }
    let is_local = metrics.lon_extent < thresholds.local_extent_deg
        && metrics.lat_extent < thresholds.local_extent_deg;
    if !is_local {
        return (BufferMethod::Geodesic, "Non-local extent".to_string());
    }
    if radius_meters > thresholds.large_radius_m {
        return (BufferMethod::Geodesic, "Large radius".to_string());
    }
    (BufferMethod::Planar, "Local single-zone extent and moderate radius".to_string())
}

/// Extent covered once `bounds` is grown by `radius_meters`.
///
/// Growth past ±180° wraps into an inverted box, so buffers that will cross the
/// antimeridian are seen as crossing it before they are built.
pub fn buffered_extent(bounds: &BoundingBox, radius_meters: f64) -> BoundingBox {
    let dlat = radius_meters.max(0.0) / (KM_PER_DEGREE * 1000.0);
    let min_lat = (bounds.min_lat - dlat).max(-90.0);
    let max_lat = (bounds.max_lat + dlat).min(90.0);
    let widest_lat = min_lat.abs().max(max_lat.abs()).min(89.0);
    let dlon = dlat / widest_lat.to_radians().cos();

    let (west, east) = (bounds.min_lon - dlon, bounds.max_lon + dlon);
    if lon_extent(bounds) + 2.0 * dlon >= 360.0 {
        return BoundingBox::new(-180.0, min_lat, 180.0, max_lat);
    }
    let west = if west <= -180.0 { west + 360.0 } else { west };
    BoundingBox::new(west, min_lat, normalize_lon(east), max_lat)
}

/// Vertex count for a circle of `radius_meters`, growing with the radius
pub fn geodesic_vertex_count(radius_meters: f64) -> usize {
    let n = 32.0 + (radius_meters.max(0.0) / 1000.0).sqrt() * 4.0;
    (n.round() as usize).clamp(MIN_CIRCLE_VERTICES, MAX_CIRCLE_VERTICES)
}

/// Wrap a longitude difference into [-180, 180)
fn wrap_delta(delta: f64) -> f64 {
    (delta + 180.0).rem_euclid(360.0) - 180.0
}

/// Geodesic circle around a WGS 84 point.
///
/// Vertices are solved with the direct geodesic problem and form a closed
/// counter-clockwise ring. Circles that enclose a pole become polar caps; circles
/// crossing the antimeridian come back as a MultiPolygon split at ±180°.
pub fn create_geodesic_buffer_point(
    center: Point,
    radius_meters: f64,
    num_points: usize,
) -> Geometry {
    let n = num_points.clamp(MIN_CIRCLE_VERTICES, MAX_CIRCLE_VERTICES);
    let step = 360.0 / n as f64;

    // descending bearings walk north, west, south, east: counter-clockwise
    let vertices: Vec<Point> = (0..n)
        .map(|i| Geodesic.destination(center, (360.0 - i as f64 * step) % 360.0, radius_meters))
        .collect();

    let north = center.y() >= 0.0;
    let pole = Point::new(center.x(), if north { 90.0 } else { -90.0 });
    if Geodesic.distance(center, pole) < radius_meters {
        return Geometry::Polygon(polar_cap(&vertices, north));
    }

    let mut ring: Vec<Coord> = vertices
        .iter()
        .map(|p| Coord { x: center.x() + wrap_delta(p.x() - center.x()), y: p.y() })
        .collect();
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    let circle = Polygon::new(LineString::new(ring), vec![]);
    collapse(split_at_antimeridian(vec![circle]))
        .unwrap_or_else(|| Geometry::MultiPolygon(MultiPolygon::new(vec![])))
}

/// Cap bounded by the circle's vertices and the pole edge of the lon/lat plane
fn polar_cap(vertices: &[Point], north: bool) -> Polygon {
    let mut coords: Vec<Coord> = vertices
        .iter()
        .map(|p| Coord { x: wrap_delta(p.x()), y: p.y() })
        .collect();
    if north {
        coords.sort_by(|a, b| a.x.total_cmp(&b.x));
        coords.push(Coord { x: 180.0, y: 90.0 });
        coords.push(Coord { x: -180.0, y: 90.0 });
    } else {
        coords.sort_by(|a, b| b.x.total_cmp(&a.x));
        coords.push(Coord { x: -180.0, y: -90.0 });
        coords.push(Coord { x: 180.0, y: -90.0 });
    }
    if let Some(first) = coords.first().copied() {
        coords.push(first);
    }
    Polygon::new(LineString::new(coords), vec![])
}

/// Cut polygons whose longitudes leave [-180, 180] into in-range pieces
pub fn split_at_antimeridian(polygons: Vec<Polygon>) -> MultiPolygon {
    let world = Rect::new(Coord { x: -180.0, y: -90.0 }, Coord { x: 180.0, y: 90.0 }).to_polygon();
    let mut parts = Vec::with_capacity(polygons.len());
    for polygon in polygons {
        let wraps = polygon
            .bounding_rect()
            .map(|r| r.min().x < -180.0 || r.max().x > 180.0)
            .unwrap_or(false);
        if !wraps {
            parts.push(polygon);
            continue;
        }
        for shift in [-360.0, 0.0, 360.0] {
            let piece = polygon.translate(shift, 0.0).intersection(&world);
            parts.extend(piece.0);
        }
    }
    MultiPolygon(parts)
}

/// One polygon as a Polygon, several as a MultiPolygon, none as `None`
pub fn collapse(polygons: MultiPolygon) -> Option<Geometry> {
    let mut polygons = polygons.0;
    match polygons.len() {
        0 => None,
        1 => polygons.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(MultiPolygon(polygons))),
    }
}

/// Euclidean buffer in the geometry's own units
pub fn planar_buffer(geometry: &Geometry, distance: f64) -> Option<Geometry> {
    collapse(geometry.buffer(distance))
}

/// Buffer a WGS 84 geometry by a distance in meters on the ellipsoid.
///
/// Points use [`create_geodesic_buffer_point`] and multipoints the union of their
/// circles. Other geometries are buffered in an azimuthal equidistant projection
/// centred on them, where distances from the center are true.
pub fn geodesic_buffer(geometry: &Geometry, radius_meters: f64) -> Result<Option<Geometry>> {
    let vertices = geodesic_vertex_count(radius_meters);
    match geometry {
        Geometry::Point(p) if radius_meters > 0.0 => {
            Ok(Some(create_geodesic_buffer_point(*p, radius_meters, vertices)))
        }
        Geometry::MultiPoint(mp) if radius_meters > 0.0 => {
            let union = mp.0.iter().fold(MultiPolygon::new(vec![]), |acc, p| {
                let circle = match create_geodesic_buffer_point(*p, radius_meters, vertices) {
                    Geometry::Polygon(poly) => MultiPolygon(vec![poly]),
                    Geometry::MultiPolygon(multi) => multi,
                    _ => MultiPolygon::new(vec![]),
                };
                acc.union(&circle)
            });
            Ok(collapse(union))
        }
        Geometry::Point(_) | Geometry::MultiPoint(_) => Ok(None),
        _ => buffer_in_local_projection(geometry, radius_meters),
    }
}

fn buffer_in_local_projection(geometry: &Geometry, radius_meters: f64) -> Result<Option<Geometry>> {
    let Some(bounds) = geometry.bounding_rect() else {
        return Ok(None);
    };
    let center = bounds.center();
    let local = azimuthal_equidistant("WGS 84 / Local Azimuthal Equidistant", center.x, center.y)
        .to_crs();
    let wgs84 = Crs::wgs84();

    let projected = Reprojector::new(&wgs84, &local)?.transform_geometry(geometry)?;
    let buffered = projected.buffer(radius_meters);
    let back = Reprojector::new(&local, &wgs84)?
        .transform_geometry(&Geometry::MultiPolygon(buffered))?;

    let polygons = match back {
        Geometry::MultiPolygon(mp) => mp.0,
        Geometry::Polygon(p) => vec![p],
        _ => vec![],
    };
    let unwrapped = polygons
        .into_iter()
        .map(|p| p.map_coords(|c| Coord { x: center.x + wrap_delta(c.x - center.x), y: c.y }))
        .collect();
    Ok(collapse(split_at_antimeridian(unwrapped)))
}
