use crate::library::{tables, OperationLibrary};
use crate::metadata::CrsMetadata;
use crate::params::Params;
use geo::{Geometry, LineString, MultiLineString, MultiPolygon, Polygon, Simplify, SimplifyVwPreserve};
use geojson::{FeatureCollection, GeoJson};
use geoproc_core::error::{GeoprocError, Result};
use geoproc_core::models::OperationType;
use geoproc_geo::FeatureTable;
use tracing::info;

impl OperationLibrary {
    /// Simplify every feature with `tolerance` in working CRS units
    pub fn simplify(&self, layers: &[GeoJson], params: &Params) -> Result<Vec<FeatureCollection>> {
        if layers.is_empty() {
            return Ok(Vec::new());
        }
        let tolerance = params.get_f64("tolerance")?.ok_or_else(|| {
            GeoprocError::invalid_parameter("tolerance", "a simplification tolerance is required")
        })?;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(GeoprocError::invalid_parameter(
                "tolerance",
                format!("must be a non-negative number, got {}", tolerance),
            ));
        }
        let preserve_topology = params.get_bool("preserve_topology")?.unwrap_or(true);

        let input = FeatureTable::concat(&tables(layers)?);
        if tolerance == 0.0 {
            return Ok(vec![input.to_feature_collection()]);
        }

        let options = self.options(params)?;
        let (mut working, selection) =
            self.prepare(std::slice::from_ref(&input), OperationType::Simplify, &options)?;
        let working = working.pop().unwrap_or_default();
        let simplified = working
            .map_geometries(|g| Ok(simplify_geometry(g, tolerance, preserve_topology)))?;
        info!(tolerance, preserve_topology, crs = %selection.crs, "Simplified features");

        let metadata = CrsMetadata::from_selection(&selection);
        Ok(vec![self.finish(&simplified, &options, Some(metadata))?])
    }
}

/// Simplify one geometry. Points pass through.
///
/// Without `preserve_topology` lines and rings go through Douglas-Peucker and a ring
/// left with fewer than four vertices is removed; a polygon losing its exterior
/// vanishes. With it, the topology preserving Visvalingam-Whyatt variant runs with the
/// triangle area `tolerance²` and collapsed rings keep their original shape.
pub fn simplify_geometry(geometry: &Geometry, tolerance: f64, preserve_topology: bool) -> Option<Geometry> {
    match geometry {
        Geometry::LineString(ls) => {
            Some(Geometry::LineString(simplify_line(ls, tolerance, preserve_topology)))
        }
        Geometry::MultiLineString(mls) => Some(Geometry::MultiLineString(MultiLineString(
            mls.0.iter().map(|ls| simplify_line(ls, tolerance, preserve_topology)).collect(),
        ))),
        Geometry::Polygon(p) => {
            simplify_polygon(p, tolerance, preserve_topology).map(Geometry::Polygon)
        }
        Geometry::MultiPolygon(mp) => {
            let polygons: Vec<Polygon> = mp
                .0
                .iter()
                .filter_map(|p| simplify_polygon(p, tolerance, preserve_topology))
                .collect();
            (!polygons.is_empty()).then(|| Geometry::MultiPolygon(MultiPolygon(polygons)))
        }
        Geometry::Rect(r) => simplify_geometry(&Geometry::Polygon(r.to_polygon()), tolerance, preserve_topology),
        Geometry::Triangle(t) => {
            simplify_geometry(&Geometry::Polygon(t.to_polygon()), tolerance, preserve_topology)
        }
        Geometry::GeometryCollection(gc) => {
            let parts: Vec<Geometry> = gc
                .0
                .iter()
                .filter_map(|g| simplify_geometry(g, tolerance, preserve_topology))
                .collect();
            Some(Geometry::GeometryCollection(parts.into()))
        }
        Geometry::Point(_) | Geometry::MultiPoint(_) | Geometry::Line(_) => Some(geometry.clone()),
    }
}

fn simplify_line(line: &LineString, tolerance: f64, preserve_topology: bool) -> LineString {
    if preserve_topology {
        line.simplify_vw_preserve(tolerance * tolerance)
    } else {
        line.simplify(tolerance)
    }
}

fn simplify_polygon(polygon: &Polygon, tolerance: f64, preserve_topology: bool) -> Option<Polygon> {
    let simplified = if preserve_topology {
        polygon.simplify_vw_preserve(tolerance * tolerance)
    } else {
        polygon.simplify(tolerance)
    };
    let exterior = keep_ring(simplified.exterior(), polygon.exterior(), preserve_topology)?;
    let interiors = simplified
        .interiors()
        .iter()
        .zip(polygon.interiors())
        .filter_map(|(ring, original)| keep_ring(ring, original, preserve_topology))
        .collect();
    Some(Polygon::new(exterior, interiors))
}

/// A simplified ring, the original when it collapsed and topology is preserved
fn keep_ring(ring: &LineString, original: &LineString, preserve_topology: bool) -> Option<LineString> {
    if ring.0.len() >= 4 {
        Some(ring.clone())
    } else if preserve_topology {
        Some(original.clone())
    } else {
        None
    }
}
