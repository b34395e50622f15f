use crate::geometry::{join_properties, polygonal, shared_columns, single_or_multi, union_all};
use crate::library::{passthrough, tables, OperationLibrary};
use crate::metadata::CrsMetadata;
use crate::params::Params;
use geo::{BooleanOps, BoundingRect, MultiPolygon};
use geojson::{FeatureCollection, GeoJson, JsonObject};
use geoproc_core::error::{GeoprocError, Result};
use geoproc_core::models::OperationType;
use geoproc_geo::spatial::bounding_boxes_intersect;
use geoproc_geo::{FeatureRow, FeatureTable};
use tracing::{debug, info, warn};

const SUFFIXES: (&str, &str) = ("_1", "_2");

/// Set operation applied between overlay layers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayHow {
    Intersection,
    Union,
    Difference,
    SymmetricDifference,
}

impl OverlayHow {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "intersection" | "intersect" => Some(OverlayHow::Intersection),
            "union" => Some(OverlayHow::Union),
            "difference" | "erase" => Some(OverlayHow::Difference),
            "symmetric_difference" | "sym_diff" | "xor" => Some(OverlayHow::SymmetricDifference),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayHow::Intersection => "intersection",
            OverlayHow::Union => "union",
            OverlayHow::Difference => "difference",
            OverlayHow::SymmetricDifference => "symmetric_difference",
        }
    }
}

/// Polygonal row of an overlay operand
struct Piece {
    shape: MultiPolygon,
    properties: JsonObject,
}

impl OperationLibrary {
    /// Fold polygon layers left to right with a set operation
    pub fn overlay(&self, layers: &[GeoJson], params: &Params) -> Result<Vec<FeatureCollection>> {
        if layers.len() < 2 {
            warn!(layers = layers.len(), "Overlay needs at least two layers, returning input");
            return passthrough(layers);
        }
        let how = match params.get_str("how") {
            Some(s) => OverlayHow::parse(s).ok_or_else(|| {
                GeoprocError::invalid_parameter(
                    "how",
                    format!("'{}' is not one of union, intersection, difference, symmetric_difference", s),
                )
            })?,
            None => OverlayHow::Intersection,
        };
        let options = self.options(params)?;
        let (working, selection) = self.prepare(&tables(layers)?, OperationType::Overlay, &options)?;
        let crs = working.first().and_then(|t| t.crs.clone());
        info!(how = how.as_str(), crs = %selection.crs, "Overlaying layers");

        let mut operands = working.iter().map(pieces);
        let mut acc = operands.next().unwrap_or_default();
        for (step, right) in operands.enumerate() {
            acc = overlay_pair(&acc, &right, how);
            debug!(step = step + 1, features = acc.len(), "Overlay step");
            if acc.is_empty() {
                break;
            }
        }

        let rows = acc
            .into_iter()
            .filter_map(|p| {
                single_or_multi(p.shape).map(|g| FeatureRow::new(Some(g), p.properties))
            })
            .collect();
        let result = FeatureTable::new(rows, crs);
        let metadata = CrsMetadata::from_selection(&selection);
        Ok(vec![self.finish(&result, &options, Some(metadata))?])
    }
}

fn pieces(table: &FeatureTable) -> Vec<Piece> {
    let mut out = Vec::with_capacity(table.len());
    for (index, row) in table.rows.iter().enumerate() {
        match row.geometry.as_ref().and_then(polygonal) {
            Some(shape) => out.push(Piece { shape, properties: row.properties.clone() }),
            None => warn!(feature = index, "Skipping non-polygonal feature in overlay"),
        }
    }
    out
}

fn overlay_pair(left: &[Piece], right: &[Piece], how: OverlayHow) -> Vec<Piece> {
    let mut out = Vec::new();
    let shared =
        shared_columns(left.iter().map(|p| &p.properties), right.iter().map(|p| &p.properties));
    if matches!(how, OverlayHow::Intersection | OverlayHow::Union) {
        for l in left {
            for r in right {
                if !shapes_touch(&l.shape, &r.shape) {
                    continue;
                }
                let shape = l.shape.intersection(&r.shape);
                if !shape.0.is_empty() {
                    let properties =
                        join_properties(&l.properties, Some(&r.properties), &shared, SUFFIXES);
                    out.push(Piece { shape, properties });
                }
            }
        }
    }
    if how != OverlayHow::Intersection {
        out.extend(remainders(left, right));
    }
    if matches!(how, OverlayHow::Union | OverlayHow::SymmetricDifference) {
        out.extend(remainders(right, left));
    }
    out
}

/// Parts of each `from` piece not covered by any `by` piece
fn remainders(from: &[Piece], by: &[Piece]) -> Vec<Piece> {
    from.iter()
        .filter_map(|piece| {
            let touching = by.iter().filter(|b| shapes_touch(&piece.shape, &b.shape));
            let cover = union_all(touching.map(|b| b.shape.clone()));
            let shape = if cover.0.is_empty() {
                piece.shape.clone()
            } else {
                piece.shape.difference(&cover)
            };
            (!shape.0.is_empty()).then(|| Piece { shape, properties: piece.properties.clone() })
        })
        .collect()
}

fn shapes_touch(a: &MultiPolygon, b: &MultiPolygon) -> bool {
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(ra), Some(rb)) => bounding_boxes_intersect(&ra, &rb),
        _ => false,
    }
}
