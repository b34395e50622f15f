use crate::geometry::{polygonal, single_or_multi, union_all};
use crate::library::{passthrough, tables, OperationLibrary};
use crate::metadata::CrsMetadata;
use crate::params::Params;
use geo::{BooleanOps, Geometry, Intersects, MultiLineString, MultiPolygon};
use geojson::{FeatureCollection, GeoJson};
use geoproc_core::error::Result;
use geoproc_core::models::OperationType;
use geoproc_geo::FeatureTable;
use tracing::{info, warn};

impl OperationLibrary {
    /// Clip the first layer by the union of the second
    pub fn clip(&self, layers: &[GeoJson], params: &Params) -> Result<Vec<FeatureCollection>> {
        if layers.len() < 2 {
            warn!(layers = layers.len(), "Clip needs a target and a mask layer, returning input");
            return passthrough(layers);
        }
        if layers.len() > 2 {
            warn!(layers = layers.len(), "Clip uses the first two layers only");
        }
        let options = self.options(params)?;
        let (mut working, selection) =
            self.prepare(&tables(&layers[..2])?, OperationType::Clip, &options)?;
        let mask_table = working.pop().unwrap_or_default();
        let target = working.pop().unwrap_or_default();

        let mask = union_all(
            mask_table.rows.iter().filter_map(|r| r.geometry.as_ref().and_then(polygonal)),
        );
        let metadata = CrsMetadata::from_selection(&selection);
        if mask.0.is_empty() {
            info!("Clip mask is empty");
            let empty = FeatureTable::new(Vec::new(), target.crs.clone());
            return Ok(vec![self.finish(&empty, &options, Some(metadata))?]);
        }

        let clipped = target.map_geometries(|g| Ok(clip_geometry(g, &mask)))?;
        let rows = clipped.rows.into_iter().filter(|r| r.geometry.is_some()).collect();
        let result = FeatureTable::new(rows, clipped.crs);
        info!(features = result.len(), "Clipped layer");
        Ok(vec![self.finish(&result, &options, Some(metadata))?])
    }
}

/// Part of `geometry` inside `mask`, `None` when nothing is left
fn clip_geometry(geometry: &Geometry, mask: &MultiPolygon) -> Option<Geometry> {
    if let Some(shape) = polygonal(geometry) {
        return single_or_multi(shape.intersection(mask));
    }
    match geometry {
        Geometry::LineString(ls) => lines(mask.clip(&MultiLineString(vec![ls.clone()]), false)),
        Geometry::Line(l) => lines(mask.clip(&MultiLineString(vec![(*l).into()]), false)),
        Geometry::MultiLineString(mls) => lines(mask.clip(mls, false)),
        Geometry::Point(p) => mask.intersects(p).then(|| geometry.clone()),
        Geometry::MultiPoint(mp) => {
            let inside: Vec<_> = mp.0.iter().filter(|p| mask.intersects(*p)).copied().collect();
            match inside.len() {
                0 => None,
                1 => Some(Geometry::Point(inside[0])),
                _ => Some(Geometry::MultiPoint(inside.into())),
            }
        }
        Geometry::GeometryCollection(gc) => {
            let parts: Vec<Geometry> = gc.0.iter().filter_map(|g| clip_geometry(g, mask)).collect();
            (!parts.is_empty()).then(|| Geometry::GeometryCollection(parts.into()))
        }
        _ => None,
    }
}

fn lines(mut clipped: MultiLineString) -> Option<Geometry> {
    clipped.0.retain(|ls| ls.0.len() >= 2);
    match clipped.0.len() {
        0 => None,
        1 => clipped.0.pop().map(Geometry::LineString),
        _ => Some(Geometry::MultiLineString(clipped)),
    }
}
