use crate::library::{tables, OperationLibrary};
use crate::metadata::CrsMetadata;
use crate::params::Params;
use geo::{Centroid, Geometry};
use geojson::{FeatureCollection, GeoJson};
use geoproc_core::error::Result;
use geoproc_core::models::OperationType;
use geoproc_geo::FeatureTable;
use tracing::info;

impl OperationLibrary {
    /// Replace every geometry by its centroid, computed in the working CRS
    pub fn centroid(&self, layers: &[GeoJson], params: &Params) -> Result<Vec<FeatureCollection>> {
        if layers.is_empty() {
            return Ok(Vec::new());
        }
        let options = self.options(params)?;
        let input = FeatureTable::concat(&tables(layers)?);
        let (mut working, selection) =
            self.prepare(std::slice::from_ref(&input), OperationType::Centroid, &options)?;
        let working = working.pop().unwrap_or_default();

        let centroids = working.map_geometries(|g| Ok(g.centroid().map(Geometry::Point)))?;
        info!(features = centroids.len(), crs = %selection.crs, "Computed centroids");
        let metadata = CrsMetadata::from_selection(&selection);
        Ok(vec![self.finish(&centroids, &options, Some(metadata))?])
    }
}
