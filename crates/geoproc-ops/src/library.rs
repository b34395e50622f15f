//! The operation library service object and dispatch

use crate::metadata::{attach_crs_metadata, CrsMetadata};
use crate::params::{CommonOptions, Params};
use geojson::{FeatureCollection, GeoJson};
use geoproc_core::config::{DecisionThresholds, LayeredConfig};
use geoproc_core::error::Result;
use geoproc_core::models::{Crs, DistanceUnit, OperationType};
use geoproc_geo::{prepare_tables_for_operation, CrsSelection, FeatureTable, ProjectionDecider};
use tracing::info;

/// Geoprocessing operations over GeoJSON layers.
///
/// Every operation takes its layers as GeoJSON, works in a CRS chosen for it and
/// returns zero or one feature collection in WGS 84.
#[derive(Debug, Clone)]
pub struct OperationLibrary {
    decider: ProjectionDecider,
    auto_optimize_crs: bool,
    projection_metadata: bool,
    radius_unit: DistanceUnit,
}

impl Default for OperationLibrary {
    fn default() -> Self {
        Self::new(DecisionThresholds::default())
    }
}

impl OperationLibrary {
    pub fn new(thresholds: DecisionThresholds) -> Self {
        Self {
            decider: ProjectionDecider::new(thresholds),
            auto_optimize_crs: true,
            projection_metadata: false,
            radius_unit: DistanceUnit::Meters,
        }
    }

    /// Library using the thresholds and operation defaults of a configuration
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            decider: ProjectionDecider::new(config.thresholds()),
            auto_optimize_crs: config.auto_optimize_crs.value,
            projection_metadata: config.projection_metadata.value,
            radius_unit: config.radius_unit.value,
        }
    }

    pub fn decider(&self) -> &ProjectionDecider {
        &self.decider
    }

    pub fn thresholds(&self) -> &DecisionThresholds {
        self.decider.thresholds()
    }

    /// Run `operation` on `layers`
    pub fn execute(
        &self,
        operation: OperationType,
        layers: &[GeoJson],
        params: &Params,
    ) -> Result<Vec<FeatureCollection>> {
        info!(operation = %operation, layers = layers.len(), "Executing operation");
        match operation {
            OperationType::Buffer => self.buffer(layers, params),
            OperationType::Overlay => self.overlay(layers, params),
            OperationType::Clip => self.clip(layers, params),
            OperationType::Dissolve => self.dissolve(layers, params),
            OperationType::Simplify => self.simplify(layers, params),
            OperationType::Sjoin => self.sjoin(layers, params),
            OperationType::SjoinNearest => self.sjoin_nearest(layers, params),
            OperationType::Area => self.area(layers, params),
            OperationType::Centroid => self.centroid(layers, params),
            OperationType::Merge => self.merge(layers, params),
        }
    }

    /// Unit of `radius` when a buffer step names none
    pub fn radius_unit(&self) -> DistanceUnit {
        self.radius_unit
    }

    pub(crate) fn options(&self, params: &Params) -> Result<CommonOptions> {
        CommonOptions::from_params(params, self.auto_optimize_crs, self.projection_metadata)
    }

    pub(crate) fn prepare(
        &self,
        tables: &[FeatureTable],
        operation: OperationType,
        options: &CommonOptions,
    ) -> Result<(Vec<FeatureTable>, CrsSelection)> {
        prepare_tables_for_operation(tables, operation, &options.crs, &self.decider)
    }

    /// Reproject a result to WGS 84 and annotate it when asked to
    pub(crate) fn finish(
        &self,
        table: &FeatureTable,
        options: &CommonOptions,
        metadata: Option<CrsMetadata>,
    ) -> Result<FeatureCollection> {
        let wgs84 = Crs::wgs84();
        let mut fc = if table.crs_or_default().same_as(&wgs84) {
            table.to_feature_collection()
        } else {
            table.to_crs(&wgs84)?.to_feature_collection()
        };
        if options.projection_metadata {
            if let Some(metadata) = metadata {
                attach_crs_metadata(&mut fc, &metadata)?;
            }
        }
        Ok(fc)
    }
}

/// Parse every layer into a table
pub(crate) fn tables(layers: &[GeoJson]) -> Result<Vec<FeatureTable>> {
    layers.iter().map(FeatureTable::from_geojson).collect()
}

/// Layers returned as collections, for operations short of inputs
pub(crate) fn passthrough(layers: &[GeoJson]) -> Result<Vec<FeatureCollection>> {
    layers.iter().map(|l| Ok(FeatureTable::from_geojson(l)?.to_feature_collection())).collect()
}

pub(crate) fn empty_collection() -> FeatureCollection {
    FeatureCollection { bbox: None, features: Vec::new(), foreign_members: None }
}
