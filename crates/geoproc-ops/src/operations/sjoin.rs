use crate::geometry::{join_properties, shared_columns};
use crate::index::SpatialIndex;
use crate::library::{passthrough, tables, OperationLibrary};
use crate::metadata::CrsMetadata;
use crate::params::{CommonOptions, Params};
use geojson::{FeatureCollection, GeoJson, JsonObject};
use geoproc_core::error::{GeoprocError, Result};
use geoproc_core::models::OperationType;
use geoproc_geo::spatial::SpatialPredicate;
use geoproc_geo::{CrsSelection, FeatureRow, FeatureTable};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

const SUFFIXES: (&str, &str) = ("_left", "_right");
const INDEX_RIGHT: &str = "index_right";

/// Which left rows survive a join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinHow {
    #[default]
    Inner,
    Left,
}

impl JoinHow {
    pub(crate) fn from_params(params: &Params) -> Result<Self> {
        match params.get_str("how").map(str::to_lowercase).as_deref() {
            None | Some("inner") => Ok(JoinHow::Inner),
            Some("left") => Ok(JoinHow::Left),
            Some(other) => Err(GeoprocError::invalid_parameter(
                "how",
                format!("'{}' is not one of inner, left", other),
            )),
        }
    }
}

impl OperationLibrary {
    /// Attach attributes of right features related to each left feature by a predicate
    pub fn sjoin(&self, layers: &[GeoJson], params: &Params) -> Result<Vec<FeatureCollection>> {
        let Some((left, right, selection, options)) =
            self.join_inputs(layers, params, OperationType::Sjoin)?
        else {
            return passthrough(layers);
        };
        let predicate = match params.first_str(&["predicate", "op"]) {
            Some(s) => SpatialPredicate::parse(s).ok_or_else(|| {
                GeoprocError::invalid_parameter(
                    "predicate",
                    format!("'{}' is not one of intersects, contains, within", s),
                )
            })?,
            None => SpatialPredicate::Intersects,
        };
        let how = JoinHow::from_params(params)?;

        let (index, shared) = join_index(&left, &right);
        let mut rows = Vec::new();
        for row in &left.rows {
            let matches: Vec<usize> = match &row.geometry {
                Some(g) => index
                    .candidates(g)
                    .into_iter()
                    .filter(|&id| index.geometry(id).is_some_and(|r| predicate.evaluate(g, r)))
                    .collect(),
                None => Vec::new(),
            };
            let matches = matches.into_iter().map(|id| (id, None));
            push_matches(&mut rows, &shared, row, &right, matches, how, None);
        }

        info!(predicate = predicate.as_str(), matches = rows.len(), "Spatial join");
        let result = FeatureTable::new(rows, left.crs.clone());
        let metadata = CrsMetadata::from_selection(&selection);
        Ok(vec![self.finish(&result, &options, Some(metadata))?])
    }

    /// Attach attributes of the nearest right feature to each left feature
    pub fn sjoin_nearest(&self, layers: &[GeoJson], params: &Params) -> Result<Vec<FeatureCollection>> {
        let Some((left, right, selection, options)) =
            self.join_inputs(layers, params, OperationType::SjoinNearest)?
        else {
            return passthrough(layers);
        };
        let max_distance = params.get_f64("max_distance")?;
        if max_distance.is_some_and(|d| !d.is_finite() || d < 0.0) {
            return Err(GeoprocError::invalid_parameter(
                "max_distance",
                "must be a non-negative number",
            ));
        }
        let distance_col = params.get_str("distance_col");
        let how = JoinHow::from_params(params)?;

        let (index, shared) = join_index(&left, &right);
        let mut rows = Vec::new();
        for row in &left.rows {
            let matches = match &row.geometry {
                Some(g) => index.nearest(g, max_distance),
                None => Vec::new(),
            };
            push_matches(
                &mut rows,
                &shared,
                row,
                &right,
                matches.into_iter().map(|(id, d)| (id, Some(d))),
                how,
                distance_col,
            );
        }

        info!(matches = rows.len(), max_distance = ?max_distance, "Nearest join");
        let result = FeatureTable::new(rows, left.crs.clone());
        let metadata = CrsMetadata::from_selection(&selection);
        Ok(vec![self.finish(&result, &options, Some(metadata))?])
    }

    fn join_inputs(
        &self,
        layers: &[GeoJson],
        params: &Params,
        operation: OperationType,
    ) -> Result<Option<(FeatureTable, FeatureTable, CrsSelection, CommonOptions)>> {
        if layers.len() < 2 {
            warn!(operation = %operation, layers = layers.len(), "Join needs two layers, returning input");
            return Ok(None);
        }
        if layers.len() > 2 {
            warn!(operation = %operation, layers = layers.len(), "Join uses the first two layers only");
        }
        let options = self.options(params)?;
        let (mut working, selection) = self.prepare(&tables(&layers[..2])?, operation, &options)?;
        let right = working.pop().unwrap_or_default();
        let left = working.pop().unwrap_or_default();
        Ok(Some((left, right, selection, options)))
    }
}

fn join_index<'a>(
    left: &FeatureTable,
    right: &'a FeatureTable,
) -> (SpatialIndex<'a>, HashSet<String>) {
    let index = SpatialIndex::from_geometries(right.rows.iter().map(|r| r.geometry.as_ref()).collect());
    let shared = shared_columns(
        left.rows.iter().map(|r| &r.properties),
        right.rows.iter().map(|r| &r.properties),
    );
    (index, shared)
}

fn push_matches(
    rows: &mut Vec<FeatureRow>,
    shared: &HashSet<String>,
    left: &FeatureRow,
    right: &FeatureTable,
    matches: impl Iterator<Item = (usize, Option<f64>)>,
    how: JoinHow,
    distance_col: Option<&str>,
) {
    let mut matched = false;
    for (id, distance) in matches {
        let Some(right_row) = right.rows.get(id) else {
            continue;
        };
        matched = true;
        let mut properties =
            join_properties(&left.properties, Some(&right_row.properties), shared, SUFFIXES);
        properties.insert(INDEX_RIGHT.to_string(), Value::from(id));
        if let (Some(col), Some(d)) = (distance_col, distance) {
            properties.insert(col.to_string(), Value::from(d));
        }
        rows.push(FeatureRow::new(left.geometry.clone(), properties));
    }
    if !matched && how == JoinHow::Left {
        let mut properties: JsonObject = join_properties(&left.properties, None, shared, SUFFIXES);
        properties.insert(INDEX_RIGHT.to_string(), Value::Null);
        if let Some(col) = distance_col {
            properties.insert(col.to_string(), Value::Null);
        }
        rows.push(FeatureRow::new(left.geometry.clone(), properties));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn points(coords: &[(f64, f64, &str)]) -> GeoJson {
        let features: Vec<_> = coords
            .iter()
            .map(|(x, y, name)| json!({"type": "Feature", "properties": {"name": name}, "geometry": {"type": "Point", "coordinates": [x, y]}}))
            .collect();
        GeoJson::from_json_value(json!({"type": "FeatureCollection", "features": features})).unwrap()
    }

    fn zones() -> GeoJson {
        GeoJson::from_json_value(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"name": "zone a", "zone": "A"},
                "geometry": {"type": "Polygon", "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]}
            }]
        }))
        .unwrap()
    }

    fn params(value: Value) -> Params {
        Params::from_value(value).unwrap()
    }

    #[test]
    fn test_inner_within_join() {
        let lib = OperationLibrary::default();
        let layers = [points(&[(0.5, 0.5, "in"), (3.0, 3.0, "out")]), zones()];
        let out = lib.sjoin(&layers, &params(json!({"predicate": "within"}))).unwrap();
        let features = &out[0].features;
        assert_eq!(features.len(), 1);
        let props = features[0].properties.as_ref().unwrap();
        assert_eq!(props["name_left"], "in");
        assert_eq!(props["name_right"], "zone a");
        assert_eq!(props["zone"], "A");
        assert_eq!(props["index_right"], 0);
    }

    #[test]
    fn test_left_join_keeps_unmatched() {
        let lib = OperationLibrary::default();
        let layers = [points(&[(0.5, 0.5, "in"), (3.0, 3.0, "out")]), zones()];
        let out = lib.sjoin(&layers, &params(json!({"how": "left"}))).unwrap();
        assert_eq!(out[0].features.len(), 2);
        let unmatched = out[0].features[1].properties.as_ref().unwrap();
        assert_eq!(unmatched["name_left"], "out");
        assert!(unmatched["index_right"].is_null());
    }

    #[test]
    fn test_single_layer_passthrough() {
        let lib = OperationLibrary::default();
        let out = lib.sjoin(&[zones()], &Params::default()).unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_nearest_with_distance_column() {
        let lib = OperationLibrary::default();
        let layers = [
            points(&[(10.0, 50.0, "origin")]),
            points(&[(10.01, 50.0, "near"), (10.1, 50.0, "far")]),
        ];
        let out = lib
            .sjoin_nearest(&layers, &params(json!({"distance_col": "dist_m"})))
            .unwrap();
        let props = out[0].features[0].properties.as_ref().unwrap();
        assert_eq!(props["name_right"], "near");
        let d = props["dist_m"].as_f64().unwrap();
        assert!((d - 716.0).abs() < 15.0, "distance {}", d);
    }

    #[test]
    fn test_nearest_max_distance_filters() {
        let lib = OperationLibrary::default();
        let layers = [points(&[(10.0, 50.0, "origin")]), points(&[(10.1, 50.0, "far")])];
        let out = lib.sjoin_nearest(&layers, &params(json!({"max_distance": 1000}))).unwrap();
        assert!(out[0].features.is_empty());
    }
}
