use crate::geometry::{join_properties, key_string, shared_columns};
use crate::library::{passthrough, tables, OperationLibrary};
use crate::metadata::CrsMetadata;
use crate::operations::sjoin::JoinHow;
use crate::params::Params;
use geojson::{FeatureCollection, GeoJson};
use geoproc_core::error::{GeoprocError, Result};
use geoproc_core::models::OperationType;
use geoproc_geo::{CrsSelection, FeatureRow, FeatureTable};
use std::collections::HashMap;
use tracing::{info, warn};

const SUFFIXES: (&str, &str) = ("_x", "_y");

impl OperationLibrary {
    /// Attribute join of two layers, or concatenation of all layers without a key.
    ///
    /// A keyed merge keeps the geometry of the first layer.
    pub fn merge(&self, layers: &[GeoJson], params: &Params) -> Result<Vec<FeatureCollection>> {
        if layers.len() < 2 {
            warn!(layers = layers.len(), "Merge needs at least two layers, returning input");
            return passthrough(layers);
        }
        let options = self.options(params)?;
        let on = (params.get_str("on"), params.get_str("left_on"), params.get_str("right_on"));
        let keys = match on {
            (Some(on), _, _) => Some((on.to_string(), on.to_string())),
            (None, Some(left), Some(right)) => Some((left.to_string(), right.to_string())),
            (None, None, None) => None,
            _ => {
                return Err(GeoprocError::invalid_parameter(
                    "left_on",
                    "left_on and right_on must be given together",
                ))
            }
        };
        let how = JoinHow::from_params(params)?;
        let inputs = tables(layers)?;

        let result = match keys {
            Some((left_on, right_on)) => {
                if inputs.len() > 2 {
                    warn!(layers = inputs.len(), "Attribute merge uses the first two layers only");
                }
                let result = attribute_join(&inputs[0], &inputs[1], &left_on, &right_on, how);
                info!(left_on, right_on, features = result.len(), "Merged attributes");
                result
            }
            None => {
                let result = FeatureTable::concat(&inputs);
                info!(layers = inputs.len(), features = result.len(), "Concatenated layers");
                result
            }
        };

        // attribute merges never touch geometry, so no working CRS is chosen
        let selection = CrsSelection {
            crs: result.crs_or_default(),
            auto_selected: false,
            selection_reason: format!("{} keeps input geometries", OperationType::Merge),
            decision: None,
        };
        let metadata = CrsMetadata::from_selection(&selection);
        Ok(vec![self.finish(&result, &options, Some(metadata))?])
    }
}

fn attribute_join(
    left: &FeatureTable,
    right: &FeatureTable,
    left_on: &str,
    right_on: &str,
    how: JoinHow,
) -> FeatureTable {
    let mut lookup: HashMap<String, Vec<&FeatureRow>> = HashMap::new();
    for row in &right.rows {
        if let Some(key) = row.properties.get(right_on).and_then(key_string) {
            lookup.entry(key).or_default().push(row);
        }
    }

    // the key column is shared by value, not duplicated
    let mut shared = shared_columns(
        left.rows.iter().map(|r| &r.properties),
        right.rows.iter().map(|r| &r.properties),
    );
    if left_on == right_on {
        shared.remove(left_on);
    }

    let mut rows = Vec::new();
    for row in &left.rows {
        let matches = row
            .properties
            .get(left_on)
            .and_then(key_string)
            .and_then(|key| lookup.get(&key));
        match matches {
            Some(matches) => {
                for right_row in matches {
                    let right = Some(&right_row.properties);
                    let mut properties = join_properties(&row.properties, right, &shared, SUFFIXES);
                    if let Some(key) = row.properties.get(left_on).filter(|_| left_on == right_on) {
                        properties.insert(left_on.to_string(), key.clone());
                    }
                    rows.push(FeatureRow { properties, ..row.clone() });
                }
            }
            None if how == JoinHow::Left => {
                let properties = join_properties(&row.properties, None, &shared, SUFFIXES);
                rows.push(FeatureRow { properties, ..row.clone() });
            }
            None => {}
        }
    }
    FeatureTable::new(rows, left.crs.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn layer(features: Value) -> GeoJson {
        GeoJson::from_json_value(json!({"type": "FeatureCollection", "features": features})).unwrap()
    }

    fn parcels() -> GeoJson {
        layer(json!([
            {"type": "Feature", "properties": {"parcel": 1, "name": "north"}, "geometry": {"type": "Point", "coordinates": [0.0, 1.0]}},
            {"type": "Feature", "properties": {"parcel": 2, "name": "south"}, "geometry": {"type": "Point", "coordinates": [0.0, -1.0]}}
        ]))
    }

    fn owners() -> GeoJson {
        layer(json!([
            {"type": "Feature", "properties": {"parcel": "1", "name": "Ada"}, "geometry": null}
        ]))
    }

    fn params(value: Value) -> Params {
        Params::from_value(value).unwrap()
    }

    #[test]
    fn test_inner_join_on_key() {
        let lib = OperationLibrary::default();
        let out = lib.merge(&[parcels(), owners()], &params(json!({"on": "parcel"}))).unwrap();
        assert_eq!(out[0].features.len(), 1);
        let props = out[0].features[0].properties.as_ref().unwrap();
        assert_eq!(props["name_x"], "north");
        assert_eq!(props["name_y"], "Ada");
        assert_eq!(props["parcel"], 1);
        assert!(out[0].features[0].geometry.is_some());
    }

    #[test]
    fn test_left_join_keeps_unmatched() {
        let lib = OperationLibrary::default();
        let out = lib
            .merge(&[parcels(), owners()], &params(json!({"on": "parcel", "how": "left"})))
            .unwrap();
        assert_eq!(out[0].features.len(), 2);
        assert_eq!(out[0].features[1].properties.as_ref().unwrap()["name_x"], "south");
    }

    #[test]
    fn test_without_key_concatenates() {
        let lib = OperationLibrary::default();
        let out = lib.merge(&[parcels(), parcels()], &Params::default()).unwrap();
        assert_eq!(out[0].features.len(), 4);
    }

    #[test]
    fn test_half_key_rejected() {
        let lib = OperationLibrary::default();
        let err =
            lib.merge(&[parcels(), owners()], &params(json!({"left_on": "parcel"}))).unwrap_err();
        assert!(matches!(err, GeoprocError::InvalidParameter { .. }));
    }
}
