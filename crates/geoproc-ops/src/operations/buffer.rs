use crate::geometry::combine;
use crate::library::OperationLibrary;
use crate::metadata::CrsMetadata;
use crate::params::Params;
use geojson::{FeatureCollection, GeoJson};
use geoproc_core::config::parse_distance_unit;
use geoproc_core::error::{GeoprocError, Result};
use geoproc_core::models::{Crs, DistanceUnit, OperationType};
use geoproc_geo::buffer::{buffered_extent, geodesic_buffer, planar_buffer};
use geoproc_geo::decider::metrics_for;
use geoproc_geo::{choose_buffer_method, BufferMethod, CrsSelection, FeatureRow, FeatureTable};
use tracing::{info, warn};

impl OperationLibrary {
    /// Buffer the features of exactly one layer by `radius`.
    ///
    /// Small local extents are buffered planarly in the working CRS picked by the
    /// decider; everything else is buffered geodesically on WGS 84.
    pub fn buffer(&self, layers: &[GeoJson], params: &Params) -> Result<Vec<FeatureCollection>> {
        let layer = match layers {
            [] => return Ok(Vec::new()),
            [layer] => layer,
            _ => {
                return Err(GeoprocError::InvalidArity {
                    operation: OperationType::Buffer.name().to_string(),
                    count: layers.len(),
                    reason: "only one layer can be buffered at a time".to_string(),
                })
            }
        };

        let radius = params
            .get_f64("radius")?
            .ok_or_else(|| GeoprocError::invalid_parameter("radius", "a buffer radius is required"))?;
        if !radius.is_finite() {
            return Err(GeoprocError::invalid_parameter("radius", "must be a finite number"));
        }
        let unit = self.buffer_unit(params);
        let radius_m = unit.to_meters(radius);
        let dissolve = params.get_bool("dissolve")?.unwrap_or(false);
        let options = self.options(params)?;

        let table = FeatureTable::from_geojson(layer)?;
        if !table.has_geometries() {
            return Ok(vec![self.finish(&table, &options, None)?]);
        }

        let override_crs = options.crs.override_crs.as_deref().map(Crs::parse).transpose()?;
        let (method, reason) = if let Some(crs) = &override_crs {
            if crs.is_geographic() {
                // a planar radius would be read as degrees
                (BufferMethod::Geodesic, format!("Manual CRS override {} is geographic", crs))
            } else {
                (BufferMethod::Planar, "Manual CRS override".to_string())
            }
        } else if !options.crs.auto_optimize_crs {
            (BufferMethod::Geodesic, "Automatic CRS optimization disabled".to_string())
        } else {
            let extent = table.wrapped_bounds().map(|b| buffered_extent(&b, radius_m));
            match extent.and_then(|b| metrics_for(self.thresholds(), &b)) {
                Some(metrics) => choose_buffer_method(radius_m, &metrics, self.thresholds()),
                None => (BufferMethod::Geodesic, "Extent could not be measured".to_string()),
            }
        };
        info!(radius_m, method = method.as_str(), reason = %reason, "Buffer method chosen");

        let (buffered, selection) = match method {
            BufferMethod::Planar => {
                let (mut prepared, selection) =
                    self.prepare(std::slice::from_ref(&table), OperationType::Buffer, &options)?;
                let working = prepared.pop().unwrap_or_default();
                let buffered = working.map_geometries(|g| Ok(planar_buffer(g, radius_m)))?;
                (buffered, selection)
            }
            BufferMethod::Geodesic => {
                let wgs84 = Crs::wgs84();
                let working = table.to_crs(&wgs84)?;
                let buffered = working.map_geometries(|g| geodesic_buffer(g, radius_m))?;
                let selection = CrsSelection {
                    crs: wgs84,
                    auto_selected: override_crs.is_none() && options.crs.auto_optimize_crs,
                    selection_reason: format!("Geodesic buffer on the ellipsoid: {}", reason),
                    decision: None,
                };
                (buffered, selection)
            }
        };

        let result = if dissolve { dissolve_buffers(buffered) } else { buffered };
        let metadata = CrsMetadata::from_selection(&selection).with_buffer_method(method, reason);
        Ok(vec![self.finish(&result, &options, Some(metadata))?])
    }

    fn buffer_unit(&self, params: &Params) -> DistanceUnit {
        match params.first_str(&["radius_unit", "unit", "units"]) {
            Some(name) => parse_distance_unit(name).unwrap_or_else(|_| {
                warn!(unit = name, "Unknown radius unit, using meters");
                DistanceUnit::Meters
            }),
            None => self.radius_unit(),
        }
    }
}

/// Merge every buffer into one feature carrying the first row's attributes
fn dissolve_buffers(table: FeatureTable) -> FeatureTable {
    let Some(first) = table.rows.first() else {
        return table;
    };
    let geometries = table.rows.iter().filter_map(|r| r.geometry.clone()).collect();
    let row = FeatureRow::new(combine(geometries), first.properties.clone());
    FeatureTable::new(vec![row], table.crs.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{BoundingRect, Geometry};
    use serde_json::json;

    fn points(coords: &[(f64, f64)]) -> GeoJson {
        let features: Vec<_> = coords
            .iter()
            .map(|(x, y)| json!({"type": "Feature", "properties": {"name": "p"}, "geometry": {"type": "Point", "coordinates": [x, y]}}))
            .collect();
        GeoJson::from_json_value(json!({"type": "FeatureCollection", "features": features})).unwrap()
    }

    fn params(value: serde_json::Value) -> Params {
        Params::from_value(value).unwrap()
    }

    fn first_geometry(fc: &FeatureCollection) -> Geometry {
        let g = fc.features[0].geometry.as_ref().unwrap();
        Geometry::<f64>::try_from(&g.value).unwrap()
    }

    #[test]
    fn test_no_layers_no_output() {
        let lib = OperationLibrary::default();
        assert!(lib.buffer(&[], &params(json!({"radius": 10}))).unwrap().is_empty());
    }

    #[test]
    fn test_two_layers_rejected() {
        let lib = OperationLibrary::default();
        let layer = points(&[(0.0, 0.0)]);
        let err = lib.buffer(&[layer.clone(), layer], &params(json!({"radius": 10}))).unwrap_err();
        assert!(matches!(err, GeoprocError::InvalidArity { count: 2, .. }));
    }

    #[test]
    fn test_radius_required() {
        let lib = OperationLibrary::default();
        let err = lib.buffer(&[points(&[(0.0, 0.0)])], &Params::default()).unwrap_err();
        assert!(matches!(err, GeoprocError::InvalidParameter { .. }));
    }

    #[test]
    fn test_point_buffer_is_polygon() {
        let lib = OperationLibrary::default();
        let out = lib.buffer(&[points(&[(14.4, 50.1)])], &params(json!({"radius": 500}))).unwrap();
        assert_eq!(out.len(), 1);
        assert!(matches!(first_geometry(&out[0]), Geometry::Polygon(_)));
        assert_eq!(out[0].features[0].properties.as_ref().unwrap()["name"], "p");
    }

    #[test]
    fn test_kilometer_radius_geodesic_when_auto_off() {
        let lib = OperationLibrary::default();
        let out = lib
            .buffer(
                &[points(&[(0.0, 0.0)])],
                &params(json!({"radius": 100, "radius_unit": "km", "auto_optimize_crs": false})),
            )
            .unwrap();
        let rect = first_geometry(&out[0]).bounding_rect().unwrap();
        let width = rect.max().x - rect.min().x;
        assert!((1.5..=2.1).contains(&width), "width {}", width);
    }

    #[test]
    fn test_geographic_override_buffers_in_meters() {
        let lib = OperationLibrary::default();
        let out = lib
            .buffer(
                &[points(&[(14.4, 50.1)])],
                &params(json!({
                    "radius": 500,
                    "override_crs": "EPSG:4326",
                    "auto_optimize_crs": false,
                    "projection_metadata": true
                })),
            )
            .unwrap();
        let rect = first_geometry(&out[0]).bounding_rect().unwrap();
        let height = rect.max().y - rect.min().y;
        // 1 km of latitude is about 0.009°
        assert!((0.0085..=0.0095).contains(&height), "height {}", height);

        let metadata = crate::metadata::crs_metadata(&out[0]).unwrap();
        assert_eq!(metadata["buffer_method"], "geodesic");
        assert_eq!(metadata["auto_selected"], false);
    }

    #[test]
    fn test_projected_override_stays_planar() {
        let lib = OperationLibrary::default();
        let out = lib
            .buffer(
                &[points(&[(14.4, 50.1)])],
                &params(json!({
                    "radius": 500,
                    "override_crs": "EPSG:32633",
                    "projection_metadata": true
                })),
            )
            .unwrap();
        let metadata = crate::metadata::crs_metadata(&out[0]).unwrap();
        assert_eq!(metadata["buffer_method"], "planar");
        assert_eq!(metadata["epsg_code"], 32633);
    }

    #[test]
    fn test_dissolve_merges_overlapping_buffers() {
        let lib = OperationLibrary::default();
        let out = lib
            .buffer(
                &[points(&[(14.40, 50.10), (14.401, 50.10)])],
                &params(json!({"radius": 200, "dissolve": true})),
            )
            .unwrap();
        assert_eq!(out[0].features.len(), 1);
        assert!(matches!(first_geometry(&out[0]), Geometry::Polygon(_)));
    }

    #[test]
    fn test_metadata_records_method() {
        let lib = OperationLibrary::default();
        let out = lib
            .buffer(
                &[points(&[(14.4, 50.1)])],
                &params(json!({"radius": 500, "projection_metadata": true})),
            )
            .unwrap();
        let metadata = crate::metadata::crs_metadata(&out[0]).unwrap();
        assert_eq!(metadata["buffer_method"], "planar");
        assert_eq!(metadata["epsg_code"], 32633);
    }
}
