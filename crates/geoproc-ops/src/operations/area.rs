use crate::library::{tables, OperationLibrary};
use crate::metadata::CrsMetadata;
use crate::params::Params;
use geo::{Area, GeodesicArea, Geometry};
use geojson::{FeatureCollection, GeoJson};
use geoproc_core::error::Result;
use geoproc_core::models::{AreaUnit, Crs, OperationType};
use geoproc_geo::FeatureTable;
use serde_json::{Number, Value};
use tracing::{info, warn};

const DEFAULT_COLUMN: &str = "area";
const UNIT_COLUMN: &str = "area_unit";

impl OperationLibrary {
    /// Attach the area of every feature, measured in an equal-area CRS.
    ///
    /// Geometries come back unchanged; only the properties gain the measurement.
    pub fn area(&self, layers: &[GeoJson], params: &Params) -> Result<Vec<FeatureCollection>> {
        if layers.is_empty() {
            return Ok(Vec::new());
        }
        let unit = match params.first_str(&["unit", "area_unit", "units"]) {
            Some(name) => AreaUnit::parse(name).unwrap_or_else(|| {
                warn!(unit = name, "Unknown area unit, using square meters");
                AreaUnit::SquareMeters
            }),
            None => AreaUnit::SquareMeters,
        };
        let column = params.get_str("column").unwrap_or(DEFAULT_COLUMN).to_string();
        let options = self.options(params)?;

        let input = FeatureTable::concat(&tables(layers)?);
        let (mut working, selection) =
            self.prepare(std::slice::from_ref(&input), OperationType::Area, &options)?;
        let mut working = working.pop().unwrap_or_default();
        let working_crs = working.crs_or_default();
        // Web Mercator inflates areas with latitude; measure on the ellipsoid instead
        let geodesic = working_crs.is_geographic() || working_crs.is_web_mercator();
        if geodesic && !working_crs.is_geographic() {
            working = input.to_crs(&Crs::wgs84())?;
        }
        info!(crs = %selection.crs, geodesic, unit = unit.label(), "Measuring areas");

        let mut result = input.clone();
        for (row, measured) in result.rows.iter_mut().zip(&working.rows) {
            let square_meters = measured.geometry.as_ref().map(|g| {
                if geodesic {
                    geodesic_area(g)
                } else {
                    g.unsigned_area()
                }
            });
            let value = square_meters
                .and_then(|m2| Number::from_f64(unit.from_square_meters(m2)))
                .map(Value::Number)
                .unwrap_or(Value::Null);
            row.properties.insert(column.clone(), value);
            row.properties.insert(UNIT_COLUMN.to_string(), Value::from(unit.label()));
        }

        let metadata = CrsMetadata::from_selection(&selection);
        Ok(vec![self.finish(&result, &options, Some(metadata))?])
    }
}

fn geodesic_area(geometry: &Geometry) -> f64 {
    match geometry {
        Geometry::Polygon(p) => p.geodesic_area_unsigned(),
        Geometry::MultiPolygon(mp) => mp.geodesic_area_unsigned(),
        Geometry::Rect(r) => r.to_polygon().geodesic_area_unsigned(),
        Geometry::Triangle(t) => t.to_polygon().geodesic_area_unsigned(),
        Geometry::GeometryCollection(gc) => gc.0.iter().map(geodesic_area).sum(),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// A 0.01° square near the equator, about 1.237 km²
    fn square_layer() -> GeoJson {
        GeoJson::from_json_value(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"name": "lot"},
                "geometry": {"type": "Polygon", "coordinates": [[
                    [10.0, 0.0], [10.01, 0.0], [10.01, 0.01], [10.0, 0.01], [10.0, 0.0]
                ]]}
            }]
        }))
        .unwrap()
    }

    fn area_of(out: &[FeatureCollection], column: &str) -> f64 {
        out[0].features[0].properties.as_ref().unwrap()[column].as_f64().unwrap()
    }

    #[test]
    fn test_area_in_square_kilometers() {
        let lib = OperationLibrary::default();
        let params = Params::from_value(json!({"unit": "km2"})).unwrap();
        let out = lib.area(&[square_layer()], &params).unwrap();
        let km2 = area_of(&out, "area");
        assert!((km2 - 1.237).abs() < 0.02, "area {}", km2);
        assert_eq!(out[0].features[0].properties.as_ref().unwrap()["area_unit"], "km2");
    }

    #[test]
    fn test_geodesic_area_when_auto_off() {
        let lib = OperationLibrary::default();
        let params =
            Params::from_value(json!({"unit": "ha", "auto_optimize_crs": false, "column": "size"}))
                .unwrap();
        let out = lib.area(&[square_layer()], &params).unwrap();
        let ha = area_of(&out, "size");
        assert!((ha - 123.7).abs() < 2.0, "area {}", ha);
    }

    #[test]
    fn test_unknown_unit_falls_back_to_square_meters() {
        let lib = OperationLibrary::default();
        let params = Params::from_value(json!({"unit": "furlongs"})).unwrap();
        let out = lib.area(&[square_layer()], &params).unwrap();
        assert!(area_of(&out, "area") > 1.0e6);
        assert_eq!(out[0].features[0].properties.as_ref().unwrap()["area_unit"], "m2");
    }

    fn square(lon: f64, lat: f64) -> serde_json::Value {
        json!({
            "type": "Feature",
            "properties": {},
            "geometry": {"type": "Polygon", "coordinates": [[
                [lon, lat], [lon + 0.01, lat], [lon + 0.01, lat + 0.01], [lon, lat + 0.01], [lon, lat]
            ]]}
        })
    }

    #[test]
    fn test_web_mercator_fallback_measured_geodesically() {
        // Union box in the South Atlantic, outside every continent band
        let layer = GeoJson::from_json_value(json!({
            "type": "FeatureCollection",
            "features": [square(-25.0, -45.0), square(-10.0, -32.01)]
        }))
        .unwrap();
        let lib = OperationLibrary::default();
        let params = Params::from_value(json!({"projection_metadata": true})).unwrap();
        let out = lib.area(&[layer], &params).unwrap();

        let metadata = crate::metadata::crs_metadata(&out[0]).unwrap();
        assert_eq!(metadata["epsg_code"], 3857);

        let expected = geo::Polygon::new(
            geo::LineString::from(vec![
                (-25.0, -45.0),
                (-24.99, -45.0),
                (-24.99, -44.99),
                (-25.0, -44.99),
                (-25.0, -45.0),
            ]),
            vec![],
        )
        .geodesic_area_unsigned();
        let measured = out[0].features[0].properties.as_ref().unwrap()["area"].as_f64().unwrap();
        assert!((measured - expected).abs() / expected < 0.01, "{} vs {}", measured, expected);
    }

    #[test]
    fn test_geometry_returned_unchanged() {
        let lib = OperationLibrary::default();
        let out = lib.area(&[square_layer()], &Params::default()).unwrap();
        let GeoJson::FeatureCollection(original) = square_layer() else {
            panic!("expected a collection");
        };
        assert_eq!(out[0].features[0].geometry, original.features[0].geometry);
    }
}
