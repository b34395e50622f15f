//! End-to-end tests of the operation library through `execute`

use geo::{BoundingRect, Contains, Geometry, Point};
use geojson::{FeatureCollection, GeoJson};
use geoproc_core::config::LayeredConfig;
use geoproc_core::models::OperationType;
use geoproc_core::GeoprocError;
use geoproc_ops::{crs_metadata, OperationLibrary, Params};
use proptest::prelude::*;
use serde_json::{json, Value};

fn square(x: f64, y: f64, size: f64, name: &str) -> GeoJson {
    GeoJson::from_json_value(json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": name},
            "geometry": {"type": "Polygon", "coordinates": [[
                [x, y], [x + size, y], [x + size, y + size], [x, y + size], [x, y]
            ]]}
        }]
    }))
    .unwrap()
}

fn point(x: f64, y: f64) -> GeoJson {
    GeoJson::from_json_value(json!({
        "type": "FeatureCollection",
        "features": [{"type": "Feature", "properties": {}, "geometry": {"type": "Point", "coordinates": [x, y]}}]
    }))
    .unwrap()
}

fn params(value: Value) -> Params {
    Params::from_value(value).unwrap()
}

fn geometry(fc: &FeatureCollection, index: usize) -> Geometry {
    let g = fc.features[index].geometry.as_ref().unwrap();
    Geometry::<f64>::try_from(&g.value).unwrap()
}

#[test]
fn test_two_square_intersection_with_auto_crs() {
    let lib = OperationLibrary::default();
    let out = lib
        .execute(
            OperationType::Overlay,
            &[square(0.0, 0.0, 2.0, "a"), square(1.0, 1.0, 2.0, "b")],
            &params(json!({"how": "intersection", "projection_metadata": true})),
        )
        .unwrap();
    assert_eq!(out.len(), 1);
    let rect = geometry(&out[0], 0).bounding_rect().unwrap();
    for (actual, expected) in [
        (rect.min().x, 1.0),
        (rect.min().y, 1.0),
        (rect.max().x, 2.0),
        (rect.max().y, 2.0),
    ] {
        assert!((actual - expected).abs() < 1e-3, "{} vs {}", actual, expected);
    }

    let metadata = crs_metadata(&out[0]).unwrap();
    assert_eq!(metadata["auto_selected"], true);
    assert!(metadata["decision_path"].as_array().is_some_and(|steps| !steps.is_empty()));
}

#[test]
fn test_metadata_absent_by_default() {
    let lib = OperationLibrary::default();
    let out = lib.execute(OperationType::Centroid, &[square(0.0, 0.0, 1.0, "a")], &Params::default()).unwrap();
    assert!(crs_metadata(&out[0]).is_none());
}

#[test]
fn test_override_crs_recorded() {
    let lib = OperationLibrary::default();
    let out = lib
        .execute(
            OperationType::Buffer,
            &[point(2.35, 48.85)],
            &params(json!({"radius": 1, "radius_unit": "kilometers", "override_crs": "EPSG:2154", "projection_metadata": true})),
        )
        .unwrap();
    let metadata = crs_metadata(&out[0]).unwrap();
    assert_eq!(metadata["epsg_code"], 2154);
    assert_eq!(metadata["auto_selected"], false);
    assert_eq!(metadata["selection_reason"], "Manual override");
    assert_eq!(metadata["buffer_method"], "planar");
}

#[test]
fn test_invalid_override_fails_fast() {
    let lib = OperationLibrary::default();
    let err = lib
        .execute(OperationType::Centroid, &[point(0.0, 0.0)], &params(json!({"override_crs": "EPSG:99999"})))
        .unwrap_err();
    assert!(matches!(err, GeoprocError::InvalidCrs { .. }));
}

#[test]
fn test_buffer_arity_through_execute() {
    let lib = OperationLibrary::default();
    let err = lib
        .execute(OperationType::Buffer, &[point(0.0, 0.0), point(1.0, 1.0)], &params(json!({"radius": 5})))
        .unwrap_err();
    assert!(err.to_string().contains("2 layers"));
    assert!(lib.execute(OperationType::Buffer, &[], &params(json!({"radius": 5}))).unwrap().is_empty());
}

#[test]
fn test_overlay_arity_guard_returns_input() {
    let lib = OperationLibrary::default();
    let out = lib.execute(OperationType::Overlay, &[square(0.0, 0.0, 1.0, "a")], &Params::default()).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].features[0].properties.as_ref().unwrap()["name"], "a");
}

#[test]
fn test_library_from_config_defaults() {
    let mut config = LayeredConfig::with_defaults();
    config.projection_metadata.value = true;
    let lib = OperationLibrary::from_config(&config);
    let out = lib.execute(OperationType::Area, &[square(10.0, 45.0, 0.1, "a")], &Params::default()).unwrap();
    assert!(crs_metadata(&out[0]).is_some());
}

#[test]
fn test_antimeridian_point_buffer_stays_in_range() {
    let lib = OperationLibrary::default();
    let out = lib
        .execute(OperationType::Buffer, &[point(179.95, -16.5)], &params(json!({"radius": 20000})))
        .unwrap();
    let rect = geometry(&out[0], 0).bounding_rect().unwrap();
    assert!(rect.min().x >= -180.0 && rect.max().x <= 180.0);
    assert!(matches!(geometry(&out[0], 0), Geometry::MultiPolygon(_)));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_point_buffer_contains_point(lon in -170.0f64..170.0, lat in -70.0f64..70.0, radius in 10.0f64..20_000.0) {
        let lib = OperationLibrary::default();
        let out = lib.execute(OperationType::Buffer, &[point(lon, lat)], &params(json!({"radius": radius}))).unwrap();
        let g = geometry(&out[0], 0);
        prop_assert!(matches!(g, Geometry::Polygon(_)));
        prop_assert!(g.contains(&Point::new(lon, lat)));
    }
}
