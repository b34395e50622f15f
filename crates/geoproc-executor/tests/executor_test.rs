//! Plans written by hand and run through `execute_plan`

use geojson::GeoJson;
use geoproc_executor::{execute_plan, parse_plan, ExecutorError};
use geoproc_ops::{crs_metadata, OperationLibrary};
use serde_json::json;

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

#[test]
fn test_llm_crs_is_never_reoptimized() {
    let plan = parse_plan(
        r#"{"operations": [{"operation": "centroid", "params": {"crs": "EPSG:32633", "projection_metadata": true}}]}"#,
    )
    .unwrap();
    let result =
        execute_plan(&OperationLibrary::default(), &plan, vec![square(14.0, 50.0, 0.1, "a")])
            .unwrap();

    let metadata = crs_metadata(&result.layers[0]).unwrap();
    assert_eq!(metadata["epsg_code"], 32633);
    assert_eq!(metadata["auto_selected"], false);
    assert_eq!(result.executed[0].params["auto_optimize_crs"], false);
}

#[test]
fn test_overlay_alias_then_area() {
    let plan = parse_plan(
        r#"[{"operation": "intersection"}, {"operation": "calculate_area", "params": {"unit": "km2"}}]"#,
    )
    .unwrap();
    let result = execute_plan(
        &OperationLibrary::default(),
        &plan,
        vec![square(10.0, 0.0, 0.02, "a"), square(10.01, 0.0, 0.02, "b")],
    )
    .unwrap();

    assert_eq!(result.operation_sequence(), vec!["overlay", "area"]);
    assert_eq!(result.executed[0].params["how"], "intersection");
    let props = result.layers[0].features[0].properties.as_ref().unwrap();
    assert_eq!(props["name_1"], "a");
    assert_eq!(props["name_2"], "b");
    // 0.01 x 0.02 degrees at the equator
    let km2 = props["area"].as_f64().unwrap();
    assert!((km2 - 2.47).abs() < 0.05, "area {}", km2);
}

#[test]
fn test_operation_error_aborts_run() {
    let plan = parse_plan(r#"[{"operation": "buffer", "params": {"radius": 10}}]"#).unwrap();
    let err = execute_plan(
        &OperationLibrary::default(),
        &plan,
        vec![square(0.0, 0.0, 1.0, "a"), square(2.0, 0.0, 1.0, "b")],
    )
    .unwrap_err();
    assert!(matches!(err, ExecutorError::Operation(_)));
    assert!(err.to_string().contains("2 layers"));
}
