//! Geometry and attribute helpers shared by the operations

use geo::{BooleanOps, Geometry, MultiPolygon};
use geojson::JsonObject;
use serde_json::Value;
use std::collections::HashSet;

/// Polygonal part of a geometry, `None` for points and lines
pub fn polygonal(geometry: &Geometry) -> Option<MultiPolygon> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon(vec![p.clone()])),
        Geometry::MultiPolygon(mp) => Some(mp.clone()),
        Geometry::Rect(r) => Some(MultiPolygon(vec![r.to_polygon()])),
        Geometry::Triangle(t) => Some(MultiPolygon(vec![t.to_polygon()])),
        Geometry::GeometryCollection(gc) => {
            let parts: Vec<MultiPolygon> = gc.0.iter().filter_map(polygonal).collect();
            if parts.is_empty() {
                None
            } else {
                Some(union_all(parts))
            }
        }
        _ => None,
    }
}

/// Union of every polygon set
pub fn union_all(parts: impl IntoIterator<Item = MultiPolygon>) -> MultiPolygon {
    parts.into_iter().fold(MultiPolygon::new(vec![]), |acc, part| {
        if acc.0.is_empty() {
            part
        } else {
            acc.union(&part)
        }
    })
}

/// Flatten geometries of mixed kinds into one collection-valued geometry
pub fn combine(geometries: Vec<Geometry>) -> Option<Geometry> {
    let polygons: Vec<MultiPolygon> = geometries.iter().filter_map(polygonal).collect();
    if polygons.len() == geometries.len() {
        return single_or_multi(union_all(polygons));
    }
    match geometries.len() {
        0 => None,
        1 => geometries.into_iter().next(),
        _ => Some(Geometry::GeometryCollection(geometries.into())),
    }
}

/// Polygon for one part, MultiPolygon for several, `None` when empty
pub fn single_or_multi(mut polygons: MultiPolygon) -> Option<Geometry> {
    match polygons.0.len() {
        0 => None,
        1 => polygons.0.pop().map(Geometry::Polygon),
        _ => Some(Geometry::MultiPolygon(polygons)),
    }
}

/// Column names present on both sides of a join
pub fn shared_columns<'a>(
    left: impl IntoIterator<Item = &'a JsonObject>,
    right: impl IntoIterator<Item = &'a JsonObject>,
) -> HashSet<String> {
    let left: HashSet<&String> = left.into_iter().flat_map(|p| p.keys()).collect();
    right
        .into_iter()
        .flat_map(|p| p.keys())
        .filter(|k| left.contains(k))
        .cloned()
        .collect()
}

/// Attributes of two joined rows.
///
/// Shared columns get the suffixes, even when the right row is missing, so every
/// output row has the same schema.
pub fn join_properties(
    left: &JsonObject,
    right: Option<&JsonObject>,
    shared: &HashSet<String>,
    suffixes: (&str, &str),
) -> JsonObject {
    let mut joined = JsonObject::new();
    let name = |key: &String, suffix: &str| {
        if shared.contains(key) {
            format!("{}{}", key, suffix)
        } else {
            key.clone()
        }
    };
    for (key, value) in left {
        joined.insert(name(key, suffixes.0), value.clone());
    }
    if let Some(right) = right {
        for (key, value) in right {
            joined.insert(name(key, suffixes.1), value.clone());
        }
    }
    joined
}

/// Attribute value rendered for key comparison, so `1` and `"1"` match
pub fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Area, Point, Rect};
    use serde_json::json;

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon {
        MultiPolygon(vec![Rect::new((x, y), (x + size, y + size)).to_polygon()])
    }

    #[test]
    fn test_union_all_merges_overlaps() {
        let union = union_all(vec![square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)]);
        assert_eq!(union.0.len(), 1);
        assert!((union.unsigned_area() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_polygonal_skips_points() {
        assert!(polygonal(&Geometry::Point(Point::new(0.0, 0.0))).is_none());
        assert!(polygonal(&Geometry::MultiPolygon(square(0.0, 0.0, 1.0))).is_some());
    }

    #[test]
    fn test_join_properties_suffixes_clashes() {
        let left = json!({"name": "a", "pop": 1}).as_object().cloned().unwrap();
        let right = json!({"name": "b", "zone": "x"}).as_object().cloned().unwrap();
        let shared = shared_columns([&left], [&right]);
        let joined = join_properties(&left, Some(&right), &shared, ("_left", "_right"));
        assert_eq!(joined["name_left"], "a");
        assert_eq!(joined["name_right"], "b");
        assert_eq!(joined["pop"], 1);
        assert_eq!(joined["zone"], "x");

        let unmatched = join_properties(&left, None, &shared, ("_left", "_right"));
        assert_eq!(unmatched["name_left"], "a");
        assert!(!unmatched.contains_key("zone"));
    }

    #[test]
    fn test_key_string_matches_numbers_and_strings() {
        assert_eq!(key_string(&json!(7)), key_string(&json!("7")));
        assert_eq!(key_string(&json!(7.0)), Some("7".to_string()));
        assert_eq!(key_string(&Value::Null), None);
    }
}
