//! Structural geometry validation

use geo::{Coord, Geometry, LineString, Polygon};

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    pub fn add_error(&mut self, location: String, reason: String) {
        self.is_valid = false;
        self.errors.push(ValidationError { location, reason });
    }

    fn absorb(&mut self, prefix: &str, other: ValidationResult) {
        for error in other.errors {
            self.add_error(format!("{}.{}", prefix, error.location), error.reason);
        }
    }
}

/// Validate a geometry: finite coordinates, enough vertices, closed rings
pub fn validate_geometry(geometry: &Geometry) -> ValidationResult {
    match geometry {
        Geometry::Point(p) => validate_coords("Point", std::iter::once(&p.0)),
        Geometry::Line(line) => validate_coords("Line", [&line.start, &line.end].into_iter()),
        Geometry::LineString(ls) => validate_linestring(ls),
        Geometry::Polygon(poly) => validate_polygon(poly),
        Geometry::MultiPoint(mp) => validate_coords("MultiPoint", mp.0.iter().map(|p| &p.0)),
        Geometry::MultiLineString(mls) => {
            let mut result = ValidationResult::valid();
            for (i, ls) in mls.0.iter().enumerate() {
                result.absorb(&format!("MultiLineString[{}]", i), validate_linestring(ls));
            }
            result
        }
        Geometry::MultiPolygon(mp) => {
            let mut result = ValidationResult::valid();
            for (i, poly) in mp.0.iter().enumerate() {
                result.absorb(&format!("MultiPolygon[{}]", i), validate_polygon(poly));
            }
            result
        }
        Geometry::GeometryCollection(gc) => {
            let mut result = ValidationResult::valid();
            for (i, g) in gc.0.iter().enumerate() {
                result.absorb(&format!("GeometryCollection[{}]", i), validate_geometry(g));
            }
            result
        }
        Geometry::Rect(rect) => validate_coords("Rect", [&rect.min(), &rect.max()].into_iter()),
        Geometry::Triangle(tri) => validate_coords("Triangle", [&tri.0, &tri.1, &tri.2].into_iter()),
    }
}

fn validate_coords<'a>(kind: &str, coords: impl Iterator<Item = &'a Coord>) -> ValidationResult {
    let mut result = ValidationResult::valid();
    for (i, coord) in coords.enumerate() {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            result.add_error(format!("{}[{}]", kind, i), "Coordinates must be finite".to_string());
        }
    }
    result
}

fn validate_linestring(linestring: &LineString) -> ValidationResult {
    // empty geometries are valid
    if linestring.0.len() == 1 {
        let mut result = ValidationResult::valid();
        result.add_error(
            "LineString".to_string(),
            format!("LineString must have at least 2 points, found {}", linestring.0.len()),
        );
        return result;
    }
    validate_coords("LineString", linestring.0.iter())
}

fn validate_ring(location: String, ring: &LineString, result: &mut ValidationResult) {
    if ring.0.len() < 4 {
        result.add_error(
            location.clone(),
            format!("Ring must have at least 4 points, found {}", ring.0.len()),
        );
    }
    if !ring.is_closed() {
        result.add_error(
            location.clone(),
            "Ring must be closed (first point == last point)".to_string(),
        );
    }
    result.absorb(&location, validate_coords("Ring", ring.0.iter()));
}

fn validate_polygon(polygon: &Polygon) -> ValidationResult {
    let mut result = ValidationResult::valid();
    if polygon.exterior().0.is_empty() && polygon.interiors().is_empty() {
        return result;
    }
    validate_ring("Polygon exterior".to_string(), polygon.exterior(), &mut result);
    for (i, interior) in polygon.interiors().iter().enumerate() {
        validate_ring(format!("Polygon interior[{}]", i), interior, &mut result);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{coord, line_string, point, polygon};

    #[test]
    fn test_valid_point() {
        assert!(validate_geometry(&Geometry::Point(point!(x: 1.0, y: 2.0))).is_valid);
    }

    #[test]
    fn test_nan_point() {
        let result = validate_geometry(&Geometry::Point(point!(x: f64::NAN, y: 2.0)));
        assert!(!result.is_valid);
        assert_eq!(result.errors[0].reason, "Coordinates must be finite");
    }

    #[test]
    fn test_short_linestring() {
        let ls = LineString::new(vec![coord! {x: 0.0, y: 0.0}]);
        assert!(!validate_geometry(&Geometry::LineString(ls)).is_valid);
    }

    #[test]
    fn test_empty_geometries_valid() {
        assert!(validate_geometry(&Geometry::LineString(LineString::new(vec![]))).is_valid);
        let empty = Polygon::new(LineString::new(vec![]), vec![]);
        assert!(validate_geometry(&Geometry::Polygon(empty)).is_valid);
    }

    #[test]
    fn test_polygon() {
        let poly = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        assert!(validate_geometry(&Geometry::Polygon(poly)).is_valid);
    }

    #[test]
    fn test_infinite_polygon_vertex() {
        let poly = Polygon::new(
            line_string![(x: 0.0, y: 0.0), (x: f64::INFINITY, y: 0.0), (x: 1.0, y: 1.0)],
            vec![],
        );
        let result = validate_geometry(&Geometry::Polygon(poly));
        assert!(!result.is_valid);
        assert!(result.errors[0].location.starts_with("Polygon exterior"));
    }
}
