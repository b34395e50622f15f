//! Spatial predicates and distances used by the join operations

use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::algorithm::intersects::Intersects;
use geo::{Distance, Euclidean, Geometry, Rect};
use serde::{Deserialize, Serialize};

/// Binary predicate between a left and a right geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpatialPredicate {
    #[default]
    Intersects,
    /// Left contains right
    Contains,
    /// Left is within right
    Within,
}

impl SpatialPredicate {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "intersects" | "intersect" => Some(SpatialPredicate::Intersects),
            "contains" | "contain" => Some(SpatialPredicate::Contains),
            "within" | "inside" => Some(SpatialPredicate::Within),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpatialPredicate::Intersects => "intersects",
            SpatialPredicate::Contains => "contains",
            SpatialPredicate::Within => "within",
        }
    }

    pub fn evaluate(&self, left: &Geometry, right: &Geometry) -> bool {
        match self {
            SpatialPredicate::Intersects => left.intersects(right),
            SpatialPredicate::Contains => left.contains(right),
            SpatialPredicate::Within => right.contains(left),
        }
    }
}

/// Check if two bounding boxes intersect
pub fn bounding_boxes_intersect(bbox1: &Rect, bbox2: &Rect) -> bool {
    let x_overlap = bbox1.min().x <= bbox2.max().x && bbox1.max().x >= bbox2.min().x;
    let y_overlap = bbox1.min().y <= bbox2.max().y && bbox1.max().y >= bbox2.min().y;
    x_overlap && y_overlap
}

/// Cheap rejection test before an exact predicate
pub fn envelopes_intersect(left: &Geometry, right: &Geometry) -> bool {
    match (left.bounding_rect(), right.bounding_rect()) {
        (Some(a), Some(b)) => bounding_boxes_intersect(&a, &b),
        _ => false,
    }
}

/// Minimum distance between two geometries in CRS units (zero when they intersect)
pub fn planar_distance(left: &Geometry, right: &Geometry) -> f64 {
    Euclidean.distance(left, right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Point, Polygon};

    fn square(x0: f64, y0: f64, size: f64) -> Geometry {
        Geometry::Polygon(Polygon::new(
            LineString::from(vec![
                (x0, y0),
                (x0 + size, y0),
                (x0 + size, y0 + size),
                (x0, y0 + size),
                (x0, y0),
            ]),
            vec![],
        ))
    }

    #[test]
    fn test_point_within_polygon() {
        let outer = square(0.0, 0.0, 10.0);
        let inside = Geometry::Point(Point::new(5.0, 5.0));
        let outside = Geometry::Point(Point::new(15.0, 15.0));

        assert!(SpatialPredicate::Within.evaluate(&inside, &outer));
        assert!(!SpatialPredicate::Within.evaluate(&outside, &outer));
        assert!(SpatialPredicate::Contains.evaluate(&outer, &inside));
    }

    #[test]
    fn test_intersects() {
        assert!(SpatialPredicate::Intersects.evaluate(&square(0.0, 0.0, 10.0), &square(5.0, 5.0, 10.0)));
        assert!(!SpatialPredicate::Intersects.evaluate(&square(0.0, 0.0, 1.0), &square(5.0, 5.0, 1.0)));
    }

    #[test]
    fn test_envelopes() {
        assert!(envelopes_intersect(&square(0.0, 0.0, 2.0), &square(1.0, 1.0, 2.0)));
        assert!(!envelopes_intersect(&square(0.0, 0.0, 1.0), &square(3.0, 3.0, 1.0)));
    }

    #[test]
    fn test_planar_distance() {
        let a = Geometry::Point(Point::new(0.0, 0.0));
        let b = square(3.0, 0.0, 1.0);
        assert!((planar_distance(&a, &b) - 3.0).abs() < 1e-12);
        assert_eq!(planar_distance(&square(0.0, 0.0, 2.0), &square(1.0, 1.0, 2.0)), 0.0);
    }

    #[test]
    fn test_parse() {
        assert_eq!(SpatialPredicate::parse("Within"), Some(SpatialPredicate::Within));
        assert_eq!(SpatialPredicate::parse("touches"), None);
    }
}
