//! R-tree over feature envelopes for the join operations

use geo::{BoundingRect, Centroid, Geometry};
use geoproc_geo::spatial::planar_distance;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// Feature envelope tagged with its row index
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedGeometry {
    pub id: usize,
    envelope: AABB<[f64; 2]>,
}

impl IndexedGeometry {
    pub fn new(id: usize, geometry: &Geometry) -> Option<Self> {
        envelope(geometry).map(|envelope| Self { id, envelope })
    }
}

impl RTreeObject for IndexedGeometry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for IndexedGeometry {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        self.envelope.distance_2(point)
    }
}

fn envelope(geometry: &Geometry) -> Option<AABB<[f64; 2]>> {
    let rect = geometry.bounding_rect()?;
    Some(AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

/// Spatial index over the geometries of one table.
///
/// Rows without geometry are not indexed and never match.
pub struct SpatialIndex<'a> {
    tree: RTree<IndexedGeometry>,
    geometries: Vec<Option<&'a Geometry>>,
}

impl<'a> SpatialIndex<'a> {
    pub fn from_geometries(geometries: Vec<Option<&'a Geometry>>) -> Self {
        let indexed = geometries
            .iter()
            .enumerate()
            .filter_map(|(id, g)| g.and_then(|g| IndexedGeometry::new(id, g)))
            .collect();
        Self { tree: RTree::bulk_load(indexed), geometries }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    pub fn geometry(&self, id: usize) -> Option<&'a Geometry> {
        self.geometries.get(id).copied().flatten()
    }

    /// Ids whose envelope intersects the envelope of `geometry`, in id order
    pub fn candidates(&self, geometry: &Geometry) -> Vec<usize> {
        let Some(window) = envelope(geometry) else {
            return Vec::new();
        };
        self.query_window(window)
    }

    fn query_window(&self, window: AABB<[f64; 2]>) -> Vec<usize> {
        let mut ids: Vec<usize> =
            self.tree.locate_in_envelope_intersecting(&window).map(|g| g.id).collect();
        ids.sort_unstable();
        ids
    }

    /// Nearest indexed geometries to `geometry` with their distance.
    ///
    /// Every geometry at the minimum distance is returned, so ties yield several ids.
    /// `max_distance` drops matches farther away.
    pub fn nearest(&self, geometry: &Geometry, max_distance: Option<f64>) -> Vec<(usize, f64)> {
        let (Some(env), Some(center)) = (envelope(geometry), geometry.centroid()) else {
            return Vec::new();
        };
        let Some(seed) = self.tree.nearest_neighbor(&[center.x(), center.y()]) else {
            return Vec::new();
        };
        let Some(seed_geometry) = self.geometry(seed.id) else {
            return Vec::new();
        };

        // any geometry closer than the seed intersects the envelope grown by its distance
        let bound = planar_distance(geometry, seed_geometry);
        let (lower, upper) = (env.lower(), env.upper());
        let window = AABB::from_corners(
            [lower[0] - bound, lower[1] - bound],
            [upper[0] + bound, upper[1] + bound],
        );

        let scored: Vec<(usize, f64)> = self
            .query_window(window)
            .into_iter()
            .filter_map(|id| self.geometry(id).map(|g| (id, planar_distance(geometry, g))))
            .collect();
        let Some(best) = scored.iter().map(|(_, d)| *d).reduce(f64::min) else {
            return Vec::new();
        };
        if max_distance.is_some_and(|max| best > max) {
            return Vec::new();
        }
        let tolerance = best.abs() * 1e-12;
        scored.into_iter().filter(|(_, d)| *d - best <= tolerance).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Point, Rect};

    fn square(x: f64, y: f64) -> Geometry {
        Geometry::Polygon(Rect::new((x, y), (x + 1.0, y + 1.0)).to_polygon())
    }

    #[test]
    fn test_candidates_by_envelope() {
        let geometries = vec![square(0.0, 0.0), square(10.0, 10.0), square(0.5, 0.5)];
        let index = SpatialIndex::from_geometries(geometries.iter().map(Some).collect());
        assert_eq!(index.len(), 3);
        assert_eq!(index.candidates(&square(0.2, 0.2)), vec![0, 2]);
    }

    #[test]
    fn test_missing_geometries_not_indexed() {
        let g = square(0.0, 0.0);
        let index = SpatialIndex::from_geometries(vec![None, Some(&g)]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.candidates(&square(0.0, 0.0)), vec![1]);
    }

    #[test]
    fn test_nearest_uses_exact_distance() {
        // a large polygon whose envelope center is far, but whose edge is near
        let geometries = vec![
            Geometry::Polygon(Rect::new((2.0, -50.0), (3.0, 50.0)).to_polygon()),
            Geometry::Point(Point::new(0.0, 4.0)),
        ];
        let index = SpatialIndex::from_geometries(geometries.iter().map(Some).collect());
        let found = index.nearest(&Geometry::Point(Point::new(0.0, 0.0)), None);
        assert_eq!(found, vec![(0, 2.0)]);
    }

    #[test]
    fn test_nearest_ties_and_max_distance() {
        let geometries = vec![Geometry::Point(Point::new(1.0, 0.0)), Geometry::Point(Point::new(-1.0, 0.0))];
        let index = SpatialIndex::from_geometries(geometries.iter().map(Some).collect());
        let origin = Geometry::Point(Point::new(0.0, 0.0));
        assert_eq!(index.nearest(&origin, None).len(), 2);
        assert!(index.nearest(&origin, Some(0.5)).is_empty());
    }
}
