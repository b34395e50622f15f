//! Bounding boxes in geographic degrees and their derived metrics.

use serde::{Deserialize, Serialize};

/// Geographic bounding box `(min_lon, min_lat, max_lon, max_lat)` in WGS 84 degrees.
///
/// An inverted longitude range (`min_lon > max_lon`) encodes a box that crosses the
/// antimeridian. It is a valid box, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self { min_lon, min_lat, max_lon, max_lat }
    }

    /// Build from `[min_lon, min_lat, max_lon, max_lat]`
    pub fn from_array(bbox: [f64; 4]) -> Self {
        Self::new(bbox[0], bbox[1], bbox[2], bbox[3])
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }

    /// Check the box invariants, returning the first violated one
    pub fn validate(&self) -> std::result::Result<(), String> {
        let coords = self.to_array();
        if coords.iter().any(|c| !c.is_finite()) {
            return Err("bbox coordinates must be finite".to_string());
        }
        for lon in [self.min_lon, self.max_lon] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(format!("longitude {} outside [-180, 180]", lon));
            }
        }
        for lat in [self.min_lat, self.max_lat] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(format!("latitude {} outside [-90, 90]", lat));
            }
        }
        if self.min_lat > self.max_lat {
            return Err(format!("min_lat {} greater than max_lat {}", self.min_lat, self.max_lat));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// True when the longitude range is inverted
    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lon > self.max_lon
    }

    /// Smallest box covering both boxes. Neither input may cross the antimeridian.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::new(
            self.min_lon.min(other.min_lon),
            self.min_lat.min(other.min_lat),
            self.max_lon.max(other.max_lon),
            self.max_lat.max(other.max_lat),
        )
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(bbox: [f64; 4]) -> Self {
        Self::from_array(bbox)
    }
}

/// Geometric descriptors of a bounding box used by projection selection.
///
/// Computed fresh for every decision; never cached across boxes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBoxMetrics {
    pub center_lon: f64,
    pub center_lat: f64,
    pub lon_extent: f64,
    pub lat_extent: f64,
    /// `lon_extent / lat_extent`, large for wide and flat boxes
    pub orientation_ratio: f64,
    /// Number of distinct UTM zones touched by the longitude range
    pub utm_zone_span: u32,
    pub is_polar: bool,
    pub crosses_antimeridian: bool,
    /// Cheap planar estimate, good enough for threshold comparisons only
    pub area_km2: f64,
}
