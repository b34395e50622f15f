//! Bounding box metrics used by the projection decision chain

use geoproc_core::config::DEFAULT_POLAR_LAT;
use geoproc_core::models::{BBoxMetrics, BoundingBox};

/// Kilometres per degree of latitude (and of longitude at the equator)
pub const KM_PER_DEGREE: f64 = 111.32;

/// Minimum number of UTM zones reported for a box crossing the antimeridian
const MIN_ANTIMERIDIAN_ZONE_SPAN: u32 = 3;

const MIN_LAT_EXTENT: f64 = 1e-9;

/// UTM zone (1..=60) containing a longitude
pub fn compute_utm_zone(lon: f64) -> u32 {
    let zone = ((lon + 180.0) / 6.0).floor() as i64 + 1;
    zone.clamp(1, 60) as u32
}

/// EPSG code of a WGS 84 UTM zone
pub fn utm_epsg(zone: u32, north: bool) -> u32 {
    if north {
        32600 + zone
    } else {
        32700 + zone
    }
}

/// Wrap a longitude into (-180, 180]
pub fn normalize_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        180.0
    } else {
        wrapped
    }
}

/// Longitude extent of a box, unwrapped across the antimeridian
pub fn lon_extent(bbox: &BoundingBox) -> f64 {
    if bbox.crosses_antimeridian() {
        bbox.max_lon + 360.0 - bbox.min_lon
    } else {
        bbox.max_lon - bbox.min_lon
    }
}

/// Center of a box, antimeridian aware
pub fn bbox_center(bbox: &BoundingBox) -> (f64, f64) {
    let center_lat = (bbox.min_lat + bbox.max_lat) / 2.0;
    let center_lon = if bbox.crosses_antimeridian() {
        normalize_lon(bbox.min_lon + lon_extent(bbox) / 2.0)
    } else {
        (bbox.min_lon + bbox.max_lon) / 2.0
    };
    (center_lon, center_lat)
}

/// Number of UTM zones a box touches
pub fn utm_zone_span(bbox: &BoundingBox) -> u32 {
    if bbox.crosses_antimeridian() {
        let start = ((bbox.min_lon + 180.0) / 6.0).floor() as i64;
        let end = ((bbox.max_lon + 360.0 + 180.0) / 6.0).floor() as i64;
        let span = (end - start + 1).max(0) as u32;
        span.max(MIN_ANTIMERIDIAN_ZONE_SPAN)
    } else {
        compute_utm_zone(bbox.max_lon) - compute_utm_zone(bbox.min_lon) + 1
    }
}

/// Metrics of a box using the default polar threshold
pub fn compute_bbox_metrics(bbox: &BoundingBox) -> BBoxMetrics {
    compute_bbox_metrics_with(bbox, DEFAULT_POLAR_LAT)
}

/// Metrics of a box. The box is assumed to have passed [`BoundingBox::validate`].
pub fn compute_bbox_metrics_with(bbox: &BoundingBox, polar_lat: f64) -> BBoxMetrics {
    let (center_lon, center_lat) = bbox_center(bbox);
    let lon_extent = lon_extent(bbox);
    let lat_extent = bbox.max_lat - bbox.min_lat;
    let area_km2 =
        lon_extent * lat_extent * center_lat.to_radians().cos().abs() * KM_PER_DEGREE.powi(2);

    BBoxMetrics {
        center_lon,
        center_lat,
        lon_extent,
        lat_extent,
        orientation_ratio: lon_extent / lat_extent.max(MIN_LAT_EXTENT),
        utm_zone_span: utm_zone_span(bbox),
        is_polar: center_lat.abs() > polar_lat,
        crosses_antimeridian: bbox.crosses_antimeridian(),
        area_km2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utm_zone() {
        assert_eq!(compute_utm_zone(-180.0), 1);
        assert_eq!(compute_utm_zone(0.5), 31);
        assert_eq!(compute_utm_zone(14.5), 33);
        assert_eq!(compute_utm_zone(179.9), 60);
        assert_eq!(compute_utm_zone(180.0), 60);
    }

    #[test]
    fn test_utm_epsg() {
        assert_eq!(utm_epsg(33, true), 32633);
        assert_eq!(utm_epsg(56, false), 32756);
    }

    #[test]
    fn test_normalize_lon() {
        assert_eq!(normalize_lon(190.0), -170.0);
        assert_eq!(normalize_lon(-180.0), 180.0);
        assert_eq!(normalize_lon(180.0), 180.0);
        assert_eq!(normalize_lon(45.0), 45.0);
    }

    #[test]
    fn test_metrics_for_small_box() {
        let m = compute_bbox_metrics(&BoundingBox::new(14.0, 50.0, 15.0, 51.0));
        assert_eq!(m.center_lon, 14.5);
        assert_eq!(m.center_lat, 50.5);
        assert_eq!(m.utm_zone_span, 1);
        assert!(!m.is_polar);
        assert!(!m.crosses_antimeridian);
        assert!((m.orientation_ratio - 1.0).abs() < 1e-12);
        assert!(m.area_km2 > 7000.0 && m.area_km2 < 8500.0);
    }

    #[test]
    fn test_metrics_across_antimeridian() {
        let m = compute_bbox_metrics(&BoundingBox::new(170.0, -20.0, -170.0, -10.0));
        assert!(m.crosses_antimeridian);
        assert!((m.lon_extent - 20.0).abs() < 1e-12);
        assert!((m.center_lon - 180.0).abs() < 1e-12);
        assert!(m.utm_zone_span >= 3);
    }

    #[test]
    fn test_zone_span_counts_touched_zones() {
        // 5.0 and 7.0 sit in zones 31 and 32
        assert_eq!(utm_zone_span(&BoundingBox::new(5.0, 0.0, 7.0, 1.0)), 2);
        assert_eq!(utm_zone_span(&BoundingBox::new(-120.0, 30.0, -70.0, 45.0)), 9);
    }

    #[test]
    fn test_polar_flag_uses_center_latitude() {
        assert!(compute_bbox_metrics(&BoundingBox::new(0.0, 79.0, 10.0, 85.0)).is_polar);
        assert!(compute_bbox_metrics(&BoundingBox::new(0.0, -88.0, 10.0, -75.0)).is_polar);
        assert!(!compute_bbox_metrics(&BoundingBox::new(0.0, -88.0, 10.0, -70.0)).is_polar);
        assert!(compute_bbox_metrics_with(&BoundingBox::new(0.0, 70.0, 10.0, 75.0), 70.0).is_polar);
    }

    #[test]
    fn test_degenerate_box_has_finite_ratio() {
        let m = compute_bbox_metrics(&BoundingBox::new(10.0, 10.0, 10.0, 10.0));
        assert!(m.orientation_ratio.is_finite());
        assert_eq!(m.area_km2, 0.0);
    }
}
