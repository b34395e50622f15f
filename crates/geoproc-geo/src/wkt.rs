//! Custom projection WKT generation.
//!
//! Builds OGC WKT1 (GDAL flavour) definitions for projections fitted to an area of
//! interest. Output is deterministic: the same inputs always produce byte-identical
//! text, so definitions can be hashed and compared.

use crate::metrics::{bbox_center, normalize_lon};
use geoproc_core::models::{BoundingBox, Crs, ProjectionProperty};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// WGS 84 geographic base shared by every generated projection
pub const WGS84_GEOGCS: &str = concat!(
    r#"GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,"#,
    r#"AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],PRIMEM["Greenwich",0],"#,
    r#"UNIT["degree",0.0174532925199433],AUTHORITY["EPSG","4326"]]"#
);

/// Standard parallels are kept within this latitude
pub const MAX_PARALLEL_LAT: f64 = 75.0;

/// Minimum separation between the two standard parallels, in degrees
pub const MIN_PARALLEL_SEPARATION: f64 = 8.0;

/// Latitude of true scale for generated polar stereographic projections
pub const POLAR_TRUE_SCALE_LAT: f64 = 70.0;

/// Parallels closer to the equator than this (summed) make a conic degenerate
const EQUATORIAL_PARALLEL_SUM: f64 = 2.0;

const HASH_LEN: usize = 12;

/// Projection method of a generated definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionFamily {
    LambertConformalConic,
    AlbersEqualArea,
    LambertAzimuthalEqualArea,
    PolarStereographic,
    AzimuthalEquidistant,
    Mercator,
    CylindricalEqualArea,
}

impl ProjectionFamily {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectionFamily::LambertConformalConic => "Lambert Conformal Conic",
            ProjectionFamily::AlbersEqualArea => "Albers Equal Area",
            ProjectionFamily::LambertAzimuthalEqualArea => "Lambert Azimuthal Equal Area",
            ProjectionFamily::PolarStereographic => "Polar Stereographic",
            ProjectionFamily::AzimuthalEquidistant => "Azimuthal Equidistant",
            ProjectionFamily::Mercator => "Mercator",
            ProjectionFamily::CylindricalEqualArea => "Cylindrical Equal Area",
        }
    }

    pub fn property(&self) -> Option<ProjectionProperty> {
        match self {
            ProjectionFamily::LambertConformalConic
            | ProjectionFamily::PolarStereographic
            | ProjectionFamily::Mercator => Some(ProjectionProperty::Conformal),
            ProjectionFamily::AlbersEqualArea
            | ProjectionFamily::LambertAzimuthalEqualArea
            | ProjectionFamily::CylindricalEqualArea => Some(ProjectionProperty::EqualArea),
            ProjectionFamily::AzimuthalEquidistant => None,
        }
    }
}

/// A generated projection definition
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionWkt {
    pub name: String,
    pub family: ProjectionFamily,
    pub wkt: String,
}

impl ProjectionWkt {
    pub fn to_crs(&self) -> Crs {
        Crs::wkt(self.wkt.clone(), self.name.clone())
    }

    pub fn hash(&self) -> String {
        wkt_hash(&self.wkt)
    }
}

/// Short stable fingerprint of a WKT definition (first 12 hex chars of SHA-256)
pub fn wkt_hash(wkt: &str) -> String {
    let digest = Sha256::digest(wkt.as_bytes());
    let mut hash = hex::encode(digest);
    hash.truncate(HASH_LEN);
    hash
}

/// Format a parameter value: six decimals at most, no trailing zeros, no `-0`
fn fmt_num(value: f64) -> String {
    let mut text = format!("{:.6}", value);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}

fn projcs(name: &str, projection: &str, parameters: &[(&str, f64)]) -> String {
    let mut wkt = format!(r#"PROJCS["{}",{},PROJECTION["{}"]"#, name, WGS84_GEOGCS, projection);
    for (key, value) in parameters {
        wkt.push_str(&format!(r#",PARAMETER["{}",{}]"#, key, fmt_num(*value)));
    }
    wkt.push_str(r#",UNIT["metre",1,AUTHORITY["EPSG","9001"]]]"#);
    wkt
}

/// Standard parallels fitted to a latitude range.
///
/// Placed at the center ± a third of the span (one sixth in from each edge), clamped
/// to ±75° and pushed at least 8° apart. Returned south to north.
pub fn standard_parallels(min_lat: f64, max_lat: f64) -> (f64, f64) {
    let center = (min_lat + max_lat) / 2.0;
    let offset = ((max_lat - min_lat) / 3.0).max(MIN_PARALLEL_SEPARATION / 2.0);

    let mut south = (center - offset).clamp(-MAX_PARALLEL_LAT, MAX_PARALLEL_LAT);
    let mut north = (center + offset).clamp(-MAX_PARALLEL_LAT, MAX_PARALLEL_LAT);

    if north - south < MIN_PARALLEL_SEPARATION {
        if north >= MAX_PARALLEL_LAT {
            south = north - MIN_PARALLEL_SEPARATION;
        } else {
            north = south + MIN_PARALLEL_SEPARATION;
        }
    }
    (south, north)
}

pub fn lambert_conformal_conic(
    name: &str,
    central_meridian: f64,
    latitude_of_origin: f64,
    parallels: (f64, f64),
) -> ProjectionWkt {
    let wkt = projcs(
        name,
        "Lambert_Conformal_Conic_2SP",
        &[
            ("standard_parallel_1", parallels.0),
            ("standard_parallel_2", parallels.1),
            ("latitude_of_origin", latitude_of_origin),
            ("central_meridian", central_meridian),
            ("false_easting", 0.0),
            ("false_northing", 0.0),
        ],
    );
    ProjectionWkt { name: name.to_string(), family: ProjectionFamily::LambertConformalConic, wkt }
}

pub fn albers_equal_area(
    name: &str,
    central_meridian: f64,
    latitude_of_origin: f64,
    parallels: (f64, f64),
) -> ProjectionWkt {
    let wkt = projcs(
        name,
        "Albers_Conic_Equal_Area",
        &[
            ("standard_parallel_1", parallels.0),
            ("standard_parallel_2", parallels.1),
            ("latitude_of_center", latitude_of_origin),
            ("longitude_of_center", central_meridian),
            ("false_easting", 0.0),
            ("false_northing", 0.0),
        ],
    );
    ProjectionWkt { name: name.to_string(), family: ProjectionFamily::AlbersEqualArea, wkt }
}

pub fn lambert_azimuthal_equal_area(name: &str, lon: f64, lat: f64) -> ProjectionWkt {
    let wkt = projcs(
        name,
        "Lambert_Azimuthal_Equal_Area",
        &[
            ("latitude_of_center", lat),
            ("longitude_of_center", lon),
            ("false_easting", 0.0),
            ("false_northing", 0.0),
        ],
    );
    ProjectionWkt {
        name: name.to_string(),
        family: ProjectionFamily::LambertAzimuthalEqualArea,
        wkt,
    }
}

/// Polar stereographic with true scale at ±70°
pub fn polar_stereographic(name: &str, north: bool, central_meridian: f64) -> ProjectionWkt {
    let true_scale = if north { POLAR_TRUE_SCALE_LAT } else { -POLAR_TRUE_SCALE_LAT };
    let wkt = projcs(
        name,
        "Polar_Stereographic",
        &[
            ("latitude_of_origin", true_scale),
            ("central_meridian", central_meridian),
            ("scale_factor", 1.0),
            ("false_easting", 0.0),
            ("false_northing", 0.0),
        ],
    );
    ProjectionWkt { name: name.to_string(), family: ProjectionFamily::PolarStereographic, wkt }
}

/// Azimuthal equidistant centred on a point; distances from the center are true
pub fn azimuthal_equidistant(name: &str, lon: f64, lat: f64) -> ProjectionWkt {
    let wkt = projcs(
        name,
        "Azimuthal_Equidistant",
        &[
            ("latitude_of_center", lat),
            ("longitude_of_center", normalize_lon(lon)),
            ("false_easting", 0.0),
            ("false_northing", 0.0),
        ],
    );
    ProjectionWkt { name: name.to_string(), family: ProjectionFamily::AzimuthalEquidistant, wkt }
}

pub fn mercator(name: &str, central_meridian: f64) -> ProjectionWkt {
    let wkt = projcs(
        name,
        "Mercator_1SP",
        &[
            ("central_meridian", central_meridian),
            ("scale_factor", 1.0),
            ("false_easting", 0.0),
            ("false_northing", 0.0),
        ],
    );
    ProjectionWkt { name: name.to_string(), family: ProjectionFamily::Mercator, wkt }
}

pub fn cylindrical_equal_area(name: &str, central_meridian: f64) -> ProjectionWkt {
    let wkt = projcs(
        name,
        "Cylindrical_Equal_Area",
        &[
            ("standard_parallel_1", 0.0),
            ("central_meridian", central_meridian),
            ("false_easting", 0.0),
            ("false_northing", 0.0),
        ],
    );
    ProjectionWkt { name: name.to_string(), family: ProjectionFamily::CylindricalEqualArea, wkt }
}

/// Projection with the requested property fitted to a box.
///
/// Conic (LCC or Albers) centred on the box. When the fitted parallels sit
/// symmetrically around the equator a conic degenerates, so the cylindrical
/// counterpart is returned instead.
pub fn fitted_projection(
    bbox: &BoundingBox,
    property: ProjectionProperty,
    region: &str,
) -> ProjectionWkt {
    let (center_lon, center_lat) = bbox_center(bbox);
    let central_meridian = normalize_lon(center_lon);
    let parallels = standard_parallels(bbox.min_lat, bbox.max_lat);
    let equatorial = parallels.0 < 0.0
        && parallels.1 > 0.0
        && (parallels.0 + parallels.1).abs() < EQUATORIAL_PARALLEL_SUM;

    let family = match (property, equatorial) {
        (ProjectionProperty::Conformal, false) => ProjectionFamily::LambertConformalConic,
        (ProjectionProperty::EqualArea, false) => ProjectionFamily::AlbersEqualArea,
        (ProjectionProperty::Conformal, true) => ProjectionFamily::Mercator,
        (ProjectionProperty::EqualArea, true) => ProjectionFamily::CylindricalEqualArea,
    };
    let name = format!("WGS 84 / {} {}", region, family.label());

    match family {
        ProjectionFamily::LambertConformalConic => {
            lambert_conformal_conic(&name, central_meridian, center_lat, parallels)
        }
        ProjectionFamily::AlbersEqualArea => {
            albers_equal_area(&name, central_meridian, center_lat, parallels)
        }
        ProjectionFamily::Mercator => mercator(&name, central_meridian),
        _ => cylindrical_equal_area(&name, central_meridian),
    }
}
