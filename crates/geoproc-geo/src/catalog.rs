//! Registered projections and regional presets known to the decider

use crate::metrics::utm_epsg;
use crate::wkt::{
    albers_equal_area, lambert_azimuthal_equal_area, lambert_conformal_conic,
    polar_stereographic, ProjectionWkt,
};
use geoproc_core::models::{Crs, ProjectionProperty};
use serde::{Deserialize, Serialize};

/// WGS 84 / North Pole LAEA Bering Sea
pub const ARCTIC_EQUAL_AREA_EPSG: u32 = 3571;
/// WGS 84 / North Pole LAEA Alaska, used for southern polar areas as well
pub const ANTARCTIC_EQUAL_AREA_EPSG: u32 = 3572;
/// WGS 84 / Arctic Polar Stereographic
pub const ARCTIC_CONFORMAL_EPSG: u32 = 3995;
/// WGS 84 / Antarctic Polar Stereographic
pub const ANTARCTIC_CONFORMAL_EPSG: u32 = 3031;

/// WGS 84 UTM zone CRS
pub fn utm_crs(zone: u32, north: bool) -> Crs {
    let hemisphere = if north { 'N' } else { 'S' };
    Crs::epsg(utm_epsg(zone, north), format!("WGS 84 / UTM zone {}{}", zone, hemisphere))
}

/// Polar CRS for a hemisphere.
///
/// With `prefer_standard_codes` a registered EPSG code is returned, otherwise a
/// generated pole-centred definition.
pub fn polar_crs(north: bool, property: ProjectionProperty, prefer_standard_codes: bool) -> Crs {
    if prefer_standard_codes {
        return match (north, property) {
            (true, ProjectionProperty::EqualArea) => {
                Crs::epsg(ARCTIC_EQUAL_AREA_EPSG, "WGS 84 / North Pole LAEA Bering Sea")
            }
            (false, ProjectionProperty::EqualArea) => {
                Crs::epsg(ANTARCTIC_EQUAL_AREA_EPSG, "WGS 84 / North Pole LAEA Alaska")
            }
            (true, ProjectionProperty::Conformal) => {
                Crs::epsg(ARCTIC_CONFORMAL_EPSG, "WGS 84 / Arctic Polar Stereographic")
            }
            (false, ProjectionProperty::Conformal) => {
                Crs::epsg(ANTARCTIC_CONFORMAL_EPSG, "WGS 84 / Antarctic Polar Stereographic")
            }
        };
    }

    let region = if north { "North Polar" } else { "South Polar" };
    let generated = match property {
        ProjectionProperty::EqualArea => {
            let pole = if north { 90.0 } else { -90.0 };
            lambert_azimuthal_equal_area(
                &format!("WGS 84 / {} Lambert Azimuthal Equal Area", region),
                0.0,
                pole,
            )
        }
        ProjectionProperty::Conformal => {
            polar_stereographic(&format!("WGS 84 / {} Stereographic", region), north, 0.0)
        }
    };
    generated.to_crs()
}

/// Continents with a regional projection preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Continent {
    NorthAmerica,
    SouthAmerica,
    Europe,
    Africa,
    Asia,
    Australia,
}

/// Parameters shared by the conformal and equal-area variants of a preset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionalPreset {
    pub central_meridian: f64,
    pub latitude_of_origin: f64,
    pub standard_parallels: (f64, f64),
}

impl Continent {
    /// Classify a point by coarse longitude and latitude bands.
    ///
    /// Bands overlap around the Mediterranean and Arabia; the first match wins in the
    /// order below.
    pub fn classify(lon: f64, lat: f64) -> Option<Continent> {
        if (-170.0..=-50.0).contains(&lon) && (15.0..=85.0).contains(&lat) {
            Some(Continent::NorthAmerica)
        } else if (-92.0..=-30.0).contains(&lon) && (-60.0..15.0).contains(&lat) {
            Some(Continent::SouthAmerica)
        } else if (-25.0..=45.0).contains(&lon) && (35.0..=72.0).contains(&lat) {
            Some(Continent::Europe)
        } else if (-20.0..=55.0).contains(&lon) && (-36.0..35.0).contains(&lat) {
            Some(Continent::Africa)
        } else if (110.0..=180.0).contains(&lon) && (-50.0..=-10.0).contains(&lat) {
            Some(Continent::Australia)
        } else if (25.0..=180.0).contains(&lon) && (-11.0..=82.0).contains(&lat) {
            Some(Continent::Asia)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Continent::NorthAmerica => "North America",
            Continent::SouthAmerica => "South America",
            Continent::Europe => "Europe",
            Continent::Africa => "Africa",
            Continent::Asia => "Asia",
            Continent::Australia => "Australia",
        }
    }

    pub fn preset(&self) -> RegionalPreset {
        let (central_meridian, latitude_of_origin, standard_parallels) = match self {
            Continent::NorthAmerica => (-96.0, 40.0, (20.0, 60.0)),
            Continent::SouthAmerica => (-60.0, -32.0, (-5.0, -42.0)),
            Continent::Europe => (10.0, 30.0, (43.0, 62.0)),
            Continent::Africa => (25.0, 0.0, (20.0, -23.0)),
            Continent::Asia => (95.0, 30.0, (15.0, 65.0)),
            Continent::Australia => (132.0, 0.0, (-18.0, -36.0)),
        };
        RegionalPreset { central_meridian, latitude_of_origin, standard_parallels }
    }

    /// Regional projection with the requested property
    pub fn projection(&self, property: ProjectionProperty) -> ProjectionWkt {
        let preset = self.preset();
        match property {
            ProjectionProperty::Conformal => lambert_conformal_conic(
                &format!("WGS 84 / {} Lambert Conformal Conic", self.name()),
                preset.central_meridian,
                preset.latitude_of_origin,
                preset.standard_parallels,
            ),
            ProjectionProperty::EqualArea => albers_equal_area(
                &format!("WGS 84 / {} Albers Equal Area", self.name()),
                preset.central_meridian,
                preset.latitude_of_origin,
                preset.standard_parallels,
            ),
        }
    }
}

impl std::fmt::Display for Continent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
