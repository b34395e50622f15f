use serde::{Deserialize, Serialize};

/// Distance units for buffer radii and join distances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceUnit {
    #[default]
    Meters,
    Kilometers,
    Miles,
    Feet,
}

impl DistanceUnit {
    /// Convert a distance value to meters
    pub fn to_meters(&self, value: f64) -> f64 {
        match self {
            DistanceUnit::Meters => value,
            DistanceUnit::Kilometers => value * 1000.0,
            DistanceUnit::Miles => value * 1609.344,
            DistanceUnit::Feet => value * 0.3048,
        }
    }

    /// Convert a distance value from meters to this unit
    pub fn from_meters(&self, meters: f64) -> f64 {
        match self {
            DistanceUnit::Meters => meters,
            DistanceUnit::Kilometers => meters / 1000.0,
            DistanceUnit::Miles => meters / 1609.344,
            DistanceUnit::Feet => meters / 0.3048,
        }
    }
}

/// Units for reported areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    #[default]
    SquareMeters,
    SquareKilometers,
    Hectares,
    SquareMiles,
    Acres,
}

impl AreaUnit {
    /// Lenient parse of the spellings planners tend to produce
    pub fn parse(s: &str) -> Option<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "m2" | "m²" | "sqm" | "sq_m" | "square_meters" | "square_metres" | "meters" => {
                Some(AreaUnit::SquareMeters)
            }
            "km2" | "km²" | "sqkm" | "sq_km" | "square_kilometers" | "square_kilometres"
            | "kilometers" => Some(AreaUnit::SquareKilometers),
            "ha" | "hectare" | "hectares" => Some(AreaUnit::Hectares),
            "mi2" | "mi²" | "sqmi" | "sq_mi" | "square_miles" | "miles" => {
                Some(AreaUnit::SquareMiles)
            }
            "ac" | "acre" | "acres" => Some(AreaUnit::Acres),
            _ => None,
        }
    }

    pub fn from_square_meters(&self, square_meters: f64) -> f64 {
        match self {
            AreaUnit::SquareMeters => square_meters,
            AreaUnit::SquareKilometers => square_meters / 1_000_000.0,
            AreaUnit::Hectares => square_meters / 10_000.0,
            AreaUnit::SquareMiles => square_meters / 2_589_988.110_336,
            AreaUnit::Acres => square_meters / 4_046.856_422_4,
        }
    }

    /// Short label used in output properties
    pub fn label(&self) -> &'static str {
        match self {
            AreaUnit::SquareMeters => "m2",
            AreaUnit::SquareKilometers => "km2",
            AreaUnit::Hectares => "ha",
            AreaUnit::SquareMiles => "mi2",
            AreaUnit::Acres => "acres",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_conversion() {
        assert!((DistanceUnit::Kilometers.to_meters(5.0) - 5000.0).abs() < 1e-9);
        assert!((DistanceUnit::Miles.from_meters(1609.344) - 1.0).abs() < 1e-9);
        assert!((DistanceUnit::Feet.to_meters(1.0) - 0.3048).abs() < 1e-12);
    }

    #[test]
    fn test_area_unit_parse() {
        assert_eq!(AreaUnit::parse("km2"), Some(AreaUnit::SquareKilometers));
        assert_eq!(AreaUnit::parse("Square Kilometers"), Some(AreaUnit::SquareKilometers));
        assert_eq!(AreaUnit::parse("ha"), Some(AreaUnit::Hectares));
        assert_eq!(AreaUnit::parse("ACRES"), Some(AreaUnit::Acres));
        assert_eq!(AreaUnit::parse("furlongs"), None);
    }

    #[test]
    fn test_area_conversion() {
        assert!((AreaUnit::Hectares.from_square_meters(25_000.0) - 2.5).abs() < 1e-12);
        assert!((AreaUnit::SquareKilometers.from_square_meters(3.0e6) - 3.0).abs() < 1e-12);
        assert!((AreaUnit::Acres.from_square_meters(4_046.856_422_4) - 1.0).abs() < 1e-12);
    }
}
