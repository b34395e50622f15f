//! Operation types and the projection property each one needs.

use serde::{Deserialize, Serialize};

/// Property a working projection must preserve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionProperty {
    /// Preserves local angles and shapes
    Conformal,
    /// Preserves areas
    EqualArea,
}

impl ProjectionProperty {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "conformal" | "shape" | "angle" | "angles" => Some(ProjectionProperty::Conformal),
            "equal_area" | "equalarea" | "area" | "equivalent" => {
                Some(ProjectionProperty::EqualArea)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectionProperty::Conformal => "conformal",
            ProjectionProperty::EqualArea => "equal_area",
        }
    }
}

impl std::fmt::Display for ProjectionProperty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geoprocessing operations offered by the operation library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Buffer,
    Overlay,
    Clip,
    Dissolve,
    Simplify,
    Sjoin,
    SjoinNearest,
    Area,
    Centroid,
    Merge,
}

impl OperationType {
    pub const ALL: [OperationType; 10] = [
        OperationType::Buffer,
        OperationType::Overlay,
        OperationType::Clip,
        OperationType::Dissolve,
        OperationType::Simplify,
        OperationType::Sjoin,
        OperationType::SjoinNearest,
        OperationType::Area,
        OperationType::Centroid,
        OperationType::Merge,
    ];

    /// Property the working CRS should preserve when the caller does not say otherwise
    pub fn default_property(&self) -> ProjectionProperty {
        match self {
            OperationType::Buffer
            | OperationType::Overlay
            | OperationType::Clip
            | OperationType::Simplify => ProjectionProperty::Conformal,
            OperationType::Dissolve
            | OperationType::Sjoin
            | OperationType::SjoinNearest
            | OperationType::Area
            | OperationType::Centroid
            | OperationType::Merge => ProjectionProperty::EqualArea,
        }
    }

    /// Operations whose output is a measurement that depends on preserved areas
    pub fn measures_area(&self) -> bool {
        matches!(self, OperationType::Area)
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperationType::Buffer => "buffer",
            OperationType::Overlay => "overlay",
            OperationType::Clip => "clip",
            OperationType::Dissolve => "dissolve",
            OperationType::Simplify => "simplify",
            OperationType::Sjoin => "sjoin",
            OperationType::SjoinNearest => "sjoin_nearest",
            OperationType::Area => "area",
            OperationType::Centroid => "centroid",
            OperationType::Merge => "merge",
        }
    }

    /// Resolve an operation name, accepting common aliases
    pub fn from_name(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase().replace(['-', ' '], "_");
        let op = match normalized.as_str() {
            "buffer" => OperationType::Buffer,
            "overlay" | "union" | "intersection" | "difference" | "symmetric_difference" => {
                OperationType::Overlay
            }
            "clip" => OperationType::Clip,
            "dissolve" => OperationType::Dissolve,
            "simplify" => OperationType::Simplify,
            "sjoin" | "spatial_join" => OperationType::Sjoin,
            "sjoin_nearest" | "nearest_join" | "spatial_join_nearest" => {
                OperationType::SjoinNearest
            }
            "area" | "calculate_area" => OperationType::Area,
            "centroid" | "centroids" => OperationType::Centroid,
            "merge" | "attribute_join" => OperationType::Merge,
            _ => return None,
        };
        Some(op)
    }

    /// One-line description used in the planner's operation catalog
    pub fn description(&self) -> &'static str {
        match self {
            OperationType::Buffer => {
                "buffer(radius, radius_unit=meters|kilometers|miles, dissolve=false): buffer exactly one layer"
            }
            OperationType::Overlay => {
                "overlay(how=union|intersection|difference|symmetric_difference): combine two or more polygon layers"
            }
            OperationType::Clip => "clip(): clip the first layer by the union of the second",
            OperationType::Dissolve => {
                "dissolve(by=<attribute>, aggfunc=first|last|sum|mean|min|max): merge geometries"
            }
            OperationType::Simplify => {
                "simplify(tolerance, preserve_topology=true): Douglas-Peucker, or topology preserving Visvalingam-Whyatt, in meters"
            }
            OperationType::Sjoin => {
                "sjoin(predicate=intersects|contains|within, how=inner|left): spatial join of two layers"
            }
            OperationType::SjoinNearest => {
                "sjoin_nearest(max_distance, distance_col, how=inner|left): nearest-feature join of two layers"
            }
            OperationType::Area => "area(unit=m2|km2|ha|mi2|acres): attach feature areas",
            OperationType::Centroid => "centroid(): replace each geometry by its centroid",
            OperationType::Merge => {
                "merge(on=<key> | left_on, right_on, how=inner|left): attribute join, or concatenation without a key"
            }
        }
    }

    /// Catalog of every operation, one per line
    pub fn catalog() -> String {
        Self::ALL.iter().map(|op| format!("- {}", op.description())).collect::<Vec<_>>().join("\n")
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_properties() {
        assert_eq!(OperationType::Area.default_property(), ProjectionProperty::EqualArea);
        assert_eq!(OperationType::Dissolve.default_property(), ProjectionProperty::EqualArea);
        assert_eq!(OperationType::Merge.default_property(), ProjectionProperty::EqualArea);
        assert_eq!(OperationType::Buffer.default_property(), ProjectionProperty::Conformal);
        assert_eq!(OperationType::Clip.default_property(), ProjectionProperty::Conformal);
        assert_eq!(OperationType::Simplify.default_property(), ProjectionProperty::Conformal);
    }

    #[test]
    fn test_from_name_roundtrip() {
        for op in OperationType::ALL {
            assert_eq!(OperationType::from_name(op.name()), Some(op));
        }
        assert_eq!(OperationType::from_name("Spatial Join"), Some(OperationType::Sjoin));
        assert_eq!(OperationType::from_name("Intersection"), Some(OperationType::Overlay));
        assert_eq!(OperationType::from_name("teleport"), None);
    }

    #[test]
    fn test_property_parse() {
        assert_eq!(ProjectionProperty::parse("equal-area"), Some(ProjectionProperty::EqualArea));
        assert_eq!(ProjectionProperty::parse("CONFORMAL"), Some(ProjectionProperty::Conformal));
        assert_eq!(ProjectionProperty::parse("distance"), None);
    }

    #[test]
    fn test_catalog_lists_everything() {
        let catalog = OperationType::catalog();
        assert_eq!(catalog.lines().count(), OperationType::ALL.len());
        assert!(catalog.contains("sjoin_nearest"));
    }
}
