//! In-memory feature table.
//!
//! Rows of geometry plus JSON properties with an optional CRS. Tables built from
//! GeoJSON carry no CRS, which means WGS 84 (RFC 7946).

use crate::transform::Reprojector;
use crate::validation::validate_geometry;
use geo::{BoundingRect, Geometry};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject};
use geoproc_core::error::{GeoprocError, Result};
use geoproc_core::models::{BoundingBox, Crs};

/// One feature of a table
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub id: Option<Id>,
    pub geometry: Option<Geometry>,
    pub properties: JsonObject,
}

impl FeatureRow {
    pub fn new(geometry: Option<Geometry>, properties: JsonObject) -> Self {
        Self { id: None, geometry, properties }
    }

    /// Same id and properties, different geometry
    pub fn with_geometry(&self, geometry: Option<Geometry>) -> Self {
        Self { id: self.id.clone(), geometry, properties: self.properties.clone() }
    }

    fn from_feature(feature: &Feature, index: usize) -> Result<Self> {
        let geometry = match &feature.geometry {
            Some(g) => {
                let geometry = Geometry::<f64>::try_from(&g.value).map_err(|e| {
                    GeoprocError::InvalidGeometry {
                        feature_id: feature_label(feature.id.as_ref(), index),
                        reason: e.to_string(),
                    }
                })?;
                let validation = validate_geometry(&geometry);
                if !validation.is_valid {
                    let reason = validation
                        .errors
                        .iter()
                        .map(|e| format!("{}: {}", e.location, e.reason))
                        .collect::<Vec<_>>()
                        .join("; ");
                    return Err(GeoprocError::InvalidGeometry {
                        feature_id: feature_label(feature.id.as_ref(), index),
                        reason,
                    });
                }
                Some(geometry)
            }
            None => None,
        };

        Ok(Self {
            id: feature.id.clone(),
            geometry,
            properties: feature.properties.clone().unwrap_or_default(),
        })
    }

    fn to_feature(&self) -> Feature {
        Feature {
            bbox: None,
            geometry: self.geometry.as_ref().map(|g| geojson::Geometry::new(g.into())),
            id: self.id.clone(),
            properties: Some(self.properties.clone()),
            foreign_members: None,
        }
    }
}

fn feature_label(id: Option<&Id>, index: usize) -> String {
    match id {
        Some(Id::String(s)) => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => format!("#{}", index),
    }
}

/// A table of features sharing one CRS
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    pub rows: Vec<FeatureRow>,
    pub crs: Option<Crs>,
}

impl FeatureTable {
    pub fn new(rows: Vec<FeatureRow>, crs: Option<Crs>) -> Self {
        Self { rows, crs }
    }

    /// Build a table from any GeoJSON object.
    ///
    /// A geometry that fails structural validation (non-finite coordinates, too few
    /// vertices, open rings) is an `InvalidGeometry` error naming the feature.
    pub fn from_geojson(geojson: &GeoJson) -> Result<Self> {
        let rows = match geojson {
            GeoJson::FeatureCollection(fc) => fc
                .features
                .iter()
                .enumerate()
                .map(|(i, f)| FeatureRow::from_feature(f, i))
                .collect::<Result<Vec<_>>>()?,
            GeoJson::Feature(f) => vec![FeatureRow::from_feature(f, 0)?],
            GeoJson::Geometry(g) => {
                let feature = Feature {
                    bbox: None,
                    geometry: Some(g.clone()),
                    id: None,
                    properties: None,
                    foreign_members: None,
                };
                vec![FeatureRow::from_feature(&feature, 0)?]
            }
        };
        Ok(Self { rows, crs: None })
    }

    pub fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.rows.iter().map(FeatureRow::to_feature).collect(),
            foreign_members: None,
        }
    }

    /// Concatenate tables in order; the CRS of the first table is kept
    pub fn concat(tables: &[FeatureTable]) -> Self {
        Self {
            rows: tables.iter().flat_map(|t| t.rows.iter().cloned()).collect(),
            crs: tables.first().and_then(|t| t.crs.clone()),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether any row carries a geometry
    pub fn has_geometries(&self) -> bool {
        self.rows.iter().any(|r| r.geometry.is_some())
    }

    /// Effective CRS; unset means WGS 84
    pub fn crs_or_default(&self) -> Crs {
        self.crs.clone().unwrap_or_else(Crs::wgs84)
    }

    /// Record WGS 84 as the CRS when none is set. The only in-place CRS change.
    pub fn ensure_crs(&mut self) {
        if self.crs.is_none() {
            self.crs = Some(Crs::wgs84());
        }
    }

    /// Bounds of every geometry, in the table's CRS
    pub fn total_bounds(&self) -> Option<BoundingBox> {
        self.rows
            .iter()
            .filter_map(|r| r.geometry.as_ref().and_then(|g| g.bounding_rect()))
            .map(|rect| {
                BoundingBox::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y)
            })
            .reduce(|a, b| a.union(&b))
    }

    /// Geographic bounds that wrap across the antimeridian when the features cluster
    /// around it (an inverted box), plain [`total_bounds`](Self::total_bounds) otherwise.
    /// Only meaningful for WGS 84 tables.
    pub fn wrapped_bounds(&self) -> Option<BoundingBox> {
        let plain = self.total_bounds()?;
        let plain_extent = plain.max_lon - plain.min_lon;
        if plain_extent <= 180.0 {
            return Some(plain);
        }

        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;
        for rect in self.rows.iter().filter_map(|r| r.geometry.as_ref()?.bounding_rect()) {
            let (west, east) = (rect.min().x, rect.max().x);
            let (west, east) = if east < 0.0 {
                (west + 360.0, east + 360.0)
            } else if west < 0.0 {
                // straddles the prime meridian, wrapping cannot help
                return Some(plain);
            } else {
                (west, east)
            };
            min_lon = min_lon.min(west);
            max_lon = max_lon.max(east);
        }

        if max_lon - min_lon < plain_extent && max_lon > 180.0 {
            Some(BoundingBox::new(min_lon, plain.min_lat, max_lon - 360.0, plain.max_lat))
        } else {
            Some(plain)
        }
    }

    /// Copy of the table in another CRS; `self` is left untouched
    pub fn to_crs(&self, target: &Crs) -> Result<FeatureTable> {
        let reprojector = Reprojector::new(&self.crs_or_default(), target)?;
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let geometry =
                    row.geometry.as_ref().map(|g| reprojector.transform_geometry(g)).transpose()?;
                Ok(row.with_geometry(geometry))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FeatureTable { rows, crs: Some(target.clone()) })
    }

    /// Replace every geometry through `f`, keeping ids and properties
    pub fn map_geometries<F>(&self, mut f: F) -> Result<FeatureTable>
    where
        F: FnMut(&Geometry) -> Result<Option<Geometry>>,
    {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let geometry = match &row.geometry {
                    Some(g) => f(g)?,
                    None => None,
                };
                Ok(row.with_geometry(geometry))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(FeatureTable { rows, crs: self.crs.clone() })
    }

    /// Geometry type shared by every row, `Mixed` otherwise, `Empty` without geometries
    pub fn geometry_type(&self) -> String {
        let mut kinds = self.rows.iter().filter_map(|r| r.geometry.as_ref()).map(geometry_kind);
        let Some(first) = kinds.next() else {
            return "Empty".to_string();
        };
        if kinds.all(|k| k == first) {
            first.to_string()
        } else {
            "Mixed".to_string()
        }
    }
}

pub fn geometry_kind(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::Line(_) | Geometry::LineString(_) => "LineString",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::Polygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => "Polygon",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}
