//! Coordinate reference system definitions.
//!
//! A CRS is either a registered EPSG code or a custom WKT definition produced by the
//! projection factory when no registered code fits the area of interest.

use crate::error::{GeoprocError, Result};
use serde::{Deserialize, Serialize};

/// How a CRS is identified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrsDefinition {
    Epsg(u32),
    Wkt(String),
}

/// Coordinate Reference System with a human readable name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub definition: CrsDefinition,
    pub name: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    pub fn epsg(code: u32, name: impl Into<String>) -> Self {
        Self { definition: CrsDefinition::Epsg(code), name: name.into() }
    }

    pub fn wkt(wkt: impl Into<String>, name: impl Into<String>) -> Self {
        Self { definition: CrsDefinition::Wkt(wkt.into()), name: name.into() }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::epsg(4326, "WGS 84")
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::epsg(3857, "WGS 84 / Pseudo-Mercator")
    }

    /// Parse a caller supplied CRS string.
    ///
    /// Accepts `EPSG:32633` (any case), a bare integer code, WKT (`PROJCS[...]`,
    /// `GEOGCS[...]`, `PROJCRS[...]`, `GEOGCRS[...]`) and PROJ strings (`+proj=...`).
    /// Only the syntax is checked here; whether the code exists is a question for the
    /// projection engine.
    pub fn parse(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        if trimmed.is_empty() {
            return Err(GeoprocError::InvalidCrs {
                code: code.to_string(),
                reason: "empty CRS string".to_string(),
            });
        }

        let upper = trimmed.to_uppercase();
        let numeric = upper.strip_prefix("EPSG:").unwrap_or(&upper);
        if let Ok(epsg) = numeric.trim().parse::<u32>() {
            return Ok(Self::epsg(epsg, format!("EPSG:{}", epsg)));
        }

        let is_wkt = ["PROJCS[", "GEOGCS[", "PROJCRS[", "GEOGCRS[", "COMPD_CS["]
            .iter()
            .any(|prefix| upper.starts_with(prefix));
        if is_wkt || trimmed.starts_with("+proj") {
            return Ok(Self::wkt(trimmed, wkt_name(trimmed).unwrap_or("Custom CRS")));
        }

        Err(GeoprocError::InvalidCrs {
            code: code.to_string(),
            reason: "expected 'EPSG:<code>', a WKT definition or a PROJ string".to_string(),
        })
    }

    /// EPSG code, if this CRS is a registered one
    pub fn epsg_code(&self) -> Option<u32> {
        match self.definition {
            CrsDefinition::Epsg(code) => Some(code),
            CrsDefinition::Wkt(_) => None,
        }
    }

    /// WKT text, if this CRS is a custom one
    pub fn wkt_text(&self) -> Option<&str> {
        match &self.definition {
            CrsDefinition::Epsg(_) => None,
            CrsDefinition::Wkt(wkt) => Some(wkt),
        }
    }

    /// Definition string understood by PROJ
    pub fn to_proj_definition(&self) -> String {
        match &self.definition {
            CrsDefinition::Epsg(code) => format!("EPSG:{}", code),
            CrsDefinition::Wkt(wkt) => wkt.clone(),
        }
    }

    /// Geographic (degree based) CRS.
    ///
    /// Decided from the definition text alone: EPSG codes in the registry's geographic
    /// 2D block (4001-4904) plus the common 3D codes, `GEOGCS`/`GEOGCRS` WKT and
    /// `+proj=longlat` PROJ strings. Geographic codes registered outside that block
    /// (rare regional datums) count as projected.
    pub fn is_geographic(&self) -> bool {
        match &self.definition {
            CrsDefinition::Epsg(code) => matches!(code, 4001..=4904 | 4937 | 4959 | 4979),
            CrsDefinition::Wkt(wkt) => {
                let upper = wkt.trim_start().to_uppercase();
                upper.starts_with("GEOGCS[")
                    || upper.starts_with("GEOGCRS[")
                    || ["+PROJ=LONGLAT", "+PROJ=LATLONG", "+PROJ=LONLAT", "+PROJ=LATLON"]
                        .iter()
                        .any(|p| upper.contains(p))
            }
        }
    }

    pub fn is_web_mercator(&self) -> bool {
        matches!(self.definition, CrsDefinition::Epsg(3857 | 900913))
    }

    /// Same definition, ignoring the display name
    pub fn same_as(&self, other: &Crs) -> bool {
        self.definition == other.definition
    }
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.definition {
            CrsDefinition::Epsg(code) => write!(f, "EPSG:{} ({})", code, self.name),
            CrsDefinition::Wkt(_) => write!(f, "{} (custom WKT)", self.name),
        }
    }
}

/// Name embedded in the first quoted string of a WKT definition
fn wkt_name(wkt: &str) -> Option<&str> {
    let start = wkt.find('"')? + 1;
    let len = wkt[start..].find('"')?;
    Some(&wkt[start..start + len])
}
