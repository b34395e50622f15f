use crate::error::{GeoprocError, Result};
use crate::models::DistanceUnit;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Centre latitude beyond which a box is treated as polar (UTM's practical limit)
pub const DEFAULT_POLAR_LAT: f64 = 80.0;
/// Boxes whose lon and lat extents are both below this many degrees are "local"
pub const DEFAULT_LOCAL_EXTENT_DEG: f64 = 10.0;
/// Orientation ratio (lon extent / lat extent) above which a box is EW-dominant
pub const DEFAULT_EW_RATIO: f64 = 2.5;
/// Area estimate above which an equal-area regional projection is required
pub const DEFAULT_LARGE_AREA_KM2: f64 = 2_000_000.0;
/// Longitude span treated as a global extent
pub const DEFAULT_GLOBAL_LON_SPAN: f64 = 300.0;
/// Latitude span treated as a global extent
pub const DEFAULT_GLOBAL_LAT_SPAN: f64 = 170.0;
/// Buffer radius above which planar buffering is abandoned for geodesic buffering
pub const DEFAULT_LARGE_RADIUS_M: f64 = 50_000.0;

/// Calibration constants of the projection decision chain and the buffer selector.
///
/// The values are tuned, not canonical; every one can be overridden through
/// [`LayeredConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    pub polar_lat: f64,
    pub local_extent_deg: f64,
    pub ew_ratio: f64,
    pub large_area_km2: f64,
    pub global_lon_span: f64,
    pub global_lat_span: f64,
    pub large_radius_m: f64,
    /// Prefer registered EPSG codes for polar projections over generated WKT
    pub prefer_standard_codes: bool,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            polar_lat: DEFAULT_POLAR_LAT,
            local_extent_deg: DEFAULT_LOCAL_EXTENT_DEG,
            ew_ratio: DEFAULT_EW_RATIO,
            large_area_km2: DEFAULT_LARGE_AREA_KM2,
            global_lon_span: DEFAULT_GLOBAL_LON_SPAN,
            global_lat_span: DEFAULT_GLOBAL_LAT_SPAN,
            large_radius_m: DEFAULT_LARGE_RADIUS_M,
            prefer_standard_codes: true,
        }
    }
}

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for GeoProc
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub polar_lat: ConfigValue<f64>,
    pub local_extent_deg: ConfigValue<f64>,
    pub ew_ratio: ConfigValue<f64>,
    pub large_area_km2: ConfigValue<f64>,
    pub global_lon_span: ConfigValue<f64>,
    pub global_lat_span: ConfigValue<f64>,
    pub large_radius_m: ConfigValue<f64>,
    pub prefer_standard_codes: ConfigValue<bool>,
    pub auto_optimize_crs: ConfigValue<bool>,
    pub projection_metadata: ConfigValue<bool>,
    pub radius_unit: ConfigValue<DistanceUnit>,
    pub generator_model: ConfigValue<String>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let thresholds = DecisionThresholds::default();
        Self {
            polar_lat: ConfigValue::new(thresholds.polar_lat, ConfigSource::Default),
            local_extent_deg: ConfigValue::new(thresholds.local_extent_deg, ConfigSource::Default),
            ew_ratio: ConfigValue::new(thresholds.ew_ratio, ConfigSource::Default),
            large_area_km2: ConfigValue::new(thresholds.large_area_km2, ConfigSource::Default),
            global_lon_span: ConfigValue::new(thresholds.global_lon_span, ConfigSource::Default),
            global_lat_span: ConfigValue::new(thresholds.global_lat_span, ConfigSource::Default),
            large_radius_m: ConfigValue::new(thresholds.large_radius_m, ConfigSource::Default),
            prefer_standard_codes: ConfigValue::new(
                thresholds.prefer_standard_codes,
                ConfigSource::Default,
            ),
            auto_optimize_crs: ConfigValue::new(true, ConfigSource::Default),
            projection_metadata: ConfigValue::new(false, ConfigSource::Default),
            radius_unit: ConfigValue::new(DistanceUnit::Meters, ConfigSource::Default),
            generator_model: ConfigValue::new("llama3.1".to_string(), ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeoprocError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeoprocError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        let source = ConfigSource::File;
        if let Some(v) = file_config.polar_lat {
            self.polar_lat.update(v, source);
        }
        if let Some(v) = file_config.local_extent_deg {
            self.local_extent_deg.update(v, source);
        }
        if let Some(v) = file_config.ew_ratio {
            self.ew_ratio.update(v, source);
        }
        if let Some(v) = file_config.large_area_km2 {
            self.large_area_km2.update(v, source);
        }
        if let Some(v) = file_config.global_lon_span {
            self.global_lon_span.update(v, source);
        }
        if let Some(v) = file_config.global_lat_span {
            self.global_lat_span.update(v, source);
        }
        if let Some(v) = file_config.large_radius_m {
            self.large_radius_m.update(v, source);
        }
        if let Some(v) = file_config.prefer_standard_codes {
            self.prefer_standard_codes.update(v, source);
        }
        if let Some(v) = file_config.auto_optimize_crs {
            self.auto_optimize_crs.update(v, source);
        }
        if let Some(v) = file_config.projection_metadata {
            self.projection_metadata.update(v, source);
        }
        if let Some(unit) = file_config.radius_unit {
            self.radius_unit.update(parse_distance_unit(&unit)?, source);
        }
        if let Some(model) = file_config.generator_model {
            self.generator_model.update(model, source);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        let source = ConfigSource::Environment;

        for (name, target) in [
            ("GEOPROC_POLAR_LAT", &mut self.polar_lat),
            ("GEOPROC_LOCAL_EXTENT_DEG", &mut self.local_extent_deg),
            ("GEOPROC_EW_RATIO", &mut self.ew_ratio),
            ("GEOPROC_LARGE_AREA_KM2", &mut self.large_area_km2),
            ("GEOPROC_LARGE_RADIUS_M", &mut self.large_radius_m),
        ] {
            if let Ok(raw) = env::var(name) {
                match parse_positive_f64(&raw) {
                    Some(v) => target.update(v, source),
                    None => tracing::warn!(
                        "Invalid {} value '{}': expected a positive number",
                        name,
                        raw
                    ),
                }
            }
        }

        for (name, target) in [
            ("GEOPROC_PREFER_STANDARD_CODES", &mut self.prefer_standard_codes),
            ("GEOPROC_AUTO_OPTIMIZE_CRS", &mut self.auto_optimize_crs),
            ("GEOPROC_PROJECTION_METADATA", &mut self.projection_metadata),
        ] {
            if let Ok(raw) = env::var(name) {
                match parse_bool(&raw) {
                    Some(v) => target.update(v, source),
                    None => {
                        tracing::warn!("Invalid {} value '{}': expected true or false", name, raw)
                    }
                }
            }
        }

        if let Ok(unit_str) = env::var("GEOPROC_RADIUS_UNIT") {
            match parse_distance_unit(&unit_str) {
                Ok(unit) => self.radius_unit.update(unit, source),
                Err(_) => tracing::warn!(
                    "Invalid GEOPROC_RADIUS_UNIT value '{}': expected meters, kilometers, miles, or feet",
                    unit_str
                ),
            }
        }

        if let Ok(model) = env::var("GEOPROC_GENERATOR_MODEL") {
            self.generator_model.update(model, source);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        let source = ConfigSource::Cli;
        if let Some(v) = overrides.local_extent_deg {
            self.local_extent_deg.update(v, source);
        }
        if let Some(v) = overrides.large_radius_m {
            self.large_radius_m.update(v, source);
        }
        if let Some(v) = overrides.prefer_standard_codes {
            self.prefer_standard_codes.update(v, source);
        }
        if let Some(v) = overrides.auto_optimize_crs {
            self.auto_optimize_crs.update(v, source);
        }
        if let Some(v) = overrides.projection_metadata {
            self.projection_metadata.update(v, source);
        }
        if let Some(model) = overrides.generator_model {
            self.generator_model.update(model, source);
        }
    }

    /// Thresholds for the projection decider and buffer selector
    pub fn thresholds(&self) -> DecisionThresholds {
        DecisionThresholds {
            polar_lat: self.polar_lat.value,
            local_extent_deg: self.local_extent_deg.value,
            ew_ratio: self.ew_ratio.value,
            large_area_km2: self.large_area_km2.value,
            global_lon_span: self.global_lon_span.value,
            global_lat_span: self.global_lat_span.value,
            large_radius_m: self.large_radius_m.value,
            prefer_standard_codes: self.prefer_standard_codes.value,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        let mut insert = |key: &str, value: String, source: ConfigSource| {
            map.insert(key.to_string(), (value, source));
        };

        insert("polar_lat", self.polar_lat.value.to_string(), self.polar_lat.source);
        insert(
            "local_extent_deg",
            self.local_extent_deg.value.to_string(),
            self.local_extent_deg.source,
        );
        insert("ew_ratio", self.ew_ratio.value.to_string(), self.ew_ratio.source);
        insert("large_area_km2", self.large_area_km2.value.to_string(), self.large_area_km2.source);
        insert(
            "global_lon_span",
            self.global_lon_span.value.to_string(),
            self.global_lon_span.source,
        );
        insert(
            "global_lat_span",
            self.global_lat_span.value.to_string(),
            self.global_lat_span.source,
        );
        insert("large_radius_m", self.large_radius_m.value.to_string(), self.large_radius_m.source);
        insert(
            "prefer_standard_codes",
            self.prefer_standard_codes.value.to_string(),
            self.prefer_standard_codes.source,
        );
        insert(
            "auto_optimize_crs",
            self.auto_optimize_crs.value.to_string(),
            self.auto_optimize_crs.source,
        );
        insert(
            "projection_metadata",
            self.projection_metadata.value.to_string(),
            self.projection_metadata.source,
        );
        insert("radius_unit", format!("{:?}", self.radius_unit.value), self.radius_unit.source);
        insert("generator_model", self.generator_model.value.clone(), self.generator_model.source);

        map
    }

    /// Effective values as a TOML document that `load_from_file` reads back
    pub fn to_toml(&self) -> Result<String> {
        let file_config = FileConfig {
            polar_lat: Some(self.polar_lat.value),
            local_extent_deg: Some(self.local_extent_deg.value),
            ew_ratio: Some(self.ew_ratio.value),
            large_area_km2: Some(self.large_area_km2.value),
            global_lon_span: Some(self.global_lon_span.value),
            global_lat_span: Some(self.global_lat_span.value),
            large_radius_m: Some(self.large_radius_m.value),
            prefer_standard_codes: Some(self.prefer_standard_codes.value),
            auto_optimize_crs: Some(self.auto_optimize_crs.value),
            projection_metadata: Some(self.projection_metadata.value),
            radius_unit: Some(format!("{:?}", self.radius_unit.value).to_lowercase()),
            generator_model: Some(self.generator_model.value.clone()),
        };
        toml::to_string(&file_config).map_err(|e| GeoprocError::Serialization(e.to_string()))
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    polar_lat: Option<f64>,
    local_extent_deg: Option<f64>,
    ew_ratio: Option<f64>,
    large_area_km2: Option<f64>,
    global_lon_span: Option<f64>,
    global_lat_span: Option<f64>,
    large_radius_m: Option<f64>,
    prefer_standard_codes: Option<bool>,
    auto_optimize_crs: Option<bool>,
    projection_metadata: Option<bool>,
    radius_unit: Option<String>,
    generator_model: Option<String>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub local_extent_deg: Option<f64>,
    pub large_radius_m: Option<f64>,
    pub prefer_standard_codes: Option<bool>,
    pub auto_optimize_crs: Option<bool>,
    pub projection_metadata: Option<bool>,
    pub generator_model: Option<String>,
}

/// Parse distance unit from string
pub fn parse_distance_unit(s: &str) -> Result<DistanceUnit> {
    match s.trim().to_lowercase().as_str() {
        "meters" | "metres" | "meter" | "metre" | "m" => Ok(DistanceUnit::Meters),
        "kilometers" | "kilometres" | "kilometer" | "kilometre" | "km" => {
            Ok(DistanceUnit::Kilometers)
        }
        "miles" | "mile" | "mi" => Ok(DistanceUnit::Miles),
        "feet" | "foot" | "ft" => Ok(DistanceUnit::Feet),
        _ => Err(GeoprocError::ConfigInvalid {
            key: "distance_unit".to_string(),
            reason: format!("Invalid distance unit: {}. Use meters, kilometers, miles, or feet", s),
        }),
    }
}

/// Parse a boolean flag, accepting the usual spellings
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_positive_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.polar_lat.value, 80.0);
        assert_eq!(config.polar_lat.source, ConfigSource::Default);
        assert!(config.auto_optimize_crs.value);
        assert!(!config.projection_metadata.value);
        assert_eq!(config.thresholds(), DecisionThresholds::default());
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        // File should override default
        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        // Environment should override file
        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);
        assert_eq!(value.source, ConfigSource::Environment);

        // CLI should override environment
        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
local_extent_deg = 8.0
large_radius_m = 25000.0
prefer_standard_codes = false
radius_unit = "km"
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.local_extent_deg.value, 8.0);
        assert_eq!(config.local_extent_deg.source, ConfigSource::File);
        assert_eq!(config.large_radius_m.value, 25_000.0);
        assert!(!config.prefer_standard_codes.value);
        assert_eq!(config.radius_unit.value, DistanceUnit::Kilometers);
        assert_eq!(config.polar_lat.source, ConfigSource::Default);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            auto_optimize_crs: Some(false),
            projection_metadata: Some(true),
            ..Default::default()
        });

        assert!(!config.auto_optimize_crs.value);
        assert_eq!(config.auto_optimize_crs.source, ConfigSource::Cli);
        assert!(config.projection_metadata.value);
        assert_eq!(config.local_extent_deg.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_distance_unit() {
        assert_eq!(parse_distance_unit("meters").unwrap(), DistanceUnit::Meters);
        assert_eq!(parse_distance_unit("m").unwrap(), DistanceUnit::Meters);
        assert_eq!(parse_distance_unit("KILOMETERS").unwrap(), DistanceUnit::Kilometers);
        assert_eq!(parse_distance_unit("miles").unwrap(), DistanceUnit::Miles);
        assert!(parse_distance_unit("parsecs").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        assert!(map.contains_key("polar_lat"));
        assert!(map.contains_key("generator_model"));

        let (value, source) = &map["large_radius_m"];
        assert_eq!(value, "50000");
        assert_eq!(*source, ConfigSource::Default);
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = LayeredConfig::with_defaults();
        config.update_from_cli(CliConfigOverrides {
            large_radius_m: Some(12_000.0),
            generator_model: Some("mistral".to_string()),
            ..Default::default()
        });
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", config.to_toml().unwrap()).unwrap();

        let loaded = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();
        assert_eq!(loaded.large_radius_m.value, 12_000.0);
        assert_eq!(loaded.generator_model.value, "mistral");
        assert_eq!(loaded.radius_unit.value, DistanceUnit::Meters);
        assert_eq!(loaded.large_radius_m.source, ConfigSource::File);
    }
}
