//! Integration tests for layered configuration
//!
//! These tests verify that configuration loading follows the correct precedence:
//! CLI arguments > Environment variables > Config file > Defaults

use geoproc_core::config::{CliConfigOverrides, ConfigSource, DecisionThresholds, LayeredConfig};
use geoproc_core::models::DistanceUnit;
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

fn clear_env() {
    for name in [
        "GEOPROC_POLAR_LAT",
        "GEOPROC_LOCAL_EXTENT_DEG",
        "GEOPROC_EW_RATIO",
        "GEOPROC_LARGE_AREA_KM2",
        "GEOPROC_LARGE_RADIUS_M",
        "GEOPROC_PREFER_STANDARD_CODES",
        "GEOPROC_AUTO_OPTIMIZE_CRS",
        "GEOPROC_PROJECTION_METADATA",
        "GEOPROC_RADIUS_UNIT",
        "GEOPROC_GENERATOR_MODEL",
    ] {
        env::remove_var(name);
    }
}

#[test]
fn test_default_configuration() {
    let config = LayeredConfig::with_defaults();

    assert_eq!(config.thresholds(), DecisionThresholds::default());
    assert_eq!(config.radius_unit.value, DistanceUnit::Meters);
    assert_eq!(config.radius_unit.source, ConfigSource::Default);
    assert_eq!(config.generator_model.source, ConfigSource::Default);
}

#[test]
fn test_partial_file_configuration() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
ew_ratio = 3.0
# Only override the EW ratio, leave others as defaults
"#
    )
    .unwrap();

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.ew_ratio.value, 3.0);
    assert_eq!(config.ew_ratio.source, ConfigSource::File);
    assert_eq!(config.polar_lat.value, 80.0);
    assert_eq!(config.polar_lat.source, ConfigSource::Default);
}

#[test]
fn test_invalid_file_is_an_error() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ew_ratio = \"very wide\"").unwrap();

    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    let result = LayeredConfig::with_defaults().load_from_file("/nonexistent/geoproc.toml");
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_env_overrides_file() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "large_radius_m = 10000.0\nauto_optimize_crs = true").unwrap();

    env::set_var("GEOPROC_LARGE_RADIUS_M", "75000");
    env::set_var("GEOPROC_AUTO_OPTIMIZE_CRS", "false");

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.large_radius_m.value, 75_000.0);
    assert_eq!(config.large_radius_m.source, ConfigSource::Environment);
    assert!(!config.auto_optimize_crs.value);
    assert_eq!(config.auto_optimize_crs.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_env_values_are_ignored() {
    clear_env();
    env::set_var("GEOPROC_POLAR_LAT", "north");
    env::set_var("GEOPROC_PROJECTION_METADATA", "perhaps");
    env::set_var("GEOPROC_RADIUS_UNIT", "leagues");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.polar_lat.value, 80.0);
    assert_eq!(config.polar_lat.source, ConfigSource::Default);
    assert_eq!(config.projection_metadata.source, ConfigSource::Default);
    assert_eq!(config.radius_unit.value, DistanceUnit::Meters);

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    env::set_var("GEOPROC_GENERATOR_MODEL", "mistral");

    let mut config = LayeredConfig::with_defaults().load_from_env();
    assert_eq!(config.generator_model.value, "mistral");

    config.update_from_cli(CliConfigOverrides {
        generator_model: Some("qwen2.5".to_string()),
        ..Default::default()
    });

    assert_eq!(config.generator_model.value, "qwen2.5");
    assert_eq!(config.generator_model.source, ConfigSource::Cli);

    clear_env();
}
