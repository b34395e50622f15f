//! Configuration loading utilities for CLI commands

use crate::cli::Cli;
use anyhow::{Context, Result};
use geoproc_core::config::{CliConfigOverrides, LayeredConfig};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "geoproc.toml";

/// Resolve the config file: an explicit path must exist, the default is optional
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.is_file().then_some(default)
        }
    }
}

/// Load layered configuration: defaults, file, environment
pub fn load_config(explicit: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = config_path(explicit) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }
    Ok(config.load_from_env())
}

/// Load layered configuration with the global CLI flags applied on top
pub fn load_config_with_overrides(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = load_config(cli.config.as_deref())?;
    config.update_from_cli(overrides(cli));
    Ok(config)
}

fn overrides(cli: &Cli) -> CliConfigOverrides {
    CliConfigOverrides {
        local_extent_deg: cli.local_extent_deg,
        large_radius_m: cli.large_radius_m,
        prefer_standard_codes: cli.prefer_standard_codes,
        auto_optimize_crs: cli.no_auto_crs.then_some(false),
        projection_metadata: cli.projection_metadata.then_some(true),
        generator_model: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use geoproc_core::config::ConfigSource;

    #[test]
    fn test_flags_become_cli_overrides() {
        let cli = Cli::try_parse_from([
            "geoproc",
            "--no-auto-crs",
            "--large-radius-m",
            "1000",
            "validate-crs",
            "EPSG:4326",
        ])
        .unwrap();
        let mut config = LayeredConfig::with_defaults();
        config.update_from_cli(overrides(&cli));
        assert!(!config.auto_optimize_crs.value);
        assert_eq!(config.auto_optimize_crs.source, ConfigSource::Cli);
        assert_eq!(config.large_radius_m.value, 1000.0);
        // absent flags leave lower layers alone
        assert_eq!(config.projection_metadata.source, ConfigSource::Default);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let missing = Path::new("/nonexistent/geoproc.toml");
        assert!(load_config(Some(missing)).is_err());
    }
}
