//! Config command implementation

use crate::cli::ConfigArgs;
use crate::config_loader::{config_path, DEFAULT_CONFIG_FILE};
use crate::output::OutputWriter;
use crate::output_types::ConfigRow;
use anyhow::Result;
use geoproc_core::config::LayeredConfig;
use std::path::Path;

pub fn execute(
    args: ConfigArgs,
    output: &OutputWriter,
    config: &LayeredConfig,
    explicit_file: Option<&Path>,
) -> Result<()> {
    if args.toml {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let mut rows: Vec<ConfigRow> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigRow::new(key, value, source))
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    if !output.is_json() {
        output.section("Effective Configuration");
        match config_path(explicit_file) {
            Some(path) => output.kv("Config file", path.display()),
            None => output.kv("Config file", format!("none ({} not found)", DEFAULT_CONFIG_FILE)),
        }
    }
    output.table(rows)
}
