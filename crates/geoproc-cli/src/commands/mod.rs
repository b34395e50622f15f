//! Command implementations

mod config;
mod decide;
mod layers;
mod plan;
mod query;
mod run;
mod validate_crs;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config_with_overrides;
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config_with_overrides(&cli)?;

    match cli.command {
        Commands::Decide(args) => decide::execute(args, &output, &config),
        Commands::Run(args) => run::execute(args, &output, &config, cli.dry_run),
        Commands::Plan(args) => plan::execute(args, &output, &config, cli.dry_run),
        Commands::Query(args) => query::execute(args, &output, &config, cli.dry_run),
        Commands::ValidateCrs(args) => validate_crs::execute(args, &output),
        Commands::Config(args) => config::execute(args, &output, &config, cli.config.as_deref()),
    }
}
