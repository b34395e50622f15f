//! Plan command implementation

use super::layers::{emit_result, read_layers};
use crate::cli::PlanArgs;
use crate::dry_run::{display_planned_steps, PlannedStep};
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use geoproc_core::config::LayeredConfig;
use geoproc_executor::{execute_plan, parse_plan};
use geoproc_ops::OperationLibrary;
use std::fs;
use tracing::info;

pub fn execute(
    args: PlanArgs,
    output: &OutputWriter,
    config: &LayeredConfig,
    dry_run: bool,
) -> Result<()> {
    let text = fs::read_to_string(&args.plan)
        .with_context(|| format!("Failed to read plan {}", args.plan.display()))?;
    let plan = parse_plan(&text)?;
    info!(steps = plan.len(), plan = %args.plan.display(), "Loaded operation plan");

    if dry_run {
        return display_planned_steps(output, &PlannedStep::resolve_all(&plan));
    }

    let layers = read_layers(&args.input)?;
    let library = OperationLibrary::from_config(config);
    let result = execute_plan(&library, &plan, layers)?;
    emit_result(output, &result, args.output.as_deref())
}
