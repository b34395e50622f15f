//! Query command implementation

use super::layers::{emit_result, read_layers};
use crate::cli::QueryArgs;
use crate::dry_run::{display_planned_steps, PlannedStep};
use crate::interactive::{confirm_plan, is_interactive, prompt_query};
use crate::output::OutputWriter;
use crate::progress::{create_spinner, finish_error, finish_success, hidden};
use anyhow::{bail, Result};
use geoproc_core::config::LayeredConfig;
use geoproc_executor::GeoprocessExecutor;
use geoproc_llm::OllamaGenerator;
use geoproc_ops::OperationLibrary;

pub fn execute(
    args: QueryArgs,
    output: &OutputWriter,
    config: &LayeredConfig,
    dry_run: bool,
) -> Result<()> {
    let query = match args.query {
        Some(query) if !args.interactive => query,
        _ => prompt_query()?,
    };
    let layers = read_layers(&args.input)?;

    let model = args.model.unwrap_or_else(|| config.generator_model.value.clone());
    let generator = OllamaGenerator::new(&args.url, model.as_str());
    let executor = GeoprocessExecutor::new(generator, OperationLibrary::from_config(config));

    let spinner = if output.is_json() {
        hidden()
    } else {
        create_spinner(&format!("Planning with {}...", model))
    };
    let plan = match executor.plan(&query, &layers) {
        Ok(plan) => {
            finish_success(&spinner, &format!("Planned {} steps", plan.len()));
            plan
        }
        Err(e) => {
            finish_error(&spinner, "Planning failed");
            return Err(e.into());
        }
    };

    let planned = PlannedStep::resolve_all(&plan);
    if dry_run {
        return display_planned_steps(output, &planned);
    }

    let ask = !args.yes && !output.is_json() && is_interactive();
    if ask {
        let rows = planned.iter().enumerate().map(|(i, s)| s.row(i + 1)).collect();
        if !confirm_plan(rows)? {
            bail!("Plan not executed");
        }
    }

    let result = executor.execute_plan(&plan, layers)?;
    emit_result(output, &result, args.output.as_deref())
}
