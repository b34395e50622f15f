//! Run command implementation

use super::layers::{emit_result, read_layers};
use crate::cli::RunArgs;
use crate::dry_run::{display_planned_steps, PlannedStep};
use crate::errors::unknown_operation;
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use geoproc_core::config::LayeredConfig;
use geoproc_core::models::OperationType;
use geoproc_executor::{execute_plan, OperationPlan, PlanStep};
use geoproc_ops::OperationLibrary;
use serde_json::{Map, Value};

pub fn execute(
    args: RunArgs,
    output: &OutputWriter,
    config: &LayeredConfig,
    dry_run: bool,
) -> Result<()> {
    // unknown names are fatal here, unlike in generated plans
    if OperationType::from_name(&args.operation).is_none() {
        return Err(unknown_operation(&args.operation, &OperationType::catalog()).into());
    }
    let params = parse_params(args.params.as_deref())?;
    let plan = OperationPlan::new(vec![PlanStep::new(args.operation, params)]);

    if dry_run {
        return display_planned_steps(output, &PlannedStep::resolve_all(&plan));
    }

    let layers = read_layers(&args.input)?;
    let library = OperationLibrary::from_config(config);
    let result = execute_plan(&library, &plan, layers)?;
    emit_result(output, &result, args.output.as_deref())
}

fn parse_params(raw: Option<&str>) -> Result<Map<String, Value>> {
    let Some(raw) = raw else {
        return Ok(Map::new());
    };
    let value: Value = serde_json::from_str(raw).context("--params is not valid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => anyhow::bail!("--params must be a JSON object, got {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params() {
        let params = parse_params(Some(r#"{"radius": 500}"#)).unwrap();
        assert_eq!(params["radius"], 500);
        assert!(parse_params(None).unwrap().is_empty());
        assert!(parse_params(Some("[1, 2]")).is_err());
        assert!(parse_params(Some("{radius: 5}")).is_err());
    }
}
