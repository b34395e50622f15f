use crate::output::OutputWriter;
use crate::output_types::StepRow;
use geoproc_executor::plan::resolve_step;
use geoproc_executor::OperationPlan;
use serde::Serialize;
use serde_json::{Map, Value};

/// A step as it would run, after name resolution and parameter normalization
#[derive(Debug, Clone, Serialize)]
pub struct PlannedStep {
    pub operation: String,
    pub runnable: bool,
    pub params: Map<String, Value>,
}

impl PlannedStep {
    pub fn resolve_all(plan: &OperationPlan) -> Vec<PlannedStep> {
        plan.steps
            .iter()
            .map(|step| match resolve_step(step) {
                Some((operation, params)) => PlannedStep {
                    operation: operation.name().to_string(),
                    runnable: true,
                    params,
                },
                None => PlannedStep {
                    operation: step.operation.clone(),
                    runnable: false,
                    params: step.params.clone(),
                },
            })
            .collect()
    }

    pub fn row(&self, index: usize) -> StepRow {
        StepRow {
            index,
            operation: if self.runnable {
                self.operation.clone()
            } else {
                format!("{} (skipped)", self.operation)
            },
            params: Value::Object(self.params.clone()).to_string(),
            layers: "-".to_string(),
        }
    }
}

/// Display planned steps in dry-run mode
pub fn display_planned_steps(output: &OutputWriter, steps: &[PlannedStep]) -> anyhow::Result<()> {
    if output.is_json() {
        output.result(serde_json::json!({
            "dry_run": true,
            "planned_steps": steps,
        }))?;
    } else {
        output.section("Planned Steps (Dry Run)");
        output.table(steps.iter().enumerate().map(|(i, s)| s.row(i + 1)).collect())?;
        output.info("No operation was run. Drop --dry-run to execute the plan.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoproc_executor::parse_plan;

    #[test]
    fn test_resolve_marks_unknown_steps() {
        let plan = parse_plan(
            r#"[{"operation": "spatial_join", "params": {"crs": "EPSG:3035"}}, {"operation": "teleport"}]"#,
        )
        .unwrap();
        let steps = PlannedStep::resolve_all(&plan);
        assert_eq!(steps[0].operation, "sjoin");
        assert!(steps[0].runnable);
        assert_eq!(steps[0].params["override_crs"], "EPSG:3035");
        assert!(!steps[1].runnable);
        assert!(steps[1].row(2).operation.contains("skipped"));
    }

    #[test]
    fn test_planned_step_serialization() {
        let step = PlannedStep { operation: "area".to_string(), runnable: true, params: Map::new() };
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"runnable\":true"));
    }
}
