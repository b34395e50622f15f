//! Decide command implementation

use crate::cli::DecideArgs;
use crate::errors::{invalid_priority, unknown_operation};
use crate::output::OutputWriter;
use crate::output_types::{DecideOutput, DecisionStepRow};
use anyhow::Result;
use geoproc_core::config::LayeredConfig;
use geoproc_core::models::{BoundingBox, OperationType, ProjectionProperty};
use geoproc_geo::ProjectionDecider;

pub fn execute(args: DecideArgs, output: &OutputWriter, config: &LayeredConfig) -> Result<()> {
    let operation = OperationType::from_name(&args.operation)
        .ok_or_else(|| unknown_operation(&args.operation, &OperationType::catalog()))?;
    let priority = args
        .priority
        .as_deref()
        .map(|p| ProjectionProperty::parse(p).ok_or_else(|| invalid_priority(p)))
        .transpose()?;

    let bbox = BoundingBox::from_array(args.bbox);
    let decider = ProjectionDecider::new(config.thresholds());
    let decision = decider.decide(&bbox, operation, priority);

    if output.is_json() {
        return output.result(DecideOutput::from(&decision));
    }

    output.section("Projection Decision");
    output.kv("Operation", operation);
    match decision.epsg_code() {
        Some(code) => output.kv("CRS", format!("EPSG:{} ({})", code, decision.crs_name)),
        None => output.kv("CRS", format!("{} (custom WKT)", decision.crs_name)),
    }
    output.kv("Property", decision.projection_property);
    output.kv("Reason", &decision.selection_reason);
    output.kv("Expected error", &decision.expected_error);
    if let Some(wkt) = decision.wkt() {
        output.section("WKT");
        println!("{}", wkt);
    }

    output.section("Decision Path");
    output.table(decision.decision_path.iter().map(DecisionStepRow::from).collect())
}
