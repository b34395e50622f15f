//! Plan prompt, plan parsing and parameter normalization.
//!
//! Planner output is untrusted text. Parsing tolerates code fences and the common
//! envelopes (`[...]`, `{"operations": [...]}`, `{"steps": [...]}`), while anything
//! that is not JSON at all is a [`ExecutorError::PlanParse`].

use crate::error::{ExecutorError, Result};
use crate::models::{LayerSummary, OperationPlan, PlanStep};
use geoproc_core::models::OperationType;
use serde_json::{Map, Value};
use tracing::warn;

const OVERLAY_MODES: [&str; 4] = ["union", "intersection", "difference", "symmetric_difference"];

/// Instruction prompt for the planner. Layer summaries travel separately as context.
pub fn plan_prompt(query: &str, catalog: &str) -> String {
    format!(
        "You are a GIS assistant that plans geoprocessing workflows.\n\
         The input layers are described above as JSON summaries.\n\
         Available operations:\n{catalog}\n\n\
         Respond with a JSON object {{\"operations\": [{{\"operation\": <name>, \"params\": {{...}}}}]}}. \
         Steps run in order and each step receives the output of the previous one; \
         the first step receives every input layer. Use only the operations listed. \
         To force a projection add \"crs\": \"EPSG:<code>\" to the params.\n\n\
         Request: {query}"
    )
}

/// Context lines for the generator, one JSON summary per layer
pub fn layer_context(summaries: &[LayerSummary]) -> Result<Vec<String>> {
    summaries
        .iter()
        .map(|s| serde_json::to_string(s).map_err(|e| ExecutorError::plan_parse(e.to_string())))
        .collect()
}

/// Drop a surrounding markdown code fence (with or without a language tag)
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // skip the info string, e.g. "json"
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse planner output into a plan.
///
/// Steps that are not objects or carry no operation name are dropped with a warning.
pub fn parse_plan(text: &str) -> Result<OperationPlan> {
    let body = strip_code_fences(text);
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ExecutorError::plan_parse(format!("{} in {:?}", e, truncate(body, 120))))?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let listed = ["operations", "steps", "plan"].iter().find_map(|key| map.remove(*key));
            match listed {
                Some(Value::Array(items)) => items,
                Some(other) => {
                    return Err(ExecutorError::plan_parse(format!(
                        "expected a list of steps, got {}",
                        other
                    )))
                }
                // a single bare step
                None if map.contains_key("operation") => vec![Value::Object(map)],
                None => {
                    return Err(ExecutorError::plan_parse(
                        "expected a list of steps or an object with an \"operations\" list",
                    ))
                }
            }
        }
        other => {
            return Err(ExecutorError::plan_parse(format!("expected a JSON plan, got {}", other)))
        }
    };

    let steps = items.into_iter().filter_map(step_from_value).collect();
    Ok(OperationPlan::new(steps))
}

fn step_from_value(value: Value) -> Option<PlanStep> {
    let mut map = match value {
        Value::Object(map) => map,
        other => {
            warn!(step = %other, "Skipping plan step that is not an object");
            return None;
        }
    };
    let operation = ["operation", "op", "name", "tool"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str).map(str::to_string));
    let Some(operation) = operation else {
        warn!(step = ?map, "Skipping plan step without an operation name");
        return None;
    };

    let explicit =
        ["params", "parameters", "args", "arguments"].iter().find_map(|key| map.remove(*key));
    let params = match explicit {
        Some(Value::Object(params)) => params,
        Some(_) | None => {
            // parameters written inline next to the operation name
            for key in ["operation", "op", "name", "tool"] {
                map.remove(key);
            }
            map
        }
    };
    Some(PlanStep::new(operation, params))
}

/// Resolve a step's operation and normalize its parameters.
///
/// `crs` becomes `override_crs`, and an explicit CRS always disables automatic
/// selection. An overlay-mode name (`union`, `intersection`, ...) becomes `overlay`
/// with `how` set. Returns `None` for unknown operations.
pub fn resolve_step(step: &PlanStep) -> Option<(OperationType, Map<String, Value>)> {
    let operation = OperationType::from_name(&step.operation)?;
    let mut params = normalize_params(step.params.clone());

    let normalized_name = step.operation.trim().to_lowercase().replace(['-', ' '], "_");
    if let Some(mode) = OVERLAY_MODES.iter().find(|m| **m == normalized_name) {
        params.entry("how").or_insert_with(|| Value::from(*mode));
    }
    Some((operation, params))
}

pub fn normalize_params(mut params: Map<String, Value>) -> Map<String, Value> {
    if let Some(crs) = params.remove("crs") {
        if !crs.is_null() && !has_value(&params, "override_crs") {
            params.insert("override_crs".to_string(), crs);
        }
    }
    if has_value(&params, "override_crs") {
        params.insert("auto_optimize_crs".to_string(), Value::Bool(false));
    }
    params
}

fn has_value(params: &Map<String, Value>, key: &str) -> bool {
    params.get(key).is_some_and(|v| !v.is_null())
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  [] "), "[]");
    }

    #[test]
    fn test_parse_envelopes() {
        let bare = parse_plan(r#"[{"operation": "buffer", "params": {"radius": 10}}]"#).unwrap();
        let wrapped =
            parse_plan(r#"{"operations": [{"operation": "buffer", "params": {"radius": 10}}]}"#)
                .unwrap();
        let steps = parse_plan(r#"{"steps": [{"operation": "buffer", "params": {"radius": 10}}]}"#)
            .unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare, steps);
        assert_eq!(bare.steps[0].params["radius"], 10);
    }

    #[test]
    fn test_parse_inline_params_and_single_step() {
        let plan = parse_plan(r#"{"operation": "simplify", "tolerance": 5}"#).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps[0].operation, "simplify");
        assert_eq!(plan.steps[0].params["tolerance"], 5);
        assert!(!plan.steps[0].params.contains_key("operation"));
    }

    #[test]
    fn test_malformed_steps_skipped() {
        let plan = parse_plan(r#"[42, {"params": {}}, {"op": "centroid"}]"#).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.steps[0].operation, "centroid");
    }

    #[test]
    fn test_invalid_json_is_plan_parse_error() {
        let err = parse_plan("Sure! First buffer the roads").unwrap_err();
        assert!(matches!(err, ExecutorError::PlanParse { .. }));
        assert!(matches!(parse_plan("\"buffer\"").unwrap_err(), ExecutorError::PlanParse { .. }));
        assert!(matches!(parse_plan(r#"{"result": 1}"#).unwrap_err(), ExecutorError::PlanParse { .. }));
    }

    #[test]
    fn test_crs_becomes_override() {
        let params = normalize_params(map(json!({"radius": 5, "crs": "EPSG:32633"})));
        assert_eq!(params["override_crs"], "EPSG:32633");
        assert_eq!(params["auto_optimize_crs"], false);
        assert!(!params.contains_key("crs"));
    }

    #[test]
    fn test_explicit_override_wins_and_disables_auto() {
        let params = normalize_params(map(json!({
            "crs": "EPSG:3857",
            "override_crs": "EPSG:2154",
            "auto_optimize_crs": true
        })));
        assert_eq!(params["override_crs"], "EPSG:2154");
        assert_eq!(params["auto_optimize_crs"], false);
    }

    #[test]
    fn test_params_without_crs_untouched() {
        let params = normalize_params(map(json!({"radius": 5})));
        assert_eq!(params, map(json!({"radius": 5})));
    }

    #[test]
    fn test_overlay_mode_alias() {
        let step = PlanStep::new("Intersection", Map::new());
        let (op, params) = resolve_step(&step).unwrap();
        assert_eq!(op, OperationType::Overlay);
        assert_eq!(params["how"], "intersection");

        let step = PlanStep::new("union", map(json!({"how": "difference"})));
        assert_eq!(resolve_step(&step).unwrap().1["how"], "difference");
        assert!(resolve_step(&PlanStep::new("teleport", Map::new())).is_none());
    }

    #[test]
    fn test_prompt_contains_request_and_catalog() {
        let prompt = plan_prompt("buffer the wells by 1 km", &OperationType::catalog());
        assert!(prompt.contains("buffer the wells by 1 km"));
        assert!(prompt.contains("sjoin_nearest"));
    }

    proptest! {
        #[test]
        fn test_normalized_crs_never_reoptimized(code in 1000u32..40000, radius in 0.0f64..1e6) {
            let params = normalize_params(map(json!({"crs": format!("EPSG:{}", code), "radius": radius})));
            prop_assert!(!params.contains_key("crs"));
            prop_assert_eq!(&params["auto_optimize_crs"], &Value::Bool(false));
            prop_assert_eq!(params["override_crs"].as_str(), Some(format!("EPSG:{}", code).as_str()));
        }
    }
}
