use geoproc_core::config::ConfigSource;
use geoproc_core::models::{DecisionStep, ProjectionDecision};
use geoproc_executor::{ExecutedStep, LayerSummary};
use serde::Serialize;
use serde_json::Value;
use tabled::Tabled;

/// Output for decide command
#[derive(Debug, Serialize)]
pub struct DecideOutput {
    pub epsg_code: Option<u32>,
    pub wkt: Option<String>,
    pub crs_name: String,
    pub projection_property: String,
    pub selection_reason: String,
    pub expected_error: String,
    pub decision_path: Vec<DecisionStep>,
}

impl From<&ProjectionDecision> for DecideOutput {
    fn from(decision: &ProjectionDecision) -> Self {
        Self {
            epsg_code: decision.epsg_code(),
            wkt: decision.wkt().map(str::to_string),
            crs_name: decision.crs_name.clone(),
            projection_property: decision.projection_property.to_string(),
            selection_reason: decision.selection_reason.clone(),
            expected_error: decision.expected_error.clone(),
            decision_path: decision.decision_path.clone(),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct DecisionStepRow {
    #[tabled(rename = "Rule")]
    pub rule: String,
    #[tabled(rename = "Fired")]
    pub fired: String,
    #[tabled(rename = "Detail")]
    pub detail: String,
}

impl From<&DecisionStep> for DecisionStepRow {
    fn from(step: &DecisionStep) -> Self {
        Self {
            rule: step.rule.as_str().to_string(),
            fired: if step.fired { "yes" } else { "-" }.to_string(),
            detail: step.detail.clone(),
        }
    }
}

/// Summary of one output layer
#[derive(Debug, Serialize, Tabled)]
pub struct LayerRow {
    #[tabled(rename = "Layer")]
    pub id: String,
    #[tabled(rename = "Geometry")]
    pub geometry_type: String,
    #[tabled(rename = "Features")]
    pub feature_count: usize,
    #[tabled(rename = "BBox")]
    pub bbox: String,
}

impl From<&LayerSummary> for LayerRow {
    fn from(summary: &LayerSummary) -> Self {
        Self {
            id: summary.id.clone(),
            geometry_type: summary.geometry_type.clone(),
            feature_count: summary.feature_count,
            bbox: summary
                .bbox
                .map(|b| format!("{:.4}, {:.4}, {:.4}, {:.4}", b[0], b[1], b[2], b[3]))
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct StepRow {
    #[tabled(rename = "#")]
    pub index: usize,
    #[tabled(rename = "Operation")]
    pub operation: String,
    #[tabled(rename = "Params")]
    pub params: String,
    #[tabled(rename = "Layers")]
    pub layers: String,
}

impl StepRow {
    pub fn executed(index: usize, step: &ExecutedStep) -> Self {
        Self {
            index,
            operation: step.operation.to_string(),
            params: Value::Object(step.params.clone()).to_string(),
            layers: format!("{} -> {}", step.input_layers, step.output_layers),
        }
    }
}

/// Output for run, plan and query commands
#[derive(Debug, Serialize)]
pub struct ExecutionOutput {
    pub executed: Vec<ExecutedStep>,
    pub skipped: Vec<String>,
    pub layers: Vec<LayerSummary>,
    pub written: Vec<String>,
}

/// Output for validate-crs command
#[derive(Debug, Serialize)]
pub struct ValidateCrsOutput {
    pub code: String,
    pub valid: bool,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

impl ConfigRow {
    pub fn new(key: String, value: String, source: ConfigSource) -> Self {
        Self { key, value, source: format!("{:?}", source) }
    }
}
