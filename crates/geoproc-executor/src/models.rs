use geojson::{FeatureCollection, GeoJson};
use geoproc_core::error::Result;
use geoproc_core::models::OperationType;
use geoproc_geo::FeatureTable;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One step of an operation plan, as written by the planner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Operation name; aliases such as `spatial_join` or `union` are accepted
    pub operation: String,

    /// Raw parameters, normalized before execution
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl PlanStep {
    pub fn new(operation: impl Into<String>, params: Map<String, Value>) -> Self {
        Self { operation: operation.into(), params }
    }
}

/// Ordered list of steps; each step consumes the previous step's output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperationPlan {
    pub steps: Vec<PlanStep>,
}

impl OperationPlan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Lightweight description of an input layer, sent to the planner instead of the
/// full geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSummary {
    pub id: String,
    pub geometry_type: String,

    /// `[min_lon, min_lat, max_lon, max_lat]`; `min_lon > max_lon` across the antimeridian
    pub bbox: Option<[f64; 4]>,
    pub feature_count: usize,
}

impl LayerSummary {
    pub fn from_layer(id: impl Into<String>, layer: &GeoJson) -> Result<Self> {
        let table = FeatureTable::from_geojson(layer)?;
        Ok(Self {
            id: id.into(),
            geometry_type: table.geometry_type(),
            bbox: table.wrapped_bounds().map(|b| b.to_array()),
            feature_count: table.len(),
        })
    }

    /// Summaries named `layer_0`, `layer_1`, ... in input order
    pub fn summarize(layers: &[GeoJson]) -> Result<Vec<Self>> {
        layers
            .iter()
            .enumerate()
            .map(|(i, layer)| Self::from_layer(format!("layer_{}", i), layer))
            .collect()
    }
}

/// A step that actually ran
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutedStep {
    pub operation: OperationType,

    /// Parameters after normalization
    pub params: Map<String, Value>,
    pub input_layers: usize,
    pub output_layers: usize,
}

/// Outcome of running a plan
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Output of the last executed step, or the input when nothing ran
    pub layers: Vec<FeatureCollection>,

    /// Steps in execution order
    pub executed: Vec<ExecutedStep>,

    /// Operation names that could not be resolved
    pub skipped: Vec<String>,
}

impl ExecutionResult {
    /// Names of the executed operations, in order
    pub fn operation_sequence(&self) -> Vec<&'static str> {
        self.executed.iter().map(|s| s.operation.name()).collect()
    }
}
