use crate::error::{ExecutorError, Result};
use crate::models::{ExecutedStep, ExecutionResult, LayerSummary, OperationPlan};
use crate::plan::{layer_context, parse_plan, plan_prompt, resolve_step};
use geojson::GeoJson;
use geoproc_core::models::OperationType;
use geoproc_llm::Generator;
use geoproc_ops::{OperationLibrary, Params};
use tracing::{debug, info, warn};

/// Geoprocess executor orchestrating planning and execution
pub struct GeoprocessExecutor<G>
where
    G: Generator,
{
    generator: G,
    library: OperationLibrary,
}

impl<G> GeoprocessExecutor<G>
where
    G: Generator,
{
    /// Create a new executor
    pub fn new(generator: G, library: OperationLibrary) -> Self {
        Self { generator, library }
    }

    pub fn library(&self) -> &OperationLibrary {
        &self.library
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Ask the generator for a plan answering `query` over `layers`
    pub fn plan(&self, query: &str, layers: &[GeoJson]) -> Result<OperationPlan> {
        let summaries = LayerSummary::summarize(layers)?;
        let context = layer_context(&summaries)?;
        let context: Vec<&str> = context.iter().map(String::as_str).collect();
        let prompt = plan_prompt(query, &OperationType::catalog());

        info!(model = self.generator.model_name(), layers = summaries.len(), "Requesting operation plan");
        let response =
            self.generator.generate(&prompt, &context).map_err(ExecutorError::Generation)?;
        debug!(response = %response, "Planner response");

        let plan = parse_plan(&response)?;
        info!(steps = plan.len(), "Parsed operation plan");
        Ok(plan)
    }

    /// Run an already parsed plan
    pub fn execute_plan(&self, plan: &OperationPlan, layers: Vec<GeoJson>) -> Result<ExecutionResult> {
        execute_plan(&self.library, plan, layers)
    }

    /// Plan and execute in one go
    pub fn run(&self, query: &str, layers: Vec<GeoJson>) -> Result<ExecutionResult> {
        let plan = self.plan(query, &layers)?;
        self.execute_plan(&plan, layers)
    }
}

/// Execute `plan` step by step, feeding each step's output to the next.
///
/// Unknown operations are skipped. The first failing operation aborts the run.
pub fn execute_plan(
    library: &OperationLibrary,
    plan: &OperationPlan,
    layers: Vec<GeoJson>,
) -> Result<ExecutionResult> {
    let mut current = layers;
    let mut result = ExecutionResult::default();

    for (index, step) in plan.steps.iter().enumerate() {
        let Some((operation, params)) = resolve_step(step) else {
            warn!(step = index, operation = %step.operation, "Skipping unknown operation");
            result.skipped.push(step.operation.clone());
            continue;
        };

        let input_layers = current.len();
        debug!(step = index, %operation, input_layers, "Executing plan step");
        let output = library.execute(operation, &current, &Params::new(params.clone()))?;
        info!(step = index, %operation, input_layers, output_layers = output.len(), "Plan step finished");

        result.executed.push(ExecutedStep {
            operation,
            params,
            input_layers,
            output_layers: output.len(),
        });
        current = output.into_iter().map(GeoJson::FeatureCollection).collect();
    }

    result.layers = current
        .into_iter()
        .map(|layer| match layer {
            GeoJson::FeatureCollection(fc) => fc,
            GeoJson::Feature(feature) => geojson::FeatureCollection {
                bbox: None,
                features: vec![feature],
                foreign_members: None,
            },
            GeoJson::Geometry(geometry) => geojson::FeatureCollection {
                bbox: None,
                features: vec![geojson::Feature::from(geometry)],
                foreign_members: None,
            },
        })
        .collect();
    Ok(result)
}
