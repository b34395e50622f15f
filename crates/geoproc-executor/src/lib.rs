//! GeoProc Executor - LLM-planned geoprocessing
//!
//! This crate turns a natural-language request into an operation plan with a
//! [`Generator`](geoproc_llm::Generator) and runs the plan step by step against the
//! operation library.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod plan;

pub use error::{ExecutorError, Result};
pub use models::{ExecutedStep, ExecutionResult, LayerSummary, OperationPlan, PlanStep};
pub use pipeline::{execute_plan, GeoprocessExecutor};
pub use plan::{parse_plan, plan_prompt};
