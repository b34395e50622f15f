//! Error types for plan generation and execution

use geoproc_core::GeoprocError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Could not parse the operation plan: {reason}")]
    PlanParse { reason: String },

    #[error("Plan generation failed: {0}")]
    Generation(#[source] GeoprocError),

    #[error(transparent)]
    Operation(#[from] GeoprocError),
}

impl ExecutorError {
    pub fn plan_parse(reason: impl Into<String>) -> Self {
        ExecutorError::PlanParse { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, ExecutorError>;
