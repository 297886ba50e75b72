//! Pipeline stage contract and per-stage result types

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::orchestration::{GeneratorError, PipelineContext};

/// One ordered unit of pipeline work
///
/// Stages form a DAG by declared dependency names; execution order is
/// primarily `order` ascending, and a stage never runs before its
/// declared dependencies have completed. Stages are registered at
/// orchestrator-setup time and are immutable for a given run.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    /// Primary sort key, ascending. Ties keep registration order.
    fn order(&self) -> i32 {
        0
    }

    fn enabled(&self) -> bool {
        true
    }

    /// Names of stages that must have completed before this one runs.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// A stage returning false here is skipped, not failed.
    fn can_execute(&self, _ctx: &PipelineContext) -> bool {
        true
    }

    /// `input` is the previous executed stage's output; durable
    /// cross-stage data should flow through the context data bag.
    async fn execute(
        &self,
        input: Option<JsonValue>,
        ctx: &mut PipelineContext,
    ) -> Result<JsonValue, GeneratorError>;

    /// Invoked on this stage's failure before the continue-on-error
    /// policy is applied; its own failure never overrides the original
    /// error.
    async fn on_error(
        &self,
        _error: &GeneratorError,
        _ctx: &PipelineContext,
    ) -> Result<(), GeneratorError> {
        Ok(())
    }
}

/// Outcome of one stage within a pipeline run
#[derive(Debug)]
pub enum StageStatus {
    Completed,
    Skipped { reason: String },
    Failed,
}

impl StageStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, StageStatus::Completed)
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, StageStatus::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, StageStatus::Failed)
    }
}

/// Per-stage record carried on the pipeline and generator results
#[derive(Debug)]
pub struct StageResult {
    pub stage: String,
    pub status: StageStatus,
    pub output: Option<JsonValue>,
    pub duration: Duration,
}

/// A stage failure with its originating stage name
#[derive(Debug)]
pub struct StageFailure {
    pub stage: String,
    pub error: GeneratorError,
}

/// Aggregate outcome of one pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    pub success: bool,
    pub stages: Vec<StageResult>,
    pub errors: Vec<StageFailure>,
}
