//! Port interface for lifecycle-managed services

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::orchestration::{GeneratorError, PipelineContext};

/// A named, versioned, dependency-ordered unit of work owned by the
/// [`ServiceRegistry`](crate::orchestration::ServiceRegistry).
///
/// Services are registered once, resolved by name from stages during
/// pipeline execution, initialized in dependency order at the start of
/// a run, and disposed exactly once (reverse order) at the end,
/// whether or not the run succeeded.
#[async_trait]
pub trait Service: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Names of services that must be initialized before this one.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    async fn initialize(&self, _ctx: &PipelineContext) -> Result<(), GeneratorError> {
        Ok(())
    }

    async fn execute(&self, input: JsonValue) -> Result<JsonValue, GeneratorError>;

    /// Best-effort cleanup. Failures are logged by the registry and
    /// never mask the run's primary outcome.
    async fn dispose(&self) -> Result<(), GeneratorError> {
        Ok(())
    }
}
