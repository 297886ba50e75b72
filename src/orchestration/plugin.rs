//! Plugin contract for contributing services, stages, and hooks

use std::sync::Arc;

use async_trait::async_trait;

use crate::orchestration::{GeneratorConfig, GeneratorError, GeneratorResult, Service, Stage};

/// A named, versioned bundle contributed to an
/// [`Orchestrator`](crate::orchestration::Orchestrator)
///
/// Services and stages returned from `services()`/`stages()` are
/// registered at `use_plugin` time and become indistinguishable from
/// directly-registered ones. Hooks run in plugin registration order;
/// plugins have no inter-plugin dependency concept.
#[async_trait]
pub trait GeneratorPlugin: Send + Sync {
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn services(&self) -> Vec<Arc<dyn Service>> {
        Vec::new()
    }

    fn stages(&self) -> Vec<Arc<dyn Stage>> {
        Vec::new()
    }

    /// Awaited at the start of `generate()`, before the before-hook
    /// chain. A failure converts the run into a failed result.
    async fn setup(&self, _config: &GeneratorConfig) -> Result<(), GeneratorError> {
        Ok(())
    }

    /// Best-effort counterpart to `setup`, awaited at the end of the
    /// run whether it succeeded or failed; failures are logged, never
    /// propagated.
    async fn teardown(&self) -> Result<(), GeneratorError> {
        Ok(())
    }

    /// May replace or mutate the config. Each plugin receives the
    /// previous plugin's output, forming a single mutation chain.
    async fn on_before_generate(
        &self,
        config: GeneratorConfig,
    ) -> Result<GeneratorConfig, GeneratorError> {
        Ok(config)
    }

    /// Runs after a successful pipeline pass. The first failing hook
    /// aborts the remaining after-hooks and flips the run to failed.
    async fn on_after_generate(&self, _result: &GeneratorResult) -> Result<(), GeneratorError> {
        Ok(())
    }

    /// Notified when the run fails at the orchestrator level.
    /// Infallible by design so a broken error handler cannot mask the
    /// original error.
    async fn on_error(&self, _error: &GeneratorError) {}
}
