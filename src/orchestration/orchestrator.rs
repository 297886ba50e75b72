//! Top-level coordinator for generation runs

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::orchestration::{
    EventBus, GENERATOR_COMPLETE, GENERATOR_ERROR, GENERATOR_START, GeneratorConfig,
    GeneratorError, GeneratorPlugin, ListenerId, Pipeline, PipelineContext, PipelineResult,
    RegistryError, SERVICE_REGISTERED, Service, ServiceRegistry, Stage, StageFailure, StageResult,
};

/// Aggregate outcome of one `generate()` call
///
/// Always returned, never thrown: callers inspect `success` and
/// `errors` rather than catching exceptions for expected failures. An
/// orchestrator-level failure (hook or lifecycle error) carries a
/// single error record with stage name `orchestrator`, distinct from
/// pipeline-internal partial failures which carry one record per
/// failing stage.
#[derive(Debug)]
pub struct GeneratorResult {
    pub success: bool,
    pub stages: Vec<StageResult>,
    pub duration: Duration,
    pub errors: Vec<StageFailure>,
    pub config: GeneratorConfig,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
}

impl GeneratorResult {
    fn from_pipeline(
        run_id: Uuid,
        config: GeneratorConfig,
        pipeline: PipelineResult,
        duration: Duration,
    ) -> Self {
        Self {
            success: pipeline.success,
            stages: pipeline.stages,
            duration,
            errors: pipeline.errors,
            config,
            run_id,
            generated_at: Utc::now(),
        }
    }

    fn failed(
        run_id: Uuid,
        config: GeneratorConfig,
        error: GeneratorError,
        duration: Duration,
    ) -> Self {
        Self {
            success: false,
            stages: Vec::new(),
            duration,
            errors: vec![StageFailure {
                stage: "orchestrator".to_string(),
                error,
            }],
            config,
            run_id,
            generated_at: Utc::now(),
        }
    }
}

/// Coordinates plugins, services, and pipeline stages into a single
/// `generate()` lifecycle
///
/// The registry, event bus, and pipeline live as long as the
/// orchestrator; the pipeline context is rebuilt for each run. Repeated
/// `generate()` calls on one instance are unsupported: the second call
/// returns a failed result without touching registered services.
#[derive(Default)]
pub struct Orchestrator {
    services: Arc<ServiceRegistry>,
    pipeline: Pipeline,
    events: EventBus,
    plugins: Vec<Arc<dyn GeneratorPlugin>>,
    has_generated: bool,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin along with its contributed services and
    /// stages. Returns `&mut Self` for chaining.
    pub fn use_plugin(
        &mut self,
        plugin: Arc<dyn GeneratorPlugin>,
    ) -> Result<&mut Self, GeneratorError> {
        tracing::info!(plugin = %plugin.name(), version = %plugin.version(), "plugin registered");
        for service in plugin.services() {
            self.register_service(service)?;
        }
        for stage in plugin.stages() {
            self.add_stage(stage);
        }
        self.plugins.push(plugin);
        Ok(self)
    }

    pub fn register_service(&mut self, service: Arc<dyn Service>) -> Result<(), GeneratorError> {
        let name = service.name().to_string();
        let version = service.version().to_string();
        self.services.register(service)?;
        self.events.emit(
            SERVICE_REGISTERED,
            json!({"service": name, "version": version}),
        );
        Ok(())
    }

    pub fn has_service(&self, name: &str) -> bool {
        self.services.has(name)
    }

    pub fn get_service(&self, name: &str) -> Result<Arc<dyn Service>, RegistryError> {
        self.services.resolve(name)
    }

    pub fn add_stage(&mut self, stage: Arc<dyn Stage>) {
        self.pipeline.add_stage(stage);
    }

    pub fn has_stage(&self, name: &str) -> bool {
        self.pipeline.has_stage(name)
    }

    pub fn on<F>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&serde_json::Value) + Send + Sync + 'static,
    {
        self.events.on(event, handler)
    }

    pub fn event_bus(&self) -> EventBus {
        self.events.clone()
    }

    /// Run the full generation lifecycle: plugin setup and
    /// before-hooks, service initialization, pipeline execution,
    /// service disposal (always attempted), after-hooks, teardown.
    pub async fn generate(&mut self, config: GeneratorConfig) -> GeneratorResult {
        let run_id = Uuid::new_v4();
        let started = Instant::now();

        if self.has_generated {
            tracing::warn!("generate() called twice on one orchestrator; runs are single-use");
            return GeneratorResult::failed(
                run_id,
                config,
                GeneratorError::AlreadyGenerated,
                started.elapsed(),
            );
        }
        self.has_generated = true;

        tracing::info!(run_id = %run_id, project = %config.project_name, "generation started");
        self.events
            .emit(GENERATOR_START, json!({"run_id": run_id.to_string()}));

        let outcome = self.run_lifecycle(run_id, config.clone()).await;

        // Disposal is attempted on both paths; its failures are logged
        // inside the registry and never mask the primary outcome.
        self.services.dispose_all().await;

        let mut result = match outcome {
            Ok((pipeline_result, final_config)) => GeneratorResult::from_pipeline(
                run_id,
                final_config,
                pipeline_result,
                started.elapsed(),
            ),
            Err(error) => {
                for plugin in &self.plugins {
                    plugin.on_error(&error).await;
                }
                tracing::error!(run_id = %run_id, error = %error, "generation failed");
                self.events.emit(
                    GENERATOR_ERROR,
                    json!({"run_id": run_id.to_string(), "error": error.to_string()}),
                );
                let result = GeneratorResult::failed(run_id, config, error, started.elapsed());
                self.run_teardowns().await;
                self.finish(&result, started);
                return result;
            }
        };

        // After-hooks typically persist or finalize output, so the
        // first failing hook aborts the rest and fails the run.
        for plugin in &self.plugins {
            if let Err(error) = plugin.on_after_generate(&result).await {
                tracing::error!(plugin = %plugin.name(), error = %error, "after-generate hook failed");
                let hook_error = GeneratorError::PluginHook {
                    plugin: plugin.name().to_string(),
                    hook: "after-generate".to_string(),
                    message: error.to_string(),
                };
                self.events.emit(
                    GENERATOR_ERROR,
                    json!({"run_id": run_id.to_string(), "error": hook_error.to_string()}),
                );
                result.success = false;
                result.errors.push(StageFailure {
                    stage: "orchestrator".to_string(),
                    error: hook_error,
                });
                break;
            }
        }

        self.run_teardowns().await;

        result.duration = started.elapsed();
        self.finish(&result, started);
        result
    }

    async fn run_lifecycle(
        &self,
        run_id: Uuid,
        config: GeneratorConfig,
    ) -> Result<(PipelineResult, GeneratorConfig), GeneratorError> {
        for plugin in &self.plugins {
            plugin
                .setup(&config)
                .await
                .map_err(|e| GeneratorError::PluginHook {
                    plugin: plugin.name().to_string(),
                    hook: "setup".to_string(),
                    message: e.to_string(),
                })?;
        }

        // Before-hooks form a single mutation chain: each plugin sees
        // the previous plugin's config, not the original.
        let mut config = config;
        for plugin in &self.plugins {
            config =
                plugin
                    .on_before_generate(config)
                    .await
                    .map_err(|e| GeneratorError::PluginHook {
                        plugin: plugin.name().to_string(),
                        hook: "before-generate".to_string(),
                        message: e.to_string(),
                    })?;
        }
        config.validate()?;

        let mut ctx = PipelineContext::new(
            run_id,
            config.clone(),
            self.events.clone(),
            Arc::clone(&self.services),
        );
        self.services.initialize_all(&ctx).await?;

        let pipeline_result = self.pipeline.execute(&mut ctx).await;
        Ok((pipeline_result, config))
    }

    /// Teardown runs on success and failure alike, mirroring the
    /// disposal guarantee for services.
    async fn run_teardowns(&self) {
        for plugin in &self.plugins {
            if let Err(error) = plugin.teardown().await {
                tracing::warn!(plugin = %plugin.name(), error = %error, "plugin teardown failed; continuing");
            }
        }
    }

    fn finish(&self, result: &GeneratorResult, started: Instant) {
        self.events.emit(
            GENERATOR_COMPLETE,
            json!({
                "run_id": result.run_id.to_string(),
                "success": result.success,
                "duration_ms": started.elapsed().as_millis() as u64,
            }),
        );
        if result.success {
            tracing::info!(
                run_id = %result.run_id,
                stages = result.stages.len(),
                duration_ms = result.duration.as_millis() as u64,
                "generation complete"
            );
        } else {
            tracing::warn!(
                run_id = %result.run_id,
                errors = result.errors.len(),
                duration_ms = result.duration.as_millis() as u64,
                "generation completed with errors"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::STAGE_COMPLETE;
    use async_trait::async_trait;
    use serde_json::Value as JsonValue;
    use std::sync::Mutex;

    struct NoopService {
        name: String,
        log: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Service for NoopService {
        fn name(&self) -> &str {
            &self.name
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        async fn execute(&self, input: JsonValue) -> Result<JsonValue, GeneratorError> {
            Ok(input)
        }
        async fn dispose(&self) -> Result<(), GeneratorError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("dispose:{}", self.name));
            Ok(())
        }
    }

    struct SuffixPlugin {
        name: String,
        suffix: String,
        fail_after: bool,
    }

    #[async_trait]
    impl GeneratorPlugin for SuffixPlugin {
        fn name(&self) -> &str {
            &self.name
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        async fn on_before_generate(
            &self,
            mut config: GeneratorConfig,
        ) -> Result<GeneratorConfig, GeneratorError> {
            config.project_name = format!("{}{}", config.project_name, self.suffix);
            Ok(config)
        }
        async fn on_after_generate(&self, _result: &GeneratorResult) -> Result<(), GeneratorError> {
            if self.fail_after {
                return Err(GeneratorError::Render("publish failed".into()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct HookRecorder {
        log: Arc<Mutex<Vec<String>>>,
        fail_setup: bool,
        fail_before: bool,
        fail_teardown: bool,
    }

    impl HookRecorder {
        fn record(&self, hook: &str) {
            self.log.lock().unwrap().push(hook.to_string());
        }
    }

    #[async_trait]
    impl GeneratorPlugin for HookRecorder {
        fn name(&self) -> &str {
            "recorder"
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        async fn setup(&self, _config: &GeneratorConfig) -> Result<(), GeneratorError> {
            self.record("setup");
            if self.fail_setup {
                return Err(GeneratorError::Render("setup exploded".into()));
            }
            Ok(())
        }
        async fn teardown(&self) -> Result<(), GeneratorError> {
            self.record("teardown");
            if self.fail_teardown {
                return Err(GeneratorError::Render("teardown exploded".into()));
            }
            Ok(())
        }
        async fn on_before_generate(
            &self,
            config: GeneratorConfig,
        ) -> Result<GeneratorConfig, GeneratorError> {
            self.record("before");
            if self.fail_before {
                return Err(GeneratorError::InvalidConfiguration("no theme".into()));
            }
            Ok(config)
        }
        async fn on_error(&self, _error: &GeneratorError) {
            self.record("on_error");
        }
    }

    struct FailingBeforePlugin;

    #[async_trait]
    impl GeneratorPlugin for FailingBeforePlugin {
        fn name(&self) -> &str {
            "broken"
        }
        fn version(&self) -> &str {
            "0.1.0"
        }
        async fn on_before_generate(
            &self,
            _config: GeneratorConfig,
        ) -> Result<GeneratorConfig, GeneratorError> {
            Err(GeneratorError::InvalidConfiguration("no theme".into()))
        }
    }

    struct EchoStage;

    #[async_trait]
    impl Stage for EchoStage {
        fn name(&self) -> &str {
            "echo"
        }
        async fn execute(
            &self,
            _input: Option<JsonValue>,
            ctx: &mut PipelineContext,
        ) -> Result<JsonValue, GeneratorError> {
            Ok(json!({"project": ctx.config.project_name}))
        }
    }

    #[tokio::test]
    async fn before_hooks_chain_config_mutations_in_registration_order() {
        let mut orchestrator = Orchestrator::new();
        orchestrator
            .use_plugin(Arc::new(SuffixPlugin {
                name: "one".into(),
                suffix: "-a".into(),
                fail_after: false,
            }))
            .unwrap()
            .use_plugin(Arc::new(SuffixPlugin {
                name: "two".into(),
                suffix: "-b".into(),
                fail_after: false,
            }))
            .unwrap();
        orchestrator.add_stage(Arc::new(EchoStage));

        let result = orchestrator.generate(GeneratorConfig::new("site")).await;

        assert!(result.success);
        assert_eq!(result.config.project_name, "site-a-b");
        // The stage observed the fully-mutated config.
        assert_eq!(
            result.stages[0].output.as_ref().unwrap()["project"],
            json!("site-a-b")
        );
    }

    #[tokio::test]
    async fn before_hook_failure_yields_single_orchestrator_error_and_disposes() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut orchestrator = Orchestrator::new();
        orchestrator
            .register_service(Arc::new(NoopService {
                name: "assets".into(),
                log: Arc::clone(&log),
            }))
            .unwrap();
        orchestrator.use_plugin(Arc::new(FailingBeforePlugin)).unwrap();
        orchestrator.add_stage(Arc::new(EchoStage));

        let result = orchestrator.generate(GeneratorConfig::new("site")).await;

        assert!(!result.success);
        assert!(result.stages.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].stage, "orchestrator");
        // Disposal is attempted even though the pipeline never ran.
        assert_eq!(*log.lock().unwrap(), vec!["dispose:assets"]);
    }

    #[tokio::test]
    async fn after_hook_failure_flips_success_but_keeps_stage_results() {
        let mut orchestrator = Orchestrator::new();
        orchestrator
            .use_plugin(Arc::new(SuffixPlugin {
                name: "publisher".into(),
                suffix: "".into(),
                fail_after: true,
            }))
            .unwrap();
        orchestrator.add_stage(Arc::new(EchoStage));

        let result = orchestrator.generate(GeneratorConfig::new("site")).await;

        assert!(!result.success);
        assert_eq!(result.stages.len(), 1);
        assert!(result.stages[0].status.is_completed());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].stage, "orchestrator");
    }

    #[tokio::test]
    async fn setup_failure_fails_the_run_and_still_tears_down() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut orchestrator = Orchestrator::new();
        orchestrator
            .use_plugin(Arc::new(HookRecorder {
                log: Arc::clone(&log),
                fail_setup: true,
                ..HookRecorder::default()
            }))
            .unwrap();
        orchestrator.add_stage(Arc::new(EchoStage));

        let result = orchestrator.generate(GeneratorConfig::new("site")).await;

        assert!(!result.success);
        assert!(result.stages.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].stage, "orchestrator");
        assert_eq!(*log.lock().unwrap(), vec!["setup", "on_error", "teardown"]);
    }

    #[tokio::test]
    async fn failed_before_hook_still_reaches_teardown() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut orchestrator = Orchestrator::new();
        orchestrator
            .use_plugin(Arc::new(HookRecorder {
                log: Arc::clone(&log),
                fail_before: true,
                ..HookRecorder::default()
            }))
            .unwrap();

        let result = orchestrator.generate(GeneratorConfig::new("site")).await;

        assert!(!result.success);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["setup", "before", "on_error", "teardown"]
        );
    }

    #[tokio::test]
    async fn teardown_failure_is_logged_not_propagated() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut orchestrator = Orchestrator::new();
        orchestrator
            .use_plugin(Arc::new(HookRecorder {
                log: Arc::clone(&log),
                fail_teardown: true,
                ..HookRecorder::default()
            }))
            .unwrap();
        orchestrator.add_stage(Arc::new(EchoStage));

        let result = orchestrator.generate(GeneratorConfig::new("site")).await;

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert_eq!(*log.lock().unwrap(), vec!["setup", "before", "teardown"]);
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn second_generate_call_is_rejected() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.add_stage(Arc::new(EchoStage));

        let first = orchestrator.generate(GeneratorConfig::new("site")).await;
        assert!(first.success);

        let second = orchestrator.generate(GeneratorConfig::new("site")).await;
        assert!(!second.success);
        assert!(matches!(
            second.errors[0].error,
            GeneratorError::AlreadyGenerated
        ));
    }

    #[tokio::test]
    async fn lifecycle_events_are_emitted_in_order() {
        let mut orchestrator = Orchestrator::new();
        orchestrator.add_stage(Arc::new(EchoStage));

        let seen = Arc::new(Mutex::new(Vec::new()));
        for event in [GENERATOR_START, STAGE_COMPLETE, GENERATOR_COMPLETE] {
            let seen = Arc::clone(&seen);
            orchestrator.on(event, move |_| {
                seen.lock().unwrap().push(event);
            });
        }

        orchestrator.generate(GeneratorConfig::new("site")).await;
        assert_eq!(
            *seen.lock().unwrap(),
            vec![GENERATOR_START, STAGE_COMPLETE, GENERATOR_COMPLETE]
        );
    }
}
