//! Ordered, dependency-aware stage executor

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{Value as JsonValue, json};

use crate::orchestration::{
    PipelineContext, PipelineResult, STAGE_COMPLETE, STAGE_ERROR, Stage, StageFailure, StageResult,
    StageStatus,
};

/// Executes registered stages in declared order over a shared context
///
/// Failure policy comes from `ctx.config.continue_on_error`: when false
/// (the default) the first stage failure aborts the remaining stages;
/// when true, failures are collected per stage and execution continues.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stage(&mut self, stage: Arc<dyn Stage>) {
        tracing::debug!(stage = %stage.name(), order = stage.order(), "stage added");
        self.stages.push(stage);
    }

    pub fn get_stage(&self, name: &str) -> Option<Arc<dyn Stage>> {
        self.stages.iter().find(|s| s.name() == name).cloned()
    }

    pub fn has_stage(&self, name: &str) -> bool {
        self.stages.iter().any(|s| s.name() == name)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Run all stages. Skips (disabled stage, false predicate,
    /// incomplete dependency) are recorded distinctly from failures.
    pub async fn execute(&self, ctx: &mut PipelineContext) -> PipelineResult {
        let mut ordered: Vec<&Arc<dyn Stage>> = self.stages.iter().collect();
        ordered.sort_by_key(|s| s.order());

        let mut results = Vec::with_capacity(ordered.len());
        let mut errors = Vec::new();
        let mut completed: HashSet<String> = HashSet::new();
        let mut previous: Option<JsonValue> = None;

        for stage in ordered {
            let name = stage.name().to_string();

            if let Some(reason) = self.skip_reason(stage.as_ref(), ctx, &completed) {
                tracing::debug!(stage = %name, reason = %reason, "stage skipped");
                results.push(StageResult {
                    stage: name,
                    status: StageStatus::Skipped { reason },
                    output: None,
                    duration: std::time::Duration::ZERO,
                });
                continue;
            }

            tracing::debug!(stage = %name, "stage starting");
            let started = Instant::now();
            match stage.execute(previous.take(), ctx).await {
                Ok(output) => {
                    let duration = started.elapsed();
                    ctx.events.emit(
                        STAGE_COMPLETE,
                        json!({"stage": name, "duration_ms": duration.as_millis() as u64}),
                    );
                    completed.insert(name.clone());
                    previous = Some(output.clone());
                    results.push(StageResult {
                        stage: name,
                        status: StageStatus::Completed,
                        output: Some(output),
                        duration,
                    });
                }
                Err(error) => {
                    let duration = started.elapsed();
                    tracing::error!(stage = %name, error = %error, "stage failed");
                    ctx.events.emit(
                        STAGE_ERROR,
                        json!({"stage": name, "error": error.to_string()}),
                    );

                    // Cleanup hook runs before the policy decision; its
                    // own failure never replaces the original error.
                    if let Err(hook_error) = stage.on_error(&error, ctx).await {
                        tracing::warn!(stage = %name, error = %hook_error, "stage on_error hook failed");
                    }

                    results.push(StageResult {
                        stage: name.clone(),
                        status: StageStatus::Failed,
                        output: None,
                        duration,
                    });
                    errors.push(StageFailure { stage: name, error });

                    if !ctx.config.continue_on_error {
                        break;
                    }
                }
            }
        }

        PipelineResult {
            success: errors.is_empty(),
            stages: results,
            errors,
        }
    }

    fn skip_reason(
        &self,
        stage: &dyn Stage,
        ctx: &PipelineContext,
        completed: &HashSet<String>,
    ) -> Option<String> {
        if !stage.enabled() {
            return Some("disabled".to_string());
        }
        for dep in stage.dependencies() {
            if !completed.contains(&dep) {
                return Some(format!("dependency '{dep}' has not completed"));
            }
        }
        if !stage.can_execute(ctx) {
            return Some("can_execute returned false".to_string());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::{EventBus, GeneratorConfig, GeneratorError, ServiceRegistry};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct TestStage {
        name: String,
        order: i32,
        enabled: bool,
        deps: Vec<String>,
        executable: bool,
        fail: bool,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl TestStage {
        fn new(name: &str, order: i32, log: &Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                order,
                enabled: true,
                deps: Vec::new(),
                executable: true,
                fail: false,
                log: Arc::clone(log),
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn disabled(mut self) -> Self {
            self.enabled = false;
            self
        }

        fn not_executable(mut self) -> Self {
            self.executable = false;
            self
        }

        fn depends_on(mut self, dep: &str) -> Self {
            self.deps.push(dep.to_string());
            self
        }
    }

    #[async_trait]
    impl Stage for TestStage {
        fn name(&self) -> &str {
            &self.name
        }

        fn order(&self) -> i32 {
            self.order
        }

        fn enabled(&self) -> bool {
            self.enabled
        }

        fn dependencies(&self) -> Vec<String> {
            self.deps.clone()
        }

        fn can_execute(&self, _ctx: &PipelineContext) -> bool {
            self.executable
        }

        async fn execute(
            &self,
            _input: Option<JsonValue>,
            _ctx: &mut PipelineContext,
        ) -> Result<JsonValue, GeneratorError> {
            self.log.lock().unwrap().push(format!("run:{}", self.name));
            if self.fail {
                return Err(GeneratorError::StageFailed {
                    stage: self.name.clone(),
                    message: "boom".into(),
                });
            }
            Ok(json!({"stage": self.name}))
        }

        async fn on_error(
            &self,
            _error: &GeneratorError,
            _ctx: &PipelineContext,
        ) -> Result<(), GeneratorError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("on_error:{}", self.name));
            Ok(())
        }
    }

    fn context(continue_on_error: bool) -> PipelineContext {
        let mut config = GeneratorConfig::new("test-site");
        config.continue_on_error = continue_on_error;
        PipelineContext::new(
            Uuid::new_v4(),
            config,
            EventBus::new(),
            Arc::new(ServiceRegistry::new()),
        )
    }

    #[tokio::test]
    async fn stages_run_in_order_ascending() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(Arc::new(TestStage::new("write", 20, &log)));
        pipeline.add_stage(Arc::new(TestStage::new("parse", 0, &log)));
        pipeline.add_stage(Arc::new(TestStage::new("render", 10, &log)));

        let mut ctx = context(false);
        let result = pipeline.execute(&mut ctx).await;

        assert!(result.success);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["run:parse", "run:render", "run:write"]
        );
    }

    #[tokio::test]
    async fn strict_policy_stops_after_first_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(Arc::new(TestStage::new("first", 0, &log)));
        pipeline.add_stage(Arc::new(TestStage::new("breaks", 1, &log).failing()));
        pipeline.add_stage(Arc::new(TestStage::new("never", 2, &log)));

        let mut ctx = context(false);
        let result = pipeline.execute(&mut ctx).await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].stage, "breaks");
        assert_eq!(result.stages.len(), 2);
        assert!(!log.lock().unwrap().contains(&"run:never".to_string()));
        // on_error hook ran before the abort decision
        assert!(log.lock().unwrap().contains(&"on_error:breaks".to_string()));
    }

    #[tokio::test]
    async fn lenient_policy_collects_every_failure() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(Arc::new(TestStage::new("a", 0, &log).failing()));
        pipeline.add_stage(Arc::new(TestStage::new("b", 1, &log)));
        pipeline.add_stage(Arc::new(TestStage::new("c", 2, &log).failing()));

        let mut ctx = context(true);
        let result = pipeline.execute(&mut ctx).await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 2);
        let failed: Vec<&str> = result.errors.iter().map(|e| e.stage.as_str()).collect();
        assert_eq!(failed, vec!["a", "c"]);
        assert_eq!(result.stages.len(), 3);
    }

    #[tokio::test]
    async fn disabled_and_unexecutable_stages_are_skipped_not_failed() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(Arc::new(TestStage::new("off", 0, &log).disabled()));
        pipeline.add_stage(Arc::new(TestStage::new("guarded", 1, &log).not_executable()));
        pipeline.add_stage(Arc::new(TestStage::new("runs", 2, &log)));

        let mut ctx = context(false);
        let result = pipeline.execute(&mut ctx).await;

        assert!(result.success);
        assert!(result.errors.is_empty());
        assert!(result.stages[0].status.is_skipped());
        assert!(result.stages[1].status.is_skipped());
        assert!(result.stages[2].status.is_completed());
        assert_eq!(*log.lock().unwrap(), vec!["run:runs"]);
    }

    #[tokio::test]
    async fn dependency_on_a_failed_stage_skips_the_dependent() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(Arc::new(TestStage::new("base", 0, &log).failing()));
        pipeline.add_stage(Arc::new(TestStage::new("child", 1, &log).depends_on("base")));

        let mut ctx = context(true);
        let result = pipeline.execute(&mut ctx).await;

        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        match &result.stages[1].status {
            StageStatus::Skipped { reason } => assert!(reason.contains("base")),
            other => panic!("expected skip, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn stage_events_are_emitted() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(Arc::new(TestStage::new("ok", 0, &log)));
        pipeline.add_stage(Arc::new(TestStage::new("bad", 1, &log).failing()));

        let mut ctx = context(true);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_complete = Arc::clone(&seen);
        ctx.events.on(STAGE_COMPLETE, move |payload| {
            seen_complete
                .lock()
                .unwrap()
                .push(format!("complete:{}", payload["stage"].as_str().unwrap()));
        });
        let seen_error = Arc::clone(&seen);
        ctx.events.on(STAGE_ERROR, move |payload| {
            seen_error
                .lock()
                .unwrap()
                .push(format!("error:{}", payload["stage"].as_str().unwrap()));
        });

        pipeline.execute(&mut ctx).await;
        assert_eq!(*seen.lock().unwrap(), vec!["complete:ok", "error:bad"]);
    }

    #[tokio::test]
    async fn previous_output_is_threaded_to_the_next_stage() {
        struct Producer;
        struct Consumer {
            log: Arc<Mutex<Vec<String>>>,
        }

        #[async_trait]
        impl Stage for Producer {
            fn name(&self) -> &str {
                "producer"
            }
            async fn execute(
                &self,
                _input: Option<JsonValue>,
                _ctx: &mut PipelineContext,
            ) -> Result<JsonValue, GeneratorError> {
                Ok(json!("payload"))
            }
        }

        #[async_trait]
        impl Stage for Consumer {
            fn name(&self) -> &str {
                "consumer"
            }
            fn order(&self) -> i32 {
                1
            }
            async fn execute(
                &self,
                input: Option<JsonValue>,
                _ctx: &mut PipelineContext,
            ) -> Result<JsonValue, GeneratorError> {
                self.log
                    .lock()
                    .unwrap()
                    .push(input.unwrap().as_str().unwrap().to_string());
                Ok(JsonValue::Null)
            }
        }

        let log = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        pipeline.add_stage(Arc::new(Producer));
        pipeline.add_stage(Arc::new(Consumer {
            log: Arc::clone(&log),
        }));

        let mut ctx = context(false);
        pipeline.execute(&mut ctx).await;
        assert_eq!(*log.lock().unwrap(), vec!["payload"]);
    }
}
