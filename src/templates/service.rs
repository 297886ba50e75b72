//! Template rendering as a pipeline service and stage

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::orchestration::{GeneratorError, PipelineContext, Service, Stage};
use crate::templates::engine::ValidationReport;
use crate::templates::nodes::TemplateNode;
use crate::templates::registry::{EngineRegistry, TemplateEngineKind};
use crate::templates::renderer::render_document;

/// Registry name of the template render service.
pub const TEMPLATE_RENDER_SERVICE: &str = "template-renderer";
/// Context data key the render stage reads its input trees from.
pub const TEMPLATES_DATA_KEY: &str = "templates";
/// Context data key the render stage stores its output under.
pub const RENDERED_DATA_KEY: &str = "rendered";

/// One named node tree to render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedTemplate {
    pub name: String,
    pub nodes: Vec<TemplateNode>,
}

#[derive(Debug, Deserialize)]
struct RenderRequest {
    #[serde(default)]
    engine: Option<TemplateEngineKind>,
    templates: Vec<NamedTemplate>,
}

#[derive(Debug, Serialize)]
struct RenderedEntry {
    name: String,
    output: String,
    warnings: Vec<String>,
    valid: bool,
    errors: Vec<String>,
}

/// Renders annotated node trees through the engine registry
///
/// The engine kind comes from the request, falling back to the kind
/// configured for the run (captured at `initialize` time).
pub struct TemplateRenderService {
    engines: EngineRegistry,
    default_kind: Mutex<TemplateEngineKind>,
}

impl TemplateRenderService {
    pub fn new(engines: EngineRegistry) -> Self {
        Self {
            engines,
            default_kind: Mutex::new(TemplateEngineKind::default()),
        }
    }

    fn default_kind(&self) -> TemplateEngineKind {
        match self.default_kind.lock() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

impl Default for TemplateRenderService {
    fn default() -> Self {
        Self::new(EngineRegistry::new())
    }
}

#[async_trait]
impl Service for TemplateRenderService {
    fn name(&self) -> &str {
        TEMPLATE_RENDER_SERVICE
    }

    fn version(&self) -> &str {
        "0.1.0"
    }

    async fn initialize(&self, ctx: &PipelineContext) -> Result<(), GeneratorError> {
        let kind = ctx.config.engine;
        if !self.engines.has_engine(kind) {
            return Err(GeneratorError::UnsupportedEngine(kind.to_string()));
        }
        match self.default_kind.lock() {
            Ok(mut guard) => *guard = kind,
            Err(poisoned) => *poisoned.into_inner() = kind,
        }
        tracing::debug!(engine = %kind, "template render service initialized");
        Ok(())
    }

    async fn execute(&self, input: JsonValue) -> Result<JsonValue, GeneratorError> {
        let request: RenderRequest = serde_json::from_value(input)?;
        let kind = request.engine.unwrap_or_else(|| self.default_kind());
        let engine = self.engines.get(kind)?;

        let mut entries = Vec::with_capacity(request.templates.len());
        for template in &request.templates {
            let rendered = render_document(engine.as_ref(), &template.nodes);
            let ValidationReport { valid, errors } = engine.validate(&rendered.output);
            tracing::debug!(
                template = %template.name,
                engine = %kind,
                warnings = rendered.warnings.len(),
                valid,
                "template rendered"
            );
            entries.push(RenderedEntry {
                name: template.name.clone(),
                output: rendered.output,
                warnings: rendered.warnings,
                valid,
                errors,
            });
        }

        Ok(json!({
            "engine": kind,
            "extension": engine.file_extension(),
            "templates": entries,
        }))
    }
}

/// Stage that feeds the data bag's template trees through the render
/// service and stores the result back for downstream stages
pub struct TemplateRenderStage {
    order: i32,
}

impl TemplateRenderStage {
    pub fn new(order: i32) -> Self {
        Self { order }
    }
}

#[async_trait]
impl Stage for TemplateRenderStage {
    fn name(&self) -> &str {
        "render-templates"
    }

    fn order(&self) -> i32 {
        self.order
    }

    fn can_execute(&self, ctx: &PipelineContext) -> bool {
        ctx.has_data(TEMPLATES_DATA_KEY)
    }

    async fn execute(
        &self,
        _input: Option<JsonValue>,
        ctx: &mut PipelineContext,
    ) -> Result<JsonValue, GeneratorError> {
        let templates = ctx
            .get_data(TEMPLATES_DATA_KEY)
            .cloned()
            .ok_or_else(|| GeneratorError::Render("no templates in pipeline context".into()))?;

        let service = ctx.services.resolve(TEMPLATE_RENDER_SERVICE)?;
        let output = service
            .execute(json!({
                "engine": ctx.config.engine,
                "templates": templates,
            }))
            .await?;

        ctx.set_data(RENDERED_DATA_KEY, output.clone());
        Ok(output)
    }
}
