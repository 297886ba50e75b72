//! Engine adapter contract

use crate::templates::nodes::{
    BlockNode, ConditionNode, ExtendsNode, IncludeNode, LoopNode, SlotNode, VariableNode,
};

/// Capability set declared by each engine
///
/// Engines must not fail a render over an unsupported feature; they
/// warn on the [`RenderSession`] and produce the best degraded
/// substitute instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineFeatures {
    pub supports_inheritance: bool,
    pub supports_partials: bool,
    pub supports_filters: bool,
    pub supports_macros: bool,
    pub supports_async: bool,
    pub supports_raw: bool,
    pub supports_comments: bool,
}

/// Formats filter arguments into engine-specific syntax
pub type ArgFormatter = fn(&[String]) -> String;

/// Maps a standard filter name onto an engine-native filter
#[derive(Clone)]
pub struct FilterMapping {
    pub name: &'static str,
    pub format_args: Option<ArgFormatter>,
}

impl FilterMapping {
    pub fn plain(name: &'static str) -> Self {
        Self {
            name,
            format_args: None,
        }
    }

    pub fn with_args(name: &'static str, format_args: ArgFormatter) -> Self {
        Self {
            name,
            format_args: Some(format_args),
        }
    }
}

/// Per-render accumulator for non-fatal warnings
///
/// Engines are stateless across renders; everything mutable during one
/// render invocation lives here, keeping adapters reentrant and safely
/// shareable.
#[derive(Debug, Default)]
pub struct RenderSession {
    warnings: Vec<String>,
}

impl RenderSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(warning = %message, "template render warning");
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}

/// Rendered output plus the warnings collected while producing it
#[derive(Debug, Clone)]
pub struct RenderedTemplate {
    pub output: String,
    pub warnings: Vec<String>,
}

/// Outcome of the post-render structural sanity check
///
/// Mismatches are reported as human-readable strings, not errors; this
/// is a balance check, not a parser.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Renders the annotated node vocabulary into one target template
/// syntax
///
/// Each render function is pure string production: it receives the
/// node plus its already-rendered children and returns the engine-
/// specific text. Child content is rendered by the tree walker in
/// [`renderer`](crate::templates::renderer), never by the engine
/// itself.
pub trait TemplateEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn version(&self) -> &'static str;

    /// Extension of emitted template files (e.g. `liquid`, `hbs`).
    fn file_extension(&self) -> &'static str;

    fn features(&self) -> EngineFeatures;

    /// Standard filter name to engine filter, if mapped.
    fn filter_mapping(&self, standard: &str) -> Option<&FilterMapping>;

    fn render_loop(&self, node: &LoopNode, body: &str, session: &mut RenderSession) -> String;

    /// `branches` holds the rendered body of each condition branch,
    /// aligned with `node.branches`; `else_body` is the rendered else
    /// arm when present.
    fn render_condition(
        &self,
        node: &ConditionNode,
        branches: &[String],
        else_body: Option<&str>,
        session: &mut RenderSession,
    ) -> String;

    fn render_variable(&self, node: &VariableNode, session: &mut RenderSession) -> String;

    fn render_slot(&self, node: &SlotNode, fallback: &str, session: &mut RenderSession) -> String;

    fn render_include(&self, node: &IncludeNode, session: &mut RenderSession) -> String;

    fn render_block(&self, node: &BlockNode, body: &str, session: &mut RenderSession) -> String;

    fn render_comment(&self, text: &str, session: &mut RenderSession) -> String;

    fn render_extends(&self, node: &ExtendsNode, session: &mut RenderSession) -> String;

    /// Apply a standard filter to an expression. Unmapped filter names
    /// pass through verbatim as engine-native syntax.
    fn apply_filter(&self, expression: &str, filter: &str, args: &[String]) -> String;

    /// Normalize source-style boolean/comparison operators into the
    /// engine's vocabulary.
    fn format_expression(&self, expression: &str, session: &mut RenderSession) -> String;

    /// Structural balance check over a fully rendered document.
    fn validate(&self, output: &str) -> ValidationReport;
}
