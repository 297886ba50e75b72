//! Handlebars engine adapter

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::templates::engine::{
    EngineFeatures, FilterMapping, RenderSession, TemplateEngine, ValidationReport,
};
use crate::templates::nodes::{
    BlockNode, ConditionNode, ExtendsNode, IncludeNode, LoopNode, SlotNode, VariableNode,
};
use crate::templates::validate::{TagPair, check_delimiters, check_tag_pairs};

const INFIX_OPERATORS: &[&str] = &["&&", "||", "===", "!==", "!"];

static TAG_PAIRS: Lazy<Vec<TagPair>> = Lazy::new(|| {
    vec![
        TagPair::new("if", r"\{\{#if\b", r"\{\{/if\}"),
        TagPair::new("each", r"\{\{#each\b", r"\{\{/each\}"),
        TagPair::new("unless", r"\{\{#unless\b", r"\{\{/unless\}"),
        TagPair::new("inline", r"\{\{#\*inline\b", r"\{\{/inline\}"),
    ]
});

/// Renders the annotated node tree into Handlebars syntax
///
/// Filters become helper calls; defaulted variables render as an
/// if/else chain since Handlebars has no `default` builtin. Plain
/// Handlebars has neither template inheritance nor infix boolean
/// operators, so both degrade with a render warning.
pub struct HandlebarsEngine {
    helpers: HashMap<&'static str, FilterMapping>,
}

impl HandlebarsEngine {
    pub fn new() -> Self {
        let mut helpers = HashMap::new();
        helpers.insert("currency", FilterMapping::plain("formatCurrency"));
        helpers.insert("uppercase", FilterMapping::plain("uppercase"));
        helpers.insert("lowercase", FilterMapping::plain("lowercase"));
        helpers.insert("capitalize", FilterMapping::plain("capitalize"));
        helpers.insert("date", FilterMapping::plain("formatDate"));
        helpers.insert("json", FilterMapping::plain("json"));
        helpers.insert("length", FilterMapping::plain("length"));
        Self { helpers }
    }
}

impl Default for HandlebarsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for HandlebarsEngine {
    fn name(&self) -> &'static str {
        "handlebars"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn file_extension(&self) -> &'static str {
        "hbs"
    }

    fn features(&self) -> EngineFeatures {
        EngineFeatures {
            supports_inheritance: false,
            supports_partials: true,
            supports_filters: true,
            supports_macros: false,
            supports_async: false,
            supports_raw: true,
            supports_comments: true,
        }
    }

    fn filter_mapping(&self, standard: &str) -> Option<&FilterMapping> {
        self.helpers.get(standard)
    }

    fn render_loop(&self, node: &LoopNode, body: &str, _session: &mut RenderSession) -> String {
        format!(
            "{{{{#each {} as |{}|}}}}\n{}\n{{{{/each}}}}",
            node.collection, node.item, body
        )
    }

    fn render_condition(
        &self,
        node: &ConditionNode,
        branches: &[String],
        else_body: Option<&str>,
        session: &mut RenderSession,
    ) -> String {
        if node.branches.is_empty() {
            session.warn("condition node has no branches; nothing rendered");
            return String::new();
        }

        let mut out = String::new();
        for (index, (branch, body)) in node.branches.iter().zip(branches).enumerate() {
            let test = self.format_expression(&branch.test, session);
            if index == 0 {
                out.push_str(&format!("{{{{#if {test}}}}}\n"));
            } else {
                out.push_str(&format!("{{{{else if {test}}}}}\n"));
            }
            out.push_str(body);
            out.push('\n');
        }
        if let Some(else_body) = else_body {
            out.push_str("{{else}}\n");
            out.push_str(else_body);
            out.push('\n');
        }
        out.push_str("{{/if}}");
        out
    }

    fn render_variable(&self, node: &VariableNode, _session: &mut RenderSession) -> String {
        let name = &node.name;
        let expr = match &node.filter {
            Some(filter) => self.apply_filter(name, &filter.name, &filter.args),
            None => name.clone(),
        };
        match &node.default {
            // No default builtin; fall back through an if/else chain.
            Some(default) => {
                format!("{{{{#if {name}}}}}{{{{{expr}}}}}{{{{else}}}}{default}{{{{/if}}}}")
            }
            None => format!("{{{{{expr}}}}}"),
        }
    }

    fn render_slot(&self, node: &SlotNode, fallback: &str, _session: &mut RenderSession) -> String {
        let name = &node.name;
        if fallback.is_empty() {
            format!("{{{{{name}}}}}")
        } else {
            format!("{{{{#if {name}}}}}{{{{{name}}}}}{{{{else}}}}{fallback}{{{{/if}}}}")
        }
    }

    fn render_include(&self, node: &IncludeNode, _session: &mut RenderSession) -> String {
        let mut out = format!("{{{{> {}", node.template);
        for (key, value) in &node.props {
            out.push_str(&format!(" {key}={value}"));
        }
        out.push_str("}}");
        out
    }

    fn render_block(&self, node: &BlockNode, body: &str, _session: &mut RenderSession) -> String {
        format!(
            "{{{{#*inline \"{}\"}}}}\n{}\n{{{{/inline}}}}",
            node.name, body
        )
    }

    fn render_comment(&self, text: &str, _session: &mut RenderSession) -> String {
        format!("{{{{!-- {text} --}}}}")
    }

    fn render_extends(&self, node: &ExtendsNode, session: &mut RenderSession) -> String {
        session.warn(format!(
            "handlebars does not support template inheritance; 'extends {}' rendered as a comment",
            node.parent
        ));
        format!("{{{{!-- extends {} --}}}}", node.parent)
    }

    fn apply_filter(&self, expression: &str, filter: &str, args: &[String]) -> String {
        let name = match self.filter_mapping(filter) {
            Some(mapping) => mapping.name,
            None => filter,
        };
        let mut out = format!("{name} {expression}");
        for arg in args {
            out.push_str(&format!(" \"{arg}\""));
        }
        out
    }

    fn format_expression(&self, expression: &str, session: &mut RenderSession) -> String {
        if INFIX_OPERATORS.iter().any(|op| expression.contains(op)) {
            session.warn(format!(
                "handlebars has no infix boolean operators; expression '{expression}' passed through"
            ));
        }
        expression.to_string()
    }

    fn validate(&self, output: &str) -> ValidationReport {
        let mut errors = check_tag_pairs(output, &TAG_PAIRS);
        if let Some(error) = check_delimiters(output, "{{", "}}") {
            errors.push(error);
        }
        ValidationReport::from_errors(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> HandlebarsEngine {
        HandlebarsEngine::new()
    }

    #[test]
    fn renders_an_each_loop() {
        let node = LoopNode {
            item: "dish".into(),
            collection: "menu".into(),
            body: vec![],
        };
        let mut session = RenderSession::new();
        assert_eq!(
            engine().render_loop(&node, "BODY", &mut session),
            "{{#each menu as |dish|}}\nBODY\n{{/each}}"
        );
    }

    #[test]
    fn variable_with_default_renders_if_else() {
        let node = VariableNode {
            name: "title".into(),
            default: Some("Untitled".into()),
            filter: None,
        };
        let mut session = RenderSession::new();
        assert_eq!(
            engine().render_variable(&node, &mut session),
            "{{#if title}}{{title}}{{else}}Untitled{{/if}}"
        );
    }

    #[test]
    fn filters_become_helper_calls() {
        assert_eq!(
            engine().apply_filter("price", "currency", &[]),
            "formatCurrency price"
        );
        assert_eq!(
            engine().apply_filter("posted", "date", &["%Y".into()]),
            "formatDate posted \"%Y\""
        );
    }

    #[test]
    fn infix_operators_warn_and_pass_through() {
        let mut session = RenderSession::new();
        let output = engine().format_expression("a && b", &mut session);
        assert_eq!(output, "a && b");
        assert_eq!(session.warnings().len(), 1);
    }

    #[test]
    fn extends_degrades_to_a_comment_with_a_warning() {
        let mut session = RenderSession::new();
        let output = engine().render_extends(
            &ExtendsNode {
                parent: "base".into(),
            },
            &mut session,
        );
        assert_eq!(output, "{{!-- extends base --}}");
        assert_eq!(session.warnings().len(), 1);
    }

    #[test]
    fn comments_use_block_comment_syntax() {
        let mut session = RenderSession::new();
        assert_eq!(
            engine().render_comment("seasonal menu", &mut session),
            "{{!-- seasonal menu --}}"
        );
    }

    #[test]
    fn validate_reports_unbalanced_each_tags() {
        let report = engine().validate("{{#each menu as |dish|}}{{dish}}");
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("'each'")));
    }
}
