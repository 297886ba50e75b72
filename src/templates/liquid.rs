//! Liquid engine adapter

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::templates::engine::{
    EngineFeatures, FilterMapping, RenderSession, TemplateEngine, ValidationReport,
};
use crate::templates::expression::rewrite_operators;
use crate::templates::nodes::{
    BlockNode, ConditionNode, ExtendsNode, IncludeNode, LoopNode, SlotNode, VariableNode,
};
use crate::templates::validate::{TagPair, check_delimiters, check_tag_pairs};

/// Source-style operators to Liquid's vocabulary. Longest first:
/// `!==` must be consumed before the identity `!=` entry, which in
/// turn shields `!=` from the bare-`!` rewrite.
const OPERATOR_TABLE: &[(&str, &str)] = &[
    ("!==", "!="),
    ("===", "=="),
    ("!=", "!="),
    ("==", "=="),
    ("&&", "and"),
    ("||", "or"),
    ("!", "not "),
];

static TAG_PAIRS: Lazy<Vec<TagPair>> = Lazy::new(|| {
    vec![
        TagPair::new("if", r"\{\%-?\s*if\b", r"\{\%-?\s*endif\b"),
        TagPair::new("for", r"\{\%-?\s*for\b", r"\{\%-?\s*endfor\b"),
        TagPair::new("unless", r"\{\%-?\s*unless\b", r"\{\%-?\s*endunless\b"),
        TagPair::new("capture", r"\{\%-?\s*capture\b", r"\{\%-?\s*endcapture\b"),
        TagPair::new("comment", r"\{\%-?\s*comment\b", r"\{\%-?\s*endcomment\b"),
    ]
});

fn quoted_args(args: &[String]) -> String {
    args.iter()
        .map(|a| format!("\"{a}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn raw_args(args: &[String]) -> String {
    args.join(", ")
}

/// Renders the annotated node tree into Liquid syntax
///
/// Liquid has no native template inheritance; `extends` degrades to a
/// comment marker plus a render warning.
pub struct LiquidEngine {
    filters: HashMap<&'static str, FilterMapping>,
}

impl LiquidEngine {
    pub fn new() -> Self {
        let mut filters = HashMap::new();
        filters.insert("currency", FilterMapping::plain("money"));
        filters.insert("uppercase", FilterMapping::plain("upcase"));
        filters.insert("lowercase", FilterMapping::plain("downcase"));
        filters.insert("capitalize", FilterMapping::plain("capitalize"));
        filters.insert("trim", FilterMapping::plain("strip"));
        filters.insert("escape", FilterMapping::plain("escape"));
        filters.insert("json", FilterMapping::plain("json"));
        filters.insert("length", FilterMapping::plain("size"));
        filters.insert("reverse", FilterMapping::plain("reverse"));
        filters.insert("first", FilterMapping::plain("first"));
        filters.insert("last", FilterMapping::plain("last"));
        filters.insert("join", FilterMapping::with_args("join", quoted_args));
        filters.insert("default", FilterMapping::with_args("default", quoted_args));
        filters.insert("date", FilterMapping::with_args("date", quoted_args));
        filters.insert("truncate", FilterMapping::with_args("truncate", raw_args));
        Self { filters }
    }
}

impl Default for LiquidEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for LiquidEngine {
    fn name(&self) -> &'static str {
        "liquid"
    }

    fn version(&self) -> &'static str {
        "0.1.0"
    }

    fn file_extension(&self) -> &'static str {
        "liquid"
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
        self.filters.get(standard)
    }

    fn render_loop(&self, node: &LoopNode, body: &str, _session: &mut RenderSession) -> String {
        format!(
            "{{% for {} in {} %}}\n{}\n{{% endfor %}}",
            node.item, node.collection, body
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
            let keyword = if index == 0 { "if" } else { "elsif" };
            out.push_str(&format!("{{% {keyword} {test} %}}\n"));
            out.push_str(body);
            out.push('\n');
        }
        if let Some(else_body) = else_body {
            out.push_str("{% else %}\n");
            out.push_str(else_body);
            out.push('\n');
        }
        out.push_str("{% endif %}");
        out
    }

    fn render_variable(&self, node: &VariableNode, _session: &mut RenderSession) -> String {
        let mut expr = node.name.clone();
        if let Some(filter) = &node.filter {
            expr = self.apply_filter(&expr, &filter.name, &filter.args);
        }
        if let Some(default) = &node.default {
            expr = self.apply_filter(&expr, "default", std::slice::from_ref(default));
        }
        format!("{{{{ {expr} }}}}")
    }

    fn render_slot(&self, node: &SlotNode, fallback: &str, _session: &mut RenderSession) -> String {
        let name = &node.name;
        if fallback.is_empty() {
            format!("{{{{ {name} }}}}")
        } else {
            format!("{{% if {name} %}}{{{{ {name} }}}}{{% else %}}{fallback}{{% endif %}}")
        }
    }

    fn render_include(&self, node: &IncludeNode, _session: &mut RenderSession) -> String {
        let mut out = format!("{{% render '{}'", node.template);
        for (key, value) in &node.props {
            out.push_str(&format!(", {key}: {value}"));
        }
        out.push_str(" %}");
        out
    }

    fn render_block(&self, node: &BlockNode, body: &str, _session: &mut RenderSession) -> String {
        format!("{{% capture {} %}}\n{}\n{{% endcapture %}}", node.name, body)
    }

    fn render_comment(&self, text: &str, _session: &mut RenderSession) -> String {
        format!("{{% comment %}} {text} {{% endcomment %}}")
    }

    fn render_extends(&self, node: &ExtendsNode, session: &mut RenderSession) -> String {
        session.warn(format!(
            "liquid does not support template inheritance; 'extends {}' rendered as a comment",
            node.parent
        ));
        format!("{{% comment %}} extends {} {{% endcomment %}}", node.parent)
    }

    fn apply_filter(&self, expression: &str, filter: &str, args: &[String]) -> String {
        let (name, formatted) = match self.filter_mapping(filter) {
            Some(mapping) => {
                let formatted = (!args.is_empty()).then(|| match mapping.format_args {
                    Some(format) => format(args),
                    None => raw_args(args),
                });
                (mapping.name, formatted)
            }
            // Unknown filters pass through verbatim as engine-native syntax.
            None => (filter, (!args.is_empty()).then(|| raw_args(args))),
        };
        match formatted {
            Some(args) => format!("{expression} | {name}: {args}"),
            None => format!("{expression} | {name}"),
        }
    }

    fn format_expression(&self, expression: &str, _session: &mut RenderSession) -> String {
        rewrite_operators(expression, OPERATOR_TABLE)
    }

    fn validate(&self, output: &str) -> ValidationReport {
        let mut errors = check_tag_pairs(output, &TAG_PAIRS);
        if let Some(error) = check_delimiters(output, "{{", "}}") {
            errors.push(error);
        }
        if let Some(error) = check_delimiters(output, "{%", "%}") {
            errors.push(error);
        }
        ValidationReport::from_errors(errors)
    }
}
