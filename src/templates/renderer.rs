//! Depth-first node-tree rendering

use crate::templates::engine::{RenderSession, RenderedTemplate, TemplateEngine};
use crate::templates::nodes::TemplateNode;

/// Render a full document tree through one engine, collecting warnings
/// into the returned [`RenderedTemplate`].
pub fn render_document(engine: &dyn TemplateEngine, nodes: &[TemplateNode]) -> RenderedTemplate {
    let mut session = RenderSession::new();
    let output = render_children(engine, nodes, &mut session);
    RenderedTemplate {
        output,
        warnings: session.into_warnings(),
    }
}

fn render_children(
    engine: &dyn TemplateEngine,
    nodes: &[TemplateNode],
    session: &mut RenderSession,
) -> String {
    nodes
        .iter()
        .map(|node| render_node(engine, node, session))
        .collect()
}

fn render_node(
    engine: &dyn TemplateEngine,
    node: &TemplateNode,
    session: &mut RenderSession,
) -> String {
    match node {
        TemplateNode::Text { content } => content.clone(),
        TemplateNode::Loop(loop_node) => {
            let body = render_children(engine, &loop_node.body, session);
            engine.render_loop(loop_node, &body, session)
        }
        TemplateNode::Condition(condition) => {
            let branches: Vec<String> = condition
                .branches
                .iter()
                .map(|branch| render_children(engine, &branch.body, session))
                .collect();
            let else_body = (!condition.else_body.is_empty())
                .then(|| render_children(engine, &condition.else_body, session));
            engine.render_condition(condition, &branches, else_body.as_deref(), session)
        }
        TemplateNode::Variable(variable) => engine.render_variable(variable, session),
        TemplateNode::Slot(slot) => {
            let fallback = render_children(engine, &slot.fallback, session);
            engine.render_slot(slot, &fallback, session)
        }
        TemplateNode::Include(include) => engine.render_include(include, session),
        TemplateNode::Block(block) => {
            let body = render_children(engine, &block.body, session);
            engine.render_block(block, &body, session)
        }
        TemplateNode::Comment { text } => engine.render_comment(text, session),
        TemplateNode::Extends(extends) => engine.render_extends(extends, session),
    }
}
