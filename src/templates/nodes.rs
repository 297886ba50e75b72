//! Annotated intermediate node vocabulary
//!
//! The closed set of node kinds every engine adapter must render.
//! Nodes serialize with a lowercase `kind` tag so trees can ride the
//! pipeline context data bag as JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A `for`-style iteration over a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopNode {
    /// Loop variable name.
    pub item: String,
    /// Expression naming the iterated collection.
    pub collection: String,
    #[serde(default)]
    pub body: Vec<TemplateNode>,
}

/// One `if`/`elseif` arm of a condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionBranch {
    /// Source-style boolean expression; engines normalize operators.
    pub test: String,
    #[serde(default)]
    pub body: Vec<TemplateNode>,
}

/// An if/elseif/else chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionNode {
    /// First branch is the `if`, the rest are `elseif`s.
    pub branches: Vec<ConditionBranch>,
    #[serde(default)]
    pub else_body: Vec<TemplateNode>,
}

/// A filter applied to a variable interpolation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterCall {
    /// Standard filter name, mapped per engine.
    pub name: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Variable interpolation with optional default and filter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableNode {
    pub name: String,
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default)]
    pub filter: Option<FilterCall>,
}

/// Named content hole with a default fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotNode {
    pub name: String,
    #[serde(default)]
    pub fallback: Vec<TemplateNode>,
}

/// Partial reference with a prop bag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludeNode {
    pub template: String,
    /// Prop name to expression, in deterministic order.
    #[serde(default)]
    pub props: BTreeMap<String, String>,
}

/// Named capture of rendered content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockNode {
    pub name: String,
    #[serde(default)]
    pub body: Vec<TemplateNode>,
}

/// Template-inheritance declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendsNode {
    pub parent: String,
}

/// A node of the annotated intermediate tree
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateNode {
    Text { content: String },
    Loop(LoopNode),
    Condition(ConditionNode),
    Variable(VariableNode),
    Slot(SlotNode),
    Include(IncludeNode),
    Block(BlockNode),
    Comment { text: String },
    Extends(ExtendsNode),
}

impl TemplateNode {
    pub fn text(content: impl Into<String>) -> Self {
        TemplateNode::Text {
            content: content.into(),
        }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        TemplateNode::Variable(VariableNode {
            name: name.into(),
            default: None,
            filter: None,
        })
    }
}
