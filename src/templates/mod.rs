//! Template-engine abstraction
//!
//! An annotated intermediate node tree (loops, conditions, variables,
//! slots, includes, blocks) is rendered into a concrete template syntax
//! by an engine adapter. Engines are selected through a closed
//! [`TemplateEngineKind`] registry rather than inheritance; per-render
//! state (warnings) lives in an explicit [`RenderSession`] so engines
//! stay stateless and shareable.

pub mod engine;
pub mod expression;
pub mod handlebars;
pub mod liquid;
pub mod nodes;
pub mod registry;
pub mod renderer;
pub mod service;
pub mod validate;

pub use engine::*;
pub use handlebars::*;
pub use liquid::*;
pub use nodes::*;
pub use registry::*;
pub use renderer::*;
pub use service::*;
