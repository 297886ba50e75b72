//! sitesmith - static-site generation pipeline
//!
//! The crate is organized around two domains:
//!
//! - [`orchestration`]: the generation lifecycle. An [`orchestration::Orchestrator`]
//!   coordinates plugins, a dependency-ordered [`orchestration::ServiceRegistry`],
//!   an ordered [`orchestration::Pipeline`] of stages sharing a per-run
//!   [`orchestration::PipelineContext`], and a synchronous [`orchestration::EventBus`]
//!   for observability.
//! - [`templates`]: the template-engine abstraction. A closed vocabulary of
//!   annotated nodes rendered into a target template syntax (Liquid,
//!   Handlebars) by engines registered in a [`templates::EngineRegistry`].
//!
//! A generation run is driven by [`orchestration::Orchestrator::generate`],
//! which always returns a [`orchestration::GeneratorResult`]; callers inspect
//! `success` and `errors` instead of catching errors for expected failure
//! modes.
#![deny(unsafe_code)]

pub mod orchestration;
pub mod templates;

pub use orchestration::{
    EventBus, GeneratorConfig, GeneratorError, GeneratorPlugin, GeneratorResult, Orchestrator,
    Pipeline, PipelineContext, RegistryError, Service, ServiceRegistry, Stage,
};
pub use templates::{EngineRegistry, TemplateEngine, TemplateEngineKind, TemplateNode};
