//! Orchestration domain - the generation lifecycle
//!
//! This module implements the coordination layer of a generation run:
//! event-driven observability, dependency-ordered service lifecycles,
//! ordered stage execution over a shared per-run context, and the
//! top-level orchestrator that ties plugins, services, and stages
//! together into a single `generate()` call.

pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod orchestrator;
pub mod pipeline;
pub mod plugin;
pub mod registry;
pub mod service;
pub mod stage;

pub use config::*;
pub use context::*;
pub use errors::*;
pub use events::*;
pub use orchestrator::*;
pub use pipeline::*;
pub use plugin::*;
pub use registry::*;
pub use service::*;
pub use stage::*;
