//! Error types for the orchestration domain

use thiserror::Error;

/// Errors raised at service registration or resolution time
///
/// These are always fatal and surface immediately; they are never
/// deferred into the pipeline run.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("service '{0}' is already registered")]
    DuplicateService(String),

    #[error("service '{0}' is not registered")]
    ServiceNotFound(String),

    #[error("service '{service}' depends on unregistered service '{dependency}'")]
    MissingDependency { service: String, dependency: String },

    #[error("circular service dependency: {}", .participants.join(" -> "))]
    CircularDependency { participants: Vec<String> },
}

/// Errors that can occur during a generation run
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    #[error("service '{service}' failed: {message}")]
    ServiceFailed { service: String, message: String },

    #[error("plugin '{plugin}' {hook} hook failed: {message}")]
    PluginHook {
        plugin: String,
        hook: String,
        message: String,
    },

    #[error("render error: {0}")]
    Render(String),

    #[error("no template engine registered for '{0}'")]
    UnsupportedEngine(String),

    #[error("generate() was already invoked on this orchestrator")]
    AlreadyGenerated,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
