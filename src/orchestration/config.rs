//! Generator configuration

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::orchestration::GeneratorError;
use crate::templates::TemplateEngineKind;

/// Resolved configuration for one generation run
///
/// Plugins may replace or mutate the config in their
/// `on_before_generate` hooks; each plugin sees the previous plugin's
/// mutations, and the final config is carried on the
/// [`GeneratorResult`](crate::orchestration::GeneratorResult).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    pub project_name: String,
    /// Target template syntax for rendered output.
    #[serde(default)]
    pub engine: TemplateEngineKind,
    /// When true, a stage failure does not abort the remaining stages.
    #[serde(default)]
    pub continue_on_error: bool,
    /// Free-form variables exposed to stages and services.
    #[serde(default)]
    pub variables: HashMap<String, JsonValue>,
    #[serde(default)]
    pub metadata: GeneratorMetadata,
}

/// Metadata about the generated site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorMetadata {
    pub version: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub license: Option<String>,
}

impl Default for GeneratorMetadata {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            description: None,
            author: None,
            license: None,
        }
    }
}

impl GeneratorConfig {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            engine: TemplateEngineKind::default(),
            continue_on_error: false,
            variables: HashMap::new(),
            metadata: GeneratorMetadata::default(),
        }
    }

    /// Parse a config from TOML source.
    pub fn from_toml_str(source: &str) -> Result<Self, GeneratorError> {
        Ok(toml::from_str(source)?)
    }

    pub fn set_variable(&mut self, key: impl Into<String>, value: JsonValue) {
        self.variables.insert(key.into(), value);
    }

    /// Validate the config has all required data.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.project_name.is_empty() {
            return Err(GeneratorError::InvalidConfiguration(
                "project name is required".to_string(),
            ));
        }
        Ok(())
    }
}
