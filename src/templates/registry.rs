//! Engine selection by kind

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::orchestration::GeneratorError;
use crate::templates::engine::TemplateEngine;
use crate::templates::handlebars::HandlebarsEngine;
use crate::templates::liquid::LiquidEngine;

/// Supported target template syntaxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemplateEngineKind {
    #[default]
    Liquid,
    Handlebars,
}

impl TemplateEngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateEngineKind::Liquid => "liquid",
            TemplateEngineKind::Handlebars => "handlebars",
        }
    }

    pub fn all() -> Vec<TemplateEngineKind> {
        vec![TemplateEngineKind::Liquid, TemplateEngineKind::Handlebars]
    }
}

impl fmt::Display for TemplateEngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TemplateEngineKind {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "liquid" => Ok(TemplateEngineKind::Liquid),
            "handlebars" | "hbs" => Ok(TemplateEngineKind::Handlebars),
            other => Err(GeneratorError::UnsupportedEngine(other.to_string())),
        }
    }
}

/// Registry mapping engine kinds to adapter implementations
///
/// The default registry carries Liquid and Handlebars; callers may
/// override or extend with custom adapters before handing the registry
/// to the render service.
pub struct EngineRegistry {
    engines: HashMap<TemplateEngineKind, Arc<dyn TemplateEngine>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        let mut engines: HashMap<TemplateEngineKind, Arc<dyn TemplateEngine>> = HashMap::new();
        engines.insert(TemplateEngineKind::Liquid, Arc::new(LiquidEngine::new()));
        engines.insert(
            TemplateEngineKind::Handlebars,
            Arc::new(HandlebarsEngine::new()),
        );
        Self { engines }
    }

    pub fn register(&mut self, kind: TemplateEngineKind, engine: Arc<dyn TemplateEngine>) {
        self.engines.insert(kind, engine);
    }

    pub fn get(&self, kind: TemplateEngineKind) -> Result<Arc<dyn TemplateEngine>, GeneratorError> {
        self.engines
            .get(&kind)
            .cloned()
            .ok_or_else(|| GeneratorError::UnsupportedEngine(kind.to_string()))
    }

    pub fn has_engine(&self, kind: TemplateEngineKind) -> bool {
        self.engines.contains_key(&kind)
    }

    pub fn supported_kinds(&self) -> Vec<TemplateEngineKind> {
        self.engines.keys().copied().collect()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_carries_both_engines() {
        let registry = EngineRegistry::new();
        assert!(registry.has_engine(TemplateEngineKind::Liquid));
        assert!(registry.has_engine(TemplateEngineKind::Handlebars));
        assert_eq!(
            registry.get(TemplateEngineKind::Liquid).unwrap().name(),
            "liquid"
        );
    }

    #[test]
    fn kinds_parse_from_strings() {
        assert_eq!(
            "liquid".parse::<TemplateEngineKind>().unwrap(),
            TemplateEngineKind::Liquid
        );
        assert_eq!(
            "HBS".parse::<TemplateEngineKind>().unwrap(),
            TemplateEngineKind::Handlebars
        );
        assert!("mustache".parse::<TemplateEngineKind>().is_err());
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(TemplateEngineKind::Handlebars).unwrap(),
            serde_json::json!("handlebars")
        );
    }
}
