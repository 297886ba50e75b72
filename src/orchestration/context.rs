//! Per-run pipeline context

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::orchestration::{EventBus, GeneratorConfig, ServiceRegistry};

/// Mutable state shared by every stage of one generation run
///
/// Constructed fresh for each `generate()` call and discarded when the
/// run completes; no state leaks across runs. Stages pass outputs
/// downstream through the data bag (`set_data`/`get_data`) rather than
/// relying on positional piping, since stage output shapes vary.
pub struct PipelineContext {
    pub run_id: Uuid,
    pub config: GeneratorConfig,
    pub events: EventBus,
    pub services: Arc<ServiceRegistry>,
    data: HashMap<String, JsonValue>,
}

impl PipelineContext {
    pub fn new(
        run_id: Uuid,
        config: GeneratorConfig,
        events: EventBus,
        services: Arc<ServiceRegistry>,
    ) -> Self {
        Self {
            run_id,
            config,
            events,
            services,
            data: HashMap::new(),
        }
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: JsonValue) {
        self.data.insert(key.into(), value);
    }

    pub fn get_data(&self, key: &str) -> Option<&JsonValue> {
        self.data.get(key)
    }

    pub fn has_data(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn data_keys(&self) -> Vec<&str> {
        self.data.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn data_bag_stores_and_returns_values() {
        let mut ctx = PipelineContext::new(
            Uuid::new_v4(),
            GeneratorConfig::new("test-site"),
            EventBus::new(),
            Arc::new(ServiceRegistry::new()),
        );

        assert!(!ctx.has_data("pages"));
        ctx.set_data("pages", json!(["index", "menu"]));
        assert!(ctx.has_data("pages"));
        assert_eq!(ctx.get_data("pages"), Some(&json!(["index", "menu"])));
        assert!(ctx.get_data("absent").is_none());
    }
}
