//! Dependency-ordered lifecycle manager for named services

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::orchestration::{GeneratorError, PipelineContext, RegistryError, Service};

#[derive(Default)]
struct RegistryState {
    services: HashMap<String, Arc<dyn Service>>,
    /// Registration order, used to keep topological ordering stable.
    registration: Vec<String>,
    /// Realized initialization order of the current run; disposal walks
    /// it in reverse.
    initialized: Vec<String>,
}

/// Owns every registered [`Service`] for the orchestrator's lifetime.
///
/// Registration errors (duplicates, unknown names, missing or circular
/// dependencies) are fatal and surface immediately; they are never
/// deferred into the pipeline run.
#[derive(Default)]
pub struct ServiceRegistry {
    state: RwLock<RegistryState>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Register a service. Fails without mutating the registry if the
    /// name is already taken.
    pub fn register(&self, service: Arc<dyn Service>) -> Result<(), RegistryError> {
        let name = service.name().to_string();
        let mut state = self.write();
        if state.services.contains_key(&name) {
            return Err(RegistryError::DuplicateService(name));
        }
        tracing::debug!(service = %name, version = %service.version(), "service registered");
        state.registration.push(name.clone());
        state.services.insert(name, service);
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.read().services.contains_key(name)
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Service>, RegistryError> {
        self.read()
            .services
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::ServiceNotFound(name.to_string()))
    }

    /// Registered service names, in registration order.
    pub fn service_names(&self) -> Vec<String> {
        self.read().registration.clone()
    }

    /// Topological ordering of all registered services by declared
    /// dependencies, stable by registration order among independent
    /// services. A dependency on an unregistered name or a dependency
    /// cycle is a fatal registry error naming the offenders.
    pub fn initialization_order(&self) -> Result<Vec<String>, RegistryError> {
        let state = self.read();

        let mut remaining: HashMap<&str, Vec<String>> = HashMap::new();
        for name in &state.registration {
            let service = &state.services[name];
            for dep in service.dependencies() {
                if !state.services.contains_key(&dep) {
                    return Err(RegistryError::MissingDependency {
                        service: name.clone(),
                        dependency: dep,
                    });
                }
            }
            remaining.insert(name.as_str(), service.dependencies());
        }

        let mut order = Vec::with_capacity(state.registration.len());
        while !remaining.is_empty() {
            // Pick the earliest-registered service whose dependencies
            // have all been ordered already.
            let next = state
                .registration
                .iter()
                .find(|name| {
                    remaining
                        .get(name.as_str())
                        .is_some_and(|deps| deps.iter().all(|d| !remaining.contains_key(d.as_str())))
                })
                .cloned();

            match next {
                Some(name) => {
                    remaining.remove(name.as_str());
                    order.push(name);
                }
                None => {
                    let mut participants: Vec<String> = state
                        .registration
                        .iter()
                        .filter(|n| remaining.contains_key(n.as_str()))
                        .cloned()
                        .collect();
                    participants.sort();
                    return Err(RegistryError::CircularDependency { participants });
                }
            }
        }

        Ok(order)
    }

    /// Initialize every registered service in dependency order,
    /// recording the realized order so disposal can walk its reverse.
    pub async fn initialize_all(&self, ctx: &PipelineContext) -> Result<(), GeneratorError> {
        let order = self.initialization_order()?;
        tracing::debug!(services = order.len(), "initializing services");

        for name in order {
            let service = self.resolve(&name)?;
            service
                .initialize(ctx)
                .await
                .map_err(|e| GeneratorError::ServiceFailed {
                    service: name.clone(),
                    message: format!("initialize failed: {e}"),
                })?;
            self.write().initialized.push(name);
        }
        Ok(())
    }

    /// Dispose every registered service, reverse of the realized
    /// initialization order (never-initialized services last).
    /// Individual disposal failures are logged and skipped so cleanup
    /// reaches every service.
    pub async fn dispose_all(&self) {
        let order: Vec<String> = {
            let mut state = self.write();
            let mut order = std::mem::take(&mut state.initialized);
            for name in &state.registration {
                if !order.contains(name) {
                    order.push(name.clone());
                }
            }
            order
        };

        for name in order.iter().rev() {
            let Ok(service) = self.resolve(name) else {
                continue;
            };
            if let Err(error) = service.dispose().await {
                tracing::warn!(service = %name, error = %error, "service disposal failed; continuing");
            } else {
                tracing::debug!(service = %name, "service disposed");
            }
        }
    }
}
