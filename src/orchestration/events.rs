//! Synchronous pub/sub hub for intra-process coordination
//!
//! The bus carries observability traffic (lifecycle and per-stage
//! notifications); actual stage outputs travel through the pipeline
//! context data bag, never through event delivery order.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value as JsonValue;

/// Emitted when a service is registered with the orchestrator.
pub const SERVICE_REGISTERED: &str = "service:registered";
/// Emitted at the start of a generation run.
pub const GENERATOR_START: &str = "generator:start";
/// Emitted when a generation run finishes, successfully or not.
pub const GENERATOR_COMPLETE: &str = "generator:complete";
/// Emitted when a generation run fails at the orchestrator level.
pub const GENERATOR_ERROR: &str = "generator:error";
/// Emitted after each stage completes.
pub const STAGE_COMPLETE: &str = "stage:complete";
/// Emitted after each stage failure.
pub const STAGE_ERROR: &str = "stage:error";

/// Handler invoked synchronously on `emit`
pub type EventHandler = Arc<dyn Fn(&JsonValue) + Send + Sync>;

/// Identifies one subscription for later removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    once: bool,
    handler: EventHandler,
}

#[derive(Default)]
struct BusState {
    next_id: u64,
    listeners: HashMap<String, Vec<Listener>>,
}

/// Synchronous fan-out event bus shared between the orchestrator,
/// services, and stages.
///
/// Cloning yields another handle on the same subscriber list. `emit`
/// is a snapshot over the listeners at call time: a handler that
/// subscribes or unsubscribes during emission only affects later
/// emits. A panicking handler is caught and logged; remaining handlers
/// still run and the emitter's control flow is unaffected.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusState>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BusState> {
        // Recover from poisoning: a panicking handler must not take the
        // whole bus down with it.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Subscribe to an event. Returns an id usable with [`EventBus::off`].
    pub fn on<F>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&JsonValue) + Send + Sync + 'static,
    {
        self.subscribe(event, Arc::new(handler), false)
    }

    /// Subscribe for exactly one delivery; the listener is removed
    /// before its first invocation.
    pub fn once<F>(&self, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&JsonValue) + Send + Sync + 'static,
    {
        self.subscribe(event, Arc::new(handler), true)
    }

    fn subscribe(&self, event: &str, handler: EventHandler, once: bool) -> ListenerId {
        let mut state = self.state();
        state.next_id += 1;
        let id = ListenerId(state.next_id);
        state
            .listeners
            .entry(event.to_string())
            .or_default()
            .push(Listener { id, once, handler });
        id
    }

    /// Remove one subscription. Returns whether it was still registered.
    pub fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut state = self.state();
        let Some(listeners) = state.listeners.get_mut(event) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        listeners.len() != before
    }

    /// Deliver `payload` to every current subscriber of `event`, in
    /// registration order. Emitting with zero subscribers is a no-op.
    pub fn emit(&self, event: &str, payload: JsonValue) {
        let snapshot: Vec<EventHandler> = {
            let mut state = self.state();
            let Some(listeners) = state.listeners.get_mut(event) else {
                return;
            };
            let handlers = listeners.iter().map(|l| Arc::clone(&l.handler)).collect();
            // `once` listeners are gone before delivery, so a handler
            // observing listener_count during its own invocation sees 0.
            listeners.retain(|l| !l.once);
            handlers
        };

        for handler in snapshot {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler(&payload)));
            if outcome.is_err() {
                tracing::error!(event = %event, "event handler panicked; continuing with remaining handlers");
            }
        }
    }

    /// Clear one event's subscribers, or every event's when `event` is `None`.
    pub fn remove_all_listeners(&self, event: Option<&str>) {
        let mut state = self.state();
        match event {
            Some(name) => {
                state.listeners.remove(name);
            }
            None => state.listeners.clear(),
        }
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.state()
            .listeners
            .get(event)
            .map(|l| l.len())
            .unwrap_or(0)
    }
}
