//! Application-wide signal bus.
//!
//! Components register interest in named signals (most importantly
//! [`QUIT`]) and are called back synchronously on whichever thread publishes
//! the signal.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Published once when the application is shutting down.
pub const QUIT: &str = "quit";

/// Handle returned on registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }
}

type SignalHandler = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: HashMap<String, Vec<(ListenerId, SignalHandler)>>,
}

/// Publish/subscribe registry for named application signals.
#[derive(Default)]
pub struct SignalBus {
    registry: Mutex<Registry>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Call `handler` every time `signal` is published.
    pub fn add_listener<F>(&self, signal: &str, handler: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        registry.next_id += 1;
        let id = ListenerId::new(registry.next_id);
        registry
            .handlers
            .entry(signal.to_string())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Unregister a listener. Returns whether it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut registry = self.registry();
        let mut removed = false;
        for handlers in registry.handlers.values_mut() {
            let before = handlers.len();
            handlers.retain(|(listener, _)| *listener != id);
            removed |= handlers.len() != before;
        }
        removed
    }

    /// Publish `signal` to every listener, in registration order.
    ///
    /// Handlers run after the registry lock is released, so they may
    /// register or unregister listeners themselves.
    pub fn notify(&self, signal: &str) {
        let handlers: Vec<SignalHandler> = self
            .registry()
            .handlers
            .get(signal)
            .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
            .unwrap_or_default();

        tracing::debug!("Signal {:?} -> {} listener(s)", signal, handlers.len());
        for handler in handlers {
            handler();
        }
    }
}
