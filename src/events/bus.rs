//! Listener registry with synchronous, ordered publish.

use std::collections::BTreeMap;
use std::fmt;

use super::types::{EventError, EventKind, HandlerError, ReloadEvent};

/// Handle returned by [`EventBus::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler = Box<dyn FnMut(&ReloadEvent) -> Result<(), HandlerError> + Send>;

/// Per-instance event registry.
///
/// Handlers run on the publishing task, in the order they were registered.
/// The first handler error stops the publish and is returned to the caller.
#[derive(Default)]
pub struct EventBus {
    handlers: BTreeMap<EventKind, Vec<(ListenerId, Handler)>>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: BTreeMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(kind, list)| (kind.as_str(), list.len()))
            .collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> ListenerId
    where
        F: FnMut(&ReloadEvent) -> Result<(), HandlerError> + Send + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.handlers
            .entry(kind)
            .or_default()
            .push((id, Box::new(handler)));
        tracing::trace!(event = %kind, ?id, "Listener registered");
        id
    }

    /// Unregister one handler. Returns `false` if the id is unknown.
    pub fn off(&mut self, id: ListenerId) -> bool {
        for list in self.handlers.values_mut() {
            if let Some(pos) = list.iter().position(|(lid, _)| *lid == id) {
                drop(list.remove(pos));
                return true;
            }
        }
        false
    }

    /// Drop every handler for an event.
    ///
    /// # Errors
    ///
    /// Returns `EventError::NotRegistered` if the event has no handlers.
    pub fn remove(&mut self, kind: EventKind) -> Result<(), EventError> {
        match self.handlers.remove(&kind) {
            Some(list) if !list.is_empty() => Ok(()),
            _ => Err(EventError::NotRegistered(kind)),
        }
    }

    /// Number of handlers registered for an event.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    /// Number of events with at least one handler.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.values().filter(|l| !l.is_empty()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every handler for the event, in registration order.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Handler` from the first handler that fails.
    pub fn publish(&mut self, event: &ReloadEvent) -> Result<(), EventError> {
        let kind = event.kind();
        let Some(list) = self.handlers.get_mut(&kind) else {
            return Ok(());
        };
        for (_, handler) in list.iter_mut() {
            handler(event).map_err(|source| EventError::Handler {
                event: kind,
                source,
            })?;
        }
        Ok(())
    }
}
