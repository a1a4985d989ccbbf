//! Per-emitter listener storage.
//!
//! Listeners are kept in registration order in an `IndexMap` keyed by id, so
//! removal by id is O(n) with order preserved and lookups stay O(1).
//! Delivery never iterates the live map: [`ListenerRegistry::listeners_for`]
//! hands out a snapshot, which callbacks may freely invalidate.

use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

use super::payload::Payload;

/// Listener callback. Receives the trigger payload (empty when none was given).
pub type EventCallback = Rc<dyn Fn(&Payload)>;

/// Opaque listener id returned by `on`/`once`, used with `off`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(String);

impl ListenerId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered (event name, callback) pair.
#[derive(Clone)]
pub struct Listener {
    pub id: ListenerId,
    pub event_name: String,
    pub callback: EventCallback,
    /// Removed after the first delivery
    pub once: bool,
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id)
            .field("event_name", &self.event_name)
            .field("once", &self.once)
            .finish()
    }
}

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: IndexMap<ListenerId, Listener>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: IndexMap::new(),
        }
    }

    /// Store a new listener and return its freshly generated id.
    pub fn register(
        &mut self,
        event_name: impl Into<String>,
        callback: EventCallback,
        once: bool,
    ) -> ListenerId {
        let mut id = ListenerId::generate();
        while self.listeners.contains_key(&id) {
            id = ListenerId::generate();
        }
        let listener = Listener {
            id: id.clone(),
            event_name: event_name.into(),
            callback,
            once,
        };
        self.listeners.insert(id.clone(), listener);
        id
    }

    /// Remove the listener with `id` and hand it back. `None` if absent.
    ///
    /// The caller decides when the callback is dropped; dropping it may run
    /// arbitrary teardown that touches this registry again.
    pub fn unregister(&mut self, id: &ListenerId) -> Option<Listener> {
        self.listeners.shift_remove(id)
    }

    /// Remove every listener, returning them in registration order.
    pub fn unregister_all(&mut self) -> Vec<Listener> {
        std::mem::take(&mut self.listeners).into_values().collect()
    }

    /// Registration-ordered snapshot of the listeners for `event_name`.
    pub fn listeners_for(&self, event_name: &str) -> Vec<Listener> {
        self.listeners
            .values()
            .filter(|l| l.event_name == event_name)
            .cloned()
            .collect()
    }

    pub fn contains(&self, id: &ListenerId) -> bool {
        self.listeners.contains_key(id)
    }

    pub fn count_for(&self, event_name: &str) -> usize {
        self.listeners
            .values()
            .filter(|l| l.event_name == event_name)
            .count()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.listeners.values()).finish()
    }
}
