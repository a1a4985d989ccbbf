//! String-keyed event emitter with synchronous, re-entrant delivery.
//!
//! Architecture:
//! - `on()`/`once()` register callbacks in the emitter's own [`ListenerRegistry`]
//! - `trigger()` invokes matching callbacks immediately, in registration order
//! - `off()` removes a listener by id, whatever event it was registered for
//!
//! Delivery iterates a snapshot taken at the start of `trigger()`. The registry
//! borrow is released before any callback runs, so callbacks may call
//! `on`/`off`/`trigger` on the same emitter:
//! - a listener added during delivery fires from the next trigger on
//! - a listener removed during delivery is skipped if its turn has not come yet
//! - a `once` listener is unregistered right before its callback runs, so a
//!   re-entrant trigger of the same event can never reach it again
//!
//! Emitters are `!Send`: all calls on one emitter must come from one thread.

use log::{trace, warn};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::payload::Payload;
use super::registry::{EventCallback, ListenerId, ListenerRegistry};

/// Default nesting limit for re-entrant triggers
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 64;

/// Per-emitter dispatch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmitterConfig {
    /// Triggers nested deeper than this are dropped with a warning
    pub max_dispatch_depth: usize,
    /// Log every delivery at trace level
    pub trace_triggers: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            max_dispatch_depth: DEFAULT_MAX_DISPATCH_DEPTH,
            trace_triggers: false,
        }
    }
}

struct EmitterInner {
    registry: RefCell<ListenerRegistry>,
    depth: Cell<usize>,
    config: EmitterConfig,
}

/// Event emitter handle.
///
/// Cloning yields another handle to the same listener table. The table is
/// dropped with the last strong handle; [`WeakEmitter`]s observe that.
#[derive(Clone)]
pub struct EventEmitter {
    inner: Rc<EmitterInner>,
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.len())
            .field("depth", &self.inner.depth.get())
            .finish()
    }
}

/// Restores dispatch depth on scope exit, including unwinding out of a callback.
struct DepthGuard<'a>(&'a Cell<usize>);

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

impl EventEmitter {
    pub fn new() -> Self {
        Self::with_config(EmitterConfig::default())
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self {
            inner: Rc::new(EmitterInner {
                registry: RefCell::new(ListenerRegistry::new()),
                depth: Cell::new(0),
                config,
            }),
        }
    }

    pub fn config(&self) -> EmitterConfig {
        self.inner.config
    }

    // ========== Registration ==========

    /// Register a persistent listener for `event_name`.
    pub fn on<F>(&self, event_name: impl AsRef<str>, callback: F) -> ListenerId
    where
        F: Fn(&Payload) + 'static,
    {
        self.register(event_name.as_ref(), Rc::new(callback), false)
    }

    /// Register a listener that is removed after its first invocation.
    pub fn once<F>(&self, event_name: impl AsRef<str>, callback: F) -> ListenerId
    where
        F: Fn(&Payload) + 'static,
    {
        self.register(event_name.as_ref(), Rc::new(callback), true)
    }

    /// Register an already type-erased callback.
    pub fn register(&self, event_name: &str, callback: EventCallback, once: bool) -> ListenerId {
        let id = self
            .inner
            .registry
            .borrow_mut()
            .register(event_name, callback, once);
        trace!("on '{}' -> {} (once: {})", event_name, id, once);
        id
    }

    /// Remove listener `id`. Unknown ids are ignored.
    pub fn off(&self, id: &ListenerId) {
        // Dropped after the borrow ends: the callback may own bindings to us
        let removed = self.inner.registry.borrow_mut().unregister(id);
        if removed.is_none() {
            trace!("off {}: no such listener", id);
        }
    }

    /// Remove every listener.
    pub fn clear(&self) {
        let removed = self.inner.registry.borrow_mut().unregister_all();
        trace!("clear: {} listener(s) removed", removed.len());
    }

    // ========== Delivery ==========

    /// Trigger `event_name` with an empty payload.
    pub fn trigger(&self, event_name: impl AsRef<str>) {
        self.trigger_with(event_name, &Payload::default());
    }

    /// Trigger `event_name`, invoking each registered listener with `payload`.
    pub fn trigger_with(&self, event_name: impl AsRef<str>, payload: &Payload) {
        let event_name = event_name.as_ref();
        let inner = &self.inner;

        let depth = inner.depth.get();
        if depth >= inner.config.max_dispatch_depth {
            warn!(
                "Dropping '{}': dispatch depth {} reached (re-entrant trigger loop?)",
                event_name, depth
            );
            return;
        }
        inner.depth.set(depth + 1);
        let _guard = DepthGuard(&inner.depth);

        let snapshot = inner.registry.borrow().listeners_for(event_name);
        if snapshot.is_empty() {
            return;
        }

        for listener in snapshot {
            // Registry borrow must end before the callback runs
            let live = if listener.once {
                let removed = inner.registry.borrow_mut().unregister(&listener.id);
                removed.is_some()
            } else {
                inner.registry.borrow().contains(&listener.id)
            };
            if !live {
                trace!("skip {} on '{}': removed during delivery", listener.id, event_name);
                continue;
            }
            if inner.config.trace_triggers {
                trace!("'{}' -> {} ({} keys)", event_name, listener.id, payload.len());
            }
            (listener.callback)(payload);
        }
    }

    // ========== Introspection ==========

    pub fn listener_count(&self, event_name: impl AsRef<str>) -> usize {
        self.inner.registry.borrow().count_for(event_name.as_ref())
    }

    pub fn has_listeners(&self, event_name: impl AsRef<str>) -> bool {
        self.listener_count(event_name) > 0
    }

    pub fn is_registered(&self, id: &ListenerId) -> bool {
        self.inner.registry.borrow().contains(id)
    }

    /// Total number of listeners across all events
    pub fn len(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.borrow().is_empty()
    }

    /// Non-owning back-reference to this emitter.
    pub fn downgrade(&self) -> WeakEmitter {
        WeakEmitter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// True if both handles share one listener table.
    pub fn ptr_eq(&self, other: &EventEmitter) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Weak emitter handle. Does not keep listeners alive.
#[derive(Clone, Default)]
pub struct WeakEmitter {
    inner: Weak<EmitterInner>,
}

impl WeakEmitter {
    pub fn upgrade(&self) -> Option<EventEmitter> {
        self.inner.upgrade().map(|inner| EventEmitter { inner })
    }

    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for WeakEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakEmitter")
            .field("alive", &self.is_alive())
            .finish()
    }
}
