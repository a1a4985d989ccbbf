//! Platform notification bridge.
//!
//! Platform broadcasts (orientation changes, audio route changes, app
//! backgrounding...) arrive as [`Notification`]s. A [`NotificationBridge`]
//! is the only place they are translated into the event callback contract:
//! it hands the notification's `user_info` (or an empty payload) to a
//! wrapped callback.
//!
//! There is no process-global center. A [`NotificationCenter`] is created and
//! owned explicitly. `observe()` returns a [`NotificationSubscription`] guard
//! that removes the observer when dropped, so an owner that stores the guard
//! gets scoped acquire/release for free.
//!
//! Delivery stays on the owning thread. Other threads get a
//! [`NotificationPoster`] that only enqueues; the owner calls
//! [`NotificationCenter::dispatch_pending`] from its loop to deliver.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::emitter::EventEmitter;
use super::payload::Payload;
use super::registry::EventCallback;

/// Maximum cross-thread notifications waiting for dispatch
pub const MAX_PENDING_NOTIFICATIONS: usize = 1000;

/// A platform-delivered notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub name: String,
    /// Sender identity, for observers that filter by source
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub user_info: Option<Payload>,
}

impl Notification {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            user_info: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_user_info(mut self, user_info: Payload) -> Self {
        self.user_info = Some(user_info);
        self
    }
}

/// Adapts one notification into an event callback invocation.
pub struct NotificationBridge {
    callback: EventCallback,
}

impl NotificationBridge {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Payload) + 'static,
    {
        Self {
            callback: Rc::new(callback),
        }
    }

    pub fn from_callback(callback: EventCallback) -> Self {
        Self { callback }
    }

    /// Bridge that re-triggers the notification as `event_name` on `emitter`.
    /// Holds the emitter weakly; once it is gone the bridge does nothing.
    pub fn forward_to(emitter: &EventEmitter, event_name: impl Into<String>) -> Self {
        let target = emitter.downgrade();
        let event_name = event_name.into();
        Self::new(move |payload| {
            if let Some(emitter) = target.upgrade() {
                emitter.trigger_with(&event_name, payload);
            }
        })
    }

    /// Invoke the wrapped callback with the notification's payload.
    pub fn handle_event(&self, notification: &Notification) {
        match &notification.user_info {
            Some(user_info) => (self.callback)(user_info),
            None => (self.callback)(&Payload::default()),
        }
    }
}

impl fmt::Debug for NotificationBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBridge").finish_non_exhaustive()
    }
}

struct Observer {
    id: u64,
    name: String,
    source: Option<String>,
    bridge: Rc<NotificationBridge>,
}

impl Observer {
    fn matches(&self, notification: &Notification) -> bool {
        self.name == notification.name
            && match &self.source {
                None => true,
                Some(source) => notification.source.as_deref() == Some(source.as_str()),
            }
    }
}

type Observers = RefCell<Vec<Observer>>;

/// Explicitly owned notification center.
pub struct NotificationCenter {
    observers: Rc<Observers>,
    next_id: Cell<u64>,
    sender: Sender<Notification>,
    receiver: Receiver<Notification>,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(MAX_PENDING_NOTIFICATIONS);
        Self {
            observers: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(1),
            sender,
            receiver,
        }
    }

    /// Route notifications named `name` (and, if given, from `source`) to `bridge`.
    ///
    /// Delivery lasts as long as the returned guard is alive.
    #[must_use = "dropping the subscription unregisters the observer immediately"]
    pub fn observe(
        &self,
        name: impl Into<String>,
        source: Option<&str>,
        bridge: NotificationBridge,
    ) -> NotificationSubscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let name = name.into();
        debug!("Observing notification '{}' (source: {:?}) as #{}", name, source, id);
        self.observers.borrow_mut().push(Observer {
            id,
            name,
            source: source.map(str::to_string),
            bridge: Rc::new(bridge),
        });
        NotificationSubscription {
            id,
            observers: Rc::downgrade(&self.observers),
        }
    }

    /// Deliver `notification` to matching observers now. Returns the number reached.
    pub fn post(&self, notification: &Notification) -> usize {
        let matching: Vec<(u64, Rc<NotificationBridge>)> = self
            .observers
            .borrow()
            .iter()
            .filter(|o| o.matches(notification))
            .map(|o| (o.id, Rc::clone(&o.bridge)))
            .collect();

        let mut delivered = 0;
        for (id, bridge) in matching {
            // An earlier observer may have dropped this one's subscription
            if !self.observers.borrow().iter().any(|o| o.id == id) {
                continue;
            }
            bridge.handle_event(notification);
            delivered += 1;
        }
        trace!("Notification '{}' delivered to {} observer(s)", notification.name, delivered);
        delivered
    }

    /// Thread-safe handle for posting from elsewhere.
    pub fn poster(&self) -> NotificationPoster {
        NotificationPoster {
            sender: self.sender.clone(),
        }
    }

    /// Deliver everything posted through [`NotificationPoster`]s so far.
    ///
    /// Notifications posted while dispatching wait for the next call.
    pub fn dispatch_pending(&self) -> usize {
        let pending: Vec<Notification> = self.receiver.try_iter().collect();
        let count = pending.len();
        for notification in &pending {
            self.post(notification);
        }
        count
    }

    pub fn pending_len(&self) -> usize {
        self.receiver.len()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("observers", &self.observer_count())
            .field("pending", &self.pending_len())
            .finish()
    }
}

/// Observer registration guard. Unregisters on drop.
pub struct NotificationSubscription {
    id: u64,
    observers: Weak<Observers>,
}

impl NotificationSubscription {
    /// Unregister now (same as dropping).
    pub fn cancel(self) {}
}

impl Drop for NotificationSubscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.upgrade() {
            // The bridge may own other subscriptions; drop it after the borrow ends
            let removed = {
                let mut observers = observers.borrow_mut();
                observers
                    .iter()
                    .position(|o| o.id == self.id)
                    .map(|pos| observers.remove(pos))
            };
            if removed.is_some() {
                trace!("Notification observer #{} removed", self.id);
            }
        }
    }
}

impl fmt::Debug for NotificationSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationSubscription")
            .field("id", &self.id)
            .field("center_alive", &(self.observers.strong_count() > 0))
            .finish()
    }
}

/// `Send` handle that queues notifications for the owning thread.
#[derive(Clone, Debug)]
pub struct NotificationPoster {
    sender: Sender<Notification>,
}

impl NotificationPoster {
    /// Queue `notification`. Returns false if it was dropped (queue full or center gone).
    pub fn post(&self, notification: Notification) -> bool {
        match self.sender.try_send(notification) {
            Ok(()) => true,
            Err(TrySendError::Full(n)) => {
                warn!(
                    "Notification queue full ({} pending), dropping '{}'",
                    MAX_PENDING_NOTIFICATIONS, n.name
                );
                false
            }
            Err(TrySendError::Disconnected(n)) => {
                debug!("Notification center gone, dropping '{}'", n.name);
                false
            }
        }
    }
}
