//! MEDIABUS - event dispatch and lifecycle binding for media player components
//!
//! Player, container, playback and media control talk to each other only
//! through string-named events:
//! - [`EventEmitter`]: `on`/`once`/`off`/`trigger` with synchronous, re-entrant
//!   delivery in registration order
//! - [`EventCapable`]: `listen_to`/`stop_listening` bindings recorded on the
//!   listening side, severed automatically when it is dropped
//! - [`NotificationBridge`]: the one translation point from platform
//!   notifications into event callbacks
//!
//! # Threading
//!
//! Emitters are built on `Rc`/`RefCell` and are neither `Send` nor `Sync`:
//! every `on`/`off`/`trigger` for a given emitter must happen on the thread
//! that created it. Work arriving from other threads goes through a
//! [`NotificationPoster`] and is delivered by
//! [`NotificationCenter::dispatch_pending`] on the owning thread.

// Event core (payloads, registry, emitter, bindings, notifications)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod control;
pub mod events;
pub mod script;

// Re-export commonly used types from core
pub use crate::core::binding::{AsEmitter, Bindings, EventCapable, EventObject};
pub use crate::core::emitter::{EmitterConfig, EventEmitter, WeakEmitter};
pub use crate::core::notification::{
    Notification, NotificationBridge, NotificationCenter, NotificationPoster, NotificationSubscription,
};
pub use crate::core::payload::{Payload, PayloadValue};
pub use crate::core::registry::{EventCallback, ListenerId};
pub use events::Event;
