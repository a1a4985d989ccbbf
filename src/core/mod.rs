//! Event core - payloads, registry, emitter, bindings, notification bridge
//!
//! These modules are independent of any player component; everything else
//! in the crate talks through them.

pub mod binding;
pub mod emitter;
pub mod notification;
pub mod payload;
pub mod registry;

// Re-exports for convenience
pub use binding::{AsEmitter, Binding, Bindings, EventCapable, EventObject};
pub use emitter::{EmitterConfig, EventEmitter, WeakEmitter};
pub use notification::{
    Notification, NotificationBridge, NotificationCenter, NotificationPoster, NotificationSubscription,
};
pub use payload::{Payload, PayloadValue};
pub use registry::{EventCallback, Listener, ListenerId, ListenerRegistry};
