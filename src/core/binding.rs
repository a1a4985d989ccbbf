//! Cross-object listener bindings.
//!
//! `listen_to` registers a callback on *another* object's emitter and records
//! the returned id on the *listening* side. The target only ever sees an
//! ordinary listener; it never learns who is listening. Unsubscribing is the
//! listener's job: `stop_listening()` walks its own [`Bindings`] and calls
//! `off` on every target that is still alive.
//!
//! Bindings hold [`WeakEmitter`]s, so a listener never keeps a target alive.
//! A binding whose target is already gone is dropped silently.
//!
//! [`Bindings`] unbinds everything on drop. Embedding one in a type therefore
//! severs all of that type's external subscriptions when it is torn down.
//!
//! # Example
//! ```ignore
//! let container = EventObject::new();
//! let control = EventObject::new();
//! control.listen_to(&container, Event::Playing, |_| println!("playing"));
//! container.trigger(Event::Playing);   // prints
//! control.stop_listening();
//! container.trigger(Event::Playing);   // nothing
//! ```

use log::{debug, trace};
use once_cell::unsync::OnceCell;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::emitter::{EventEmitter, WeakEmitter};
use super::payload::Payload;
use super::registry::ListenerId;

/// Anything that exposes an emitter can be listened to.
pub trait AsEmitter {
    fn as_emitter(&self) -> &EventEmitter;
}

impl AsEmitter for EventEmitter {
    fn as_emitter(&self) -> &EventEmitter {
        self
    }
}

impl<T: AsEmitter + ?Sized> AsEmitter for Rc<T> {
    fn as_emitter(&self) -> &EventEmitter {
        (**self).as_emitter()
    }
}

/// One subscription the owner made on another emitter.
#[derive(Debug, Clone)]
pub struct Binding {
    pub id: ListenerId,
    pub target: WeakEmitter,
}

impl Binding {
    fn is_live(&self) -> bool {
        self.target
            .upgrade()
            .is_some_and(|target| target.is_registered(&self.id))
    }

    /// Unregister from the target if it still exists.
    fn sever(self) {
        match self.target.upgrade() {
            Some(target) => target.off(&self.id),
            None => trace!("binding {}: target already dropped", self.id),
        }
    }
}

/// Owner-side record of every external subscription. Unbinds all on drop.
#[derive(Default)]
pub struct Bindings {
    entries: Rc<RefCell<Vec<Binding>>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember a new binding, pruning entries that can no longer be severed:
    /// the target was dropped, or the listener was removed on the target side.
    fn record(&self, id: ListenerId, target: WeakEmitter) {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(Binding::is_live);
        if entries.len() < before {
            trace!("pruned {} stale binding(s)", before - entries.len());
        }
        entries.push(Binding { id, target });
    }

    /// Unbind every recorded subscription. Returns how many were recorded.
    pub fn unbind_all(&self) -> usize {
        // Take the list first: `off` must not run under our borrow
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        let count = entries.len();
        for binding in entries {
            binding.sever();
        }
        count
    }

    /// Unbind exactly one subscription. Returns false if `id` is not recorded here.
    pub fn unbind(&self, id: &ListenerId) -> bool {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            entries
                .iter()
                .position(|b| &b.id == id)
                .map(|pos| entries.remove(pos))
        };
        match removed {
            Some(binding) => {
                binding.sever();
                true
            }
            None => false,
        }
    }

    pub fn ids(&self) -> Vec<ListenerId> {
        self.entries.borrow().iter().map(|b| b.id.clone()).collect()
    }

    pub fn contains(&self, id: &ListenerId) -> bool {
        self.entries.borrow().iter().any(|b| &b.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn downgrade(&self) -> Weak<RefCell<Vec<Binding>>> {
        Rc::downgrade(&self.entries)
    }
}

impl Drop for Bindings {
    fn drop(&mut self) {
        let count = self.unbind_all();
        if count > 0 {
            debug!("Bindings dropped: severed {} subscription(s)", count);
        }
    }
}

impl fmt::Debug for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.entries.borrow().iter()).finish()
    }
}

/// Emitter + listener capability for composition into any type.
///
/// Implementors provide an emitter (via [`AsEmitter`]) and a [`Bindings`]
/// store; every operation comes as a default method.
pub trait EventCapable: AsEmitter {
    fn bindings(&self) -> &Bindings;

    // ========== Own emitter ==========

    fn on<F>(&self, event_name: impl AsRef<str>, callback: F) -> ListenerId
    where
        F: Fn(&Payload) + 'static,
    {
        self.as_emitter().on(event_name, callback)
    }

    fn once<F>(&self, event_name: impl AsRef<str>, callback: F) -> ListenerId
    where
        F: Fn(&Payload) + 'static,
    {
        self.as_emitter().once(event_name, callback)
    }

    fn off(&self, id: &ListenerId) {
        self.as_emitter().off(id)
    }

    fn trigger(&self, event_name: impl AsRef<str>) {
        self.as_emitter().trigger(event_name)
    }

    fn trigger_with(&self, event_name: impl AsRef<str>, payload: &Payload) {
        self.as_emitter().trigger_with(event_name, payload)
    }

    // ========== Other emitters ==========

    /// Register `callback` on `target` and remember the binding here.
    fn listen_to<T, F>(&self, target: &T, event_name: impl AsRef<str>, callback: F) -> ListenerId
    where
        T: AsEmitter + ?Sized,
        F: Fn(&Payload) + 'static,
    {
        let target = target.as_emitter();
        let id = target.on(event_name, callback);
        self.bindings().record(id.clone(), target.downgrade());
        id
    }

    /// Like [`listen_to`](Self::listen_to), but fires once. The binding
    /// record removes itself when the listener fires.
    fn listen_to_once<T, F>(&self, target: &T, event_name: impl AsRef<str>, callback: F) -> ListenerId
    where
        T: AsEmitter + ?Sized,
        F: Fn(&Payload) + 'static,
    {
        let target = target.as_emitter();
        let own_id: Rc<OnceCell<ListenerId>> = Rc::new(OnceCell::new());
        let entries = self.bindings().downgrade();

        let slot = Rc::clone(&own_id);
        let id = target.once(event_name, move |payload| {
            if let (Some(entries), Some(id)) = (entries.upgrade(), slot.get()) {
                entries.borrow_mut().retain(|b| &b.id != id);
            }
            callback(payload);
        });

        let _ = own_id.set(id.clone());
        self.bindings().record(id.clone(), target.downgrade());
        id
    }

    /// Unbind from every target this object listens to.
    fn stop_listening(&self) {
        self.bindings().unbind_all();
    }

    /// Unbind a single subscription made through `listen_to`/`listen_to_once`.
    fn stop_listening_id(&self, id: &ListenerId) {
        if !self.bindings().unbind(id) {
            trace!("stop_listening {}: not bound here", id);
        }
    }
}

/// Ready-made emitter + bindings pair for embedding in unrelated types.
#[derive(Debug, Default)]
pub struct EventObject {
    emitter: EventEmitter,
    bindings: Bindings,
}

impl EventObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emitter(emitter: EventEmitter) -> Self {
        Self {
            emitter,
            bindings: Bindings::new(),
        }
    }

    pub fn emitter(&self) -> &EventEmitter {
        &self.emitter
    }
}

impl AsEmitter for EventObject {
    fn as_emitter(&self) -> &EventEmitter {
        &self.emitter
    }
}

impl EventCapable for EventObject {
    fn bindings(&self) -> &Bindings {
        &self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&Payload) + 'static) {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        (hits, move |_: &Payload| h.set(h.get() + 1))
    }

    #[test]
    fn test_stop_listening_unbinds_from_target() {
        let a = EventObject::new();
        let b = EventObject::new();
        let (hits, cb) = counter();

        a.listen_to(&b, "x", cb);
        b.trigger("x");
        assert_eq!(hits.get(), 1);

        a.stop_listening();
        b.trigger("x");
        assert_eq!(hits.get(), 1);
        assert!(a.bindings().is_empty());
        assert!(b.as_emitter().is_empty());
    }

    #[test]
    fn test_stop_listening_after_target_dropped() {
        let a = EventObject::new();
        let b = EventObject::new();
        let (_hits, cb) = counter();

        a.listen_to(&b, "x", cb);
        drop(b);

        assert_eq!(a.bindings().len(), 1);
        a.stop_listening();
        assert!(a.bindings().is_empty());
    }

    #[test]
    fn test_stop_listening_across_many_targets() {
        let a = EventObject::new();
        let b = EventEmitter::new();
        let c = EventEmitter::new();
        let (hits, _) = counter();

        for target in [&b, &c] {
            let h = Rc::clone(&hits);
            a.listen_to(target, "ready", move |_| h.set(h.get() + 1));
        }
        // Own listeners are unaffected by stop_listening
        let h = Rc::clone(&hits);
        a.on("ready", move |_| h.set(h.get() + 100));

        a.stop_listening();
        b.trigger("ready");
        c.trigger("ready");
        assert_eq!(hits.get(), 0);

        a.trigger("ready");
        assert_eq!(hits.get(), 100);
    }

    #[test]
    fn test_stop_listening_id_unbinds_one() {
        let a = EventObject::new();
        let b = EventEmitter::new();
        let (first, cb1) = counter();
        let (second, cb2) = counter();

        let id1 = a.listen_to(&b, "x", cb1);
        a.listen_to(&b, "x", cb2);

        a.stop_listening_id(&id1);
        b.trigger("x");
        assert_eq!((first.get(), second.get()), (0, 1));
        assert_eq!(a.bindings().len(), 1);

        // Unknown id: no-op
        a.stop_listening_id(&id1);
        assert_eq!(a.bindings().len(), 1);
    }

    #[test]
    fn test_drop_listener_unbinds_automatically() {
        let b = EventEmitter::new();
        let (hits, cb) = counter();

        {
            let a = EventObject::new();
            a.listen_to(&b, "x", cb);
            assert_eq!(b.listener_count("x"), 1);
        }

        assert_eq!(b.listener_count("x"), 0);
        b.trigger("x");
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_listen_to_once_prunes_binding() {
        let a = EventObject::new();
        let b = EventEmitter::new();
        let (hits, cb) = counter();

        let id = a.listen_to_once(&b, "ready", cb);
        assert!(a.bindings().contains(&id));

        b.trigger("ready");
        b.trigger("ready");
        assert_eq!(hits.get(), 1);
        assert!(a.bindings().is_empty());
    }

    #[test]
    fn test_listen_to_once_then_stop_listening_before_fire() {
        let a = EventObject::new();
        let b = EventEmitter::new();
        let (hits, cb) = counter();

        a.listen_to_once(&b, "ready", cb);
        a.stop_listening();
        b.trigger("ready");
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_listen_to_once_outliving_listener() {
        let b = EventEmitter::new();
        let (hits, cb) = counter();

        let a = EventObject::new();
        a.listen_to_once(&b, "ready", cb);
        // Bindings dropped -> listener removed, nothing dangling left on b
        drop(a);
        b.trigger("ready");
        assert_eq!(hits.get(), 0);
        assert!(b.is_empty());
    }

    #[test]
    fn test_stop_listening_from_inside_callback() {
        let a = Rc::new(EventObject::new());
        let b = EventEmitter::new();
        let (hits, _) = counter();

        let weak_a = Rc::downgrade(&a);
        let h = Rc::clone(&hits);
        a.listen_to(&b, "x", move |_| {
            h.set(h.get() + 1);
            if let Some(a) = weak_a.upgrade() {
                a.stop_listening();
            }
        });
        let h = Rc::clone(&hits);
        a.listen_to(&b, "x", move |_| h.set(h.get() + 10));

        // Second listener was unbound by the first before its turn
        b.trigger("x");
        assert_eq!(hits.get(), 1);
        b.trigger("x");
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_listen_to_rc_target() {
        let a = EventObject::new();
        let b = Rc::new(EventObject::new());
        let (hits, cb) = counter();

        a.listen_to(&b, "x", cb);
        b.trigger("x");
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_off_drops_callback_owning_consumer() {
        let target = EventEmitter::new();
        let child = EventObject::new();
        child.listen_to(&target, "y", |_| {});
        let id = target.on("x", move |_| child.trigger("z"));
        assert_eq!(target.len(), 2);

        // Last owner of `child` goes with the callback; its bindings unbind from `target`
        target.off(&id);
        assert!(target.is_empty());
    }

    #[test]
    fn test_clear_drops_callback_owning_consumer() {
        let target = EventEmitter::new();
        let child = EventObject::new();
        child.listen_to(&target, "y", |_| {});
        target.on("x", move |_| child.trigger("z"));

        target.clear();
        assert!(target.is_empty());
        target.trigger("y");
    }

    #[test]
    fn test_once_callback_owning_consumer_released_after_fire() {
        let target = EventEmitter::new();
        let child = EventObject::new();
        let (hits, cb) = counter();
        child.listen_to(&target, "y", cb);
        target.once("x", move |_| child.trigger("z"));

        target.trigger("x");
        assert!(target.is_empty());
        target.trigger("y");
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_record_prunes_stale_bindings() {
        let a = EventObject::new();
        for _ in 0..10 {
            let short_lived = EventEmitter::new();
            a.listen_to(&short_lived, "x", |_| {});
        }
        // Only the last one is recorded before its target went away
        assert_eq!(a.bindings().len(), 1);

        let b = EventEmitter::new();
        let removed_on_target = a.listen_to(&b, "x", |_| {});
        b.off(&removed_on_target);
        let kept = a.listen_to(&b, "y", |_| {});

        assert_eq!(a.bindings().ids(), vec![kept]);
    }
}
