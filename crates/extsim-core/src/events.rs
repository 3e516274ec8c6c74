//! Insertion-ordered listener registries.
//!
//! Every `onX` surface in the simulator is one of these: an ordered list of
//! listeners dispatched in registration order, with no duplicate
//! suppression. Registering the same closure twice is two registrations;
//! removal is by the handle returned at registration, not by comparing
//! closures.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use extsim_runloop::EventQueue;

/// Identifies one registration so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

impl ListenerHandle {
    pub(crate) fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub(crate) fn raw(&self) -> u64 {
        self.0
    }
}

type Listener<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// An ordered registry of listeners for one event, parameterized by the
/// event's argument type.
///
/// [`emit`](EventRegistry::emit) never runs a listener synchronously: it
/// enqueues one deferred task per listener, in registration order, on the
/// shared queue.
pub struct EventRegistry<A> {
    name: &'static str,
    listeners: Mutex<Vec<(u64, Listener<A>)>>,
    next_id: AtomicU64,
}

impl<A> EventRegistry<A> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append a listener. Returns the handle that removes this registration.
    pub fn add_listener<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().push((id, Arc::new(listener)));
        trace!(event = self.name, id, "listener added");
        ListenerHandle(id)
    }

    /// Remove the registration behind `handle`. Returns whether it was
    /// still registered.
    pub fn remove_listener(&self, handle: ListenerHandle) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != handle.0);
        let removed = listeners.len() != before;
        if removed {
            trace!(event = self.name, id = handle.0, "listener removed");
        }
        removed
    }

    pub fn has_listeners(&self) -> bool {
        !self.listeners.lock().is_empty()
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.listeners.lock().clear();
    }

    /// Schedule one deferred delivery of `args` per listener, in
    /// registration order.
    pub fn emit(&self, queue: &EventQueue, args: A)
    where
        A: Clone + Send + 'static,
    {
        let listeners: Vec<Listener<A>> = {
            let guard = self.listeners.lock();
            guard.iter().map(|(_, l)| l.clone()).collect()
        };
        if listeners.is_empty() {
            return;
        }
        trace!(event = self.name, fan_out = listeners.len(), "emit");
        for listener in listeners {
            let args = args.clone();
            queue.defer(move || listener(&args));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use extsim_runloop::VirtualClock;

    fn queue() -> EventQueue {
        EventQueue::new(Arc::new(VirtualClock::new()))
    }

    #[test]
    fn test_emit_is_deferred() {
        let queue = queue();
        let registry: EventRegistry<u32> = EventRegistry::new("test.event");
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = seen.clone();
        registry.add_listener(move |n| s.lock().push(*n));

        registry.emit(&queue, 7);
        assert!(seen.lock().is_empty());

        queue.tick();
        assert_eq!(*seen.lock(), vec![7]);
    }

    #[test]
    fn test_fan_out_in_registration_order() {
        let queue = queue();
        let registry: EventRegistry<()> = EventRegistry::new("test.event");
        let order = Arc::new(Mutex::new(Vec::new()));

        for label in ["a", "b", "c"] {
            let order = order.clone();
            registry.add_listener(move |_| order.lock().push(label));
        }

        registry.emit(&queue, ());
        queue.tick();
        assert_eq!(*order.lock(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_registration_is_not_deduplicated() {
        let queue = queue();
        let registry: EventRegistry<()> = EventRegistry::new("test.event");
        let count = Arc::new(Mutex::new(0));

        let shared = {
            let count = count.clone();
            move |_: &()| *count.lock() += 1
        };
        registry.add_listener(shared.clone());
        registry.add_listener(shared);
        assert_eq!(registry.len(), 2);

        registry.emit(&queue, ());
        queue.tick();
        assert_eq!(*count.lock(), 2);
    }

    #[test]
    fn test_remove_listener_by_handle() {
        let registry: EventRegistry<()> = EventRegistry::new("test.event");
        let first = registry.add_listener(|_| {});
        let second = registry.add_listener(|_| {});

        assert!(registry.remove_listener(first));
        assert!(!registry.remove_listener(first));
        assert_eq!(registry.len(), 1);
        assert!(registry.remove_listener(second));
        assert!(!registry.has_listeners());
    }

    #[test]
    fn test_removed_listener_does_not_fire() {
        let queue = queue();
        let registry: EventRegistry<()> = EventRegistry::new("test.event");
        let count = Arc::new(Mutex::new(0));

        let c = count.clone();
        let handle = registry.add_listener(move |_| *c.lock() += 1);
        registry.remove_listener(handle);

        registry.emit(&queue, ());
        queue.tick();
        assert_eq!(*count.lock(), 0);
    }

    #[test]
    fn test_clear() {
        let registry: EventRegistry<()> = EventRegistry::new("test.event");
        registry.add_listener(|_| {});
        registry.add_listener(|_| {});
        registry.clear();
        assert!(registry.is_empty());
    }
}
