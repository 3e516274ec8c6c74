//! Runtime message bus with sender attribution.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use extsim_protocols::Sender;
use extsim_runloop::EventQueue;

use crate::diagnostics::DiagnosticsLog;
use crate::events::ListenerHandle;

/// Response collector handed to each message listener.
///
/// The first response wins; later calls are ignored. Responding after the
/// dispatch turn has ended has no effect on the original caller (see
/// [`MessageBus::send_message_then`]).
pub struct Responder {
    slot: Mutex<Option<Value>>,
}

impl Responder {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    pub fn respond(&self, value: Value) {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn take(self) -> Option<Value> {
        self.slot.into_inner()
    }
}

type MessageListener = Arc<dyn Fn(&Value, &Sender, &Responder) -> bool + Send + Sync>;

/// The `runtime` namespace: message dispatch, the manifest accessor, URL
/// construction, and the `lastError` slot.
///
/// Listeners run synchronously in registration order and return a flag
/// meaning "I will respond asynchronously". When any listener raises the
/// flag, the caller's callback is never invoked; the bus does not track
/// out-of-band responses. This mirrors the emulated platform's behavior and
/// is intentional.
pub struct MessageBus {
    listeners: Mutex<Vec<(u64, MessageListener)>>,
    next_listener_id: AtomicU64,
    last_error: Mutex<Option<String>>,
    manifest: Value,
    extension_id: String,
    queue: Arc<EventQueue>,
    diagnostics: Arc<DiagnosticsLog>,
}

impl MessageBus {
    pub fn new(
        queue: Arc<EventQueue>,
        diagnostics: Arc<DiagnosticsLog>,
        manifest: Value,
        extension_id: impl Into<String>,
    ) -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            last_error: Mutex::new(None),
            manifest,
            extension_id: extension_id.into(),
            queue,
            diagnostics,
        }
    }

    /// Register an `onMessage` listener. Duplicates are kept; dispatch is in
    /// registration order.
    pub fn add_message_listener<F>(&self, listener: F) -> ListenerHandle
    where
        F: Fn(&Value, &Sender, &Responder) -> bool + Send + Sync + 'static,
    {
        let id = self.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().push((id, Arc::new(listener)));
        ListenerHandle::from_raw(id)
    }

    pub fn remove_message_listener(&self, handle: ListenerHandle) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != handle.raw());
        listeners.len() != before
    }

    pub fn has_message_listeners(&self) -> bool {
        !self.listeners.lock().is_empty()
    }

    pub fn message_listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Dispatch `message` to every listener, discarding any response.
    pub fn send_message(&self, message: Value) {
        let _ = self.dispatch(&message);
    }

    /// Dispatch `message` to every listener. If no listener flagged an
    /// asynchronous response, `cb` receives the first collected response
    /// (or `None`) on the next turn; if any listener did, `cb` is dropped.
    pub fn send_message_then<F>(&self, message: Value, cb: F)
    where
        F: FnOnce(Option<Value>) + Send + 'static,
    {
        let (response, async_flagged) = self.dispatch(&message);
        if async_flagged {
            self.diagnostics.warn(
                "runtime.sendMessage: listener flagged an async response; callback suppressed",
            );
            return;
        }
        self.queue.defer(move || cb(response));
    }

    fn dispatch(&self, message: &Value) -> (Option<Value>, bool) {
        let listeners: Vec<MessageListener> = {
            let guard = self.listeners.lock();
            guard.iter().map(|(_, l)| l.clone()).collect()
        };
        self.diagnostics.info(format!(
            "runtime.sendMessage: dispatching to {} listener(s)",
            listeners.len()
        ));

        // The sender descriptor is constructed by the bus; callers cannot
        // forge their identity.
        let sender = Sender::new(self.extension_id.clone(), self.extension_url(""));
        let responder = Responder::new();
        let mut async_flagged = false;
        for listener in listeners {
            if listener(message, &sender, &responder) {
                async_flagged = true;
            }
        }
        (responder.take(), async_flagged)
    }

    /// The manifest value supplied at construction, unmodified.
    pub fn get_manifest(&self) -> Value {
        self.manifest.clone()
    }

    /// Absolute extension URL for `path`.
    pub fn get_url(&self, path: &str) -> String {
        self.extension_url(path)
    }

    fn extension_url(&self, path: &str) -> String {
        format!(
            "chrome-extension://{}/{}",
            self.extension_id,
            path.trim_start_matches('/')
        )
    }

    /// The current `lastError`, if set. Consulted by convention; nothing in
    /// the simulator throws.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    pub fn set_last_error(&self, message: impl Into<String>) {
        *self.last_error.lock() = Some(message.into());
    }

    pub fn clear_last_error(&self) {
        *self.last_error.lock() = None;
    }

    pub(crate) fn clear_listeners(&self) {
        self.listeners.lock().clear();
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
