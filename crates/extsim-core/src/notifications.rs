//! The `notifications` namespace: alert records plus the simulated user
//! actions that stand in for a human clicking or dismissing them.
//!
//! Nothing here renders. A notification is a stored record; the only way
//! `onClicked`, `onButtonClicked`, or `onClosed(byUser=true)` ever fire is
//! through the `simulate_*` entry points the inspection side drives.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;

use extsim_protocols::{Notification, NotificationOptions, NotificationUpdate};
use extsim_runloop::EventQueue;

use crate::diagnostics::DiagnosticsLog;
use crate::events::EventRegistry;

/// `onButtonClicked` payload: notification id and zero-based button index.
pub type ButtonClickEvent = (String, usize);

/// `onClosed` payload: notification id and whether a simulated user closed it.
pub type NotificationClosedEvent = (String, bool);

struct NotifyTable {
    records: BTreeMap<String, Notification>,
    next_id: u64,
}

/// Live notification records keyed by id.
pub struct NotificationManager {
    state: Mutex<NotifyTable>,
    on_clicked: EventRegistry<String>,
    on_button_clicked: EventRegistry<ButtonClickEvent>,
    on_closed: EventRegistry<NotificationClosedEvent>,
    queue: Arc<EventQueue>,
    diagnostics: Arc<DiagnosticsLog>,
}

impl NotificationManager {
    pub fn new(queue: Arc<EventQueue>, diagnostics: Arc<DiagnosticsLog>) -> Self {
        Self {
            state: Mutex::new(NotifyTable {
                records: BTreeMap::new(),
                next_id: 1,
            }),
            on_clicked: EventRegistry::new("notifications.onClicked"),
            on_button_clicked: EventRegistry::new("notifications.onButtonClicked"),
            on_closed: EventRegistry::new("notifications.onClosed"),
            queue,
            diagnostics,
        }
    }

    pub fn on_clicked(&self) -> &EventRegistry<String> {
        &self.on_clicked
    }

    pub fn on_button_clicked(&self) -> &EventRegistry<ButtonClickEvent> {
        &self.on_button_clicked
    }

    pub fn on_closed(&self) -> &EventRegistry<NotificationClosedEvent> {
        &self.on_closed
    }

    /// Create a notification record. An absent or empty `id` is assigned
    /// from an internal counter; a supplied id that already exists silently
    /// overwrites the old record.
    pub fn create(&self, id: Option<String>, options: NotificationOptions) -> String {
        self.create_inner(id, options)
    }

    /// [`create`](Self::create), then deliver the assigned id to `cb` on the
    /// next turn.
    pub fn create_then<F>(&self, id: Option<String>, options: NotificationOptions, cb: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        let id = self.create_inner(id, options);
        self.queue.defer(move || cb(id));
    }

    fn create_inner(&self, id: Option<String>, options: NotificationOptions) -> String {
        let mut state = self.state.lock();
        let id = match id {
            Some(id) if !id.is_empty() => id,
            _ => {
                let id = format!("notif_{}", state.next_id);
                state.next_id += 1;
                id
            }
        };
        self.diagnostics
            .info(format!("notifications.create: {id} ({:?})", options.kind));
        state.records.insert(
            id.clone(),
            Notification {
                id: id.clone(),
                options,
                created_at: Utc::now(),
            },
        );
        id
    }

    /// Merge `update` into the stored record. Returns whether a record with
    /// that id existed.
    pub fn update(&self, id: &str, update: NotificationUpdate) -> bool {
        self.update_inner(id, update)
    }

    /// [`update`](Self::update), then deliver the outcome to `cb` on the
    /// next turn.
    pub fn update_then<F>(&self, id: &str, update: NotificationUpdate, cb: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let updated = self.update_inner(id, update);
        self.queue.defer(move || cb(updated));
    }

    fn update_inner(&self, id: &str, update: NotificationUpdate) -> bool {
        let mut state = self.state.lock();
        match state.records.get_mut(id) {
            Some(record) => {
                record.options.apply(&update);
                self.diagnostics.info(format!("notifications.update: {id}"));
                true
            }
            None => {
                self.diagnostics
                    .error(format!("notifications.update: no notification with id {id}"));
                false
            }
        }
    }

    /// Remove the record if present and fire `onClosed(id, byUser=false)`.
    /// Returns whether anything was removed.
    pub fn clear(&self, id: &str) -> bool {
        self.clear_inner(id)
    }

    /// [`clear`](Self::clear), then deliver the outcome to `cb` on the next
    /// turn.
    pub fn clear_then<F>(&self, id: &str, cb: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let cleared = self.clear_inner(id);
        self.queue.defer(move || cb(cleared));
    }

    fn clear_inner(&self, id: &str) -> bool {
        let removed = self.state.lock().records.remove(id).is_some();
        if removed {
            self.diagnostics.info(format!("notifications.clear: {id}"));
            self.on_closed
                .emit(&self.queue, (id.to_string(), false));
        } else {
            self.diagnostics
                .error(format!("notifications.clear: no notification with id {id}"));
        }
        removed
    }

    /// Deliver a snapshot of all live records (id to options) to `cb` on
    /// the next turn.
    pub fn get_all<F>(&self, cb: F)
    where
        F: FnOnce(BTreeMap<String, NotificationOptions>) + Send + 'static,
    {
        let all: BTreeMap<String, NotificationOptions> = {
            let state = self.state.lock();
            state
                .records
                .iter()
                .map(|(id, record)| (id.clone(), record.options.clone()))
                .collect()
        };
        self.queue.defer(move || cb(all));
    }

    /// Emulate a user clicking the notification body. Fires `onClicked`
    /// when the id is live; the record itself stays.
    pub(crate) fn simulate_click(&self, id: &str) -> bool {
        if !self.state.lock().records.contains_key(id) {
            self.diagnostics
                .error(format!("notifications.simulateClick: no notification with id {id}"));
            return false;
        }
        self.on_clicked.emit(&self.queue, id.to_string());
        true
    }

    /// Emulate a user clicking button `index`. The index must name an
    /// existing button on the record.
    pub(crate) fn simulate_button_click(&self, id: &str, index: usize) -> bool {
        let valid = {
            let state = self.state.lock();
            match state.records.get(id) {
                Some(record) => {
                    let button_count = record
                        .options
                        .buttons
                        .as_ref()
                        .map(Vec::len)
                        .unwrap_or(0);
                    index < button_count
                }
                None => false,
            }
        };
        if !valid {
            self.diagnostics.error(format!(
                "notifications.simulateButtonClick: no notification {id} with button {index}"
            ));
            return false;
        }
        self.on_button_clicked
            .emit(&self.queue, (id.to_string(), index));
        true
    }

    /// Emulate a user dismissing the notification: removes the record and
    /// fires `onClosed(id, byUser=true)`.
    pub(crate) fn simulate_close(&self, id: &str) -> bool {
        let removed = self.state.lock().records.remove(id).is_some();
        if removed {
            self.on_closed.emit(&self.queue, (id.to_string(), true));
        } else {
            self.diagnostics
                .error(format!("notifications.simulateClose: no notification with id {id}"));
        }
        removed
    }

    /// Drop every record and restart the id counter. Listener registries
    /// are left alone; they belong to the inspection side.
    pub(crate) fn reset(&self) {
        let mut state = self.state.lock();
        state.records.clear();
        state.next_id = 1;
    }

    pub(crate) fn snapshot(&self) -> Vec<Notification> {
        self.state.lock().records.values().cloned().collect()
    }
}

#[cfg(test)]
#[path = "notifications_tests.rs"]
mod tests;
