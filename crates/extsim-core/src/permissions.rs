//! The `permissions` namespace: an always-grant capability ledger.
//!
//! There is no user to prompt, so `request` has no veto path; it appends
//! and reports success. The `onAdded`/`onRemoved` registries exist so code
//! under test can register against them, but no mutation ever emits. That
//! gap matches the emulated surface and is deliberate.

use std::sync::Arc;

use parking_lot::Mutex;

use extsim_protocols::PermissionSet;
use extsim_runloop::EventQueue;

use crate::diagnostics::DiagnosticsLog;
use crate::events::EventRegistry;

pub struct PermissionLedger {
    granted: Mutex<PermissionSet>,
    on_added: EventRegistry<PermissionSet>,
    on_removed: EventRegistry<PermissionSet>,
    queue: Arc<EventQueue>,
    diagnostics: Arc<DiagnosticsLog>,
}

impl PermissionLedger {
    /// Build a ledger pre-seeded with the manifest's declared grants.
    pub fn new(
        queue: Arc<EventQueue>,
        diagnostics: Arc<DiagnosticsLog>,
        initial: PermissionSet,
    ) -> Self {
        Self {
            granted: Mutex::new(initial),
            on_added: EventRegistry::new("permissions.onAdded"),
            on_removed: EventRegistry::new("permissions.onRemoved"),
            queue,
            diagnostics,
        }
    }

    /// Registry surface only; mutations do not emit through it.
    pub fn on_added(&self) -> &EventRegistry<PermissionSet> {
        &self.on_added
    }

    /// Registry surface only; mutations do not emit through it.
    pub fn on_removed(&self) -> &EventRegistry<PermissionSet> {
        &self.on_removed
    }

    /// Grant everything in `set`. Always succeeds.
    pub fn request(&self, set: PermissionSet) {
        self.request_inner(set);
    }

    /// [`request`](Self::request), then deliver `true` to `cb` on the next
    /// turn.
    pub fn request_then<F>(&self, set: PermissionSet, cb: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        self.request_inner(set);
        self.queue.defer(move || cb(true));
    }

    fn request_inner(&self, set: PermissionSet) {
        self.diagnostics.info(format!(
            "permissions.request: granting {} entry(s)",
            set.len()
        ));
        let mut granted = self.granted.lock();
        granted.permissions.extend(set.permissions);
        granted.origins.extend(set.origins);
    }

    /// Deliver whether every entry of `set` is already granted.
    pub fn contains<F>(&self, set: PermissionSet, cb: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let held = set.is_subset_of(&self.granted.lock());
        self.queue.defer(move || cb(held));
    }

    /// Deliver a snapshot of the full grant set.
    pub fn get_all<F>(&self, cb: F)
    where
        F: FnOnce(PermissionSet) + Send + 'static,
    {
        let all = self.granted.lock().clone();
        self.queue.defer(move || cb(all));
    }

    /// Subtract `set` from the grants. Returns whether anything was
    /// actually removed.
    pub fn remove(&self, set: &PermissionSet) -> bool {
        self.remove_inner(set)
    }

    /// [`remove`](Self::remove), then deliver the outcome to `cb` on the
    /// next turn.
    pub fn remove_then<F>(&self, set: &PermissionSet, cb: F)
    where
        F: FnOnce(bool) + Send + 'static,
    {
        let changed = self.remove_inner(set);
        self.queue.defer(move || cb(changed));
    }

    fn remove_inner(&self, set: &PermissionSet) -> bool {
        let mut granted = self.granted.lock();
        let before = granted.len();
        for permission in &set.permissions {
            granted.permissions.remove(permission);
        }
        for origin in &set.origins {
            granted.origins.remove(origin);
        }
        let changed = granted.len() != before;
        if changed {
            self.diagnostics.info(format!(
                "permissions.remove: dropped {} entry(s)",
                before - granted.len()
            ));
        }
        changed
    }

    pub(crate) fn snapshot(&self) -> PermissionSet {
        self.granted.lock().clone()
    }
}
