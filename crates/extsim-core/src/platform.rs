//! Orchestrator: builds the component tree and hands out its two faces.
//!
//! [`Platform`] is the namespace-shaped surface code under test calls; it
//! exposes nothing the emulated API would not. [`Inspector`] is the side a
//! test harness or UI drives: state snapshots, the simulated user actions,
//! and reset. Both are cheap clones over the same shared tree.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use extsim_protocols::{
    AreaName, ExtensionManifest, LogEntry, NetworkRecord, Notification, PermissionSet, Tab,
};
use extsim_runloop::{Clock, EventQueue, VirtualClock, WallClock};
use extsim_traffic::{HttpTransport, InFlight, ReqwestTransport, TrafficLog};

use crate::config::SimulatorSettings;
use crate::context::ExecutionContext;
use crate::diagnostics::DiagnosticsLog;
use crate::notifications::NotificationManager;
use crate::permissions::PermissionLedger;
use crate::runtime::MessageBus;
use crate::storage::{StorageDump, StorageManager, StorageNamespace};
use crate::tabs::TabRegistry;

/// The shared component tree behind every handle.
pub(crate) struct SimulatorInner {
    pub(crate) queue: Arc<EventQueue>,
    pub(crate) virtual_clock: Option<Arc<VirtualClock>>,
    pub(crate) diagnostics: Arc<DiagnosticsLog>,
    pub(crate) storage: Arc<StorageManager>,
    pub(crate) tabs: Arc<TabRegistry>,
    pub(crate) runtime: Arc<MessageBus>,
    pub(crate) notifications: Arc<NotificationManager>,
    pub(crate) permissions: Arc<PermissionLedger>,
    pub(crate) traffic: Arc<TrafficLog>,
    pub(crate) in_flight: InFlight,
    pub(crate) transport: Arc<dyn HttpTransport>,
}

impl SimulatorInner {
    /// Return the simulator to its armed state.
    ///
    /// Clears the storage areas (with ordinary change notification), the
    /// tab table, live notifications, and the bus's listeners and
    /// `lastError`. Deliberately left alone: the tab and notification
    /// listener registries (the inspection side owns those), the
    /// permission ledger, the traffic log, diagnostics, and any tasks
    /// already queued.
    pub(crate) fn reset(&self) {
        debug!("simulator reset");
        self.diagnostics.info("reset: returning simulator to armed state");
        for area in AreaName::ALL {
            self.storage.clear(area);
        }
        self.tabs.reset();
        self.notifications.reset();
        self.runtime.clear_listeners();
        self.runtime.clear_last_error();
    }
}

/// Assembles a [`Simulator`] from a manifest descriptor.
pub struct SimulatorBuilder {
    manifest: Value,
    settings: SimulatorSettings,
    transport: Option<Arc<dyn HttpTransport>>,
    wall_clock: bool,
}

impl SimulatorBuilder {
    fn new(manifest: Value) -> Self {
        Self {
            manifest,
            settings: SimulatorSettings::default(),
            transport: None,
            wall_clock: false,
        }
    }

    pub fn settings(mut self, settings: SimulatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Swap the default reqwest transport, e.g. for a test double.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Order delayed tasks by real elapsed time instead of the virtual
    /// clock. `advance` becomes a no-op; `settle` sleeps instead.
    pub fn wall_clock(mut self) -> Self {
        self.wall_clock = true;
        self
    }

    pub fn build(self) -> Simulator {
        let (clock, virtual_clock): (Arc<dyn Clock>, Option<Arc<VirtualClock>>) =
            if self.wall_clock {
                (Arc::new(WallClock::new()), None)
            } else {
                let virtual_clock = Arc::new(VirtualClock::new());
                (virtual_clock.clone(), Some(virtual_clock))
            };
        let queue = Arc::new(EventQueue::new(clock));
        let diagnostics = Arc::new(DiagnosticsLog::new(self.settings.diagnostics_capacity));
        let seed = seed_permissions(&self.manifest, &diagnostics);

        let storage = Arc::new(StorageManager::new(queue.clone(), diagnostics.clone()));
        let tabs = Arc::new(TabRegistry::new(
            queue.clone(),
            diagnostics.clone(),
            self.settings.current_window_id,
            self.settings.settle_delay_ms,
        ));
        let runtime = Arc::new(MessageBus::new(
            queue.clone(),
            diagnostics.clone(),
            self.manifest,
            self.settings.extension_id.clone(),
        ));
        let notifications = Arc::new(NotificationManager::new(queue.clone(), diagnostics.clone()));
        let permissions = Arc::new(PermissionLedger::new(
            queue.clone(),
            diagnostics.clone(),
            seed,
        ));
        let traffic = Arc::new(TrafficLog::new(self.settings.traffic_capacity));
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(ReqwestTransport::new()));

        debug!(extension_id = %self.settings.extension_id, "simulator armed");
        Simulator {
            inner: Arc::new(SimulatorInner {
                queue,
                virtual_clock,
                diagnostics,
                storage,
                tabs,
                runtime,
                notifications,
                permissions,
                traffic,
                in_flight: InFlight::new(),
                transport,
            }),
        }
    }
}

/// Grants declared in the manifest; a descriptor that does not parse seeds
/// an empty ledger rather than failing arming.
fn seed_permissions(manifest: &Value, diagnostics: &DiagnosticsLog) -> PermissionSet {
    match serde_json::from_value::<ExtensionManifest>(manifest.clone()) {
        Ok(parsed) => PermissionSet::from_lists(parsed.permissions, parsed.host_permissions),
        Err(error) => {
            warn!(%error, "manifest did not parse; permission ledger starts empty");
            diagnostics.warn(format!(
                "manifest did not parse ({error}); permission ledger starts empty"
            ));
            PermissionSet::new()
        }
    }
}

/// Owner handle over the component tree.
pub struct Simulator {
    inner: Arc<SimulatorInner>,
}

impl Simulator {
    /// Arm the simulator with default settings, a virtual clock, and the
    /// real network transport.
    pub fn new(manifest: Value) -> Self {
        Self::builder(manifest).build()
    }

    pub fn builder(manifest: Value) -> SimulatorBuilder {
        SimulatorBuilder::new(manifest)
    }

    /// The surface handed to code under test.
    pub fn platform(&self) -> Platform {
        Platform {
            inner: self.inner.clone(),
        }
    }

    /// The reading and driving side for a harness or UI.
    pub fn inspector(&self) -> Inspector {
        Inspector {
            inner: self.inner.clone(),
        }
    }

    /// A fresh execution frame: platform surface plus the intercepted
    /// request primitives and the queue controls.
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new(self.inner.clone())
    }

    pub fn reset(&self) {
        self.inner.reset();
    }
}

/// The namespace-shaped API surface.
///
/// Holds no state of its own; every handle it returns shares the
/// simulator's tree. None of the inspection accessors are reachable from
/// here.
#[derive(Clone)]
pub struct Platform {
    inner: Arc<SimulatorInner>,
}

impl Platform {
    pub(crate) fn new(inner: Arc<SimulatorInner>) -> Self {
        Self { inner }
    }

    pub fn storage(&self) -> StorageNamespace {
        StorageNamespace::new(self.inner.storage.clone())
    }

    pub fn tabs(&self) -> Arc<TabRegistry> {
        self.inner.tabs.clone()
    }

    pub fn runtime(&self) -> Arc<MessageBus> {
        self.inner.runtime.clone()
    }

    pub fn notifications(&self) -> Arc<NotificationManager> {
        self.inner.notifications.clone()
    }

    pub fn permissions(&self) -> Arc<PermissionLedger> {
        self.inner.permissions.clone()
    }
}

/// Read accessors and simulated user actions that do not exist on the
/// emulated API and are never exposed to code under test.
#[derive(Clone)]
pub struct Inspector {
    inner: Arc<SimulatorInner>,
}

impl Inspector {
    pub fn tabs(&self) -> Vec<Tab> {
        self.inner.tabs.snapshot()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.inner.notifications.snapshot()
    }

    pub fn storage(&self) -> StorageDump {
        self.inner.storage.dump()
    }

    pub fn permissions(&self) -> PermissionSet {
        self.inner.permissions.snapshot()
    }

    /// Intercepted requests, newest first.
    pub fn traffic(&self) -> Vec<NetworkRecord> {
        self.inner.traffic.snapshot()
    }

    pub fn clear_traffic(&self) {
        self.inner.traffic.clear();
    }

    pub fn diagnostics(&self) -> Vec<LogEntry> {
        self.inner.diagnostics.snapshot()
    }

    /// Emulate a user clicking a notification body.
    pub fn simulate_notification_click(&self, id: &str) -> bool {
        self.inner.notifications.simulate_click(id)
    }

    /// Emulate a user clicking a notification action button.
    pub fn simulate_notification_button_click(&self, id: &str, index: usize) -> bool {
        self.inner.notifications.simulate_button_click(id, index)
    }

    /// Emulate a user dismissing a notification.
    pub fn simulate_notification_close(&self, id: &str) -> bool {
        self.inner.notifications.simulate_close(id)
    }

    pub fn reset(&self) {
        self.inner.reset();
    }
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod tests;
