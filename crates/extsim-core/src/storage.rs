//! Three key/value storage areas with change diffing and listener fan-out.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use extsim_protocols::{
    AreaName, JsonMap, StorageChange, StorageChanges, StorageKeys, StorageQuery,
};
use extsim_runloop::EventQueue;

use crate::diagnostics::DiagnosticsLog;
use crate::events::EventRegistry;

/// Argument delivered to `onChanged` listeners: the per-key change set and
/// the originating area.
pub type StorageChangeEvent = (StorageChanges, AreaName);

#[derive(Default)]
struct Areas {
    local: JsonMap,
    sync: JsonMap,
    session: JsonMap,
}

impl Areas {
    fn get(&self, name: AreaName) -> &JsonMap {
        match name {
            AreaName::Local => &self.local,
            AreaName::Sync => &self.sync,
            AreaName::Session => &self.session,
        }
    }

    fn get_mut(&mut self, name: AreaName) -> &mut JsonMap {
        match name {
            AreaName::Local => &mut self.local,
            AreaName::Sync => &mut self.sync,
            AreaName::Session => &mut self.session,
        }
    }
}

/// Owner of the three areas and the shared `onChanged` registry.
///
/// Keys are created on first write; a key is either absent or holds one
/// current value. Change records are built per mutating call, only for keys
/// whose value actually differed, and the registry is notified exactly once
/// per call when the change set is non-empty. Callbacks and notifications
/// are always deferred.
pub struct StorageManager {
    areas: Mutex<Areas>,
    on_changed: EventRegistry<StorageChangeEvent>,
    queue: Arc<EventQueue>,
    diagnostics: Arc<DiagnosticsLog>,
}

impl StorageManager {
    pub fn new(queue: Arc<EventQueue>, diagnostics: Arc<DiagnosticsLog>) -> Self {
        Self {
            areas: Mutex::new(Areas::default()),
            on_changed: EventRegistry::new("storage.onChanged"),
            queue,
            diagnostics,
        }
    }

    /// The registry shared by all three areas. Each notification names its
    /// originating area so listeners can filter.
    pub fn on_changed(&self) -> &EventRegistry<StorageChangeEvent> {
        &self.on_changed
    }

    /// Look up `query` in `area` and deliver the resulting map on the next
    /// turn. Unknown keys are omitted, never an error; a defaults object
    /// fills absent keys from its own values.
    pub fn get<Q, F>(&self, area: AreaName, query: Q, cb: F)
    where
        Q: Into<StorageQuery>,
        F: FnOnce(JsonMap) + Send + 'static,
    {
        let result = self.lookup(area, query.into());
        self.diagnostics
            .info(format!("storage.{area}.get: {} key(s)", result.len()));
        self.queue.defer(move || cb(result));
    }

    fn lookup(&self, area: AreaName, query: StorageQuery) -> JsonMap {
        let areas = self.areas.lock();
        let data = areas.get(area);
        match query {
            StorageQuery::All => data.clone(),
            StorageQuery::Key(key) => {
                let mut result = JsonMap::new();
                if let Some(value) = data.get(&key) {
                    result.insert(key, value.clone());
                }
                result
            }
            StorageQuery::Keys(keys) => {
                let mut result = JsonMap::new();
                for key in keys {
                    if let Some(value) = data.get(&key) {
                        result.insert(key, value.clone());
                    }
                }
                result
            }
            StorageQuery::WithDefaults(defaults) => {
                let mut result = JsonMap::new();
                for (key, default) in defaults {
                    let value = data.get(&key).cloned().unwrap_or(default);
                    result.insert(key, value);
                }
                result
            }
        }
    }

    /// Merge `items` into `area`.
    pub fn set(&self, area: AreaName, items: JsonMap) {
        self.apply_set(area, items);
    }

    /// Merge `items` into `area`, then invoke `cb` on the next turn.
    pub fn set_then<F>(&self, area: AreaName, items: JsonMap, cb: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.apply_set(area, items);
        self.queue.defer(cb);
    }

    fn apply_set(&self, area: AreaName, items: JsonMap) {
        let total = items.len();
        let mut changes = StorageChanges::new();
        {
            let mut areas = self.areas.lock();
            let data = areas.get_mut(area);
            for (key, new_value) in items {
                match data.get(&key) {
                    Some(old) if *old == new_value => {}
                    Some(old) => {
                        changes.insert(
                            key.clone(),
                            StorageChange::updated(old.clone(), new_value.clone()),
                        );
                        data.insert(key, new_value);
                    }
                    None => {
                        changes.insert(key.clone(), StorageChange::created(new_value.clone()));
                        data.insert(key, new_value);
                    }
                }
            }
        }
        self.diagnostics.info(format!(
            "storage.{area}.set: {} of {total} key(s) changed",
            changes.len()
        ));
        self.notify(area, changes);
    }

    /// Delete the named keys from `area`.
    pub fn remove<K>(&self, area: AreaName, keys: K)
    where
        K: Into<StorageKeys>,
    {
        self.apply_remove(area, keys.into());
    }

    /// Delete the named keys from `area`, then invoke `cb` on the next turn.
    pub fn remove_then<K, F>(&self, area: AreaName, keys: K, cb: F)
    where
        K: Into<StorageKeys>,
        F: FnOnce() + Send + 'static,
    {
        self.apply_remove(area, keys.into());
        self.queue.defer(cb);
    }

    fn apply_remove(&self, area: AreaName, keys: StorageKeys) {
        let mut changes = StorageChanges::new();
        {
            let mut areas = self.areas.lock();
            let data = areas.get_mut(area);
            for key in keys.into_vec() {
                if let Some(old) = data.remove(&key) {
                    changes.insert(key, StorageChange::removed(old));
                }
            }
        }
        self.diagnostics.info(format!(
            "storage.{area}.remove: {} key(s) deleted",
            changes.len()
        ));
        self.notify(area, changes);
    }

    /// Remove every key in `area`.
    pub fn clear(&self, area: AreaName) {
        self.apply_clear(area);
    }

    /// Remove every key in `area`, then invoke `cb` on the next turn.
    pub fn clear_then<F>(&self, area: AreaName, cb: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.apply_clear(area);
        self.queue.defer(cb);
    }

    fn apply_clear(&self, area: AreaName) {
        let drained = {
            let mut areas = self.areas.lock();
            std::mem::take(areas.get_mut(area))
        };
        let mut changes = StorageChanges::new();
        for (key, old) in drained {
            changes.insert(key, StorageChange::removed(old));
        }
        self.diagnostics.info(format!(
            "storage.{area}.clear: {} key(s) deleted",
            changes.len()
        ));
        self.notify(area, changes);
    }

    fn notify(&self, area: AreaName, changes: StorageChanges) {
        if changes.is_empty() {
            return;
        }
        self.on_changed.emit(&self.queue, (changes, area));
    }

    pub(crate) fn dump(&self) -> StorageDump {
        let areas = self.areas.lock();
        StorageDump {
            local: areas.local.clone(),
            sync: areas.sync.clone(),
            session: areas.session.clone(),
        }
    }
}

/// Snapshot of all three areas, read by the inspection side.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageDump {
    pub local: JsonMap,
    pub sync: JsonMap,
    pub session: JsonMap,
}

impl StorageDump {
    pub fn area(&self, name: AreaName) -> &JsonMap {
        match name {
            AreaName::Local => &self.local,
            AreaName::Sync => &self.sync,
            AreaName::Session => &self.session,
        }
    }
}

/// The `storage` namespace handed to code under test: one handle per area
/// plus the shared `onChanged` registry.
#[derive(Clone)]
pub struct StorageNamespace {
    manager: Arc<StorageManager>,
}

impl StorageNamespace {
    pub(crate) fn new(manager: Arc<StorageManager>) -> Self {
        Self { manager }
    }

    pub fn local(&self) -> StorageArea {
        self.area(AreaName::Local)
    }

    pub fn sync(&self) -> StorageArea {
        self.area(AreaName::Sync)
    }

    pub fn session(&self) -> StorageArea {
        self.area(AreaName::Session)
    }

    pub fn area(&self, name: AreaName) -> StorageArea {
        StorageArea {
            manager: self.manager.clone(),
            area: name,
        }
    }

    pub fn on_changed(&self) -> &EventRegistry<StorageChangeEvent> {
        self.manager.on_changed()
    }
}

/// One storage area bound to its manager.
#[derive(Clone)]
pub struct StorageArea {
    manager: Arc<StorageManager>,
    area: AreaName,
}

impl StorageArea {
    pub fn name(&self) -> AreaName {
        self.area
    }

    pub fn get<Q, F>(&self, query: Q, cb: F)
    where
        Q: Into<StorageQuery>,
        F: FnOnce(JsonMap) + Send + 'static,
    {
        self.manager.get(self.area, query, cb);
    }

    pub fn set(&self, items: JsonMap) {
        self.manager.set(self.area, items);
    }

    pub fn set_then<F>(&self, items: JsonMap, cb: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.manager.set_then(self.area, items, cb);
    }

    pub fn remove<K>(&self, keys: K)
    where
        K: Into<StorageKeys>,
    {
        self.manager.remove(self.area, keys);
    }

    pub fn remove_then<K, F>(&self, keys: K, cb: F)
    where
        K: Into<StorageKeys>,
        F: FnOnce() + Send + 'static,
    {
        self.manager.remove_then(self.area, keys, cb);
    }

    pub fn clear(&self) {
        self.manager.clear(self.area);
    }

    pub fn clear_then<F>(&self, cb: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.manager.clear_then(self.area, cb);
    }
}

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
