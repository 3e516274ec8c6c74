//! Simulated tab table with lifecycle events.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use url::Url;

use extsim_protocols::{
    CreateTabProps, RemoveInfo, Tab, TabChanges, TabId, TabIds, TabQuery, TabStatus,
    UpdateTabProps, WindowId,
};
use extsim_runloop::EventQueue;

use crate::diagnostics::DiagnosticsLog;
use crate::events::EventRegistry;

/// Argument delivered to `onUpdated` listeners: the tab id, the fields that
/// changed, and the full updated tab.
pub type TabUpdatedEvent = (TabId, TabChanges, Tab);

/// Argument delivered to `onRemoved` listeners.
pub type TabRemovedEvent = (TabId, RemoveInfo);

struct TabTable {
    tabs: Vec<Tab>,
    next_id: TabId,
}

impl TabTable {
    fn reindex(&mut self) {
        for (index, tab) in self.tabs.iter_mut().enumerate() {
            tab.index = index as u32;
        }
    }
}

/// Ordered table of simulated tabs.
///
/// Ids are assigned monotonically starting at 1 and never reused within a
/// table's lifetime; exactly one default tab exists at construction. A
/// freshly created (or re-navigated) tab is `loading` and flips to
/// `complete` after the settle delay, deriving its title from the URL.
pub struct TabRegistry {
    state: Arc<Mutex<TabTable>>,
    on_created: EventRegistry<Tab>,
    on_updated: Arc<EventRegistry<TabUpdatedEvent>>,
    on_removed: EventRegistry<TabRemovedEvent>,
    queue: Arc<EventQueue>,
    diagnostics: Arc<DiagnosticsLog>,
    current_window_id: WindowId,
    settle_delay_ms: u64,
    host_tab: Tab,
}

impl TabRegistry {
    pub fn new(
        queue: Arc<EventQueue>,
        diagnostics: Arc<DiagnosticsLog>,
        current_window_id: WindowId,
        settle_delay_ms: u64,
    ) -> Self {
        let mut table = TabTable {
            tabs: Vec::new(),
            next_id: 1,
        };
        let default_id = table.next_id;
        table.next_id += 1;
        table.tabs.push(default_tab(default_id, current_window_id));

        Self {
            state: Arc::new(Mutex::new(table)),
            on_created: EventRegistry::new("tabs.onCreated"),
            on_updated: Arc::new(EventRegistry::new("tabs.onUpdated")),
            on_removed: EventRegistry::new("tabs.onRemoved"),
            queue,
            diagnostics,
            current_window_id,
            settle_delay_ms,
            host_tab: host_tab(current_window_id),
        }
    }

    pub fn on_created(&self) -> &EventRegistry<Tab> {
        &self.on_created
    }

    pub fn on_updated(&self) -> &EventRegistry<TabUpdatedEvent> {
        &self.on_updated
    }

    pub fn on_removed(&self) -> &EventRegistry<TabRemovedEvent> {
        &self.on_removed
    }

    /// Deliver the tabs matching `query` on the next turn. An empty query
    /// matches every tab.
    pub fn query<F>(&self, query: TabQuery, cb: F)
    where
        F: FnOnce(Vec<Tab>) + Send + 'static,
    {
        let matches: Vec<Tab> = {
            let table = self.state.lock();
            table
                .tabs
                .iter()
                .filter(|tab| self.matches(tab, &query))
                .cloned()
                .collect()
        };
        self.diagnostics
            .info(format!("tabs.query: {} match(es)", matches.len()));
        self.queue.defer(move || cb(matches));
    }

    fn matches(&self, tab: &Tab, query: &TabQuery) -> bool {
        if let Some(active) = query.active {
            if tab.active != active {
                return false;
            }
        }
        if let Some(current) = query.current_window {
            if (tab.window_id == self.current_window_id) != current {
                return false;
            }
        }
        if let Some(filter) = &query.url {
            if !filter.matches(&tab.url) {
                return false;
            }
        }
        if let Some(window_id) = query.window_id {
            if tab.window_id != window_id {
                return false;
            }
        }
        true
    }

    /// Append a new tab and fire `onCreated` with it. The tab starts
    /// `loading`; after the settle delay it completes and `onUpdated` fires.
    pub fn create(&self, props: CreateTabProps) {
        self.create_inner(props);
    }

    /// Like [`create`](TabRegistry::create), delivering the new tab to `cb`
    /// on the next turn.
    pub fn create_then<F>(&self, props: CreateTabProps, cb: F)
    where
        F: FnOnce(Tab) + Send + 'static,
    {
        let tab = self.create_inner(props);
        self.queue.defer(move || cb(tab));
    }

    fn create_inner(&self, props: CreateTabProps) -> Tab {
        let tab = {
            let mut table = self.state.lock();
            let id = table.next_id;
            table.next_id += 1;

            let active = props.active.unwrap_or(false);
            if active {
                for tab in table.tabs.iter_mut() {
                    tab.active = false;
                }
            }

            let insert_at = props
                .index
                .map(|i| (i as usize).min(table.tabs.len()))
                .unwrap_or(table.tabs.len());
            let tab = Tab {
                id,
                index: insert_at as u32,
                window_id: props.window_id.unwrap_or(self.current_window_id),
                active,
                pinned: props.pinned.unwrap_or(false),
                highlighted: active,
                url: props.url.unwrap_or_else(|| "about:blank".to_string()),
                title: String::new(),
                status: TabStatus::Loading,
                fav_icon_url: None,
                incognito: false,
                audible: false,
            };
            table.tabs.insert(insert_at, tab);
            table.reindex();
            table.tabs[insert_at].clone()
        };

        self.diagnostics
            .info(format!("tabs.create: id {} url {}", tab.id, tab.url));
        self.on_created.emit(&self.queue, tab.clone());
        self.schedule_load(tab.id);
        tab
    }

    /// Mutate the tab's fields. A `url` change restarts the loading cycle;
    /// `active: true` deactivates every other tab in the registry. Fires
    /// `onUpdated` only when something actually changed.
    pub fn update(&self, id: TabId, props: UpdateTabProps) {
        self.update_inner(id, props);
    }

    /// Like [`update`](TabRegistry::update), delivering the full updated tab
    /// (or `None` for an unknown id) to `cb` on the next turn.
    pub fn update_then<F>(&self, id: TabId, props: UpdateTabProps, cb: F)
    where
        F: FnOnce(Option<Tab>) + Send + 'static,
    {
        let updated = self.update_inner(id, props);
        self.queue.defer(move || cb(updated));
    }

    fn update_inner(&self, id: TabId, props: UpdateTabProps) -> Option<Tab> {
        let mut restart_load = false;
        let outcome = {
            let mut table = self.state.lock();
            let Some(pos) = table.tabs.iter().position(|t| t.id == id) else {
                drop(table);
                self.diagnostics
                    .error(format!("tabs.update: no tab with id {id}"));
                return None;
            };

            if props.active == Some(true) {
                for (i, tab) in table.tabs.iter_mut().enumerate() {
                    if i != pos {
                        tab.active = false;
                    }
                }
            }

            let tab = &mut table.tabs[pos];
            let mut changes = TabChanges::default();
            if let Some(url) = props.url {
                if tab.url != url {
                    tab.url = url.clone();
                    changes.url = Some(url);
                }
                if tab.status != TabStatus::Loading {
                    tab.status = TabStatus::Loading;
                    changes.status = Some(TabStatus::Loading);
                }
                restart_load = true;
            }
            if let Some(active) = props.active {
                if tab.active != active {
                    tab.active = active;
                    changes.active = Some(active);
                }
            }
            if let Some(pinned) = props.pinned {
                if tab.pinned != pinned {
                    tab.pinned = pinned;
                    changes.pinned = Some(pinned);
                }
            }
            if let Some(highlighted) = props.highlighted {
                if tab.highlighted != highlighted {
                    tab.highlighted = highlighted;
                    changes.highlighted = Some(highlighted);
                }
            }
            if let Some(audible) = props.audible {
                if tab.audible != audible {
                    tab.audible = audible;
                    changes.audible = Some(audible);
                }
            }
            (changes, tab.clone())
        };

        let (changes, snapshot) = outcome;
        self.diagnostics.info(format!("tabs.update: id {id}"));
        if restart_load {
            self.schedule_load(id);
        }
        if !changes.is_empty() {
            self.on_updated
                .emit(&self.queue, (id, changes, snapshot.clone()));
        }
        Some(snapshot)
    }

    /// Delete the named tab(s), firing `onRemoved` per id. Removing the last
    /// tab is allowed; unknown ids are reported to diagnostics and skipped.
    pub fn remove<I>(&self, ids: I)
    where
        I: Into<TabIds>,
    {
        self.remove_inner(ids.into());
    }

    /// Like [`remove`](TabRegistry::remove), invoking `cb` on the next turn.
    pub fn remove_then<I, F>(&self, ids: I, cb: F)
    where
        I: Into<TabIds>,
        F: FnOnce() + Send + 'static,
    {
        self.remove_inner(ids.into());
        self.queue.defer(cb);
    }

    fn remove_inner(&self, ids: TabIds) {
        for id in ids.into_vec() {
            let removed = {
                let mut table = self.state.lock();
                match table.tabs.iter().position(|t| t.id == id) {
                    Some(pos) => {
                        let tab = table.tabs.remove(pos);
                        table.reindex();
                        Some(tab)
                    }
                    None => None,
                }
            };
            match removed {
                Some(tab) => {
                    self.diagnostics.info(format!("tabs.remove: id {id}"));
                    self.on_removed.emit(
                        &self.queue,
                        (
                            id,
                            RemoveInfo {
                                window_id: tab.window_id,
                                is_window_closing: false,
                            },
                        ),
                    );
                }
                None => {
                    self.diagnostics
                        .error(format!("tabs.remove: no tab with id {id}"));
                }
            }
        }
    }

    /// Point lookup; delivers `None` for an unknown id.
    pub fn get<F>(&self, id: TabId, cb: F)
    where
        F: FnOnce(Option<Tab>) + Send + 'static,
    {
        let found = {
            let table = self.state.lock();
            table.tabs.iter().find(|t| t.id == id).cloned()
        };
        if found.is_none() {
            self.diagnostics
                .error(format!("tabs.get: no tab with id {id}"));
        }
        self.queue.defer(move || cb(found));
    }

    /// Deliver the synthetic tab hosting the code under test. It is not part
    /// of the table and is unaffected by mutations or reset.
    pub fn get_current<F>(&self, cb: F)
    where
        F: FnOnce(Tab) + Send + 'static,
    {
        let host = self.host_tab.clone();
        self.queue.defer(move || cb(host));
    }

    /// Echo `message` back on the next turn. Simulated tabs have no
    /// execution context, so there is no listener side; the call always
    /// succeeds.
    pub fn send_message<F>(&self, tab_id: TabId, message: Value, cb: F)
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.diagnostics
            .info(format!("tabs.sendMessage: tab {tab_id}"));
        self.queue.defer(move || cb(message));
    }

    fn schedule_load(&self, id: TabId) {
        let state = self.state.clone();
        let on_updated = self.on_updated.clone();
        let queue = self.queue.clone();
        self.queue.defer_after(self.settle_delay_ms, move || {
            let outcome = {
                let mut table = state.lock();
                let Some(tab) = table.tabs.iter_mut().find(|t| t.id == id) else {
                    return;
                };
                let mut changes = TabChanges::default();
                if tab.status != TabStatus::Complete {
                    tab.status = TabStatus::Complete;
                    changes.status = Some(TabStatus::Complete);
                }
                let title = derive_title(&tab.url);
                if tab.title != title {
                    tab.title = title.clone();
                    changes.title = Some(title);
                }
                (changes, tab.clone())
            };
            let (changes, snapshot) = outcome;
            if !changes.is_empty() {
                on_updated.emit(&queue, (id, changes, snapshot));
            }
        });
    }

    /// Discard every tab and restart the id counter, leaving a fresh default
    /// tab with id 1. Fires no events; listener registries are untouched.
    pub(crate) fn reset(&self) {
        let mut table = self.state.lock();
        table.tabs.clear();
        table.next_id = 1;
        let id = table.next_id;
        table.next_id += 1;
        table.tabs.push(default_tab(id, self.current_window_id));
    }

    pub(crate) fn snapshot(&self) -> Vec<Tab> {
        self.state.lock().tabs.clone()
    }
}

fn default_tab(id: TabId, window_id: WindowId) -> Tab {
    Tab {
        id,
        index: 0,
        window_id,
        active: true,
        pinned: false,
        highlighted: true,
        url: "about:blank".to_string(),
        title: "New Tab".to_string(),
        status: TabStatus::Complete,
        fav_icon_url: None,
        incognito: false,
        audible: false,
    }
}

fn host_tab(window_id: WindowId) -> Tab {
    Tab {
        id: 0,
        index: 0,
        window_id,
        active: true,
        pinned: false,
        highlighted: true,
        url: "about:srcdoc".to_string(),
        title: "Extension Host".to_string(),
        status: TabStatus::Complete,
        fav_icon_url: None,
        incognito: false,
        audible: false,
    }
}

/// Title shown once a load settles: "New Tab" for blank pages, else the
/// URL's host, else the raw URL.
fn derive_title(url: &str) -> String {
    if url.is_empty() || url == "about:blank" {
        return "New Tab".to_string();
    }
    match Url::parse(url) {
        Ok(parsed) => parsed
            .host_str()
            .map(str::to_string)
            .unwrap_or_else(|| url.to_string()),
        Err(_) => url.to_string(),
    }
}

#[cfg(test)]
#[path = "tabs_tests.rs"]
mod tests;
