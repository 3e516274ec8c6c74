//! Simulated browser tab records and their query/mutation payloads.

use serde::{Deserialize, Serialize};

/// Identifier of a simulated tab. Monotonically assigned starting at 1;
/// id 0 is reserved for the synthetic tab hosting the code under test.
pub type TabId = u32;

/// Identifier of a simulated window.
pub type WindowId = u32;

/// Load state of a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
}

impl std::fmt::Display for TabStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TabStatus::Loading => f.write_str("loading"),
            TabStatus::Complete => f.write_str("complete"),
        }
    }
}

/// One simulated tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    pub index: u32,
    pub window_id: WindowId,
    pub active: bool,
    pub pinned: bool,
    pub highlighted: bool,
    pub url: String,
    pub title: String,
    pub status: TabStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fav_icon_url: Option<String>,
    pub incognito: bool,
    pub audible: bool,
}

/// Properties accepted by `tabs.create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTabProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
}

impl CreateTabProps {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    pub fn with_window(mut self, window_id: WindowId) -> Self {
        self.window_id = Some(window_id);
        self
    }
}

/// Mutable fields accepted by `tabs.update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTabProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audible: Option<bool>,
}

impl UpdateTabProps {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn with_pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    pub fn with_highlighted(mut self, highlighted: bool) -> Self {
        self.highlighted = Some(highlighted);
        self
    }

    pub fn with_audible(mut self, audible: bool) -> Self {
        self.audible = Some(audible);
        self
    }

    /// True when no field is set; such an update is a no-op.
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.active.is_none()
            && self.pinned.is_none()
            && self.highlighted.is_none()
            && self.audible.is_none()
    }
}

/// URL predicate accepted by `tabs.query`: a single substring or a list
/// matched as "any of".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrlFilter {
    Substring(String),
    AnyOf(Vec<String>),
}

impl UrlFilter {
    /// Whether `url` matches this filter (plain substring semantics).
    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlFilter::Substring(needle) => url.contains(needle.as_str()),
            UrlFilter::AnyOf(needles) => needles.iter().any(|n| url.contains(n.as_str())),
        }
    }
}

impl From<&str> for UrlFilter {
    fn from(s: &str) -> Self {
        UrlFilter::Substring(s.to_string())
    }
}

impl From<String> for UrlFilter {
    fn from(s: String) -> Self {
        UrlFilter::Substring(s)
    }
}

impl From<Vec<String>> for UrlFilter {
    fn from(list: Vec<String>) -> Self {
        UrlFilter::AnyOf(list)
    }
}

impl From<Vec<&str>> for UrlFilter {
    fn from(list: Vec<&str>) -> Self {
        UrlFilter::AnyOf(list.into_iter().map(String::from).collect())
    }
}

/// Optional predicate set accepted by `tabs.query`. An empty filter
/// matches every tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_window: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<UrlFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
}

impl TabQuery {
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }

    pub fn current_window(mut self, current: bool) -> Self {
        self.current_window = Some(current);
        self
    }

    pub fn url(mut self, filter: impl Into<UrlFilter>) -> Self {
        self.url = Some(filter.into());
        self
    }

    pub fn window(mut self, window_id: WindowId) -> Self {
        self.window_id = Some(window_id);
        self
    }
}

/// Changed-field payload delivered to `onUpdated` listeners. Only the
/// fields that actually changed are present; the listener also receives
/// the full updated tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pinned: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TabStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl TabChanges {
    pub fn is_empty(&self) -> bool {
        self.url.is_none()
            && self.active.is_none()
            && self.pinned.is_none()
            && self.highlighted.is_none()
            && self.audible.is_none()
            && self.status.is_none()
            && self.title.is_none()
    }
}

/// Payload delivered to `onRemoved` listeners, one per removed tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveInfo {
    pub window_id: WindowId,
    pub is_window_closing: bool,
}

/// The id argument accepted by `tabs.remove`: one id or a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabIds {
    One(TabId),
    Many(Vec<TabId>),
}

impl TabIds {
    pub fn into_vec(self) -> Vec<TabId> {
        match self {
            TabIds::One(id) => vec![id],
            TabIds::Many(ids) => ids,
        }
    }
}

impl From<TabId> for TabIds {
    fn from(id: TabId) -> Self {
        TabIds::One(id)
    }
}

impl From<Vec<TabId>> for TabIds {
    fn from(ids: Vec<TabId>) -> Self {
        TabIds::Many(ids)
    }
}

impl From<&[TabId]> for TabIds {
    fn from(ids: &[TabId]) -> Self {
        TabIds::Many(ids.to_vec())
    }
}

#[cfg(test)]
#[path = "tab_tests.rs"]
mod tests;
