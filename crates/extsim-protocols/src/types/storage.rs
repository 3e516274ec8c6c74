//! Storage area lookup and change-diff types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::JsonMap;

/// One of the three independent storage areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaName {
    Local,
    Sync,
    Session,
}

impl AreaName {
    /// All areas, in the order the platform surface exposes them.
    pub const ALL: [AreaName; 3] = [AreaName::Local, AreaName::Sync, AreaName::Session];

    pub fn as_str(&self) -> &'static str {
        match self {
            AreaName::Local => "local",
            AreaName::Sync => "sync",
            AreaName::Session => "session",
        }
    }
}

impl std::fmt::Display for AreaName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The polymorphic key argument accepted by `get`.
///
/// Mirrors the platform contract: absent (whole area), a single key, a key
/// list, or an object whose keys name the lookup set and whose values are
/// per-key defaults for absent keys.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageQuery {
    /// Return every key in the area.
    All,
    /// Return a single key, if present.
    Key(String),
    /// Return the named keys that are present.
    Keys(Vec<String>),
    /// Return the named keys, filling absent ones from the supplied defaults.
    WithDefaults(JsonMap),
}

impl From<&str> for StorageQuery {
    fn from(key: &str) -> Self {
        StorageQuery::Key(key.to_string())
    }
}

impl From<String> for StorageQuery {
    fn from(key: String) -> Self {
        StorageQuery::Key(key)
    }
}

impl From<Vec<String>> for StorageQuery {
    fn from(keys: Vec<String>) -> Self {
        StorageQuery::Keys(keys)
    }
}

impl From<Vec<&str>> for StorageQuery {
    fn from(keys: Vec<&str>) -> Self {
        StorageQuery::Keys(keys.into_iter().map(String::from).collect())
    }
}

impl From<JsonMap> for StorageQuery {
    fn from(defaults: JsonMap) -> Self {
        StorageQuery::WithDefaults(defaults)
    }
}

/// The key argument accepted by `remove`: a single key or a key list.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageKeys {
    One(String),
    Many(Vec<String>),
}

impl StorageKeys {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StorageKeys::One(key) => vec![key],
            StorageKeys::Many(keys) => keys,
        }
    }
}

impl From<&str> for StorageKeys {
    fn from(key: &str) -> Self {
        StorageKeys::One(key.to_string())
    }
}

impl From<String> for StorageKeys {
    fn from(key: String) -> Self {
        StorageKeys::One(key)
    }
}

impl From<Vec<String>> for StorageKeys {
    fn from(keys: Vec<String>) -> Self {
        StorageKeys::Many(keys)
    }
}

impl From<Vec<&str>> for StorageKeys {
    fn from(keys: Vec<&str>) -> Self {
        StorageKeys::Many(keys.into_iter().map(String::from).collect())
    }
}

/// Per-key change record delivered to `onChanged` listeners.
///
/// Absence of `new_value` signals deletion; absence of `old_value` signals
/// first write. Emitted only for keys whose serialized form actually
/// differs, never for no-op writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
}

impl StorageChange {
    /// Change for a key that gained a first value.
    pub fn created(new_value: Value) -> Self {
        Self {
            old_value: None,
            new_value: Some(new_value),
        }
    }

    /// Change for a key whose value was replaced.
    pub fn updated(old_value: Value, new_value: Value) -> Self {
        Self {
            old_value: Some(old_value),
            new_value: Some(new_value),
        }
    }

    /// Change for a key that was deleted.
    pub fn removed(old_value: Value) -> Self {
        Self {
            old_value: Some(old_value),
            new_value: None,
        }
    }

    /// Whether this change represents a deletion.
    pub fn is_removal(&self) -> bool {
        self.new_value.is_none()
    }
}

/// The change set for one mutating call, keyed by storage key.
pub type StorageChanges = BTreeMap<String, StorageChange>;

#[cfg(test)]
#[path = "storage_tests.rs"]
mod tests;
