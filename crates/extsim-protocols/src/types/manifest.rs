//! Extension manifest descriptor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::JsonMap;

/// The static descriptor the simulator is armed with, shaped like a
/// `manifest.json`. Unknown keys are preserved in `extra` so the bus can
/// return the descriptor unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionManifest {
    pub manifest_version: u32,
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_permissions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub icons: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl ExtensionManifest {
    /// Minimal valid manifest (manifest v3).
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            manifest_version: 3,
            name: name.into(),
            version: version.into(),
            description: String::new(),
            permissions: Vec::new(),
            host_permissions: Vec::new(),
            background: None,
            action: None,
            icons: BTreeMap::new(),
            extra: JsonMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_host_permissions<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.host_permissions = origins.into_iter().map(Into::into).collect();
        self
    }
}

/// Background entry of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackgroundSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_worker: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scripts: Vec<String>,
}

/// Toolbar action entry of the manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_popup: Option<String>,
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
