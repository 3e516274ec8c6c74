//! Capability sets held by the permission ledger.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A set of API permissions plus host origins.
///
/// Used both as the ledger's state and as the argument to
/// `request`/`contains`/`remove`. Sets are ordered so snapshots are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet {
    #[serde(default)]
    pub permissions: BTreeSet<String>,
    #[serde(default)]
    pub origins: BTreeSet<String>,
}

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origins.insert(origin.into());
        self
    }

    /// Build a set from manifest-style string lists.
    pub fn from_lists<P, O>(permissions: P, origins: O) -> Self
    where
        P: IntoIterator<Item = String>,
        O: IntoIterator<Item = String>,
    {
        Self {
            permissions: permissions.into_iter().collect(),
            origins: origins.into_iter().collect(),
        }
    }

    /// True iff every permission and every origin in `self` is present
    /// in `other`.
    pub fn is_subset_of(&self, other: &PermissionSet) -> bool {
        self.permissions.is_subset(&other.permissions) && self.origins.is_subset(&other.origins)
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty() && self.origins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.permissions.len() + self.origins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set() {
        let set = PermissionSet::new();
        assert!(set.is_empty());
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_builders() {
        let set = PermissionSet::new()
            .with_permission("tabs")
            .with_permission("storage")
            .with_origin("https://example.com/*");
        assert_eq!(set.permissions.len(), 2);
        assert_eq!(set.origins.len(), 1);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_from_lists() {
        let set = PermissionSet::from_lists(
            vec!["tabs".to_string()],
            vec!["https://a.com/*".to_string()],
        );
        assert!(set.permissions.contains("tabs"));
        assert!(set.origins.contains("https://a.com/*"));
    }

    #[test]
    fn test_subset() {
        let granted = PermissionSet::new()
            .with_permission("tabs")
            .with_permission("storage")
            .with_origin("https://a.com/*");
        let asked = PermissionSet::new().with_permission("tabs");
        assert!(asked.is_subset_of(&granted));
        assert!(!granted.is_subset_of(&asked));
    }

    #[test]
    fn test_subset_requires_origins_too() {
        let granted = PermissionSet::new().with_permission("tabs");
        let asked = PermissionSet::new()
            .with_permission("tabs")
            .with_origin("https://b.com/*");
        assert!(!asked.is_subset_of(&granted));
    }

    #[test]
    fn test_empty_set_is_subset_of_anything() {
        let granted = PermissionSet::new().with_permission("tabs");
        assert!(PermissionSet::new().is_subset_of(&granted));
        assert!(PermissionSet::new().is_subset_of(&PermissionSet::new()));
    }

    #[test]
    fn test_serde_defaults() {
        let set: PermissionSet = serde_json::from_str(r#"{"permissions":["tabs"]}"#).unwrap();
        assert!(set.permissions.contains("tabs"));
        assert!(set.origins.is_empty());
    }
}
