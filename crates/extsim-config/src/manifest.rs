//! Manifest loading.

use std::fs;
use std::path::Path;

use serde_json::Value;

use extsim_protocols::ExtensionManifest;

use crate::error::ConfigError;

/// A parsed manifest in both views: the typed descriptor for seeding the
/// simulator, and the raw JSON the runtime hands back verbatim.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub manifest: ExtensionManifest,
    pub raw: Value,
}

/// `manifest.json` loader and validator.
pub struct ManifestLoader;

impl ManifestLoader {
    /// Load and validate a manifest file.
    pub fn load(path: &Path) -> Result<LoadedManifest, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load and validate a manifest from a string.
    pub fn load_str(content: &str) -> Result<LoadedManifest, ConfigError> {
        let raw: Value = serde_json::from_str(content)?;
        let manifest: ExtensionManifest = serde_json::from_value(raw.clone())?;
        Self::validate(&manifest)?;
        Ok(LoadedManifest { manifest, raw })
    }

    fn validate(manifest: &ExtensionManifest) -> Result<(), ConfigError> {
        if manifest.name.is_empty() {
            return Err(ConfigError::MissingField("name".to_string()));
        }
        if manifest.version.is_empty() {
            return Err(ConfigError::MissingField("version".to_string()));
        }
        if !matches!(manifest.manifest_version, 2 | 3) {
            return Err(ConfigError::InvalidValue {
                field: "manifest_version".to_string(),
                message: format!("expected 2 or 3, got {}", manifest.manifest_version),
            });
        }
        Ok(())
    }
}
