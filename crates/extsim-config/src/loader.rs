//! Settings loader.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ConfigError;
use crate::schema::SimulatorConfig;

static ENV_VAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Settings loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load settings from a TOML file. Values may reference environment
    /// variables as `${VAR}`; an unset variable is an error.
    pub fn load(path: &Path) -> Result<SimulatorConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load settings from a string.
    pub fn load_str(content: &str) -> Result<SimulatorConfig, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: SimulatorConfig = toml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        for cap in ENV_VAR.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }
        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.extsim`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config_gives_defaults() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.simulator.settle_delay_ms, 300);
        assert_eq!(config.traffic.capacity, 200);
    }

    #[test]
    fn test_load_basic_config() {
        let content = r#"
            [simulator]
            settle_delay_ms = 50
            extension_id = "test-ext"

            [traffic]
            capacity = 16
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.simulator.settle_delay_ms, 50);
        assert_eq!(config.simulator.extension_id, "test-ext");
        assert_eq!(config.traffic.capacity, 16);
        assert_eq!(config.diagnostics.capacity, 500);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let content = r#"
            [simulator]
            settle_delay_ms = 0
        "#;
        let result = ConfigLoader::load_str(content);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "simulator.settle_delay_ms"
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[simulator]").unwrap();
        writeln!(file, "settle_delay_ms = 25").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.simulator.settle_delay_ms, 25);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/extsim.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let content = "invalid = [unclosed";
        let result = ConfigLoader::load_str(content);
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("EXTSIM_TEST_CONFIG_VAR", "expanded-id");
        }
        let content = "[simulator]\nextension_id = \"${EXTSIM_TEST_CONFIG_VAR}\"";
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.simulator.extension_id, "expanded-id");
        unsafe {
            std::env::remove_var("EXTSIM_TEST_CONFIG_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "[simulator]\nextension_id = \"${EXTSIM_NONEXISTENT_VAR_12345}\"";
        let result = ConfigLoader::load_str(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "value = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/scenario.toml");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/scenario.toml"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        let path = "/etc/extsim/extsim.toml";
        assert_eq!(ConfigLoader::expand_path(path), path);
    }
}
