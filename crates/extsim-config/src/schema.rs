//! Settings schema.

use serde::{Deserialize, Serialize};

use extsim_protocols::WindowId;

use crate::error::ConfigError;

/// Root settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub simulator: SimulatorTable,

    #[serde(default)]
    pub traffic: TrafficTable,

    #[serde(default)]
    pub diagnostics: DiagnosticsTable,
}

impl SimulatorConfig {
    /// Reject values the simulator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulator.settle_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "simulator.settle_delay_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.simulator.current_window_id == 0 {
            return Err(ConfigError::InvalidValue {
                field: "simulator.current_window_id".to_string(),
                message: "window ids start at 1".to_string(),
            });
        }
        if self.simulator.extension_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "simulator.extension_id".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.traffic.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "traffic.capacity".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.diagnostics.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "diagnostics.capacity".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }
}

/// `[simulator]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorTable {
    /// Delay before a loading tab flips to complete, in milliseconds.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Window id the "current window" queries compare against.
    #[serde(default = "default_current_window_id")]
    pub current_window_id: WindowId,

    /// Synthetic extension identifier used in `chrome-extension://` URLs.
    #[serde(default = "default_extension_id")]
    pub extension_id: String,
}

impl Default for SimulatorTable {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            current_window_id: default_current_window_id(),
            extension_id: default_extension_id(),
        }
    }
}

fn default_settle_delay_ms() -> u64 {
    300
}

fn default_current_window_id() -> WindowId {
    1
}

fn default_extension_id() -> String {
    "extsim-dev".to_string()
}

/// `[traffic]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficTable {
    /// Most-recent-first traffic log capacity.
    #[serde(default = "default_traffic_capacity")]
    pub capacity: usize,
}

impl Default for TrafficTable {
    fn default() -> Self {
        Self {
            capacity: default_traffic_capacity(),
        }
    }
}

fn default_traffic_capacity() -> usize {
    200
}

/// `[diagnostics]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsTable {
    /// Bounded diagnostics buffer capacity.
    #[serde(default = "default_diagnostics_capacity")]
    pub capacity: usize,
}

impl Default for DiagnosticsTable {
    fn default() -> Self {
        Self {
            capacity: default_diagnostics_capacity(),
        }
    }
}

fn default_diagnostics_capacity() -> usize {
    500
}
