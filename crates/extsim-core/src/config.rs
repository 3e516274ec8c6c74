//! Simulator settings.

use extsim_protocols::WindowId;

/// Tunable parameters shared across the component tree.
///
/// The defaults match the emulated platform's observable behavior: a 300ms
/// tab settle delay and a single "current" window with id 1.
#[derive(Debug, Clone)]
pub struct SimulatorSettings {
    /// Delay before a loading tab flips to complete, in clock milliseconds.
    pub settle_delay_ms: u64,
    /// The window id `tabs.query({ currentWindow: true })` compares against.
    pub current_window_id: WindowId,
    /// Synthetic extension identifier used by `runtime.getURL` and sender
    /// attribution.
    pub extension_id: String,
    /// Most-recent-first traffic log capacity.
    pub traffic_capacity: usize,
    /// Bounded diagnostics buffer capacity.
    pub diagnostics_capacity: usize,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 300,
            current_window_id: 1,
            extension_id: "extsim-dev".to_string(),
            traffic_capacity: 200,
            diagnostics_capacity: crate::diagnostics::DEFAULT_DIAGNOSTICS_CAPACITY,
        }
    }
}

impl SimulatorSettings {
    pub fn with_settle_delay_ms(mut self, settle_delay_ms: u64) -> Self {
        self.settle_delay_ms = settle_delay_ms;
        self
    }

    pub fn with_current_window(mut self, current_window_id: WindowId) -> Self {
        self.current_window_id = current_window_id;
        self
    }

    pub fn with_extension_id(mut self, extension_id: impl Into<String>) -> Self {
        self.extension_id = extension_id.into();
        self
    }
}
