//! # ExtSim Config
//!
//! Settings and manifest loading for the simulator: a TOML settings file
//! with environment variable substitution, and a Chrome-flavored
//! `manifest.json` loader that keeps the raw JSON alongside the typed view.

mod error;
mod loader;
mod manifest;
mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use manifest::{LoadedManifest, ManifestLoader};
pub use schema::{DiagnosticsTable, SimulatorConfig, SimulatorTable, TrafficTable};
