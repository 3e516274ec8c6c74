//! # ExtSim Protocols
//!
//! Shared data model for the ExtSim extension runtime simulator.
//! Contains only type definitions - no component implementations.
//!
//! ## Type Families
//!
//! - [`Tab`], [`TabQuery`], [`CreateTabProps`], [`UpdateTabProps`] - simulated tab records
//! - [`StorageQuery`], [`StorageChange`] - key/value storage lookups and change diffs
//! - [`NotificationOptions`], [`NotificationUpdate`] - user-facing alert payloads
//! - [`PermissionSet`] - granted capability sets
//! - [`Sender`] - message origin descriptor attached by the bus
//! - [`NetworkRecord`] - intercepted outbound request log entries
//! - [`ExtensionManifest`] - the static descriptor the simulator is armed with
//! - [`LogEntry`] - diagnostics sink entries read by the inspection UI
//!
//! The simulator core intentionally defines no error enums here: ordinary
//! misuse is reported through result channels and the diagnostics sink,
//! never through `Err` (see the orchestrator crate). Crates with genuinely
//! fallible surfaces (config loading, network transport) carry their own
//! error types.

pub mod types;

pub use types::*;
