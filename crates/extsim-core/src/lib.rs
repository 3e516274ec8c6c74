//! # ExtSim Core
//!
//! The simulated extension platform: five state components composed by an
//! orchestrator, all sharing one deferred-delivery queue.
//!
//! ## Components
//!
//! - [`StorageManager`] - three key/value areas with change diffing
//! - [`TabRegistry`] - simulated tab table with lifecycle events
//! - [`MessageBus`] - runtime messaging with sender attribution
//! - [`NotificationManager`] - alert records with simulated user actions
//! - [`PermissionLedger`] - granted capability sets
//! - [`Simulator`] - builds the component tree; hands out [`Platform`]
//!   (the surface code under test sees) and [`Inspector`] (the read/driving
//!   side a test harness or UI uses)
//! - [`ExecutionContext`] - a platform handle plus intercepted network
//!   primitives and the pump/advance/settle controls
//!
//! Every callback and listener notification is deferred through the shared
//! [`EventQueue`](extsim_runloop::EventQueue); nothing is delivered inside
//! the caller's stack frame.

pub mod config;
pub mod context;
pub mod diagnostics;
pub mod events;
pub mod notifications;
pub mod permissions;
pub mod platform;
pub mod runtime;
pub mod storage;
pub mod tabs;

pub use config::SimulatorSettings;
pub use context::ExecutionContext;
pub use diagnostics::{DEFAULT_DIAGNOSTICS_CAPACITY, DiagnosticsLog};
pub use events::{EventRegistry, ListenerHandle};
pub use notifications::{ButtonClickEvent, NotificationClosedEvent, NotificationManager};
pub use permissions::PermissionLedger;
pub use platform::{Inspector, Platform, Simulator};
pub use runtime::{MessageBus, Responder};
pub use storage::{StorageArea, StorageChangeEvent, StorageDump, StorageManager, StorageNamespace};
pub use tabs::{TabRegistry, TabRemovedEvent, TabUpdatedEvent};
