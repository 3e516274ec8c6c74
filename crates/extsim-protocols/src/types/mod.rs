//! Common types used across the ExtSim simulator.

mod diagnostics;
mod manifest;
mod message;
mod network;
mod notification;
mod permissions;
mod storage;
mod tab;

pub use diagnostics::*;
pub use manifest::*;
pub use message::*;
pub use network::*;
pub use notification::*;
pub use permissions::*;
pub use storage::*;
pub use tab::*;

/// JSON object map used for storage items, query defaults, and payloads.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;
