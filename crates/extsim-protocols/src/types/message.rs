//! Message-bus envelope types.

use serde::{Deserialize, Serialize};

/// Identity metadata the bus attaches to every delivered message.
///
/// Constructed by the bus, never by the caller, so senders cannot forge
/// their origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    /// The synthetic extension identifier the simulator was armed with.
    pub id: String,
    /// URL of the simulated component the message originated from.
    pub url: String,
}

impl Sender {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
        }
    }
}
