//! # ExtSim Traffic
//!
//! Outbound request interception for the simulated execution context.
//!
//! Wraps the two ambient request primitives the context exposes: a
//! promise-style fetch call and an event-driven request object. Both run
//! against the real network through a pluggable [`HttpTransport`] while
//! appending [`NetworkRecord`](extsim_protocols::NetworkRecord)s to a
//! shared [`TrafficLog`], most recent first.
//!
//! Interception is purely observational: outcomes, ordering, and payloads
//! reach the caller exactly as the transport produced them.

pub mod error;
pub mod fetch;
pub mod inflight;
pub mod log;
pub mod transport;
pub mod xhr;

pub use error::TrafficError;
pub use fetch::{FetchClient, FetchInit, FetchResponse};
pub use inflight::InFlight;
pub use log::{DEFAULT_TRAFFIC_CAPACITY, TrafficLog};
pub use transport::{HttpTransport, ReqwestTransport, TransportRequest, TransportResponse};
pub use xhr::{XhrRequest, XhrResponse};
