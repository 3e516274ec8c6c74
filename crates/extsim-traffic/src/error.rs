//! Traffic errors.
//!
//! These surface only through the request primitives themselves (a failed
//! fetch, a misused request object); the log and the interception layer
//! never fail.

use thiserror::Error;

/// Traffic error types.
#[derive(Debug, Error)]
pub enum TrafficError {
    /// The underlying HTTP client failed.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A non-default transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request object was sent before `open`.
    #[error("request not opened")]
    NotOpened,

    /// The request object was sent twice.
    #[error("request already sent")]
    AlreadySent,
}
