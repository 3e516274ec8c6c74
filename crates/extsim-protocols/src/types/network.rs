//! Intercepted-request log entries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Which outbound primitive produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Fetch,
    Xhr,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestKind::Fetch => f.write_str("fetch"),
            RequestKind::Xhr => f.write_str("xhr"),
        }
    }
}

/// Header map captured on either side of a request.
pub type HeaderMap = BTreeMap<String, String>;

/// One intercepted outbound request, created with partial fields at call
/// start and completed in place when the response or error resolves.
///
/// Owned exclusively by the traffic log; the inspection UI reads
/// snapshots only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub url: String,
    pub method: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_headers: Option<HeaderMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_headers: Option<HeaderMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NetworkRecord {
    /// A partial record allocated at call start.
    pub fn started(kind: RequestKind, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            url: url.into(),
            method: method.into(),
            timestamp: Utc::now(),
            duration_ms: None,
            status: None,
            status_text: None,
            request_headers: None,
            response_headers: None,
            request_body: None,
            response_body: None,
            error: None,
        }
    }

    pub fn with_request_headers(mut self, headers: HeaderMap) -> Self {
        if !headers.is_empty() {
            self.request_headers = Some(headers);
        }
        self
    }

    pub fn with_request_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    /// Fill in the response side of a completed request.
    pub fn complete(
        &mut self,
        status: u16,
        status_text: impl Into<String>,
        duration_ms: u64,
        response_headers: HeaderMap,
        response_body: Option<Value>,
    ) {
        self.status = Some(status);
        self.status_text = Some(status_text.into());
        self.duration_ms = Some(duration_ms);
        self.response_headers = Some(response_headers);
        self.response_body = response_body;
    }

    /// Record a transport failure: an error string and a zero duration
    /// instead of response fields.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        self.duration_ms = Some(0);
    }

    /// Whether the request has resolved, successfully or not.
    pub fn is_finished(&self) -> bool {
        self.status.is_some() || self.error.is_some()
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
