//! The promise-style request primitive.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use extsim_protocols::{HeaderMap, NetworkRecord, RequestKind};

use crate::error::TrafficError;
use crate::inflight::InFlight;
use crate::log::TrafficLog;
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};

/// Options for a fetch call.
#[derive(Debug, Clone, Default)]
pub struct FetchInit {
    pub method: Option<String>,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl FetchInit {
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// JSON body with the matching content type.
    pub fn json(self, value: &Value) -> Self {
        self.header("content-type", "application/json")
            .body(value.to_string())
    }
}

/// Response handed back to the caller, buffered in full so the traffic
/// log reading it never consumes anything the caller still needs.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    body: String,
}

impl FetchResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> &str {
        &self.body
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

impl From<TransportResponse> for FetchResponse {
    fn from(response: TransportResponse) -> Self {
        Self {
            status: response.status,
            status_text: response.status_text,
            headers: response.headers,
            body: response.body,
        }
    }
}

/// Intercepting fetch: records every call in the traffic log, then lets
/// the transport's outcome through unmodified.
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn HttpTransport>,
    log: Arc<TrafficLog>,
    in_flight: InFlight,
}

impl FetchClient {
    pub fn new(transport: Arc<dyn HttpTransport>, log: Arc<TrafficLog>, in_flight: InFlight) -> Self {
        Self {
            transport,
            log,
            in_flight,
        }
    }

    /// GET `url` with no headers or body.
    pub async fn fetch(&self, url: &str) -> Result<FetchResponse, TrafficError> {
        self.fetch_with(url, FetchInit::default()).await
    }

    pub async fn fetch_with(
        &self,
        url: &str,
        init: FetchInit,
    ) -> Result<FetchResponse, TrafficError> {
        let method = init.method.clone().unwrap_or_else(|| "GET".to_string());
        let mut record = NetworkRecord::started(RequestKind::Fetch, &method, url)
            .with_request_headers(init.headers.clone());
        if let Some(ref body) = init.body {
            record = record.with_request_body(body.clone());
        }
        let id = self.log.insert(record);

        let _guard = self.in_flight.enter();
        let started = Instant::now();
        let result = self
            .transport
            .execute(TransportRequest {
                method,
                url: url.to_string(),
                headers: init.headers,
                body: init.body,
            })
            .await;

        match result {
            Ok(response) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                self.log.complete(
                    id,
                    response.status,
                    response.status_text.clone(),
                    duration_ms,
                    response.headers.clone(),
                    Some(response.body_value()),
                );
                Ok(FetchResponse::from(response))
            }
            Err(error) => {
                self.log.fail(id, error.to_string());
                Err(error)
            }
        }
    }
}

#[cfg(test)]
#[path = "fetch_tests.rs"]
mod tests;
