//! The pluggable HTTP transport behind both request primitives.

use async_trait::async_trait;
use serde_json::Value;

use extsim_protocols::HeaderMap;

use crate::error::TrafficError;

/// A prepared outbound request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<String>,
}

/// A fully buffered response.
///
/// Bodies are buffered here once; the caller-facing response objects and
/// the traffic log both read from this copy, so nothing the caller sees
/// is ever consumed by interception.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: String,
}

impl TransportResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Whether the declared content type is JSON.
    pub fn is_json(&self) -> bool {
        self.header("content-type")
            .is_some_and(|content_type| content_type.contains("json"))
    }

    /// The body as structured data when the content type indicates JSON
    /// and it parses, text otherwise.
    pub fn body_value(&self) -> Value {
        if self.is_json() {
            if let Ok(value) = serde_json::from_str(&self.body) {
                return value;
            }
        }
        Value::String(self.body.clone())
    }
}

/// Executes prepared requests against a real (or test) backend.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TrafficError>;
}

/// Default transport backed by a shared reqwest client.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse, TrafficError> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| TrafficError::Transport(format!("invalid method: {}", request.method)))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers: HeaderMap = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.text().await?;

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            body,
        })
    }
}
