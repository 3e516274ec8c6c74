//! The event-driven request primitive.
//!
//! Mirrors the classic request-object shape: `open`, `set_request_header`,
//! handler registration, then `send`. The request runs on the async
//! runtime, but completion handlers are delivered through the shared
//! [`EventQueue`] so they observe the same deferred ordering as every
//! other callback in the simulator.

use std::sync::Arc;
use std::time::Instant;

use extsim_protocols::{HeaderMap, NetworkRecord, RequestKind};
use extsim_runloop::EventQueue;

use crate::error::TrafficError;
use crate::inflight::InFlight;
use crate::log::TrafficLog;
use crate::transport::{HttpTransport, TransportRequest, TransportResponse};

type LoadHandler = Box<dyn FnOnce(XhrResponse) + Send>;
type ErrorHandler = Box<dyn FnOnce(String) + Send>;

/// Response surface handed to the `on_load` handler.
#[derive(Debug, Clone)]
pub struct XhrResponse {
    pub status: u16,
    pub status_text: String,
    pub headers: HeaderMap,
    pub response_text: String,
}

impl XhrResponse {
    /// Case-insensitive response header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

impl From<TransportResponse> for XhrResponse {
    fn from(response: TransportResponse) -> Self {
        Self {
            status: response.status,
            status_text: response.status_text,
            headers: response.headers,
            response_text: response.body,
        }
    }
}

/// One reusable request object.
///
/// An HTTP error status is still a load; `on_error` fires only for
/// transport-level failures, matching the primitive being emulated.
pub struct XhrRequest {
    transport: Arc<dyn HttpTransport>,
    log: Arc<TrafficLog>,
    queue: Arc<EventQueue>,
    in_flight: InFlight,
    target: Option<(String, String)>,
    headers: HeaderMap,
    sent: bool,
    on_load: Option<LoadHandler>,
    on_error: Option<ErrorHandler>,
}

impl XhrRequest {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        log: Arc<TrafficLog>,
        queue: Arc<EventQueue>,
        in_flight: InFlight,
    ) -> Self {
        Self {
            transport,
            log,
            queue,
            in_flight,
            target: None,
            headers: HeaderMap::new(),
            sent: false,
            on_load: None,
            on_error: None,
        }
    }

    /// Arm the request with a method and URL. Re-opening resets headers
    /// and the sent flag, like the primitive being emulated.
    pub fn open(&mut self, method: impl Into<String>, url: impl Into<String>) {
        self.target = Some((method.into(), url.into()));
        self.headers.clear();
        self.sent = false;
    }

    pub fn set_request_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    pub fn on_load<F>(&mut self, handler: F)
    where
        F: FnOnce(XhrResponse) + Send + 'static,
    {
        self.on_load = Some(Box::new(handler));
    }

    pub fn on_error<F>(&mut self, handler: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        self.on_error = Some(Box::new(handler));
    }

    /// Start the request. Must be called inside a tokio runtime; handlers
    /// fire on a later queue turn, never inside this call.
    pub fn send(&mut self, body: Option<String>) -> Result<(), TrafficError> {
        let (method, url) = self.target.clone().ok_or(TrafficError::NotOpened)?;
        if self.sent {
            return Err(TrafficError::AlreadySent);
        }
        self.sent = true;

        let mut record = NetworkRecord::started(RequestKind::Xhr, &method, &url)
            .with_request_headers(self.headers.clone());
        if let Some(ref body) = body {
            record = record.with_request_body(body.clone());
        }
        let id = self.log.insert(record);

        let request = TransportRequest {
            method,
            url,
            headers: self.headers.clone(),
            body,
        };
        let transport = self.transport.clone();
        let log = self.log.clone();
        let queue = self.queue.clone();
        let on_load = self.on_load.take();
        let on_error = self.on_error.take();
        let guard = self.in_flight.enter();

        tokio::spawn(async move {
            let started = Instant::now();
            match transport.execute(request).await {
                Ok(response) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    log.complete(
                        id,
                        response.status,
                        response.status_text.clone(),
                        duration_ms,
                        response.headers.clone(),
                        Some(response.body_value()),
                    );
                    if let Some(handler) = on_load {
                        queue.defer(move || handler(XhrResponse::from(response)));
                    }
                }
                Err(error) => {
                    let message = error.to_string();
                    log.fail(id, message.clone());
                    if let Some(handler) = on_error {
                        queue.defer(move || handler(message));
                    }
                }
            }
            // Released only after the handler is queued; see InFlight.
            drop(guard);
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "xhr_tests.rs"]
mod tests;
