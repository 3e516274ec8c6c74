use super::*;

use std::time::Duration;

use parking_lot::Mutex;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

use crate::transport::ReqwestTransport;
use extsim_runloop::VirtualClock;

struct Harness {
    log: Arc<TrafficLog>,
    queue: Arc<EventQueue>,
    in_flight: InFlight,
}

impl Harness {
    fn new() -> Self {
        Self {
            log: Arc::new(TrafficLog::default()),
            queue: Arc::new(EventQueue::new(Arc::new(VirtualClock::new()))),
            in_flight: InFlight::new(),
        }
    }

    fn xhr(&self) -> XhrRequest {
        XhrRequest::new(
            Arc::new(ReqwestTransport::new()),
            self.log.clone(),
            self.queue.clone(),
            self.in_flight.clone(),
        )
    }

    /// Wait for the request task to finish recording, then deliver the
    /// deferred handlers.
    async fn drain(&self) {
        while !self.in_flight.is_zero() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        self.queue.run_until_idle();
    }
}

#[tokio::test]
async fn test_send_before_open_errors() {
    let harness = Harness::new();
    let mut xhr = harness.xhr();
    assert!(matches!(xhr.send(None), Err(TrafficError::NotOpened)));
    assert!(harness.log.is_empty());
}

#[tokio::test]
async fn test_double_send_errors() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let harness = Harness::new();
    let mut xhr = harness.xhr();
    xhr.open("GET", format!("{}/once", server.uri()));
    xhr.send(None).unwrap();
    assert!(matches!(xhr.send(None), Err(TrafficError::AlreadySent)));
    harness.drain().await;
    assert_eq!(harness.log.len(), 1);
}

#[tokio::test]
async fn test_on_load_is_deferred_through_the_queue() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new();
    let loaded = Arc::new(Mutex::new(None));

    let mut xhr = harness.xhr();
    xhr.open("GET", format!("{}/page", server.uri()));
    let l = loaded.clone();
    xhr.on_load(move |response| {
        *l.lock() = Some((response.status, response.response_text));
    });
    xhr.send(None).unwrap();

    // The handler waits in the queue even after the request resolves.
    while !harness.in_flight.is_zero() {
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(loaded.lock().is_none());

    harness.queue.run_until_idle();
    assert_eq!(
        loaded.lock().take(),
        Some((200, "hello".to_string()))
    );

    let record = &harness.log.snapshot()[0];
    assert_eq!(record.kind, RequestKind::Xhr);
    assert_eq!(record.status, Some(200));
}

#[tokio::test]
async fn test_request_headers_and_body_are_recorded() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/submit"))
        .and(matchers::header("x-trace", "t1"))
        .and(matchers::body_string(r#"{"n":1}"#))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let harness = Harness::new();
    let mut xhr = harness.xhr();
    xhr.open("POST", format!("{}/submit", server.uri()));
    xhr.set_request_header("x-trace", "t1");
    xhr.send(Some(r#"{"n":1}"#.to_string())).unwrap();
    harness.drain().await;

    let record = &harness.log.snapshot()[0];
    assert_eq!(record.method, "POST");
    assert_eq!(record.request_body.as_deref(), Some(r#"{"n":1}"#));
    let headers = record.request_headers.as_ref().unwrap();
    assert_eq!(headers.get("x-trace").map(String::as_str), Some("t1"));
    assert_eq!(record.status, Some(204));
}

#[tokio::test]
async fn test_http_error_status_still_loads() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down"))
        .mount(&server)
        .await;

    let harness = Harness::new();
    let outcome = Arc::new(Mutex::new((None, None)));

    let mut xhr = harness.xhr();
    xhr.open("GET", format!("{}/flaky", server.uri()));
    let o = outcome.clone();
    xhr.on_load(move |response| o.lock().0 = Some(response.status));
    let o = outcome.clone();
    xhr.on_error(move |message| o.lock().1 = Some(message));
    xhr.send(None).unwrap();
    harness.drain().await;

    let outcome = outcome.lock();
    assert_eq!(outcome.0, Some(503));
    assert!(outcome.1.is_none());
}

#[tokio::test]
async fn test_transport_failure_fires_on_error() {
    let harness = Harness::new();
    let failure = Arc::new(Mutex::new(None));

    let mut xhr = harness.xhr();
    // Nothing listens on port 1.
    xhr.open("GET", "http://127.0.0.1:1/unreachable");
    let f = failure.clone();
    xhr.on_error(move |message| *f.lock() = Some(message));
    xhr.send(None).unwrap();
    harness.drain().await;

    assert!(failure.lock().take().is_some_and(|m| !m.is_empty()));
    let record = &harness.log.snapshot()[0];
    assert!(record.error.is_some());
    assert_eq!(record.duration_ms, Some(0));
}

#[tokio::test]
async fn test_reopen_resets_the_object() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let harness = Harness::new();
    let mut xhr = harness.xhr();
    xhr.open("GET", format!("{}/a", server.uri()));
    xhr.send(None).unwrap();
    harness.drain().await;

    xhr.open("GET", format!("{}/b", server.uri()));
    xhr.send(None).unwrap();
    harness.drain().await;

    let snapshot = harness.log.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert!(snapshot[0].url.ends_with("/b"));
    assert!(snapshot[1].url.ends_with("/a"));
}
