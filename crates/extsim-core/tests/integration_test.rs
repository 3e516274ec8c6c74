//! End-to-end scenarios across the simulated platform surface.
//!
//! These tests drive the public API the way extension code under test
//! would: mutate through [`Platform`], observe through [`Inspector`], and
//! move time with the [`ExecutionContext`] controls.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

use extsim_core::{NotificationClosedEvent, Simulator, StorageChangeEvent, TabUpdatedEvent};
use extsim_protocols::{
    CreateTabProps, JsonMap, NotificationOptions, RequestKind, StorageChange, Tab, TabStatus,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn manifest() -> Value {
    json!({
        "manifest_version": 3,
        "name": "Scenario Extension",
        "version": "1.0.0",
        "permissions": ["storage", "tabs", "notifications"],
        "host_permissions": ["https://api.example.com/*"]
    })
}

fn obj(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

// ============================================================================
// Scenarios
// ============================================================================

/// Test: writing an identical value set fires no change event, and a
/// partial overwrite reports exactly the keys that differ.
#[test]
fn test_identical_write_is_silent_and_diffs_are_minimal() {
    let sim = Simulator::new(manifest());
    let ctx = sim.context();
    let platform = sim.platform();
    let storage = platform.storage();

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    storage
        .on_changed()
        .add_listener(move |(changes, _): &StorageChangeEvent| {
            sink.lock().push(changes.clone());
        });

    storage.local().set(obj(json!({"theme": "dark", "count": 1})));
    ctx.pump();
    assert_eq!(events.lock().len(), 1);

    // Same payload again: nothing differs, nothing fires.
    storage.local().set(obj(json!({"theme": "dark", "count": 1})));
    ctx.pump();
    assert_eq!(events.lock().len(), 1);

    // One key differs: the diff carries exactly that key.
    storage.local().set(obj(json!({"theme": "light", "count": 1})));
    ctx.pump();
    let all = events.lock();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].len(), 1);
    assert_eq!(
        all[1]["theme"],
        StorageChange::updated(json!("dark"), json!("light"))
    );
}

/// Test: a created tab is announced as loading, then settles to complete
/// once simulated time passes the settle delay.
#[test]
fn test_created_tab_settles_after_the_delay() {
    let sim = Simulator::new(manifest());
    let ctx = sim.context();
    let platform = sim.platform();

    let created = Arc::new(Mutex::new(None));
    let slot = created.clone();
    platform.tabs().on_created().add_listener(move |tab: &Tab| {
        *slot.lock() = Some(tab.clone());
    });

    let updates = Arc::new(Mutex::new(Vec::new()));
    let sink = updates.clone();
    platform
        .tabs()
        .on_updated()
        .add_listener(move |(id, changes, tab): &TabUpdatedEvent| {
            sink.lock().push((*id, changes.clone(), tab.clone()));
        });

    platform
        .tabs()
        .create(CreateTabProps::default().with_url("https://example.com/app"));
    ctx.pump();

    let announced = created.lock().clone().expect("onCreated never fired");
    assert_eq!(announced.status, TabStatus::Loading);
    assert!(updates.lock().is_empty());

    // Jump past the settle window; the status flip arrives as an update.
    ctx.advance(300);
    let settled = updates.lock();
    assert_eq!(settled.len(), 1);
    let (id, changes, after) = &settled[0];
    assert_eq!(*id, announced.id);
    assert_eq!(changes.status, Some(TabStatus::Complete));
    assert_eq!(after.status, TabStatus::Complete);
}

/// Test: every tab activation leaves exactly one active tab behind.
#[test]
fn test_activating_a_tab_deactivates_the_rest() {
    let sim = Simulator::new(manifest());
    let ctx = sim.context();
    let platform = sim.platform();

    platform.tabs().create(
        CreateTabProps::default()
            .with_url("https://a.example")
            .with_active(true),
    );
    platform.tabs().create(
        CreateTabProps::default()
            .with_url("https://b.example")
            .with_active(true),
    );
    ctx.pump();

    let tabs = sim.inspector().tabs();
    assert_eq!(tabs.len(), 3);
    let active: Vec<&Tab> = tabs.iter().filter(|tab| tab.active).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].url, "https://b.example");
}

/// Test: when any listener flags an asynchronous response, the caller's
/// callback is never invoked, even though another listener responded.
#[test]
fn test_async_flagged_listener_suppresses_the_send_callback() {
    let sim = Simulator::new(manifest());
    let ctx = sim.context();
    let runtime = sim.platform().runtime();

    runtime.add_message_listener(|message, _, respond| {
        respond.respond(json!({ "echo": message.clone() }));
        false
    });
    runtime.add_message_listener(|_, _, _| true);

    let delivered = Arc::new(Mutex::new(0u32));
    let hits = delivered.clone();
    runtime.send_message_then(json!({"ping": true}), move |_| {
        *hits.lock() += 1;
    });
    ctx.pump();

    assert_eq!(*delivered.lock(), 0);
}

/// Test: a simulated click on a live notification reaches every
/// `onClicked` listener, in registration order semantics.
#[test]
fn test_notification_click_fans_out_to_all_listeners() {
    let sim = Simulator::new(manifest());
    let ctx = sim.context();
    let platform = sim.platform();

    let first = Arc::new(Mutex::new(Vec::new()));
    let second = Arc::new(Mutex::new(Vec::new()));
    for sink in [first.clone(), second.clone()] {
        platform
            .notifications()
            .on_clicked()
            .add_listener(move |id: &String| {
                sink.lock().push(id.clone());
            });
    }

    platform.notifications().create(
        Some("n1".into()),
        NotificationOptions::basic("Build done", "All green"),
    );
    assert!(sim.inspector().simulate_notification_click("n1"));
    ctx.pump();

    assert_eq!(*first.lock(), vec!["n1".to_string()]);
    assert_eq!(*second.lock(), vec!["n1".to_string()]);
}

/// Test: create with a generated id, list it, clear it, and observe the
/// programmatic close event.
#[test]
fn test_notification_lifecycle_round_trip() {
    let sim = Simulator::new(manifest());
    let ctx = sim.context();
    let platform = sim.platform();

    let closes = Arc::new(Mutex::new(Vec::new()));
    let sink = closes.clone();
    platform
        .notifications()
        .on_closed()
        .add_listener(move |event: &NotificationClosedEvent| {
            sink.lock().push(event.clone());
        });

    let assigned = Arc::new(Mutex::new(None));
    let slot = assigned.clone();
    platform.notifications().create_then(
        None,
        NotificationOptions::basic("Deploy", "Rolled out"),
        move |id| {
            *slot.lock() = Some(id);
        },
    );
    ctx.pump();
    let id = assigned.lock().clone().expect("create callback never ran");

    let listing = Arc::new(Mutex::new(None));
    let slot = listing.clone();
    platform.notifications().get_all(move |map| {
        *slot.lock() = Some(map);
    });
    ctx.pump();
    assert!(listing.lock().as_ref().expect("getAll never ran").contains_key(&id));

    assert!(platform.notifications().clear(&id));
    ctx.pump();

    // Programmatic clears report by_user = false.
    assert_eq!(*closes.lock(), vec![(id, false)]);
    assert!(sim.inspector().notifications().is_empty());
}

/// Test: a fetch through the execution context resolves the response and
/// leaves a completed record in the traffic log.
#[tokio::test]
async fn test_fetch_resolves_and_records_traffic() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/v1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let sim = Simulator::new(manifest());
    let ctx = sim.context();

    let response = ctx
        .fetch()
        .fetch(&format!("{}/v1/status", server.uri()))
        .await
        .unwrap();
    assert!(response.ok());
    assert_eq!(response.json().unwrap(), json!({"ok": true}));

    ctx.settle().await;
    let traffic = sim.inspector().traffic();
    assert_eq!(traffic.len(), 1);
    assert_eq!(traffic[0].kind, RequestKind::Fetch);
    assert_eq!(traffic[0].status, Some(200));
    assert!(traffic[0].is_finished());
}

/// Test: an XHR load handler arrives on a later queue turn and the
/// request shows up in the traffic log.
#[tokio::test]
async fn test_xhr_load_handler_arrives_through_the_queue() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("payload"))
        .mount(&server)
        .await;

    let sim = Simulator::new(manifest());
    let ctx = sim.context();

    let loaded = Arc::new(Mutex::new(None));
    let slot = loaded.clone();
    let mut xhr = ctx.xhr();
    xhr.open("GET", format!("{}/feed", server.uri()));
    xhr.on_load(move |response| {
        *slot.lock() = Some(response.response_text);
    });
    xhr.send(None).unwrap();

    ctx.settle().await;
    assert_eq!(loaded.lock().clone(), Some("payload".to_string()));

    let traffic = sim.inspector().traffic();
    assert_eq!(traffic.len(), 1);
    assert_eq!(traffic[0].kind, RequestKind::Xhr);
    assert_eq!(traffic[0].status, Some(200));
}
