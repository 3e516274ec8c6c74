use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use extsim_protocols::{LogLevel, NotificationButton};
use extsim_runloop::VirtualClock;

fn manager() -> (Arc<NotificationManager>, Arc<EventQueue>) {
    let queue = Arc::new(EventQueue::new(Arc::new(VirtualClock::new())));
    let diagnostics = Arc::new(DiagnosticsLog::default());
    (
        Arc::new(NotificationManager::new(queue.clone(), diagnostics)),
        queue,
    )
}

fn opts(title: &str) -> NotificationOptions {
    NotificationOptions::basic(title, "body")
}

#[test]
fn test_create_assigns_counter_ids() {
    let (notifications, _queue) = manager();
    assert_eq!(notifications.create(None, opts("first")), "notif_1");
    assert_eq!(notifications.create(None, opts("second")), "notif_2");
    assert_eq!(notifications.snapshot().len(), 2);
}

#[test]
fn test_create_then_delivers_id_deferred() {
    let (notifications, queue) = manager();
    let delivered = Arc::new(Mutex::new(None));

    let d = delivered.clone();
    notifications.create_then(None, opts("t"), move |id| {
        *d.lock() = Some(id);
    });

    assert!(delivered.lock().is_none());
    queue.run_until_idle();
    assert_eq!(delivered.lock().take().as_deref(), Some("notif_1"));
}

#[test]
fn test_empty_id_is_assigned() {
    let (notifications, _queue) = manager();
    assert_eq!(notifications.create(Some(String::new()), opts("t")), "notif_1");
}

#[test]
fn test_supplied_id_overwrites_on_collision() {
    let (notifications, queue) = manager();
    let closed = Arc::new(Mutex::new(0));

    let c = closed.clone();
    notifications.on_closed().add_listener(move |_| *c.lock() += 1);

    notifications.create(Some("n1".into()), opts("old"));
    notifications.create(Some("n1".into()), opts("new"));
    queue.run_until_idle();

    let records = notifications.snapshot();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].options.title, "new");
    // Overwrite is not a close.
    assert_eq!(*closed.lock(), 0);
}

#[test]
fn test_update_merges_only_present_fields() {
    let (notifications, queue) = manager();
    notifications.create(Some("n1".into()), opts("original"));

    let outcome = Arc::new(Mutex::new(None));
    let o = outcome.clone();
    notifications.update_then(
        "n1",
        NotificationUpdate::default().title("renamed"),
        move |updated| {
            *o.lock() = Some(updated);
        },
    );
    queue.run_until_idle();

    assert_eq!(outcome.lock().take(), Some(true));
    let records = notifications.snapshot();
    assert_eq!(records[0].options.title, "renamed");
    assert_eq!(records[0].options.message, "body");
}

#[test]
fn test_update_unknown_id_reports_false() {
    let queue = Arc::new(EventQueue::new(Arc::new(VirtualClock::new())));
    let diagnostics = Arc::new(DiagnosticsLog::default());
    let notifications = NotificationManager::new(queue.clone(), diagnostics.clone());

    let outcome = Arc::new(Mutex::new(None));
    let o = outcome.clone();
    notifications.update_then("ghost", NotificationUpdate::default(), move |updated| {
        *o.lock() = Some(updated);
    });
    queue.run_until_idle();

    assert_eq!(outcome.lock().take(), Some(false));
    assert!(
        diagnostics
            .snapshot()
            .iter()
            .any(|entry| entry.level == LogLevel::Error && entry.message.contains("ghost"))
    );
}

#[test]
fn test_clear_fires_on_closed_not_by_user() {
    let (notifications, queue) = manager();
    let closes = Arc::new(Mutex::new(Vec::new()));

    let c = closes.clone();
    notifications
        .on_closed()
        .add_listener(move |(id, by_user): &NotificationClosedEvent| {
            c.lock().push((id.clone(), *by_user));
        });

    notifications.create(Some("n1".into()), opts("t"));
    assert!(notifications.clear("n1"));
    queue.run_until_idle();

    assert_eq!(*closes.lock(), vec![("n1".to_string(), false)]);
    assert!(notifications.snapshot().is_empty());
}

#[test]
fn test_clear_unknown_id_is_silent() {
    let (notifications, queue) = manager();
    let closes = Arc::new(Mutex::new(0));

    let c = closes.clone();
    notifications.on_closed().add_listener(move |_| *c.lock() += 1);

    let outcome = Arc::new(Mutex::new(None));
    let o = outcome.clone();
    notifications.clear_then("ghost", move |cleared| {
        *o.lock() = Some(cleared);
    });
    queue.run_until_idle();

    assert_eq!(outcome.lock().take(), Some(false));
    assert_eq!(*closes.lock(), 0);
}

#[test]
fn test_get_all_maps_ids_to_options() {
    let (notifications, queue) = manager();
    notifications.create(Some("a".into()), opts("first"));
    notifications.create(Some("b".into()), opts("second"));

    let result = Arc::new(Mutex::new(None));
    let r = result.clone();
    notifications.get_all(move |all| {
        *r.lock() = Some(all);
    });
    queue.run_until_idle();

    let all = result.lock().take().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["a"].title, "first");
    assert_eq!(all["b"].title, "second");
}

#[test]
fn test_simulate_click_reaches_every_listener() {
    let (notifications, queue) = manager();
    let clicks = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..2 {
        let c = clicks.clone();
        notifications
            .on_clicked()
            .add_listener(move |id: &String| c.lock().push(id.clone()));
    }

    notifications.create(Some("n1".into()), opts("t"));
    assert!(notifications.simulate_click("n1"));
    assert!(clicks.lock().is_empty());

    queue.run_until_idle();
    assert_eq!(*clicks.lock(), vec!["n1".to_string(), "n1".to_string()]);
    // Clicking does not dismiss.
    assert_eq!(notifications.snapshot().len(), 1);
}

#[test]
fn test_simulate_click_unknown_id_fires_nothing() {
    let (notifications, queue) = manager();
    let clicks = Arc::new(Mutex::new(0));

    let c = clicks.clone();
    notifications.on_clicked().add_listener(move |_| *c.lock() += 1);

    assert!(!notifications.simulate_click("ghost"));
    queue.run_until_idle();
    assert_eq!(*clicks.lock(), 0);
}

#[test]
fn test_simulate_button_click_validates_index() {
    let (notifications, queue) = manager();
    let clicks = Arc::new(Mutex::new(Vec::new()));

    let c = clicks.clone();
    notifications
        .on_button_clicked()
        .add_listener(move |(id, index): &ButtonClickEvent| {
            c.lock().push((id.clone(), *index));
        });

    let options = opts("t").with_buttons(vec![
        NotificationButton::new("Yes"),
        NotificationButton::new("No"),
    ]);
    notifications.create(Some("n1".into()), options);

    assert!(notifications.simulate_button_click("n1", 1));
    assert!(!notifications.simulate_button_click("n1", 2));
    assert!(!notifications.simulate_button_click("ghost", 0));
    queue.run_until_idle();

    assert_eq!(*clicks.lock(), vec![("n1".to_string(), 1)]);
}

#[test]
fn test_simulate_close_removes_and_reports_by_user() {
    let (notifications, queue) = manager();
    let closes = Arc::new(Mutex::new(Vec::new()));

    let c = closes.clone();
    notifications
        .on_closed()
        .add_listener(move |(id, by_user): &NotificationClosedEvent| {
            c.lock().push((id.clone(), *by_user));
        });

    notifications.create(Some("n1".into()), opts("t"));
    assert!(notifications.simulate_close("n1"));
    assert!(!notifications.simulate_close("n1"));
    queue.run_until_idle();

    assert_eq!(*closes.lock(), vec![("n1".to_string(), true)]);
    assert!(notifications.snapshot().is_empty());
}

#[test]
fn test_reset_restarts_counter_and_keeps_listeners() {
    let (notifications, queue) = manager();
    let clicks = Arc::new(Mutex::new(Vec::new()));

    let c = clicks.clone();
    notifications
        .on_clicked()
        .add_listener(move |id: &String| c.lock().push(id.clone()));

    notifications.create(None, opts("before"));
    notifications.reset();
    assert!(notifications.snapshot().is_empty());

    // The counter restarts, and the pre-reset listener still fires.
    let id = notifications.create(None, opts("after"));
    assert_eq!(id, "notif_1");
    notifications.simulate_click(&id);
    queue.run_until_idle();
    assert_eq!(*clicks.lock(), vec!["notif_1".to_string()]);
}
