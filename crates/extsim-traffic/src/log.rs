//! The captured-traffic log, most recent first.

use std::collections::VecDeque;

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;

use extsim_protocols::{HeaderMap, NetworkRecord};

/// Default record cap before the oldest entries are evicted.
pub const DEFAULT_TRAFFIC_CAPACITY: usize = 200;

/// Bounded log of intercepted requests.
///
/// Records are inserted at the front when a request starts and completed
/// in place when it resolves, so iteration order is newest first. The
/// inspection side reads snapshots only.
pub struct TrafficLog {
    records: Mutex<VecDeque<NetworkRecord>>,
    capacity: usize,
}

impl TrafficLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Insert a freshly started record at the front, evicting the oldest
    /// entries past capacity. Returns the record's id.
    pub fn insert(&self, record: NetworkRecord) -> Uuid {
        let id = record.id;
        debug!(%id, method = %record.method, url = %record.url, "traffic: request started");
        let mut records = self.records.lock();
        records.push_front(record);
        records.truncate(self.capacity);
        id
    }

    /// Fill in the response side of the record with `id`. Returns whether
    /// the record was still in the log.
    pub fn complete(
        &self,
        id: Uuid,
        status: u16,
        status_text: impl Into<String>,
        duration_ms: u64,
        response_headers: HeaderMap,
        response_body: Option<serde_json::Value>,
    ) -> bool {
        debug!(%id, status, duration_ms, "traffic: request completed");
        let mut records = self.records.lock();
        match records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.complete(status, status_text, duration_ms, response_headers, response_body);
                true
            }
            None => false,
        }
    }

    /// Mark the record with `id` as failed. Returns whether the record was
    /// still in the log.
    pub fn fail(&self, id: Uuid, error: impl Into<String>) -> bool {
        let error = error.into();
        debug!(%id, %error, "traffic: request failed");
        let mut records = self.records.lock();
        match records.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                record.fail(error);
                true
            }
            None => false,
        }
    }

    /// Newest-first copy of the log.
    pub fn snapshot(&self) -> Vec<NetworkRecord> {
        self.records.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Default for TrafficLog {
    fn default() -> Self {
        Self::new(DEFAULT_TRAFFIC_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use extsim_protocols::RequestKind;

    fn started(url: &str) -> NetworkRecord {
        NetworkRecord::started(RequestKind::Fetch, "GET", url)
    }

    #[test]
    fn test_newest_first_order() {
        let log = TrafficLog::default();
        log.insert(started("https://a.example/"));
        log.insert(started("https://b.example/"));

        let snapshot = log.snapshot();
        assert_eq!(snapshot[0].url, "https://b.example/");
        assert_eq!(snapshot[1].url, "https://a.example/");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let log = TrafficLog::new(2);
        log.insert(started("https://one.example/"));
        log.insert(started("https://two.example/"));
        log.insert(started("https://three.example/"));

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].url, "https://three.example/");
        assert_eq!(snapshot[1].url, "https://two.example/");
    }

    #[test]
    fn test_complete_fills_response_fields() {
        let log = TrafficLog::default();
        let id = log.insert(started("https://api.example/data"));

        let mut headers = HeaderMap::new();
        headers.insert("content-type".into(), "application/json".into());
        assert!(log.complete(id, 200, "OK", 42, headers, Some(serde_json::json!({"ok": true}))));

        let record = &log.snapshot()[0];
        assert!(record.is_finished());
        assert_eq!(record.status, Some(200));
        assert_eq!(record.status_text.as_deref(), Some("OK"));
        assert_eq!(record.duration_ms, Some(42));
        assert_eq!(record.response_body, Some(serde_json::json!({"ok": true})));
    }

    #[test]
    fn test_fail_records_error_and_zero_duration() {
        let log = TrafficLog::default();
        let id = log.insert(started("https://down.example/"));
        assert!(log.fail(id, "connection refused"));

        let record = &log.snapshot()[0];
        assert_eq!(record.error.as_deref(), Some("connection refused"));
        assert_eq!(record.duration_ms, Some(0));
        assert_eq!(record.status, None);
    }

    #[test]
    fn test_finishing_an_evicted_record_reports_false() {
        let log = TrafficLog::new(1);
        let evicted = log.insert(started("https://old.example/"));
        log.insert(started("https://new.example/"));

        assert!(!log.complete(evicted, 200, "OK", 1, HeaderMap::new(), None));
        assert!(!log.fail(evicted, "late"));
    }

    #[test]
    fn test_clear() {
        let log = TrafficLog::default();
        log.insert(started("https://a.example/"));
        assert!(!log.is_empty());
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }
}
