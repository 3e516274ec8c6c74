//! The simulated execution frame.
//!
//! What code under test runs against: the platform surface, the two
//! intercepted request primitives, and the controls that drive the
//! deferred queue (pump, advance, settle).

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use extsim_runloop::Clock;
use extsim_traffic::{FetchClient, XhrRequest};

use crate::platform::{Platform, SimulatorInner};

#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<SimulatorInner>,
    fetch: FetchClient,
}

impl ExecutionContext {
    pub(crate) fn new(inner: Arc<SimulatorInner>) -> Self {
        let fetch = FetchClient::new(
            inner.transport.clone(),
            inner.traffic.clone(),
            inner.in_flight.clone(),
        );
        Self { inner, fetch }
    }

    /// The API surface this frame sees.
    pub fn platform(&self) -> Platform {
        Platform::new(self.inner.clone())
    }

    /// The intercepting promise-style request primitive.
    pub fn fetch(&self) -> &FetchClient {
        &self.fetch
    }

    /// A fresh intercepting request object.
    pub fn xhr(&self) -> XhrRequest {
        XhrRequest::new(
            self.inner.transport.clone(),
            self.inner.traffic.clone(),
            self.inner.queue.clone(),
            self.inner.in_flight.clone(),
        )
    }

    /// Run every task that is currently runnable, including tasks they
    /// defer in turn. Delayed tasks whose time has not come stay queued.
    pub fn pump(&self) {
        self.inner.queue.run_until_idle();
    }

    /// Move the virtual clock forward by `ms`, then pump. Under a wall
    /// clock the move is ignored (with a warning) and the pump still runs.
    pub fn advance(&self, ms: u64) {
        match &self.inner.virtual_clock {
            Some(clock) => clock.advance(ms),
            None => warn!(ms, "advance ignored: simulator runs on the wall clock"),
        }
        self.pump();
    }

    /// Drive until nothing remains: the queue is empty (advancing the
    /// virtual clock past delayed tasks, or sleeping up to them under a
    /// wall clock) and no intercepted request is still in flight.
    pub async fn settle(&self) {
        loop {
            self.inner.queue.run_until_idle();
            if self.inner.queue.is_idle() && self.inner.in_flight.is_zero() {
                return;
            }
            if let Some(due) = self.inner.queue.next_due_at() {
                match &self.inner.virtual_clock {
                    Some(clock) => {
                        clock.set(due);
                        continue;
                    }
                    None => {
                        let now = self.inner.queue.clock().now_ms();
                        let wait = due.saturating_sub(now).max(1);
                        tokio::time::sleep(Duration::from_millis(wait)).await;
                        continue;
                    }
                }
            }
            // Only in-flight requests remain; yield until they record.
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }
}
