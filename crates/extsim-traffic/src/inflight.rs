//! Count of requests that have started but not yet finished recording.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared in-flight request counter.
///
/// A request holds a guard from just before it hits the transport until
/// its log record is finalized and any completion callback has been
/// deferred, so "counter at zero and queue idle" means every observable
/// effect of past requests has landed.
#[derive(Clone, Default)]
pub struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn enter(&self) -> InFlightGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(self.clone())
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_zero(&self) -> bool {
        self.count() == 0
    }
}

/// Decrements the counter when dropped, including when the owning future
/// is cancelled mid-request.
pub(crate) struct InFlightGuard(InFlight);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.0.fetch_sub(1, Ordering::SeqCst);
    }
}
