//! Time sources for the deferred-delivery queue.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Millisecond time source the [`EventQueue`](crate::EventQueue) orders
/// delayed tasks by.
///
/// Only relative time matters: implementations report milliseconds since
/// their own origin, not since any epoch.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the clock's origin.
    fn now_ms(&self) -> u64;
}

/// Manually advanced clock.
///
/// Starts at zero and only moves when [`advance`](VirtualClock::advance) is
/// called, which makes settle delays and delayed tasks fully deterministic.
#[derive(Debug, Default)]
pub struct VirtualClock {
    now_ms: AtomicU64,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `ms` milliseconds.
    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump the clock to an absolute value. Ignored if `ms` is in the past;
    /// the clock never moves backwards.
    pub fn set(&self, ms: u64) {
        self.now_ms.fetch_max(ms, Ordering::SeqCst);
    }
}

impl Clock for VirtualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// Monotonic wall clock, measured from construction.
#[derive(Debug)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
