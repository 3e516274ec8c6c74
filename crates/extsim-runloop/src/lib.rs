//! # ExtSim RunLoop
//!
//! Deferred-delivery engine for the ExtSim browser-extension simulator.
//!
//! The simulated platform API is asynchronous by contract: every callback and
//! every listener notification is delivered on a later turn, never inside the
//! caller's stack frame, even when the result is already known. Rather than
//! emulating that with zero-delay timers, this crate models it as an explicit
//! task queue drained between caller turns:
//!
//! - [`EventQueue`]: an immediate FIFO plus a delayed min-heap. `defer` puts a
//!   task at the back of the FIFO; `defer_after` parks it in the heap until its
//!   due time, after which [`EventQueue::promote_due`] moves it to the FIFO.
//! - [`Clock`]: the time source the delayed heap is ordered by.
//!   [`VirtualClock`] is manually advanced (deterministic tests);
//!   [`WallClock`] tracks real elapsed time.
//!
//! A drain pass ([`EventQueue::tick`]) runs only the tasks that were ready
//! when the pass began. Tasks deferred *during* a pass wait for the next one,
//! so a callback scheduling another callback observes the same
//! one-turn-later contract as its caller did.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use extsim_runloop::{EventQueue, VirtualClock};
//!
//! let clock = Arc::new(VirtualClock::new());
//! let queue = EventQueue::new(clock.clone());
//!
//! let hits = Arc::new(AtomicUsize::new(0));
//! let h = hits.clone();
//! queue.defer(move || { h.fetch_add(1, Ordering::SeqCst); });
//!
//! assert_eq!(hits.load(Ordering::SeqCst), 0); // nothing runs synchronously
//! queue.tick();
//! assert_eq!(hits.load(Ordering::SeqCst), 1);
//! ```

pub mod clock;
pub mod queue;

pub use clock::{Clock, VirtualClock, WallClock};
pub use queue::{EventQueue, Task};
