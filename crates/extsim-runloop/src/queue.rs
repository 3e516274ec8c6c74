//! Deferred task queue with immediate and delayed lanes.

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::trace;

use crate::clock::Clock;

/// A unit of deferred work. Callbacks and listener notifications are boxed
/// into these before entering the queue.
pub type Task = Box<dyn FnOnce() + Send>;

struct DelayedEntry {
    due_at_ms: u64,
    seq: u64,
    task: Task,
}

impl PartialEq for DelayedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for DelayedEntry {}

impl PartialOrd for DelayedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for DelayedEntry {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Earlier due time pops first (reverse for min-heap); ties promote
        // in defer order.
        other
            .due_at_ms
            .cmp(&self.due_at_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct QueueState {
    immediate: VecDeque<Task>,
    delayed: BinaryHeap<DelayedEntry>,
}

/// The queue every simulator component schedules deferred delivery through.
///
/// Two lanes: an immediate FIFO drained by [`tick`](EventQueue::tick), and a
/// delayed min-heap whose entries join the FIFO once their due time passes
/// (see [`promote_due`](EventQueue::promote_due)). Within the FIFO, tasks run
/// strictly in defer order.
///
/// There is no cancellation: once deferred, a task will run. A simulator
/// `reset()` does not touch this queue.
pub struct EventQueue {
    clock: Arc<dyn Clock>,
    state: Mutex<QueueState>,
    seq: AtomicU64,
}

impl EventQueue {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(QueueState {
                immediate: VecDeque::new(),
                delayed: BinaryHeap::new(),
            }),
            seq: AtomicU64::new(0),
        }
    }

    /// The clock this queue orders delayed tasks by.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Schedule `task` for the next drain pass.
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        trace!(seq, "task deferred");
        self.state.lock().immediate.push_back(Box::new(task));
    }

    /// Schedule `task` to become runnable once `delay_ms` milliseconds have
    /// passed on the queue's clock.
    pub fn defer_after<F>(&self, delay_ms: u64, task: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let due_at_ms = self.clock.now_ms().saturating_add(delay_ms);
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        trace!(seq, due_at_ms, "task deferred with delay");
        self.state.lock().delayed.push(DelayedEntry {
            due_at_ms,
            seq,
            task: Box::new(task),
        });
    }

    /// Move every delayed task whose due time has passed into the immediate
    /// lane, in due-time order. Returns how many were promoted.
    pub fn promote_due(&self) -> usize {
        let now = self.clock.now_ms();
        let mut state = self.state.lock();
        let mut promoted = 0;
        while let Some(entry) = state.delayed.peek() {
            if entry.due_at_ms > now {
                break;
            }
            if let Some(entry) = state.delayed.pop() {
                trace!(seq = entry.seq, due_at_ms = entry.due_at_ms, "task promoted");
                state.immediate.push_back(entry.task);
                promoted += 1;
            }
        }
        promoted
    }

    /// Due time of the earliest delayed task, if any.
    pub fn next_due_at(&self) -> Option<u64> {
        self.state.lock().delayed.peek().map(|e| e.due_at_ms)
    }

    /// One drain pass: promote due tasks, then run the tasks that were in the
    /// immediate lane at that point. Tasks deferred by the running tasks stay
    /// queued for the next pass. Returns how many tasks ran.
    ///
    /// The lock is not held while a task runs, so tasks may freely call back
    /// into the queue (and into the components that feed it).
    pub fn tick(&self) -> usize {
        self.promote_due();
        let ready = self.state.lock().immediate.len();
        let mut ran = 0;
        for _ in 0..ready {
            let task = self.state.lock().immediate.pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    /// Drain passes until no task is runnable: the immediate lane is empty
    /// and no delayed task is due. Delayed tasks whose time has not come are
    /// left in place. Returns the total number of tasks run.
    pub fn run_until_idle(&self) -> usize {
        let mut total = 0;
        loop {
            let ran = self.tick();
            total += ran;
            if ran == 0 && !self.has_ready() {
                return total;
            }
        }
    }

    fn has_ready(&self) -> bool {
        let now = self.clock.now_ms();
        let state = self.state.lock();
        !state.immediate.is_empty()
            || state.delayed.peek().is_some_and(|e| e.due_at_ms <= now)
    }

    /// Tasks waiting in either lane.
    pub fn pending(&self) -> usize {
        let state = self.state.lock();
        state.immediate.len() + state.delayed.len()
    }

    pub fn immediate_len(&self) -> usize {
        self.state.lock().immediate.len()
    }

    pub fn delayed_len(&self) -> usize {
        self.state.lock().delayed.len()
    }

    /// True when both lanes are empty, including delayed tasks not yet due.
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.immediate.is_empty() && state.delayed.is_empty()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
