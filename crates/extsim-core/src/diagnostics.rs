//! Bounded diagnostics buffer.
//!
//! The simulator never throws for ordinary misuse; components report what
//! they were called with (and any not-found condition) here instead. The
//! buffer keeps the newest entries for the inspection side and forwards
//! every entry to `tracing` at the matching level.

use std::collections::VecDeque;

use parking_lot::Mutex;

use extsim_protocols::{LogEntry, LogLevel};

/// Entries kept when no explicit capacity is configured.
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 500;

/// Shared `(level, message)` sink for every simulator component.
pub struct DiagnosticsLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl DiagnosticsLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let entry = LogEntry::new(level, message);
        match level {
            LogLevel::Info => tracing::info!("{}", entry.message),
            LogLevel::Warn => tracing::warn!("{}", entry.message),
            LogLevel::Error => tracing::error!("{}", entry.message),
        }
        let mut entries = self.entries.lock();
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Oldest-first copy of the buffered entries.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for DiagnosticsLog {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGNOSTICS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_kept_in_order() {
        let log = DiagnosticsLog::default();
        log.info("first");
        log.warn("second");
        log.error("third");

        let entries = log.snapshot();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[2].level, LogLevel::Error);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let log = DiagnosticsLog::new(2);
        log.info("a");
        log.info("b");
        log.info("c");

        let entries = log.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].message, "b");
        assert_eq!(entries[1].message, "c");
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let log = DiagnosticsLog::new(0);
        log.info("only");
        assert_eq!(log.len(), 1);
    }
}
