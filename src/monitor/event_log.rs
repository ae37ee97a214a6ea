//! Bounded in-session event log.
//!
//! Keeps the recent history of state transitions and check outcomes
//! for the end-of-session report. When the capacity is exceeded the
//! oldest half is dropped in one batch, trading completeness for
//! amortized cost.

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub at: DateTime<Utc>,
    pub message: String,
}

#[derive(Debug)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    capacity: usize,
}

impl EventLog {
    /// A capacity below 2 would make batch eviction degenerate; clamp
    /// to 2.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(2),
        }
    }

    /// Append an entry. If the log now exceeds its capacity, the
    /// oldest `capacity / 2` entries are evicted at once.
    pub fn append(&mut self, message: impl Into<String>) {
        self.entries.push(LogEntry {
            at: Utc::now(),
            message: message.into(),
        });
        if self.entries.len() > self.capacity {
            self.entries.drain(..self.capacity / 2);
        }
    }

    /// Chronological view of the retained entries.
    pub fn summary(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}
