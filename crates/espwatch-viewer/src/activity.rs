//! Bounded activity log, newest entry first.

use std::collections::VecDeque;

use chrono::{Local, NaiveTime};

/// One log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Local wall-clock time, `HH:MM:SS`.
    pub timestamp: String,
    pub message: String,
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.timestamp, self.message)
    }
}

/// Activity log; once full, the oldest entry is evicted.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl ActivityLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a message stamped with the current local time.
    pub fn push(&mut self, message: impl Into<String>) -> &LogEntry {
        self.push_at(Local::now().time(), message)
    }

    /// Append a message with an explicit timestamp.
    pub fn push_at(&mut self, time: NaiveTime, message: impl Into<String>) -> &LogEntry {
        self.entries.push_front(LogEntry {
            timestamp: time.format("%H:%M:%S").to_string(),
            message: message.into(),
        });
        self.entries.truncate(self.capacity);
        &self.entries[0]
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Messages only, newest first.
    pub fn messages(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.message.as_str()).collect()
    }

    /// How many entries carry exactly `message`.
    pub fn count(&self, message: &str) -> usize {
        self.entries.iter().filter(|e| e.message == message).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
