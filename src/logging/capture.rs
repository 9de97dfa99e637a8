//! In-memory record capture, used by tests and log viewers.

use super::{LogRecord, LogSink};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

const MAX_LOG_ENTRIES: usize = 1000;

/// A thread-safe, fixed-capacity log record buffer.
///
/// Captures every record handed to it, dropping the oldest once the
/// capacity is reached. Clones share the same underlying buffer.
#[derive(Clone)]
pub struct LogBuffer(Arc<Mutex<VecDeque<LogRecord>>>);

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl LogBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(VecDeque::with_capacity(
            MAX_LOG_ENTRIES,
        ))))
    }

    /// Snapshot of the captured records, oldest first.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Number of captured records.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been captured.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Discards all captured records.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<LogRecord>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for LogBuffer {
    fn emit(&self, record: &LogRecord) {
        let mut buffer = self.lock();
        if buffer.len() >= MAX_LOG_ENTRIES {
            buffer.pop_front();
        }
        buffer.push_back(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Severity;
    use chrono::Local;

    fn record(message: &str) -> LogRecord {
        LogRecord {
            timestamp: Local::now(),
            severity: Severity::Info,
            logger: "test".to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn captures_in_order() {
        let buffer = LogBuffer::new();
        buffer.emit(&record("first"));
        buffer.emit(&record("second"));

        let records = buffer.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].message, "first");
        assert_eq!(records[1].message, "second");
    }

    #[test]
    fn drops_oldest_beyond_capacity() {
        let buffer = LogBuffer::new();
        for i in 0..(MAX_LOG_ENTRIES + 5) {
            buffer.emit(&record(&i.to_string()));
        }
        assert_eq!(buffer.len(), MAX_LOG_ENTRIES);
        assert_eq!(buffer.records()[0].message, "5");
    }

    #[test]
    fn clear_empties_the_buffer() {
        let buffer = LogBuffer::new();
        buffer.emit(&record("x"));
        assert!(!buffer.is_empty());
        buffer.clear();
        assert!(buffer.is_empty());
    }
}
