//! In-memory record store.
//!
//! A thread-safe [`LogSink`] that keeps every record it receives. Hosts use it
//! to inspect or forward records in batches; tests use it to assert on exactly
//! what an interceptor emitted.

use parking_lot::RwLock;
use uuid::Uuid;

use super::record::{LogRecord, LogSink, RecordKind};

/// Thread-safe, append-only record buffer.
pub struct RecordStore {
    records: RwLock<Vec<LogRecord>>,
}

impl RecordStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Copy of all records in arrival order.
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.records.read().clone()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Records of one kind, in arrival order.
    pub fn of_kind(&self, kind: RecordKind) -> Vec<LogRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }

    /// All records belonging to one call, in emission order.
    pub fn for_call(&self, call_id: Uuid) -> Vec<LogRecord> {
        self.records
            .read()
            .iter()
            .filter(|r| r.call_id == call_id)
            .cloned()
            .collect()
    }

    pub fn count(&self, kind: RecordKind) -> usize {
        self.records.read().iter().filter(|r| r.kind == kind).count()
    }

    /// True if any stored record mentions `needle` in a field or its message.
    pub fn any_mentions(&self, needle: &str) -> bool {
        self.records.read().iter().any(|r| r.mentions(needle))
    }

    /// Remove and return all records.
    pub fn drain(&self) -> Vec<LogRecord> {
        std::mem::take(&mut *self.records.write())
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for RecordStore {
    fn emit(&self, record: &LogRecord) {
        self.records.write().push(record.clone());
    }
}
