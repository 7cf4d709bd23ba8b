//! Log records produced per instrumented call, and the sink they go to.

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::Level;
use uuid::Uuid;

/// Which template a record follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// Emitted once per call on every exit path.
    Duration,
    /// Emitted only for successful calls when result logging is on.
    Result,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duration => "duration",
            Self::Result => "result",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully formatted record handed to a [`LogSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub kind: RecordKind,
    /// Shared by all records of one call.
    pub call_id: Uuid,
    /// Wall-clock time for correlation only; durations use the monotonic clock.
    pub timestamp: DateTime<Utc>,
    pub fields: Vec<(&'static str, String)>,
}

impl LogRecord {
    pub fn new(kind: RecordKind, call_id: Uuid) -> Self {
        Self {
            level: Level::INFO,
            kind,
            call_id,
            timestamp: Utc::now(),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.fields.push((key, value.into()));
        self
    }

    /// First value recorded under `key`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_field(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// True if any field value contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.fields.iter().any(|(_, v)| v.contains(needle)) || self.message().contains(needle)
    }

    /// Human-readable one-line message.
    pub fn message(&self) -> String {
        let caller = self.field("caller").unwrap_or_default();
        let operation = self.field("operation").unwrap_or_default();
        match self.kind {
            RecordKind::Duration => format!(
                "{} -> {}{} in {} ms",
                caller,
                operation,
                self.field("args").unwrap_or_default(),
                self.field("elapsed_ms").unwrap_or("0"),
            ),
            RecordKind::Result => format!(
                "{} -> {}: {}",
                caller,
                operation,
                self.field("result").unwrap_or("null"),
            ),
        }
    }
}

/// Destination for call records.
///
/// Implementations must be safe for concurrent use; `emit` is fire-and-forget
/// and any failure inside it is the sink's own concern.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &LogRecord);
}

/// Default sink: forwards records to the `tracing` dispatcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: &LogRecord) {
        let message = record.message();
        let kind = record.kind.as_str();
        let call_id = record.call_id;
        let caller = record.field("caller").unwrap_or_default();
        let operation = record.field("operation").unwrap_or_default();
        let args = record.field("args");
        let elapsed_ms = record.field("elapsed_ms");
        let outcome = record.field("outcome");
        let result = record.field("result");
        let degraded = record.has_field("degraded");

        macro_rules! emit_at {
            ($level:ident) => {
                tracing::$level!(
                    target: "calltrace",
                    kind, %call_id, caller, operation, args, elapsed_ms, outcome, result, degraded,
                    "{}", message
                )
            };
        }

        let level = record.level;
        if level == Level::ERROR || level == Level::WARN {
            emit_at!(warn);
        } else if level == Level::INFO {
            emit_at!(info);
        } else {
            emit_at!(debug);
        }
    }
}

impl<S: LogSink + ?Sized> LogSink for std::sync::Arc<S> {
    fn emit(&self, record: &LogRecord) {
        (**self).emit(record)
    }
}
