//! calltrace
//!
//! Generic call instrumentation: measures how long a call takes, logs a
//! sanitized view of its arguments and optionally a rendering of its result,
//! while handing the original return value or error back untouched.
//!
//! # Guarantees
//!
//! - **Transparent**: the wrapped call's value, error or panic reaches the caller unchanged
//! - **One duration record per call**: on success, failure, panic and cancellation
//! - **No leaks**: sensitive arguments are dropped, non-scalar arguments show only their type name
//! - **Fail-open / fail-soft**: missing metadata or unserializable results degrade the log line, never the call
//!
//! # Layout
//!
//! - [`instrument`]: interceptor, sanitizer, renderer, timer and sensitivity metadata
//! - [`telemetry`]: log records, sinks and subscriber setup
//! - [`config`]: immutable configuration loaded once at startup

pub mod config;
pub mod instrument;
pub mod telemetry;

pub use config::InstrumentationConfig;
pub use instrument::{CallContext, Inspect, Interceptor, Opaque, RenderMode, SensitivityDescriptor};
pub use telemetry::{LogRecord, LogSink, RecordKind, RecordStore, TracingSink};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
