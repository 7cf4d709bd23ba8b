//! Telemetry module: call records, sinks and subscriber setup.
//!
//! Records are handed to a [`LogSink`]. The default sink forwards them to
//! `tracing`; [`RecordStore`] keeps them in memory.

mod logging;
mod record;
mod store;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use record::{LogRecord, LogSink, RecordKind, TracingSink};
pub use store::RecordStore;
