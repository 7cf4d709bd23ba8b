//! Call instrumentation.
//!
//! [`Interceptor`] wraps a single invocation. It is built from an immutable
//! [`InstrumentationConfig`](crate::config::InstrumentationConfig), a
//! [`LogSink`](crate::telemetry::LogSink) and an optional
//! [`SensitivityResolver`]. Arguments and results are seen through the
//! [`Inspect`] trait.
//!
//! ```
//! use std::sync::Arc;
//! use calltrace::config::InstrumentationConfig;
//! use calltrace::instrument::{CallContext, Inspect, Interceptor};
//!
//! let interceptor = Interceptor::new(Arc::new(InstrumentationConfig::default()));
//! let amount = 100u64;
//! let account = "secret-123";
//! let args: [&dyn Inspect; 2] = [&amount, &account];
//! let ctx = CallContext::new("Bank", "transfer", &args).with_sensitivity(vec![false, true]);
//!
//! let out: Result<u64, String> = interceptor.intercept(ctx, || Ok(amount));
//! assert_eq!(out, Ok(100));
//! ```

mod error;
mod inspect;
mod interceptor;
mod render;
mod sanitizer;
mod sensitivity;
mod timer;

pub use error::InstrumentError;
pub use inspect::{serialize_to_json, simple_type_name, Inspect, Opaque};
pub use interceptor::{CallContext, CallOutcome, Interceptor};
pub use render::{ParseRenderModeError, RenderMode, Rendered, ResultRenderer};
pub use sanitizer::{format_args_list, ArgumentSanitizer, UNPRINTABLE};
pub use sensitivity::{
    OperationId, SensitivityDescriptor, SensitivityRegistry, SensitivityRegistryBuilder,
    SensitivityResolver,
};
pub use timer::{CallTimer, TimerHandle};
