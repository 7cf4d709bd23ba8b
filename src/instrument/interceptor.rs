//! The call interceptor.
//!
//! Per call: sanitize arguments, time the wrapped invocation, emit a result
//! record on success (when enabled) and a duration record on every exit path,
//! then hand back exactly what the wrapped function produced.
//!
//! The duration record is emitted by the `Drop` of [`CallScope`], so it also
//! fires when the wrapped function panics or an async call is cancelled.

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use uuid::Uuid;

use super::inspect::{Inspect, Opaque};
use super::render::{RenderMode, Rendered, ResultRenderer};
use super::sanitizer::{format_args_list, ArgumentSanitizer};
use super::sensitivity::{OperationId, SensitivityDescriptor, SensitivityResolver};
use super::timer::{CallTimer, TimerHandle};
use crate::config::InstrumentationConfig;
use crate::telemetry::{LogRecord, LogSink, RecordKind, TracingSink};

/// Everything the interceptor needs to know about one invocation.
pub struct CallContext<'a> {
    caller: &'a str,
    operation: &'a str,
    args: &'a [&'a dyn Inspect],
    sensitivity: SensitivityDescriptor,
}

impl<'a> CallContext<'a> {
    /// Context with no sensitive parameters.
    pub fn new(caller: &'a str, operation: &'a str, args: &'a [&'a dyn Inspect]) -> Self {
        Self {
            caller,
            operation,
            args,
            sensitivity: SensitivityDescriptor::none(),
        }
    }

    pub fn with_sensitivity(mut self, sensitivity: impl Into<SensitivityDescriptor>) -> Self {
        self.sensitivity = sensitivity.into();
        self
    }

    pub fn sensitivity(&self) -> &SensitivityDescriptor {
        &self.sensitivity
    }

    pub fn operation_id(&self) -> OperationId {
        OperationId::new(self.caller, self.operation, self.args.len())
    }
}

/// Where a call ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Pending,
    Succeeded,
    Failed,
    /// The wrapped function panicked; the panic keeps unwinding.
    Panicked,
    /// The call future was dropped after it started but before it completed.
    Cancelled,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Panicked => "panicked",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Wraps calls with timing and sanitized logging.
///
/// Cheap to clone; clones share configuration, sink and resolver.
///
/// [`intercept`](Self::intercept) needs the return type to implement
/// [`Inspect`]. [`intercept_opaque`](Self::intercept_opaque) accepts any
/// return type and logs it by type name.
#[derive(Clone)]
pub struct Interceptor {
    config: Arc<InstrumentationConfig>,
    sink: Arc<dyn LogSink>,
    resolver: Option<Arc<dyn SensitivityResolver>>,
}

impl Interceptor {
    /// Interceptor logging through `tracing` with no sensitivity resolver.
    pub fn new(config: Arc<InstrumentationConfig>) -> Self {
        Self {
            config,
            sink: Arc::new(TracingSink),
            resolver: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SensitivityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(&self) -> &InstrumentationConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Build a call context, resolving sensitivity through the configured resolver.
    ///
    /// Unknown operations, resolver errors and resolver panics all yield a
    /// context with no sensitive parameters.
    pub fn context<'a>(
        &self,
        caller: &'a str,
        operation: &'a str,
        args: &'a [&'a dyn Inspect],
    ) -> CallContext<'a> {
        let ctx = CallContext::new(caller, operation, args);
        if !self.config.enabled {
            return ctx;
        }
        let Some(resolver) = &self.resolver else {
            return ctx;
        };

        let id = ctx.operation_id();
        match panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve(&id))) {
            Ok(Ok(descriptor)) => ctx.with_sensitivity(descriptor),
            Ok(Err(err)) => {
                tracing::debug!(target: "calltrace", operation = %id, error = %err, "sensitivity unknown, no redaction");
                ctx
            }
            Err(_) => {
                tracing::warn!(target: "calltrace", operation = %id, "sensitivity resolver panicked, no redaction");
                ctx
            }
        }
    }

    /// Run `invoke` under instrumentation and return its result unchanged.
    pub fn intercept<T, E, F>(&self, ctx: CallContext<'_>, invoke: F) -> Result<T, E>
    where
        T: Inspect,
        F: FnOnce() -> Result<T, E>,
    {
        self.run(ctx, invoke, |value: &T, mode| ResultRenderer::render(value, mode))
    }

    /// Like [`intercept`](Self::intercept) for return types without an
    /// [`Inspect`] impl. The result record shows the type name only.
    pub fn intercept_opaque<T, E, F>(&self, ctx: CallContext<'_>, invoke: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        self.run(ctx, invoke, |value: &T, mode| ResultRenderer::render(&Opaque(value), mode))
    }

    /// Async variant of [`intercept`](Self::intercept).
    ///
    /// Arguments are sanitized immediately. Timing starts on first poll and
    /// spans every suspension of the wrapped future. Dropping the returned
    /// future after it was first polled still emits the duration record; a
    /// future that is never polled emits nothing. The future does not borrow
    /// `self` or `ctx`.
    pub fn intercept_async<T, E, F, Fut>(
        &self,
        ctx: CallContext<'_>,
        invoke: F,
    ) -> impl Future<Output = Result<T, E>>
    where
        T: Inspect,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_async(ctx, invoke, |value: &T, mode| ResultRenderer::render(value, mode))
    }

    /// Async variant of [`intercept_opaque`](Self::intercept_opaque).
    pub fn intercept_opaque_async<T, E, F, Fut>(
        &self,
        ctx: CallContext<'_>,
        invoke: F,
    ) -> impl Future<Output = Result<T, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run_async(ctx, invoke, |value: &T, mode| {
            ResultRenderer::render(&Opaque(value), mode)
        })
    }

    fn run<T, E, F, R>(&self, ctx: CallContext<'_>, invoke: F, render: R) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        R: FnOnce(&T, RenderMode) -> Option<Rendered>,
    {
        if !self.config.enabled {
            return invoke();
        }

        let mut scope = self.prepare(&ctx).begin();
        let result = invoke();
        scope.finish(&result);

        if let Ok(value) = &result {
            scope.emit_result(render(value, self.config.render_mode));
        }
        result
    }

    fn run_async<T, E, F, Fut, R>(
        &self,
        ctx: CallContext<'_>,
        invoke: F,
        render: R,
    ) -> impl Future<Output = Result<T, E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: FnOnce(&T, RenderMode) -> Option<Rendered>,
    {
        let prepared = self.config.enabled.then(|| self.prepare(&ctx));
        let render_mode = self.config.render_mode;

        async move {
            let Some(prepared) = prepared else {
                return invoke().await;
            };

            let mut scope = prepared.begin();
            let result = invoke().await;
            scope.finish(&result);

            if let Ok(value) = &result {
                scope.emit_result(render(value, render_mode));
            }
            result
        }
    }

    fn prepare(&self, ctx: &CallContext<'_>) -> PreparedCall {
        if !ctx.sensitivity.is_empty() && ctx.sensitivity.len() != ctx.args.len() {
            tracing::debug!(
                target: "calltrace",
                operation = %ctx.operation_id(),
                flags = ctx.sensitivity.len(),
                "sensitivity descriptor length mismatch, no redaction"
            );
        }

        let args = ArgumentSanitizer::sanitize(ctx.args, &ctx.sensitivity);
        PreparedCall {
            sink: self.sink.clone(),
            caller: ctx.caller.to_string(),
            operation: ctx.operation.to_string(),
            args: format_args_list(&args),
            log_args_on_failure: self.config.log_arguments_on_failure,
        }
    }
}

/// Sanitized, owned view of a call that has not started yet. Emits nothing.
struct PreparedCall {
    sink: Arc<dyn LogSink>,
    caller: String,
    operation: String,
    args: String,
    log_args_on_failure: bool,
}

impl PreparedCall {
    /// Start the clock. The returned scope always emits a duration record.
    fn begin(self) -> CallScope {
        CallScope {
            call_id: Uuid::new_v4(),
            call: self,
            timer: Some(CallTimer::start()),
            elapsed_ms: None,
            outcome: CallOutcome::Pending,
        }
    }
}

/// A running call. Emits the duration record when dropped.
struct CallScope {
    call: PreparedCall,
    call_id: Uuid,
    timer: Option<TimerHandle>,
    elapsed_ms: Option<u64>,
    outcome: CallOutcome,
}

impl CallScope {
    fn finish<T, E>(&mut self, result: &Result<T, E>) {
        self.elapsed_ms = self.timer.take().map(TimerHandle::elapsed_millis);
        self.outcome = match result {
            Ok(_) => CallOutcome::Succeeded,
            Err(_) => CallOutcome::Failed,
        };
    }

    fn emit_result(&self, rendered: Option<Rendered>) {
        let Some(rendered) = rendered else {
            return;
        };

        let mut record = LogRecord::new(RecordKind::Result, self.call_id)
            .with_field("caller", self.call.caller.as_str())
            .with_field("operation", self.call.operation.as_str())
            .with_field("result", rendered.text);

        if let Some(err) = &rendered.degraded {
            tracing::warn!(
                target: "calltrace",
                call_id = %self.call_id,
                caller = %self.call.caller,
                operation = %self.call.operation,
                error = %err,
                "result rendering degraded to type tag"
            );
            record = record.with_field("degraded", "true");
        }

        emit_guarded(self.call.sink.as_ref(), &record);
    }

    fn duration_record(&mut self) -> LogRecord {
        let elapsed_ms = match self.elapsed_ms {
            Some(ms) => ms,
            None => self.timer.take().map(TimerHandle::elapsed_millis).unwrap_or(0),
        };
        let outcome = match self.outcome {
            CallOutcome::Pending if std::thread::panicking() => CallOutcome::Panicked,
            CallOutcome::Pending => CallOutcome::Cancelled,
            other => other,
        };

        let mut record = LogRecord::new(RecordKind::Duration, self.call_id)
            .with_field("caller", self.call.caller.as_str())
            .with_field("operation", self.call.operation.as_str());
        if outcome == CallOutcome::Succeeded || self.call.log_args_on_failure {
            record = record.with_field("args", std::mem::take(&mut self.call.args));
        }
        record
            .with_field("elapsed_ms", elapsed_ms.to_string())
            .with_field("outcome", outcome.as_str())
    }
}

impl Drop for CallScope {
    fn drop(&mut self) {
        let record = self.duration_record();
        emit_guarded(self.call.sink.as_ref(), &record);
    }
}

/// Hand a record to the sink; a panicking sink never reaches the caller.
fn emit_guarded(sink: &dyn LogSink, record: &LogRecord) {
    if panic::catch_unwind(AssertUnwindSafe(|| sink.emit(record))).is_err() {
        tracing::warn!(target: "calltrace", call_id = %record.call_id, kind = record.kind.as_str(), "log sink panicked, record dropped");
    }
}
