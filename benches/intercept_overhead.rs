//! Interception overhead benchmarks.
//!
//! Compares a disabled pass-through against full interception in each
//! result render mode.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use calltrace::config::InstrumentationConfig;
use calltrace::instrument::{CallContext, Inspect, Interceptor, RenderMode};
use calltrace::telemetry::{LogRecord, LogSink};

struct NullSink;

impl LogSink for NullSink {
    fn emit(&self, record: &LogRecord) {
        black_box(record);
    }
}

fn interceptor(config: InstrumentationConfig) -> Interceptor {
    Interceptor::new(Arc::new(config)).with_sink(Arc::new(NullSink))
}

fn bench_intercept(c: &mut Criterion) {
    let mut group = c.benchmark_group("intercept");
    group.throughput(Throughput::Elements(1));

    let amount = 100u64;
    let account = "secret-123";
    let tags = vec!["a", "b"];
    let args: [&dyn Inspect; 3] = [&amount, &account, &tags];

    let disabled = interceptor(InstrumentationConfig::disabled());
    group.bench_function(BenchmarkId::new("disabled", "pass_through"), |b| {
        b.iter(|| {
            let ctx = CallContext::new("Bank", "transfer", &args);
            let out: Result<u64, ()> = disabled.intercept(ctx, || Ok(black_box(amount)));
            black_box(out)
        })
    });

    for mode in [
        RenderMode::Suppressed,
        RenderMode::TypeTag,
        RenderMode::Literal,
        RenderMode::Serialized,
    ] {
        let enabled = interceptor(InstrumentationConfig {
            render_mode: mode,
            ..Default::default()
        });
        group.bench_function(BenchmarkId::new("enabled", mode.as_str()), |b| {
            b.iter(|| {
                let ctx = CallContext::new("Bank", "transfer", &args)
                    .with_sensitivity(vec![false, true, false]);
                let out: Result<Vec<u64>, ()> =
                    enabled.intercept(ctx, || Ok(black_box(vec![amount; 4])));
                black_box(out)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_intercept);
criterion_main!(benches);
