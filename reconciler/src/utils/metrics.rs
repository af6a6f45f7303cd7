use once_cell::sync::Lazy;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::{global, KeyValue};

pub static RECONCILER_METRICS: Lazy<ReconcilerMetrics> = Lazy::new(ReconcilerMetrics::register);

pub struct ReconcilerMetrics {
    pub trace_operations: Counter<u64>,
    pub reconcile_outcomes: Counter<u64>,
    pub reconcile_response_time: Histogram<f64>,
    pub db_calls_response_time: Histogram<f64>,
}

impl ReconcilerMetrics {
    pub fn register() -> Self {
        let meter: Meter = global::meter("crates.trace_reconciler.opentelemetry");

        let trace_operations = meter
            .u64_counter("trace_operations")
            .with_description("Count of trace reconciliation operations by kind")
            .with_unit("operations")
            .build();

        let reconcile_outcomes = meter
            .u64_counter("reconcile_outcomes")
            .with_description("Count of build-state updates by response status")
            .with_unit("updates")
            .build();

        let reconcile_response_time = meter
            .f64_histogram("reconcile_response_time")
            .with_description("Time taken to answer a build-state update")
            .with_unit("s")
            .build();

        let db_calls_response_time = meter
            .f64_histogram("db_calls_response_time")
            .with_description("Response time of DB calls over time")
            .with_unit("s")
            .build();

        Self { trace_operations, reconcile_outcomes, reconcile_response_time, db_calls_response_time }
    }
}

/// Trace events worth counting while reconciling an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display, strum_macros::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum TraceOperation {
    /// The runner sent a full trace.
    Overwrite,
    /// The update was deferred until migration finishes.
    Accepted,
    /// All chunks were persisted when the update was checked.
    Finalized,
    /// The reported checksum did not match the stored trace.
    Invalid,
    /// Waiting for migration timed out and the state was committed anyway.
    Discarded,
    /// Two writers raced on the same pending state.
    Conflict,
    /// Another update held the job's trace lease.
    Locked,
}

/// Sink for trace operation counters. Never consulted for correctness.
#[cfg_attr(test, mockall::automock)]
pub trait TraceMetrics: Send + Sync {
    fn increment_trace_operation(&self, operation: TraceOperation);
}

/// Writes trace operations into the OpenTelemetry `trace_operations` counter.
#[derive(Debug, Default, Clone, Copy)]
pub struct OtelTraceMetrics;

impl TraceMetrics for OtelTraceMetrics {
    fn increment_trace_operation(&self, operation: TraceOperation) {
        RECONCILER_METRICS.trace_operations.add(1, &[KeyValue::new("operation", operation.to_string())]);
    }
}
