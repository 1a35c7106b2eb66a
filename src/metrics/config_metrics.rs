//! Configuration metrics tracking using OpenTelemetry.

use crate::error::{ConfigError, LoadStage};
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::time::Instant;

/// Which pipeline run is being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// An explicit `load`
    Load,
    /// A `reload`, manual or triggered by a file change
    Reload,
}

impl Operation {
    fn as_str(self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Reload => "reload",
        }
    }
}

/// Metrics collector for pipeline runs.
///
/// Every counter and the duration histogram carry an `operation` attribute
/// (`load` or `reload`); failures also carry the failing `stage`.
///
/// # Examples
///
/// ```rust,no_run
/// use strata_config::metrics::{ConfigMetrics, Operation};
/// use opentelemetry::global;
///
/// let meter = global::meter("strata-config");
/// let metrics = ConfigMetrics::new(meter);
///
/// let timer = metrics.start(Operation::Reload);
/// // ... perform reload ...
/// metrics.record_success(Operation::Reload, timer);
/// ```
#[derive(Clone)]
pub struct ConfigMetrics {
    attempts: Counter<u64>,
    successes: Counter<u64>,
    failures: Counter<u64>,
    duration: Histogram<f64>,
    validation_failures: Counter<u64>,
    active_subscribers: Gauge<i64>,
}

impl ConfigMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let attempts = meter
            .u64_counter("strata_config.pipeline.attempts")
            .with_description("Total number of load and reload attempts")
            .build();

        let successes = meter
            .u64_counter("strata_config.pipeline.success")
            .with_description("Number of runs that installed a snapshot")
            .build();

        let failures = meter
            .u64_counter("strata_config.pipeline.failures")
            .with_description("Number of runs that failed and kept the previous snapshot")
            .build();

        let duration = meter
            .f64_histogram("strata_config.pipeline.duration")
            .with_description("Duration of load and reload runs in seconds")
            .with_unit("s")
            .build();

        let validation_failures = meter
            .u64_counter("strata_config.validation.failures")
            .with_description("Number of runs rejected by the schema or a custom check")
            .build();

        let active_subscribers = meter
            .i64_gauge("strata_config.subscribers.active")
            .with_description("Number of active subscribers")
            .build();

        Self {
            attempts,
            successes,
            failures,
            duration,
            validation_failures,
            active_subscribers,
        }
    }

    /// Start timing a run.
    ///
    /// Pass the returned `Instant` to `record_success` or `record_failure`.
    pub fn start(&self, operation: Operation) -> Instant {
        self.attempts.add(1, &[operation_attr(operation)]);
        Instant::now()
    }

    /// Record a run that installed a snapshot.
    pub fn record_success(&self, operation: Operation, start: Instant) {
        let attrs = [operation_attr(operation)];
        self.successes.add(1, &attrs);
        self.duration.record(start.elapsed().as_secs_f64(), &attrs);
    }

    /// Record a failed run.
    pub fn record_failure(&self, operation: Operation, start: Instant, error: &ConfigError) {
        let stage = error.stage().map(|stage| stage.to_string()).unwrap_or_default();
        let attrs = [operation_attr(operation), KeyValue::new("stage", stage)];
        self.failures.add(1, &attrs);
        self.duration.record(start.elapsed().as_secs_f64(), &attrs[..1]);

        if error.stage() == Some(LoadStage::Validate) {
            self.validation_failures.add(1, &attrs[..1]);
        }
    }

    /// Update the number of active subscribers.
    pub fn update_subscriber_count(&self, count: usize) {
        self.active_subscribers
            .record(i64::try_from(count).unwrap_or(i64::MAX), &[]);
    }
}

fn operation_attr(operation: Operation) -> KeyValue {
    KeyValue::new("operation", operation.as_str())
}
