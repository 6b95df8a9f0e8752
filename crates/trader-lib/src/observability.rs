//! Observability infrastructure for the classification service
//!
//! Provides:
//! - Prometheus metrics (prediction latency, outcome counters, model info)
//! - Structured JSON logging with tracing

use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter, register_int_counter_vec,
    GaugeVec, Histogram, IntCounter, IntCounterVec,
};
use std::sync::OnceLock;
use tracing::{error, info};

/// Default histogram buckets for latency measurements (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ServiceMetricsInner> = OnceLock::new();

/// Inner metrics structure that holds the actual Prometheus metrics
struct ServiceMetricsInner {
    prediction_latency_seconds: Histogram,
    predictions_total: IntCounterVec,
    validation_rejections_total: IntCounter,
    prediction_errors_total: IntCounter,
    model_info: GaugeVec,
}

impl ServiceMetricsInner {
    fn new() -> Self {
        Self {
            prediction_latency_seconds: register_histogram!(
                "trader_service_prediction_latency_seconds",
                "Time spent validating a record and running inference",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register prediction_latency_seconds"),

            predictions_total: register_int_counter_vec!(
                "trader_service_predictions_total",
                "Total number of predictions served, by outcome label",
                &["outcome"]
            )
            .expect("Failed to register predictions_total"),

            validation_rejections_total: register_int_counter!(
                "trader_service_validation_rejections_total",
                "Total number of records rejected by the feature contract"
            )
            .expect("Failed to register validation_rejections_total"),

            prediction_errors_total: register_int_counter!(
                "trader_service_prediction_errors_total",
                "Total number of internal prediction failures"
            )
            .expect("Failed to register prediction_errors_total"),

            model_info: register_gauge_vec!(
                "trader_service_model_info",
                "Information about the currently loaded classifier",
                &["format", "features"]
            )
            .expect("Failed to register model_info"),
        }
    }
}

/// Service metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct ServiceMetrics {
    _private: (),
}

impl Default for ServiceMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ServiceMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ServiceMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    /// Record a prediction latency observation
    pub fn observe_prediction_latency(&self, duration_secs: f64) {
        self.inner().prediction_latency_seconds.observe(duration_secs);
    }

    /// Increment the served-prediction counter for an outcome label
    pub fn inc_predictions(&self, outcome: &str) {
        self.inner()
            .predictions_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Increment the validation-rejection counter
    pub fn inc_validation_rejections(&self) {
        self.inner().validation_rejections_total.inc();
    }

    /// Increment the internal-error counter
    pub fn inc_prediction_errors(&self) {
        self.inner().prediction_errors_total.inc();
    }

    /// Record information about the loaded classifier
    pub fn set_model_info(&self, format: &str, feature_count: usize) {
        self.inner().model_info.reset();
        self.inner()
            .model_info
            .with_label_values(&[format, &feature_count.to_string()])
            .set(1.0);
    }
}

/// Structured logger for service events
///
/// Provides consistent JSON-formatted logging for startup, predictions,
/// and internal failures.
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    /// Log service startup after the artifacts have loaded
    pub fn log_startup(&self, version: &str, model_path: &str, feature_count: usize) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            model_path = %model_path,
            feature_count = feature_count,
            "Trader classification service started"
        );
    }

    /// Log service shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Trader classification service shutting down"
        );
    }

    /// Log a served prediction
    pub fn log_prediction(&self, prediction: &str, confidence: f64) {
        info!(
            event = "prediction_generated",
            service = %self.service,
            prediction = %prediction,
            confidence = confidence,
            "Generated trader prediction"
        );
    }

    /// Log a served batch
    pub fn log_batch(&self, total: usize, good_traders: usize) {
        info!(
            event = "batch_prediction_generated",
            service = %self.service,
            total = total,
            good_traders = good_traders,
            "Generated batch predictions"
        );
    }

    /// Log an internal failure that surfaced after validation passed.
    ///
    /// User-input rejections are not logged here; they are client errors,
    /// not operational failures.
    pub fn log_internal_error(&self, operation: &str, error: &str) {
        error!(
            event = "prediction_failed",
            service = %self.service,
            operation = %operation,
            error = %error,
            "Internal prediction failure"
        );
    }
}
