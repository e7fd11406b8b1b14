//! Metrics module for subscription-service.
//! Provides Prometheus metrics for subscription storage and cost aggregation.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{
    histogram_opts, opts, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec,
    IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;

/// Recorder handle for HTTP metrics emitted through the `metrics` facade
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Database query duration histogram
pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        histogram_opts!(
            "subscription_db_query_duration_seconds",
            "Database query duration"
        ),
        &["operation"]
    )
    .expect("Failed to register DB_QUERY_DURATION")
});

/// Subscription CRUD operations counter
pub static SUBSCRIPTION_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Aggregation requests counter, labelled by which filters were applied
pub static AGGREGATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Distribution of the number of months in requested windows
pub static AGGREGATION_WINDOW_MONTHS: OnceLock<HistogramVec> = OnceLock::new();

/// Error counter for alerting
pub static ERRORS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize all metrics. Call once at startup.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_none() {
        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                let _ = METRICS_HANDLE.set(handle);
            }
            Err(e) => tracing::warn!(error = %e, "Prometheus recorder already installed"),
        }
    }

    SUBSCRIPTION_OPERATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "subscription_operations_total",
                "Total subscription operations by operation type"
            ),
            &["operation"]
        )
        .expect("Failed to register SUBSCRIPTION_OPERATIONS_TOTAL")
    });

    AGGREGATIONS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!(
                "subscription_aggregations_total",
                "Total cost aggregations by applied filter"
            ),
            &["filter"]
        )
        .expect("Failed to register AGGREGATIONS_TOTAL")
    });

    // Window sizes in months; a degenerate window is recorded as 0
    AGGREGATION_WINDOW_MONTHS.get_or_init(|| {
        register_histogram_vec!(
            histogram_opts!(
                "subscription_aggregation_window_months",
                "Requested aggregation window size in months",
                vec![0.0, 1.0, 3.0, 6.0, 12.0, 24.0, 60.0, 120.0]
            ),
            &["filter"]
        )
        .expect("Failed to register AGGREGATION_WINDOW_MONTHS")
    });

    ERRORS_TOTAL.get_or_init(|| {
        register_int_counter_vec!(
            opts!("subscription_errors_total", "Total errors by type for alerting"),
            &["error_type", "operation"]
        )
        .expect("Failed to register ERRORS_TOTAL")
    });

    // Force initialization of lazy statics
    let _ = &*DB_QUERY_DURATION;
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_default();

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return output;
    }
    if let Ok(custom_metrics) = String::from_utf8(buffer) {
        output.push_str(&custom_metrics);
    }

    output
}

/// Record a subscription operation.
pub fn record_subscription_operation(operation: &str) {
    if let Some(counter) = SUBSCRIPTION_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation]).inc();
    }
}

/// Record an aggregation and the size of its window.
pub fn record_aggregation(filter: &str, window_months: i64) {
    if let Some(counter) = AGGREGATIONS_TOTAL.get() {
        counter.with_label_values(&[filter]).inc();
    }
    if let Some(histogram) = AGGREGATION_WINDOW_MONTHS.get() {
        histogram
            .with_label_values(&[filter])
            .observe(window_months.max(0) as f64);
    }
}

/// Record an error for alerting.
pub fn record_error(error_type: &str, operation: &str) {
    if let Some(counter) = ERRORS_TOTAL.get() {
        counter.with_label_values(&[error_type, operation]).inc();
    }
}
