//! Prometheus metrics for access-service.
//!
//! HTTP request metrics go through the `metrics` recorder installed here;
//! aggregation metrics live in a dedicated prometheus registry. Both are
//! rendered together at `/metrics`.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();

pub static UPSTREAM_REQUESTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static AGGREGATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static AGGREGATION_DURATION_SECONDS: OnceLock<HistogramVec> = OnceLock::new();
pub static UNDEFINED_ACCESS_LEVELS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

/// Install the recorder and register aggregation metrics. Call once at startup.
pub fn init_metrics() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    METRICS_HANDLE
        .set(handle)
        .map_err(|_| anyhow::anyhow!("metrics handle already initialized"))?;

    let registry = Registry::new();

    let upstream_requests = IntCounterVec::new(
        Opts::new(
            "access_upstream_requests_total",
            "Requests sent to the hierarchy API by endpoint and status",
        ),
        &["endpoint", "status"],
    )?;

    let aggregations = IntCounterVec::new(
        Opts::new(
            "access_aggregations_total",
            "Aggregation runs by strategy and outcome",
        ),
        &["strategy", "outcome"],
    )?;

    let aggregation_duration = HistogramVec::new(
        HistogramOpts::new(
            "access_aggregation_duration_seconds",
            "Wall-clock duration of aggregation runs",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["strategy"],
    )?;

    let undefined_levels = IntCounterVec::new(
        Opts::new(
            "access_undefined_access_levels_total",
            "Roster rows carrying an access level code outside the known set",
        ),
        &["code"],
    )?;

    registry.register(Box::new(upstream_requests.clone()))?;
    registry.register(Box::new(aggregations.clone()))?;
    registry.register(Box::new(aggregation_duration.clone()))?;
    registry.register(Box::new(undefined_levels.clone()))?;

    let _ = PROMETHEUS_REGISTRY.set(registry);
    let _ = UPSTREAM_REQUESTS_TOTAL.set(upstream_requests);
    let _ = AGGREGATIONS_TOTAL.set(aggregations);
    let _ = AGGREGATION_DURATION_SECONDS.set(aggregation_duration);
    let _ = UNDEFINED_ACCESS_LEVELS_TOTAL.set(undefined_levels);

    Ok(())
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

pub fn record_upstream_request(endpoint: &str, status: &str) {
    if let Some(counter) = UPSTREAM_REQUESTS_TOTAL.get() {
        counter.with_label_values(&[endpoint, status]).inc();
    }
}

pub fn record_aggregation(strategy: &str, outcome: &str, seconds: f64) {
    if let Some(counter) = AGGREGATIONS_TOTAL.get() {
        counter.with_label_values(&[strategy, outcome]).inc();
    }
    if let Some(histogram) = AGGREGATION_DURATION_SECONDS.get() {
        histogram.with_label_values(&[strategy]).observe(seconds);
    }
}

pub fn record_undefined_access_level(code: i64) {
    if let Some(counter) = UNDEFINED_ACCESS_LEVELS_TOTAL.get() {
        counter.with_label_values(&[&code.to_string()]).inc();
    }
}
