//! Prometheus metrics for mockdir.
//!
//! Tracks mock request outcomes, script execution, and configuration reloads.
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

lazy_static! {
    /// Mock requests by endpoint and outcome
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "mockdir_requests_total",
        "Total number of mock requests handled",
        &["endpoint", "outcome"]  // outcome: ok|no_endpoint|no_rule|error
    )
    .unwrap();

    /// Script evaluations by result
    pub static ref SCRIPT_EXECUTIONS_TOTAL: CounterVec = register_counter_vec!(
        "mockdir_script_executions_total",
        "Total number of response script evaluations",
        &["result"]  // result: ok|error
    )
    .unwrap();

    /// Script evaluation duration, including preprocessing and compilation
    pub static ref SCRIPT_DURATION_MS: HistogramVec = register_histogram_vec!(
        "mockdir_script_duration_ms",
        "Histogram of response script evaluation time in milliseconds",
        &["result"],
        vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0]
    )
    .unwrap();

    /// Configuration reloads by result
    pub static ref RELOADS_TOTAL: CounterVec = register_counter_vec!(
        "mockdir_reloads_total",
        "Total number of endpoint configuration reloads",
        &["result"]  // result: ok|error
    )
    .unwrap();
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if encoder.encode(&metric_families, &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub fn record_request(endpoint: &str, outcome: &str) {
    REQUESTS_TOTAL.with_label_values(&[endpoint, outcome]).inc();
}

pub fn record_script_execution(result: &str, duration_ms: f64) {
    SCRIPT_EXECUTIONS_TOTAL.with_label_values(&[result]).inc();
    SCRIPT_DURATION_MS
        .with_label_values(&[result])
        .observe(duration_ms);
}

pub fn record_reload(success: bool) {
    let result = if success { "ok" } else { "error" };
    RELOADS_TOTAL.with_label_values(&[result]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_after_recording() {
        record_request("foo", "ok");
        record_request("", "no_endpoint");
        record_script_execution("ok", 0.25);
        record_reload(true);

        let metrics = collect_metrics();
        assert!(metrics.contains("mockdir_requests_total"));
        assert!(metrics.contains("mockdir_script_duration_ms"));
        assert!(metrics.contains("mockdir_reloads_total"));
    }
}
