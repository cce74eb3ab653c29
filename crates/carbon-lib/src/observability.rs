//! Observability infrastructure for the analytics core
//!
//! Provides:
//! - Prometheus metrics (per-component run latency, anomaly and drift counts,
//!   optimizer, clustering and training outcomes)
//! - Structured event logging with tracing

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder,
    HistogramVec, IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Instant;
use tracing::{info, warn};

/// Histogram buckets for component run latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0,
];

/// Component labels used on the latency histogram
pub mod components {
    pub const FORECASTER: &str = "forecaster";
    pub const ANOMALY_DETECTOR: &str = "anomaly_detector";
    pub const OPTIMIZER: &str = "optimizer";
    pub const CLUSTERER: &str = "clusterer";
    pub const REGRESSOR: &str = "regressor";
}

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AnalyticsMetricsInner> = OnceLock::new();

struct AnalyticsMetricsInner {
    run_latency_seconds: HistogramVec,
    anomalies_flagged: IntCounterVec,
    drift_detected: IntCounter,
    optimizer_runs: IntCounter,
    clustering_runs: IntCounter,
    kmeans_iterations: IntCounter,
    training_runs: IntCounter,
    training_failures: IntCounter,
    predictions: IntCounter,
}

impl AnalyticsMetricsInner {
    fn new() -> Self {
        Self {
            run_latency_seconds: register_histogram_vec!(
                "carbon_analytics_run_latency_seconds",
                "Time spent in one analytics component call",
                &["component"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register run_latency_seconds"),

            anomalies_flagged: register_int_counter_vec!(
                "carbon_analytics_anomalies_flagged_total",
                "Emission samples flagged as anomalous",
                &["severity"]
            )
            .expect("Failed to register anomalies_flagged"),

            drift_detected: register_int_counter!(
                "carbon_analytics_drift_detected_total",
                "Series in which CUSUM reported sustained drift"
            )
            .expect("Failed to register drift_detected"),

            optimizer_runs: register_int_counter!(
                "carbon_analytics_optimizer_runs_total",
                "Completed genetic-algorithm optimization runs"
            )
            .expect("Failed to register optimizer_runs"),

            clustering_runs: register_int_counter!(
                "carbon_analytics_clustering_runs_total",
                "Completed k-means clustering runs"
            )
            .expect("Failed to register clustering_runs"),

            kmeans_iterations: register_int_counter!(
                "carbon_analytics_kmeans_iterations_total",
                "K-means iterations executed across all runs"
            )
            .expect("Failed to register kmeans_iterations"),

            training_runs: register_int_counter!(
                "carbon_analytics_training_runs_total",
                "Successful regression training runs"
            )
            .expect("Failed to register training_runs"),

            training_failures: register_int_counter!(
                "carbon_analytics_training_failures_total",
                "Regression training runs rejected as degenerate or singular"
            )
            .expect("Failed to register training_failures"),

            predictions: register_int_counter!(
                "carbon_analytics_predictions_total",
                "Emission predictions served"
            )
            .expect("Failed to register predictions"),
        }
    }
}

/// Analytics metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct AnalyticsMetrics {
    _private: (),
}

impl Default for AnalyticsMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AnalyticsMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AnalyticsMetricsInner {
        GLOBAL_METRICS.get_or_init(AnalyticsMetricsInner::new)
    }

    /// Record how long a component call took
    pub fn observe_run(&self, component: &str, started: Instant) {
        self.inner()
            .run_latency_seconds
            .with_label_values(&[component])
            .observe(started.elapsed().as_secs_f64());
    }

    pub fn inc_anomalies(&self, severity: &str, count: u64) {
        self.inner()
            .anomalies_flagged
            .with_label_values(&[severity])
            .inc_by(count);
    }

    pub fn inc_drift_detected(&self) {
        self.inner().drift_detected.inc();
    }

    pub fn inc_optimizer_runs(&self) {
        self.inner().optimizer_runs.inc();
    }

    pub fn record_clustering(&self, iterations: usize) {
        self.inner().clustering_runs.inc();
        self.inner().kmeans_iterations.inc_by(iterations as u64);
    }

    pub fn inc_training_runs(&self) {
        self.inner().training_runs.inc();
    }

    pub fn inc_training_failures(&self) {
        self.inner().training_failures.inc();
    }

    pub fn inc_predictions(&self) {
        self.inner().predictions.inc();
    }

    pub fn optimizer_runs(&self) -> u64 {
        self.inner().optimizer_runs.get()
    }

    pub fn training_failures(&self) -> u64 {
        self.inner().training_failures.get()
    }

    /// Render every registered metric in the Prometheus text format
    pub fn gather_text(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
            return String::new();
        }
        String::from_utf8(buffer).unwrap_or_default()
    }
}

/// Structured logger for analytics events
///
/// Provides consistent event-style logging for anomalies, drift,
/// optimization results and model training.
#[derive(Clone)]
pub struct StructuredLogger {
    source: String,
}

impl StructuredLogger {
    /// `source` names the dataset or caller the events belong to
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn log_anomaly(&self, index: usize, value: f64, z_score: f64, severity: &str) {
        match severity {
            "critical" => {
                warn!(
                    event = "anomaly_detected",
                    source = %self.source,
                    index = index,
                    value = value,
                    z_score = z_score,
                    severity = %severity,
                    "Critical emission anomaly detected"
                );
            }
            _ => {
                info!(
                    event = "anomaly_detected",
                    source = %self.source,
                    index = index,
                    value = value,
                    z_score = z_score,
                    severity = %severity,
                    "Emission anomaly detected"
                );
            }
        }
    }

    pub fn log_drift(&self, change_point: usize) {
        warn!(
            event = "drift_detected",
            source = %self.source,
            change_point = change_point,
            "Sustained emission drift detected"
        );
    }

    pub fn log_optimization(
        &self,
        region: &str,
        time: u32,
        expected_emissions: f64,
        within_budget: bool,
    ) {
        info!(
            event = "optimization_completed",
            source = %self.source,
            region = %region,
            time = time,
            expected_emissions = expected_emissions,
            within_budget = within_budget,
            "Optimal deployment configuration found"
        );
    }

    pub fn log_patterns(&self, clusters: usize, records: usize) {
        info!(
            event = "patterns_analyzed",
            source = %self.source,
            clusters = clusters,
            records = records,
            "Deployment patterns clustered"
        );
    }

    pub fn log_training(&self, samples: usize, r_squared: f64) {
        info!(
            event = "model_trained",
            source = %self.source,
            samples = samples,
            r_squared = r_squared,
            "Emission regression model trained"
        );
    }

    pub fn log_training_failure(&self, samples: usize, reason: &str) {
        warn!(
            event = "model_training_failed",
            source = %self.source,
            samples = samples,
            reason = %reason,
            "Emission regression training failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_handles_share_state() {
        let a = AnalyticsMetrics::new();
        let b = a.clone();
        let before = b.optimizer_runs();
        a.inc_optimizer_runs();
        assert!(b.optimizer_runs() > before);
    }

    #[test]
    fn test_gather_text_contains_registered_metrics() {
        let metrics = AnalyticsMetrics::new();
        metrics.observe_run(components::FORECASTER, Instant::now());
        metrics.inc_anomalies("warning", 2);
        let text = metrics.gather_text();
        assert!(text.contains("carbon_analytics_run_latency_seconds"));
        assert!(text.contains("carbon_analytics_anomalies_flagged_total"));
    }

    #[test]
    fn test_structured_logger_does_not_panic() {
        let logger = StructuredLogger::new("test");
        logger.log_anomaly(3, 1000.0, 4.2, "critical");
        logger.log_anomaly(1, 300.0, 2.7, "warning");
        logger.log_drift(12);
        logger.log_optimization("eu-north-1", 12, 1.5, true);
        logger.log_patterns(4, 50);
        logger.log_training(20, 0.99);
        logger.log_training_failure(3, "singular");
    }
}
