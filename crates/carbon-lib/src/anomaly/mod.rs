//! Anomaly detection for emission series
//!
//! This module provides detection for:
//! - Outliers (samples whose Z-score exceeds a threshold)
//! - Drift (sustained mean shifts, via two-sided CUSUM)

mod drift;
mod outlier;

pub use drift::{CusumParams, DriftResult};
pub use outlier::{Anomaly, Severity};

use crate::config::AnomalyConfig;
use crate::observability::{components, AnalyticsMetrics};
use crate::stats::{mean, std_dev};
use std::time::Instant;

/// Minimum standard deviation treated as non-zero variance
const MIN_STD_DEV: f64 = 1e-12;

/// Flags outliers and drift in emission series
pub struct AnomalyDetector {
    config: AnomalyConfig,
    metrics: AnalyticsMetrics,
}

impl AnomalyDetector {
    /// Create a detector with the given Z-score threshold
    pub fn new(threshold: f64) -> Self {
        Self::with_config(AnomalyConfig {
            threshold,
            ..AnomalyConfig::default()
        })
    }

    pub fn with_config(config: AnomalyConfig) -> Self {
        Self {
            config,
            metrics: AnalyticsMetrics::new(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Flag every sample whose Z-score strictly exceeds the threshold
    ///
    /// A series with zero variance (or no samples) has no anomalies.
    pub fn detect_anomalies(&self, series: &[f64]) -> Vec<Anomaly> {
        let started = Instant::now();
        let anomalies = outlier::detect(series, self.config.threshold, self.config.critical_z);

        let critical = anomalies
            .iter()
            .filter(|a| a.severity == Severity::Critical)
            .count() as u64;
        self.metrics
            .inc_anomalies(Severity::Critical.as_str(), critical);
        self.metrics
            .inc_anomalies(Severity::Warning.as_str(), anomalies.len() as u64 - critical);
        self.metrics.observe_run(components::ANOMALY_DETECTOR, started);
        anomalies
    }

    /// Two-sided CUSUM with slack `σ/2` and decision interval `5σ`
    pub fn detect_drift(&self, series: &[f64]) -> DriftResult {
        self.detect_drift_with(series, CusumParams::default())
    }

    /// Two-sided CUSUM with explicit slack and decision interval
    pub fn detect_drift_with(&self, series: &[f64], params: CusumParams) -> DriftResult {
        let started = Instant::now();
        let result = drift::detect(series, params);
        if result.is_drifting {
            self.metrics.inc_drift_detected();
        }
        self.metrics.observe_run(components::ANOMALY_DETECTOR, started);
        result
    }
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self::with_config(AnomalyConfig::default())
    }
}

/// Population mean and standard deviation, or `None` for degenerate series
pub(crate) fn series_moments(series: &[f64]) -> Option<(f64, f64)> {
    if series.is_empty() {
        return None;
    }
    let m = mean(series);
    let sd = std_dev(series, m);
    if !sd.is_finite() || sd < MIN_STD_DEV {
        return None;
    }
    Some((m, sd))
}
