//! Z-score outlier detection
//!
//! Computes the population mean and standard deviation once, then flags
//! every sample lying more than `threshold` standard deviations away.

use super::series_moments;
use serde::Serialize;
use tracing::{debug, warn};

/// Severity of a flagged sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// A flagged emission sample
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Anomaly {
    /// Position in the input series
    pub index: usize,
    pub value: f64,
    /// Absolute number of standard deviations from the mean
    pub z_score: f64,
    pub severity: Severity,
}

pub(super) fn detect(series: &[f64], threshold: f64, critical_z: f64) -> Vec<Anomaly> {
    let Some((mean, std_dev)) = series_moments(series) else {
        if !series.is_empty() {
            debug!(samples = series.len(), "Zero variance series, no anomalies");
        }
        return Vec::new();
    };

    let anomalies: Vec<Anomaly> = series
        .iter()
        .enumerate()
        .filter_map(|(index, &value)| {
            let z_score = (value - mean).abs() / std_dev;
            if z_score > threshold {
                Some(Anomaly {
                    index,
                    value,
                    z_score,
                    severity: if z_score > critical_z {
                        Severity::Critical
                    } else {
                        Severity::Warning
                    },
                })
            } else {
                None
            }
        })
        .collect();

    for anomaly in anomalies.iter().filter(|a| a.severity == Severity::Critical) {
        warn!(
            index = anomaly.index,
            value = anomaly.value,
            z_score = anomaly.z_score,
            "Critical emission anomaly"
        );
    }
    debug!(
        samples = series.len(),
        mean = mean,
        std_dev = std_dev,
        flagged = anomalies.len(),
        "Z-score scan complete"
    );
    anomalies
}
