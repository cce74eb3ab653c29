//! Combined insights report
//!
//! Runs every analytics component over one input bundle and collects the
//! results into a single serializable report. A failing component is
//! recorded in its own section and does not abort the others.

use crate::anomaly::{Anomaly, AnomalyDetector, DriftResult};
use crate::cluster::{ClusterSummary, PatternClusterer};
use crate::config::AnalyticsConfig;
use crate::error::{AnalyticsError, Result};
use crate::forecast::{Clock, ForecastComponents, SystemClock, TrendForecaster};
use crate::models::{DeploymentRecord, TrainingSample};
use crate::observability::StructuredLogger;
use crate::optimizer::{ConfigOptimizer, Constraints, OptimalConfig};
use crate::regression::{EmissionRegressor, RegressionModel};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Everything one analysis run looks at
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsInput {
    /// Historical carbon intensity per region
    pub intensity_history: BTreeMap<String, Vec<f64>>,
    /// Emission series screened for anomalies and drift
    pub emissions: Vec<f64>,
    pub records: Vec<DeploymentRecord>,
    pub constraints: Option<Constraints>,
    pub training: Vec<TrainingSample>,
}

/// Result of one report section
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum Outcome<T> {
    Completed(T),
    Skipped { reason: String },
    Failed { reason: String },
}

impl<T> Outcome<T> {
    fn from_result(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Completed(value),
            Err(e) => Outcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    fn skipped(reason: &str) -> Self {
        Outcome::Skipped {
            reason: reason.to_string(),
        }
    }

    pub fn completed(&self) -> Option<&T> {
        match self {
            Outcome::Completed(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionForecast {
    pub region: String,
    /// Last observed intensity, if any
    pub current: Option<f64>,
    pub predicted: f64,
    pub components: ForecastComponents,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsightsReport {
    pub generated_at: DateTime<Utc>,
    pub forecasts: Vec<RegionForecast>,
    /// Total number of flagged samples
    pub anomaly_count: usize,
    /// Highest-Z anomalies, most extreme first
    pub top_anomalies: Vec<Anomaly>,
    pub drift: DriftResult,
    pub optimization: Outcome<OptimalConfig>,
    pub patterns: Outcome<Vec<ClusterSummary>>,
    pub regression: Outcome<RegressionModel>,
}

/// Runs the full analysis over an [`InsightsInput`]
pub struct InsightsEngine<C: Clock = SystemClock> {
    config: AnalyticsConfig,
    forecaster: TrendForecaster<C>,
    detector: AnomalyDetector,
    logger: StructuredLogger,
}

impl InsightsEngine<SystemClock> {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> InsightsEngine<C> {
    pub fn with_clock(config: AnalyticsConfig, clock: C) -> Self {
        Self {
            detector: AnomalyDetector::with_config(config.anomaly.clone()),
            forecaster: TrendForecaster::with_clock(clock),
            config,
            logger: StructuredLogger::new("insights"),
        }
    }

    pub fn run<R: Rng + ?Sized>(&self, input: &InsightsInput, rng: &mut R) -> InsightsReport {
        let forecasts = self.forecast_regions(input);

        let anomalies = self.detector.detect_anomalies(&input.emissions);
        let anomaly_count = anomalies.len();
        let top_anomalies = self.top_anomalies(anomalies);
        for a in &top_anomalies {
            self.logger
                .log_anomaly(a.index, a.value, a.z_score, a.severity.as_str());
        }

        let drift = self.detector.detect_drift(&input.emissions);
        if let Some(change_point) = drift.change_point {
            self.logger.log_drift(change_point);
        }

        let optimization = self.optimize(input, rng);
        let patterns = self.patterns(input, rng);
        let regression = self.regression(input);

        for (section, failed) in [
            ("optimization", optimization.is_failed()),
            ("patterns", patterns.is_failed()),
            ("regression", regression.is_failed()),
        ] {
            if failed {
                warn!(section = section, "Insights section failed");
            }
        }
        info!(
            regions = forecasts.len(),
            anomalies = anomaly_count,
            drifting = drift.is_drifting,
            "Insights report generated"
        );

        InsightsReport {
            generated_at: Utc::now(),
            forecasts,
            anomaly_count,
            top_anomalies,
            drift,
            optimization,
            patterns,
            regression,
        }
    }

    fn forecast_regions(&self, input: &InsightsInput) -> Vec<RegionForecast> {
        let horizon = self.config.insights.forecast_horizon;
        input
            .intensity_history
            .iter()
            .map(|(region, series)| {
                let components = self.forecaster.decompose(series, horizon);
                RegionForecast {
                    region: region.clone(),
                    current: series.last().copied(),
                    predicted: components.total(),
                    components,
                }
            })
            .collect()
    }

    fn top_anomalies(&self, mut anomalies: Vec<Anomaly>) -> Vec<Anomaly> {
        anomalies.sort_by(|a, b| b.z_score.abs().total_cmp(&a.z_score.abs()));
        anomalies.truncate(self.config.insights.top_anomalies);
        anomalies
    }

    fn optimize<R: Rng + ?Sized>(
        &self,
        input: &InsightsInput,
        rng: &mut R,
    ) -> Outcome<OptimalConfig> {
        let Some(constraints) = &input.constraints else {
            return Outcome::skipped("no optimizer constraints supplied");
        };
        let result = ConfigOptimizer::new(self.config.optimizer.clone())
            .and_then(|optimizer| optimizer.optimize_with_rng(constraints, rng));
        if let Ok(best) = &result {
            self.logger.log_optimization(
                &best.region,
                best.time,
                best.expected_emissions,
                best.within_budget,
            );
        }
        Outcome::from_result(result)
    }

    fn patterns<R: Rng + ?Sized>(
        &self,
        input: &InsightsInput,
        rng: &mut R,
    ) -> Outcome<Vec<ClusterSummary>> {
        if input.records.is_empty() {
            return Outcome::skipped("no deployment records supplied");
        }
        let result = PatternClusterer::new(self.config.cluster.clone())
            .and_then(|clusterer| clusterer.cluster_with_rng(&input.records, rng));
        if let Ok(clusters) = &result {
            self.logger.log_patterns(clusters.len(), input.records.len());
        }
        Outcome::from_result(result)
    }

    fn regression(&self, input: &InsightsInput) -> Outcome<RegressionModel> {
        if input.training.is_empty() {
            return Outcome::skipped("no training samples supplied");
        }
        let regressor = EmissionRegressor::new();
        Outcome::from_result(regressor.train(&input.training).and_then(|()| {
            regressor
                .model()
                .ok_or(AnalyticsError::ModelNotTrained)
        }))
    }
}
