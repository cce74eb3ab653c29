//! Emission regression
//!
//! Multiple linear regression over `[1, region_multiplier, time, cpu,
//! memory, duration]` solved with the normal equation. The trained model
//! lives behind a lock so that training replaces it atomically while
//! predictions read the current one.

mod model;

pub use model::{
    confidence, design_row, Prediction, RegressionModel, COEFFICIENT_COUNT, COEFFICIENT_NAMES,
};

use crate::error::{AnalyticsError, Result};
use crate::models::{DeploymentSpec, TrainingSample};
use crate::observability::{components, AnalyticsMetrics, StructuredLogger};
use std::sync::{PoisonError, RwLock};
use std::time::Instant;
use tracing::debug;

/// Trains and serves the emission model
pub struct EmissionRegressor {
    model: RwLock<Option<RegressionModel>>,
    metrics: AnalyticsMetrics,
    logger: StructuredLogger,
}

impl Default for EmissionRegressor {
    fn default() -> Self {
        Self::new()
    }
}

impl EmissionRegressor {
    /// Create a regressor with no trained model
    pub fn new() -> Self {
        Self {
            model: RwLock::new(None),
            metrics: AnalyticsMetrics::new(),
            logger: StructuredLogger::new(components::REGRESSOR),
        }
    }

    /// Create a regressor serving an already fitted model
    pub fn from_model(model: RegressionModel) -> Self {
        let regressor = Self::new();
        *regressor.model.write().unwrap_or_else(PoisonError::into_inner) = Some(model);
        regressor
    }

    /// Fit on `samples` and replace the current model
    ///
    /// On failure the previous model, if any, stays in place.
    pub fn train(&self, samples: &[TrainingSample]) -> Result<()> {
        let started = Instant::now();
        let fitted = match RegressionModel::fit(samples) {
            Ok(model) => model,
            Err(e) => {
                self.metrics.inc_training_failures();
                self.logger.log_training_failure(samples.len(), &e.to_string());
                return Err(e);
            }
        };

        self.logger.log_training(fitted.sample_count, fitted.r_squared);
        debug!(coefficients = ?fitted.coefficients, "Regression coefficients updated");

        *self.model.write().unwrap_or_else(PoisonError::into_inner) = Some(fitted);
        self.metrics.inc_training_runs();
        self.metrics.observe_run(components::REGRESSOR, started);
        Ok(())
    }

    pub fn predict(&self, spec: &DeploymentSpec) -> Result<Prediction> {
        let guard = self.model.read().unwrap_or_else(PoisonError::into_inner);
        let model = guard.as_ref().ok_or(AnalyticsError::ModelNotTrained)?;
        self.metrics.inc_predictions();
        Ok(model.predict(spec))
    }

    pub fn is_trained(&self) -> bool {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Snapshot of the current model
    pub fn model(&self) -> Option<RegressionModel> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
