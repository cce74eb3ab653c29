//! Normal-equation fit of the emission model

use crate::error::{AnalyticsError, Result};
use crate::models::{DeploymentSpec, TrainingSample};
use crate::region;
use crate::stats::{invert, mean, multiply, multiply_vector, transpose, Matrix};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Intercept plus five deployment features
pub const COEFFICIENT_COUNT: usize = 6;

/// Names of the coefficients, in design-row order
pub const COEFFICIENT_NAMES: [&str; COEFFICIENT_COUNT] =
    ["intercept", "region", "time", "cpu", "memory", "duration"];

/// Prediction the confidence curve is centred on
const CONFIDENCE_CENTER: f64 = 150.0;
const CONFIDENCE_SPREAD: f64 = 300.0;
const MIN_CONFIDENCE: f64 = 0.5;

/// Emission estimate for one deployment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub prediction: f64,
    /// Heuristic in `[0.5, 1.0]`, highest for predictions near 150
    pub confidence: f64,
}

/// `[1, region_multiplier, time, cpu, memory, duration]`
pub fn design_row(spec: &DeploymentSpec) -> [f64; COEFFICIENT_COUNT] {
    [
        1.0,
        region::multiplier(&spec.region),
        spec.time as f64,
        spec.cpu,
        spec.memory,
        spec.duration,
    ]
}

pub fn confidence(prediction: f64) -> f64 {
    let raw = 1.0 - (prediction - CONFIDENCE_CENTER).abs() / CONFIDENCE_SPREAD;
    MIN_CONFIDENCE.max(raw).clamp(MIN_CONFIDENCE, 1.0)
}

/// Trained linear model
#[derive(Debug, Clone, Serialize)]
pub struct RegressionModel {
    pub coefficients: [f64; COEFFICIENT_COUNT],
    pub sample_count: usize,
    /// Coefficient of determination on the training set
    pub r_squared: f64,
    pub trained_at: DateTime<Utc>,
}

impl RegressionModel {
    /// Solve `β = (XᵗX)⁻¹XᵗY` over the samples
    pub fn fit(samples: &[TrainingSample]) -> Result<Self> {
        if samples.is_empty() {
            return Err(AnalyticsError::DegenerateInput(
                "cannot train on an empty sample set".to_string(),
            ));
        }

        let x: Matrix = samples
            .iter()
            .map(|s| design_row(&s.spec()).to_vec())
            .collect();
        let y: Vec<f64> = samples.iter().map(|s| s.emissions).collect();

        let xt = transpose(&x);
        let xtx_inv = invert(&multiply(&xt, &x))?;
        let beta = multiply_vector(&xtx_inv, &multiply_vector(&xt, &y));

        let mut coefficients = [0.0; COEFFICIENT_COUNT];
        for (slot, value) in coefficients.iter_mut().zip(&beta) {
            if !value.is_finite() {
                return Err(AnalyticsError::DegenerateInput(
                    "training produced non-finite coefficients".to_string(),
                ));
            }
            *slot = *value;
        }

        let mut model = Self {
            coefficients,
            sample_count: samples.len(),
            r_squared: 0.0,
            trained_at: Utc::now(),
        };
        model.r_squared = model.score(&x, &y);
        Ok(model)
    }

    /// Linear prediction without confidence
    pub fn evaluate(&self, spec: &DeploymentSpec) -> f64 {
        dot(&self.coefficients, &design_row(spec))
    }

    pub fn predict(&self, spec: &DeploymentSpec) -> Prediction {
        let prediction = self.evaluate(spec);
        Prediction {
            prediction,
            confidence: confidence(prediction),
        }
    }

    /// Coefficient paired with its feature name
    pub fn named_coefficients(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        COEFFICIENT_NAMES
            .iter()
            .copied()
            .zip(self.coefficients.iter().copied())
    }

    fn score(&self, x: &[Vec<f64>], y: &[f64]) -> f64 {
        let y_mean = mean(y);
        let total: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();
        let residual: f64 = x
            .iter()
            .zip(y)
            .map(|(row, v)| (v - dot(&self.coefficients, row)).powi(2))
            .sum();
        if total == 0.0 {
            return if residual < 1e-12 { 1.0 } else { 0.0 };
        }
        1.0 - residual / total
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
