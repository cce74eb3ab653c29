//! Analytics core for carbon-aware deployments
//!
//! This crate provides the core functionality for:
//! - Carbon intensity forecasting (trend, seasonal and cyclical terms)
//! - Emission anomaly and drift detection
//! - Genetic-algorithm search for low-emission deployment configurations
//! - K-means clustering of deployment behavior
//! - Multiple linear regression for emission prediction
//!
//! Every component is a synchronous computation over caller-supplied data.

pub mod advisor;
pub mod anomaly;
pub mod cluster;
pub mod config;
pub mod error;
pub mod forecast;
pub mod insights;
pub mod models;
pub mod observability;
pub mod optimizer;
pub mod region;
pub mod regression;
pub mod stats;

pub use anomaly::{Anomaly, AnomalyDetector, CusumParams, DriftResult, Severity};
pub use cluster::{ClusterSummary, PatternClusterer, PatternKind};
pub use crate::config::AnalyticsConfig;
pub use error::{AnalyticsError, Result};
pub use forecast::{Clock, FixedClock, ForecastComponents, SystemClock, TrendForecaster};
pub use models::*;
pub use observability::{AnalyticsMetrics, StructuredLogger};
pub use optimizer::{ConfigOptimizer, Constraints, EmissionEstimator, OptimalConfig};
pub use regression::{EmissionRegressor, Prediction, RegressionModel};
