//! Analytics configuration
//!
//! Defaults match the documented algorithm parameters. [`AnalyticsConfig::load`]
//! layers an optional file and `CARBON_*` environment variables on top, e.g.
//! `CARBON_OPTIMIZER__GENERATIONS=200`.

use crate::error::{AnalyticsError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default Z-score threshold for anomaly flagging
pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.5;

/// Z-score above which an anomaly is critical
pub const DEFAULT_CRITICAL_Z: f64 = 3.0;

/// Anomaly detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    pub threshold: f64,
    pub critical_z: f64,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ANOMALY_THRESHOLD,
            critical_z: DEFAULT_CRITICAL_Z,
        }
    }
}

/// Genetic algorithm settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub population_size: usize,
    pub generations: usize,
    /// Per-gene mutation probability
    pub mutation_rate: f64,
    pub tournament_size: usize,
    /// Fixed seed for reproducible runs; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            mutation_rate: 0.1,
            tournament_size: 3,
            seed: None,
        }
    }
}

/// K-means settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub k: usize,
    pub max_iterations: usize,
    /// Centroid movement below which k-means has converged
    pub tolerance: f64,
    pub seed: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            k: 4,
            max_iterations: 100,
            tolerance: 0.01,
            seed: None,
        }
    }
}

/// Settings for the combined insights report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsConfig {
    /// Hours ahead for region intensity forecasts
    pub forecast_horizon: usize,
    /// Number of anomalies kept in the report, highest Z first
    pub top_anomalies: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            forecast_horizon: 6,
            top_anomalies: 5,
        }
    }
}

/// Top-level configuration for all components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub anomaly: AnomalyConfig,
    pub optimizer: OptimizerConfig,
    pub cluster: ClusterConfig,
    pub insights: InsightsConfig,
}

impl AnalyticsConfig {
    /// Load configuration from an optional file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix("CARBON")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AnalyticsConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.anomaly.validate()?;
        self.optimizer.validate()?;
        self.cluster.validate()
    }
}

impl AnomalyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threshold.is_nan() || self.threshold <= 0.0 {
            return Err(AnalyticsError::InvalidConfig(
                "anomaly threshold must be positive".to_string(),
            ));
        }
        if self.critical_z.is_nan() || self.critical_z <= 0.0 {
            return Err(AnalyticsError::InvalidConfig(
                "critical Z-score must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(AnalyticsError::InvalidConfig(
                "population size must be at least 2".to_string(),
            ));
        }
        if self.tournament_size == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "tournament size must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(AnalyticsError::InvalidConfig(
                "mutation rate must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl ClusterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "cluster count k must be at least 1".to_string(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(AnalyticsError::InvalidConfig(
                "k-means iteration cap must be at least 1".to_string(),
            ));
        }
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(AnalyticsError::InvalidConfig(
                "convergence tolerance must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.anomaly.threshold, 2.5);
        assert_eq!(config.optimizer.population_size, 50);
        assert_eq!(config.optimizer.generations, 100);
        assert_eq!(config.optimizer.mutation_rate, 0.1);
        assert_eq!(config.cluster.k, 4);
        assert_eq!(config.cluster.max_iterations, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[optimizer]\ngenerations = 20\nseed = 7\n\n[cluster]\nk = 2\n"
        )
        .unwrap();

        let config = AnalyticsConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.optimizer.generations, 20);
        assert_eq!(config.optimizer.seed, Some(7));
        // Unspecified fields keep their defaults
        assert_eq!(config.optimizer.population_size, 50);
        assert_eq!(config.cluster.k, 2);
        assert_eq!(config.anomaly.threshold, 2.5);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[cluster]\nk = 0\n").unwrap();

        let result = AnalyticsConfig::load(Some(file.path()));
        assert!(matches!(result, Err(AnalyticsError::InvalidConfig(_))));
    }

    #[test]
    fn test_validation() {
        let mut config = AnalyticsConfig::default();
        config.optimizer.mutation_rate = 1.5;
        assert!(config.validate().is_err());

        let mut config = AnalyticsConfig::default();
        config.optimizer.population_size = 1;
        assert!(config.validate().is_err());

        let mut config = AnalyticsConfig::default();
        config.anomaly.threshold = 0.0;
        assert!(config.validate().is_err());

        let mut config = AnalyticsConfig::default();
        config.cluster.tolerance = -1.0;
        assert!(config.validate().is_err());
    }
}
