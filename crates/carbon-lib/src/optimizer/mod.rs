//! Deployment configuration optimizer
//!
//! Genetic-algorithm search over region × time window × resource allocation
//! for the lowest-emission configuration. Each generation is evaluated,
//! tournament-selected and recombined; there is no elitism, and the best
//! configuration is picked from the final generation only.

mod estimator;
mod genetic;

pub use estimator::{time_multiplier, EmissionEstimator, HeuristicEstimator, BASE_EMISSION};
pub use genetic::{Individual, Population};

use crate::config::OptimizerConfig;
use crate::error::{AnalyticsError, Result};
use crate::models::Resources;
use crate::observability::{components, AnalyticsMetrics};
use crate::stats::mean;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Search space and budget for one optimization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraints {
    pub regions: Vec<String>,
    /// Candidate start hours
    pub time_windows: Vec<u32>,
    /// Upper bounds for cpu and memory draws
    pub resource_limits: Resources,
    /// Emission budget the result is checked against
    pub carbon_budget: f64,
}

impl Constraints {
    /// Reject search spaces the population cannot be drawn from
    pub fn validate(&self) -> Result<()> {
        if self.regions.is_empty() {
            return Err(AnalyticsError::ConstraintViolation(
                "at least one candidate region is required".to_string(),
            ));
        }
        if self.time_windows.is_empty() {
            return Err(AnalyticsError::ConstraintViolation(
                "at least one time window is required".to_string(),
            ));
        }
        let limits = self.resource_limits;
        if !(limits.cpu.is_finite() && limits.cpu > 0.0)
            || !(limits.memory.is_finite() && limits.memory > 0.0)
        {
            return Err(AnalyticsError::ConstraintViolation(format!(
                "resource limits must be positive, got cpu={} memory={}",
                limits.cpu, limits.memory
            )));
        }
        Ok(())
    }
}

/// Best configuration found by a run
#[derive(Debug, Clone, Serialize)]
pub struct OptimalConfig {
    pub region: String,
    pub time: u32,
    pub resources: Resources,
    pub expected_emissions: f64,
    /// Whether `expected_emissions` fits in the constraint budget
    pub within_budget: bool,
    /// Mean estimated emissions of the initial random population
    pub initial_average_emissions: f64,
    pub generations: usize,
}

/// Genetic-algorithm optimizer
pub struct ConfigOptimizer<E: EmissionEstimator = HeuristicEstimator> {
    config: OptimizerConfig,
    estimator: E,
    metrics: AnalyticsMetrics,
}

impl ConfigOptimizer<HeuristicEstimator> {
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        Self::with_estimator(config, HeuristicEstimator::default())
    }
}

impl<E: EmissionEstimator> ConfigOptimizer<E> {
    pub fn with_estimator(config: OptimizerConfig, estimator: E) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            estimator,
            metrics: AnalyticsMetrics::new(),
        })
    }

    /// Estimated emissions of a configuration, as reported in results
    pub fn expected_emissions(&self, individual: &Individual) -> f64 {
        genetic::emissions(&self.estimator, individual)
    }

    /// Optimize with the configured seed, or an entropy seed when unset
    pub fn optimize(&self, constraints: &Constraints) -> Result<OptimalConfig> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.optimize_with_rng(constraints, &mut rng)
    }

    /// Optimize using the supplied random source
    pub fn optimize_with_rng<R: Rng + ?Sized>(
        &self,
        constraints: &Constraints,
        rng: &mut R,
    ) -> Result<OptimalConfig> {
        constraints.validate()?;
        let started = Instant::now();

        let mut population =
            genetic::initialize(constraints, self.config.population_size, rng);
        let initial: Vec<f64> = population
            .iter()
            .map(|i| self.expected_emissions(i))
            .collect();
        let initial_average_emissions = mean(&initial);

        for generation in 0..self.config.generations {
            let fitness: Vec<f64> = population
                .iter()
                .map(|i| genetic::fitness(&self.estimator, i))
                .collect();
            let parents = genetic::tournament_select(
                &population,
                &fitness,
                self.config.tournament_size,
                rng,
            );
            population =
                genetic::next_generation(&parents, constraints, self.config.mutation_rate, rng);

            if generation % 25 == 0 {
                debug!(
                    generation = generation,
                    best_fitness = fitness.iter().cloned().fold(0.0, f64::max),
                    "Generation evaluated"
                );
            }
        }

        let best = population
            .iter()
            .map(|i| (i, self.expected_emissions(i)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| {
                AnalyticsError::DegenerateInput("optimizer population is empty".to_string())
            })?;

        let (individual, expected_emissions) = best;
        let result = OptimalConfig {
            region: individual.region.clone(),
            time: individual.time,
            resources: individual.resources,
            expected_emissions,
            within_budget: expected_emissions <= constraints.carbon_budget,
            initial_average_emissions,
            generations: self.config.generations,
        };

        info!(
            region = %result.region,
            time = result.time,
            expected_emissions = result.expected_emissions,
            initial_average_emissions = result.initial_average_emissions,
            within_budget = result.within_budget,
            "Optimization completed"
        );
        self.metrics.inc_optimizer_runs();
        self.metrics.observe_run(components::OPTIMIZER, started);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints() -> Constraints {
        Constraints {
            regions: vec![
                "us-east-1".to_string(),
                "us-west-2".to_string(),
                "eu-north-1".to_string(),
                "eu-west-1".to_string(),
            ],
            time_windows: (0..24).collect(),
            resource_limits: Resources::new(4.0, 8.0),
            carbon_budget: 500.0,
        }
    }

    fn small_config(seed: u64) -> OptimizerConfig {
        OptimizerConfig {
            generations: 30,
            seed: Some(seed),
            ..OptimizerConfig::default()
        }
    }

    #[test]
    fn test_rejects_empty_regions() {
        let optimizer = ConfigOptimizer::new(OptimizerConfig::default()).unwrap();
        let mut c = constraints();
        c.regions.clear();
        assert!(matches!(
            optimizer.optimize(&c),
            Err(AnalyticsError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_rejects_empty_time_windows() {
        let optimizer = ConfigOptimizer::new(OptimizerConfig::default()).unwrap();
        let mut c = constraints();
        c.time_windows.clear();
        assert!(matches!(
            optimizer.optimize(&c),
            Err(AnalyticsError::ConstraintViolation(_))
        ));
    }

    #[test]
    fn test_rejects_non_positive_limits() {
        let optimizer = ConfigOptimizer::new(OptimizerConfig::default()).unwrap();
        let mut c = constraints();
        c.resource_limits.cpu = 0.0;
        assert!(optimizer.optimize(&c).is_err());
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = OptimizerConfig {
            population_size: 0,
            ..OptimizerConfig::default()
        };
        assert!(matches!(
            ConfigOptimizer::new(config),
            Err(AnalyticsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_result_is_self_consistent() {
        let optimizer = ConfigOptimizer::new(small_config(42)).unwrap();
        let c = constraints();
        let result = optimizer.optimize(&c).unwrap();

        assert!(c.regions.contains(&result.region));
        assert!(c.time_windows.contains(&result.time));
        let recomputed = optimizer.expected_emissions(&Individual {
            region: result.region.clone(),
            time: result.time,
            resources: result.resources,
        });
        assert_eq!(recomputed, result.expected_emissions);
        assert_eq!(result.within_budget, result.expected_emissions <= 500.0);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let c = constraints();
        let a = ConfigOptimizer::new(small_config(9)).unwrap().optimize(&c).unwrap();
        let b = ConfigOptimizer::new(small_config(9)).unwrap().optimize(&c).unwrap();
        assert_eq!(a.region, b.region);
        assert_eq!(a.time, b.time);
        assert_eq!(a.expected_emissions, b.expected_emissions);
    }

    #[test]
    fn test_improves_on_initial_population() {
        let c = constraints();
        let mut improved = 0;
        for seed in 0..10 {
            let result = ConfigOptimizer::new(small_config(seed))
                .unwrap()
                .optimize(&c)
                .unwrap();
            if result.expected_emissions < result.initial_average_emissions {
                improved += 1;
            }
        }
        assert!(improved >= 9, "only {} of 10 runs improved", improved);
    }

    #[test]
    fn test_single_option_space() {
        let optimizer = ConfigOptimizer::new(small_config(1)).unwrap();
        let c = Constraints {
            regions: vec!["eu-north-1".to_string()],
            time_windows: vec![12],
            resource_limits: Resources::new(1.0, 1.0),
            carbon_budget: 30.0,
        };
        let result = optimizer.optimize(&c).unwrap();
        assert_eq!(result.region, "eu-north-1");
        assert_eq!(result.time, 12);
        assert!(result.resources.cpu <= 1.0 && result.resources.memory <= 1.0);
        // 100 × 0.3 × cpu × memory × 1.0
        assert!(result.expected_emissions > 0.0 && result.expected_emissions <= 30.0);
        assert!(result.within_budget == (result.expected_emissions <= 30.0));
    }
}
