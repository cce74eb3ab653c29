//! Deployment pattern clustering
//!
//! Maps every deployment record to a feature vector
//! `[hour_of_day, region_code, emissions, cpu, memory]`, groups the vectors
//! with k-means and labels each cluster with a behavioral pattern and
//! rule-based recommendations.

mod kmeans;
mod patterns;

pub use kmeans::{nearest, KMeansResult};
pub use patterns::{
    recommendations, PatternKind, CPU_THRESHOLD, EMISSION_THRESHOLD, RECOMMEND_REGION,
    RECOMMEND_RIGHT_SIZE, RECOMMEND_SOLAR_WINDOW,
};

use crate::config::ClusterConfig;
use crate::error::{AnalyticsError, Result};
use crate::models::DeploymentRecord;
use crate::observability::{components, AnalyticsMetrics};
use crate::region;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Number of features per deployment
pub const FEATURE_COUNT: usize = 5;

const HOUR: usize = 0;
const EMISSIONS: usize = 2;
const CPU: usize = 3;

/// `[hour_of_day, region_code, emissions, cpu, memory]`
pub type FeatureVector = [f64; FEATURE_COUNT];

/// Feature vector for one record
pub fn features(record: &DeploymentRecord) -> FeatureVector {
    [
        (record.time % 24) as f64,
        region::cluster_code(&record.region),
        record.emissions,
        record.resources.cpu,
        record.resources.memory,
    ]
}

/// One labelled cluster
#[derive(Debug, Clone, Serialize)]
pub struct ClusterSummary {
    pub cluster_index: usize,
    pub pattern: PatternKind,
    pub avg_emissions: f64,
    /// Mean hour of day of the members
    pub avg_hour: f64,
    pub avg_cpu: f64,
    pub size: usize,
    pub centroid: FeatureVector,
    pub recommendations: Vec<String>,
}

/// Groups deployment records into behavioral clusters
pub struct PatternClusterer {
    config: ClusterConfig,
    metrics: AnalyticsMetrics,
}

impl PatternClusterer {
    pub fn new(config: ClusterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            metrics: AnalyticsMetrics::new(),
        })
    }

    /// Clusterer with `k` clusters and default iteration settings
    pub fn with_k(k: usize) -> Result<Self> {
        Self::new(ClusterConfig {
            k,
            ..ClusterConfig::default()
        })
    }

    /// Cluster with the configured seed, or an entropy seed when unset
    pub fn cluster(&self, records: &[DeploymentRecord]) -> Result<Vec<ClusterSummary>> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.cluster_with_rng(records, &mut rng)
    }

    /// Cluster using the supplied random source for centroid seeding
    ///
    /// Returns exactly `k` summaries; clusters that end up empty are
    /// labelled [`PatternKind::Unknown`].
    pub fn cluster_with_rng<R: Rng + ?Sized>(
        &self,
        records: &[DeploymentRecord],
        rng: &mut R,
    ) -> Result<Vec<ClusterSummary>> {
        if records.is_empty() {
            return Err(AnalyticsError::DegenerateInput(
                "cannot cluster an empty set of deployments".to_string(),
            ));
        }
        let started = Instant::now();

        let points: Vec<FeatureVector> = records.iter().map(features).collect();
        let result = kmeans::run(
            &points,
            self.config.k,
            self.config.max_iterations,
            self.config.tolerance,
            rng,
        );
        debug!(
            records = records.len(),
            k = self.config.k,
            iterations = result.iterations,
            converged = result.converged,
            "K-means finished"
        );

        let summaries: Vec<ClusterSummary> = result
            .centroids
            .iter()
            .enumerate()
            .map(|(index, centroid)| {
                let members: Vec<&FeatureVector> = points
                    .iter()
                    .zip(&result.assignments)
                    .filter(|(_, &a)| a == index)
                    .map(|(p, _)| p)
                    .collect();
                summarize(index, *centroid, &members)
            })
            .collect();

        info!(
            records = records.len(),
            clusters = summaries.len(),
            non_empty = summaries.iter().filter(|s| s.size > 0).count(),
            "Deployment patterns analyzed"
        );
        self.metrics.record_clustering(result.iterations);
        self.metrics.observe_run(components::CLUSTERER, started);
        Ok(summaries)
    }
}

fn feature_mean(members: &[&FeatureVector], feature: usize) -> f64 {
    if members.is_empty() {
        return 0.0;
    }
    members.iter().map(|p| p[feature]).sum::<f64>() / members.len() as f64
}

fn summarize(index: usize, centroid: FeatureVector, members: &[&FeatureVector]) -> ClusterSummary {
    let avg_hour = feature_mean(members, HOUR);
    let avg_emissions = feature_mean(members, EMISSIONS);
    let avg_cpu = feature_mean(members, CPU);

    let (pattern, recommendations) = if members.is_empty() {
        (PatternKind::Unknown, Vec::new())
    } else {
        (
            PatternKind::classify(avg_hour, avg_emissions),
            patterns::recommendations(avg_hour, avg_emissions, avg_cpu),
        )
    };

    ClusterSummary {
        cluster_index: index,
        pattern,
        avg_emissions,
        avg_hour,
        avg_cpu,
        size: members.len(),
        centroid,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Resources;

    fn record(time: u32, region: &str, emissions: f64, cpu: f64, memory: f64) -> DeploymentRecord {
        DeploymentRecord {
            time,
            region: region.to_string(),
            emissions,
            resources: Resources::new(cpu, memory),
        }
    }

    #[test]
    fn test_feature_extraction() {
        let f = features(&record(27, "eu-west-1", 120.0, 2.0, 4.0));
        assert_eq!(f, [3.0, 3.0, 120.0, 2.0, 4.0]);
        let unknown = features(&record(5, "sa-east-1", 1.0, 1.0, 1.0));
        assert_eq!(unknown[1], 0.0);
    }

    #[test]
    fn test_identical_records_single_cluster() {
        let records: Vec<_> = (0..8)
            .map(|_| record(10, "eu-north-1", 50.0, 1.0, 2.0))
            .collect();
        let clusterer = PatternClusterer::with_k(1).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let summaries = clusterer.cluster_with_rng(&records, &mut rng).unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].pattern, PatternKind::OptimizedBusinessHours);
        assert_eq!(summaries[0].avg_emissions, 50.0);
        assert_eq!(summaries[0].size, 8);
        assert!(summaries[0].recommendations.is_empty());
    }

    #[test]
    fn test_k_one_averages_all_records() {
        let records = vec![
            record(2, "us-east-1", 320.0, 3.0, 6.0),
            record(11, "us-west-2", 80.0, 1.0, 2.0),
            record(15, "eu-west-1", 150.0, 2.0, 4.0),
            record(23, "eu-north-1", 40.0, 0.5, 1.0),
        ];
        let clusterer = PatternClusterer::with_k(1).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        let summaries = clusterer.cluster_with_rng(&records, &mut rng).unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].size, 4);
        assert!((summaries[0].avg_emissions - 147.5).abs() < 1e-9);
    }

    #[test]
    fn test_more_clusters_than_distinct_points() {
        // Every centroid seeds on the same point, so all but the first stay empty
        let records: Vec<_> = (0..3)
            .map(|_| record(20, "us-east-1", 400.0, 3.0, 8.0))
            .collect();
        let clusterer = PatternClusterer::with_k(4).unwrap();
        let mut rng = StdRng::seed_from_u64(2);
        let summaries = clusterer.cluster_with_rng(&records, &mut rng).unwrap();

        assert_eq!(summaries.len(), 4);
        assert_eq!(summaries[0].size, 3);
        assert_eq!(summaries[0].pattern, PatternKind::HighEmissionOffHours);
        assert_eq!(summaries[0].recommendations.len(), 3);
        for empty in &summaries[1..] {
            assert_eq!(empty.size, 0);
            assert_eq!(empty.pattern, PatternKind::Unknown);
            assert!(empty.recommendations.is_empty());
            assert!(empty.centroid.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        let clusterer = PatternClusterer::new(ClusterConfig::default()).unwrap();
        assert!(matches!(
            clusterer.cluster(&[]),
            Err(AnalyticsError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_zero_k_rejected() {
        assert!(matches!(
            PatternClusterer::with_k(0),
            Err(AnalyticsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_every_record_assigned_once() {
        let records: Vec<_> = (0..40)
            .map(|i| {
                record(
                    (i * 5) % 24,
                    ["us-east-1", "us-west-2", "eu-west-1", "eu-north-1"][i as usize % 4],
                    100.0 + (i as f64 * 7.0) % 200.0,
                    1.0 + (i % 3) as f64,
                    2.0 + (i % 6) as f64,
                )
            })
            .collect();
        let clusterer = PatternClusterer::with_k(4).unwrap();
        let mut rng = StdRng::seed_from_u64(17);
        let summaries = clusterer.cluster_with_rng(&records, &mut rng).unwrap();
        assert_eq!(summaries.len(), 4);
        assert_eq!(summaries.iter().map(|s| s.size).sum::<usize>(), 40);
    }
}
