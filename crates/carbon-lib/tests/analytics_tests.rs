//! Integration tests for the analytics components through the public API

use carbon_lib::{
    config::{AnomalyConfig, OptimizerConfig},
    optimizer::Individual,
    AnalyticsError, AnomalyDetector, ConfigOptimizer, Constraints, DeploymentRecord,
    DeploymentSpec, EmissionRegressor, FixedClock, PatternClusterer, PatternKind, Resources,
    Severity, TrainingSample, TrendForecaster,
};
use chrono::{TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const REGIONS: [&str; 4] = ["us-east-1", "us-west-2", "eu-north-1", "eu-west-1"];

fn random_series(rng: &mut StdRng, len: usize) -> Vec<f64> {
    (0..len).map(|_| 150.0 + rng.gen::<f64>() * 100.0).collect()
}

fn random_records(rng: &mut StdRng, len: usize) -> Vec<DeploymentRecord> {
    (0..len)
        .map(|_| DeploymentRecord {
            time: rng.gen_range(0..24),
            region: REGIONS[rng.gen_range(0..REGIONS.len())].to_string(),
            emissions: 100.0 + rng.gen::<f64>() * 200.0,
            resources: Resources::new(1.0 + rng.gen::<f64>() * 3.0, 2.0 + rng.gen::<f64>() * 6.0),
        })
        .collect()
}

fn constraints() -> Constraints {
    Constraints {
        regions: REGIONS.iter().map(|r| r.to_string()).collect(),
        time_windows: (0..24).collect(),
        resource_limits: Resources::new(4.0, 8.0),
        carbon_budget: 500.0,
    }
}

#[test]
fn test_anomaly_flags_bounded_and_above_threshold() {
    let detector = AnomalyDetector::new(2.0);
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..20 {
        let mut series = random_series(&mut rng, 100);
        series[rng.gen_range(0..100)] = 2000.0;
        let anomalies = detector.detect_anomalies(&series);
        assert!(anomalies.len() <= series.len());
        assert!(!anomalies.is_empty());
        for a in &anomalies {
            assert!(a.z_score > detector.threshold());
            assert_eq!(series[a.index], a.value);
        }
    }
}

#[test]
fn test_infinite_threshold_flags_nothing() {
    let detector = AnomalyDetector::new(f64::INFINITY);
    let series = [1.0, 2.0, 3.0, 1000.0, -500.0];
    assert!(detector.detect_anomalies(&series).is_empty());
}

#[test]
fn test_five_point_spike_reaches_bound() {
    // With n samples the largest attainable Z-score is sqrt(n - 1)
    let series = [100.0, 100.0, 100.0, 100.0, 1000.0];
    assert!(AnomalyDetector::new(2.5).detect_anomalies(&series).is_empty());

    let lenient = AnomalyDetector::with_config(AnomalyConfig {
        threshold: 1.5,
        ..AnomalyConfig::default()
    });
    let anomalies = lenient.detect_anomalies(&series);
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].index, 4);
    assert_eq!(anomalies[0].z_score, 2.0);
    assert_eq!(anomalies[0].severity, Severity::Warning);
}

#[test]
fn test_isolated_spike_is_critical() {
    let mut series = vec![100.0; 20];
    series.push(1000.0);
    let anomalies = AnomalyDetector::new(2.5).detect_anomalies(&series);
    assert_eq!(anomalies.len(), 1);
    assert_eq!(anomalies[0].value, 1000.0);
    assert_eq!(anomalies[0].severity, Severity::Critical);
}

#[test]
fn test_drift_detected_after_level_shift() {
    let mut series = vec![100.0, 102.0, 98.0, 101.0, 99.0, 100.0, 103.0, 97.0, 100.0, 101.0];
    series.extend(std::iter::repeat(180.0).take(15));
    let detector = AnomalyDetector::default();
    let drift = detector.detect_drift(&series);
    assert!(drift.is_drifting);
    // The alarm fires on the low side, while the early samples sit below the overall mean
    assert!(drift.change_point.unwrap() < 10);

    let alternating: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 99.0 } else { 101.0 }).collect();
    assert!(!detector.detect_drift(&alternating).is_drifting);
}

#[test]
fn test_regressor_recovers_linear_relation() {
    let mut rng = StdRng::seed_from_u64(21);
    let samples: Vec<TrainingSample> = (0..40)
        .map(|_| {
            let cpu = 0.5 + rng.gen::<f64>() * 3.5;
            let memory = 1.0 + rng.gen::<f64>() * 7.0;
            TrainingSample {
                region: REGIONS[rng.gen_range(0..REGIONS.len())].to_string(),
                time: rng.gen_range(0..24),
                cpu,
                memory,
                duration: 0.5 + rng.gen::<f64>() * 3.0,
                emissions: 2.0 * cpu + 3.0 * memory,
            }
        })
        .collect();

    let regressor = EmissionRegressor::new();
    regressor.train(&samples).unwrap();
    let coefficients = regressor.model().unwrap().coefficients;
    assert!((coefficients[3] - 2.0).abs() < 1e-6);
    assert!((coefficients[4] - 3.0).abs() < 1e-6);

    let p = regressor
        .predict(&DeploymentSpec {
            region: "eu-west-1".to_string(),
            time: 9,
            cpu: 2.0,
            memory: 4.0,
            duration: 1.0,
        })
        .unwrap();
    assert!((p.prediction - 16.0).abs() < 1e-6);
    // 1 - |16 - 150| / 300
    assert!((p.confidence - (1.0 - 134.0 / 300.0)).abs() < 1e-6);
}

#[test]
fn test_regressor_untrained_and_singular() {
    let regressor = EmissionRegressor::new();
    let spec = DeploymentSpec {
        region: "us-east-1".to_string(),
        time: 1,
        cpu: 1.0,
        memory: 1.0,
        duration: 1.0,
    };
    assert!(matches!(regressor.predict(&spec), Err(AnalyticsError::ModelNotTrained)));

    let constant: Vec<TrainingSample> = (0..10)
        .map(|_| TrainingSample {
            region: spec.region.clone(),
            time: 1,
            cpu: 1.0,
            memory: 1.0,
            duration: 1.0,
            emissions: 70.0,
        })
        .collect();
    assert!(matches!(
        regressor.train(&constant),
        Err(AnalyticsError::SingularMatrix { .. })
    ));
}

#[test]
fn test_single_cluster_holds_every_record() {
    let mut rng = StdRng::seed_from_u64(8);
    let records = random_records(&mut rng, 50);
    let expected = records.iter().map(|r| r.emissions).sum::<f64>() / 50.0;

    let summaries = PatternClusterer::with_k(1)
        .unwrap()
        .cluster_with_rng(&records, &mut rng)
        .unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].size, 50);
    assert!((summaries[0].avg_emissions - expected).abs() < 1e-9);
}

#[test]
fn test_identical_business_hour_records() {
    let records: Vec<DeploymentRecord> = (0..8)
        .map(|_| DeploymentRecord {
            time: 10,
            region: "us-west-2".to_string(),
            emissions: 50.0,
            resources: Resources::new(1.0, 2.0),
        })
        .collect();
    let mut rng = StdRng::seed_from_u64(0);
    let summaries = PatternClusterer::with_k(1)
        .unwrap()
        .cluster_with_rng(&records, &mut rng)
        .unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].pattern, PatternKind::OptimizedBusinessHours);
    assert_eq!(summaries[0].pattern.label(), "Optimized Business Hours");
    assert_eq!(summaries[0].avg_emissions, 50.0);
}

#[test]
fn test_optimizer_beats_random_configuration_on_average() {
    let c = constraints();
    let mut optimized = 0.0;
    let mut random = 0.0;
    let runs = 10;

    for seed in 0..runs {
        let optimizer = ConfigOptimizer::new(OptimizerConfig {
            generations: 40,
            seed: Some(seed),
            ..OptimizerConfig::default()
        })
        .unwrap();
        optimized += optimizer.optimize(&c).unwrap().expected_emissions;

        let mut rng = StdRng::seed_from_u64(1000 + seed);
        let individual = Individual {
            region: c.regions[rng.gen_range(0..c.regions.len())].clone(),
            time: c.time_windows[rng.gen_range(0..c.time_windows.len())],
            resources: Resources::new(
                c.resource_limits.cpu * (1.0 - rng.gen::<f64>()),
                c.resource_limits.memory * (1.0 - rng.gen::<f64>()),
            ),
        };
        random += optimizer.expected_emissions(&individual);
    }

    assert!(
        optimized / runs as f64 <= random / runs as f64,
        "optimized {} vs random {}",
        optimized,
        random
    );
}

#[test]
fn test_forecast_idempotent_under_fixed_clock() {
    let clock = FixedClock::utc(Utc.with_ymd_and_hms(2024, 11, 20, 7, 30, 0).unwrap());
    let forecaster = TrendForecaster::with_clock(clock);
    let mut rng = StdRng::seed_from_u64(3);
    let series = random_series(&mut rng, 72);

    let first = forecaster.forecast(&series, 6);
    assert!(first.is_finite());
    assert_eq!(first, forecaster.forecast(&series, 6));
    assert_eq!(
        forecaster.decompose(&series, 6).total(),
        forecaster.forecast(&series, 6)
    );
}
