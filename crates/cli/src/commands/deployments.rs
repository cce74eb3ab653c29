//! Deployment commands: optimization, pattern analysis and prediction

use anyhow::Result;
use carbon_lib::advisor::{self, DeploymentAssessment};
use carbon_lib::{
    AnalyticsError, ClusterSummary, ConfigOptimizer, Constraints, DeploymentRecord, DeploymentSpec,
    EmissionRegressor, OptimalConfig, PatternClusterer, Prediction, RegressionModel,
    TrainingSample,
};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use super::Context;
use crate::input::load_json;
use crate::output::{
    color_confidence, color_status, format_emissions, print_heading, print_json, print_success,
    print_table, print_warning, OutputFormat,
};

/// Row for the cluster table
#[derive(Tabled)]
pub(crate) struct ClusterRow {
    #[tabled(rename = "Cluster")]
    cluster: usize,
    #[tabled(rename = "Pattern")]
    pattern: String,
    #[tabled(rename = "Size")]
    size: usize,
    #[tabled(rename = "Avg Hour")]
    avg_hour: String,
    #[tabled(rename = "Avg Emissions")]
    avg_emissions: String,
    #[tabled(rename = "Avg CPU")]
    avg_cpu: String,
}

impl From<&ClusterSummary> for ClusterRow {
    fn from(c: &ClusterSummary) -> Self {
        Self {
            cluster: c.cluster_index,
            pattern: c.pattern.to_string(),
            size: c.size,
            avg_hour: format!("{:.1}", c.avg_hour),
            avg_emissions: format_emissions(c.avg_emissions),
            avg_cpu: format!("{:.2}", c.avg_cpu),
        }
    }
}

/// Row for the coefficient table
#[derive(Tabled)]
struct CoefficientRow {
    #[tabled(rename = "Feature")]
    feature: &'static str,
    #[tabled(rename = "Coefficient")]
    coefficient: String,
}

#[derive(Serialize)]
struct PredictOutput {
    prediction: Prediction,
    model: RegressionModel,
    assessment: DeploymentAssessment,
}

pub(crate) fn print_optimal(result: &OptimalConfig) {
    println!("Region:                 {}", result.region.cyan());
    println!("Start hour:             {:02}:00", result.time);
    println!(
        "Resources:              {:.2} cpu, {:.2} memory",
        result.resources.cpu, result.resources.memory
    );
    println!(
        "{}     {}",
        "Expected emissions:".bold(),
        format_emissions(result.expected_emissions).green().bold()
    );
    println!(
        "Random baseline:        {}",
        format_emissions(result.initial_average_emissions)
    );
    let budget = if result.within_budget {
        "within budget"
    } else {
        "over budget"
    };
    println!("Budget:                 {}", color_status(budget));
}

pub(crate) fn print_clusters(clusters: &[ClusterSummary]) {
    let rows: Vec<ClusterRow> = clusters.iter().map(ClusterRow::from).collect();
    print_table(&rows, "No clusters");
    for c in clusters.iter().filter(|c| !c.recommendations.is_empty()) {
        println!();
        println!("{} {}", format!("Cluster {}", c.cluster_index).bold(), c.pattern);
        for r in &c.recommendations {
            println!("  • {}", r);
        }
    }
}

/// Run the genetic optimizer over a constraint file
pub fn optimize(ctx: &Context, path: &Path, seed: Option<u64>) -> Result<()> {
    let constraints: Constraints = load_json(path)?;
    let mut config = ctx.config.optimizer.clone();
    if seed.is_some() {
        config.seed = seed;
    }
    let result = ConfigOptimizer::new(config)?.optimize(&constraints)?;

    match ctx.format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            print_heading("Optimal Deployment Configuration");
            print_optimal(&result);
            if !result.within_budget {
                print_warning(&format!(
                    "No configuration found within the {} budget",
                    format_emissions(constraints.carbon_budget)
                ));
            }
        }
    }
    Ok(())
}

/// Cluster deployment records
pub fn patterns(ctx: &Context, path: &Path, k: Option<usize>, seed: Option<u64>) -> Result<()> {
    let records: Vec<DeploymentRecord> = load_json(path)?;
    let mut config = ctx.config.cluster.clone();
    if let Some(k) = k {
        config.k = k;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    let clusters = PatternClusterer::new(config)?.cluster(&records)?;

    match ctx.format {
        OutputFormat::Json => print_json(&clusters)?,
        OutputFormat::Table => {
            print_heading("Deployment Patterns");
            println!("Records:                {}", records.len());
            println!();
            print_clusters(&clusters);
        }
    }
    Ok(())
}

/// Train on a sample file and predict one deployment
pub fn predict(ctx: &Context, training_path: &Path, deployment_path: &Path) -> Result<()> {
    let samples: Vec<TrainingSample> = load_json(training_path)?;
    let spec: DeploymentSpec = load_json(deployment_path)?;

    let regressor = EmissionRegressor::new();
    regressor.train(&samples)?;
    let prediction = regressor.predict(&spec)?;
    let model = regressor
        .model()
        .ok_or(AnalyticsError::ModelNotTrained)?;
    let output = PredictOutput {
        prediction,
        model,
        assessment: advisor::assess(&spec),
    };

    match ctx.format {
        OutputFormat::Json => print_json(&output)?,
        OutputFormat::Table => {
            print_heading("Emission Prediction");
            print_success(&format!(
                "Model trained on {} samples (R² {:.3})",
                output.model.sample_count, output.model.r_squared
            ));
            println!();
            let rows: Vec<CoefficientRow> = output
                .model
                .named_coefficients()
                .map(|(feature, value)| CoefficientRow {
                    feature,
                    coefficient: format!("{:.4}", value),
                })
                .collect();
            print_table(&rows, "No coefficients");
            println!();

            println!(
                "{}             {}",
                "Prediction:".bold(),
                format_emissions(output.prediction.prediction).green().bold()
            );
            println!(
                "Confidence:             {}",
                color_confidence(output.prediction.confidence)
            );
            println!(
                "Table estimate:         {}",
                format_emissions(output.assessment.estimated_emissions)
            );
            println!(
                "Grid intensity:         {:.0} g CO₂/kWh ({})",
                output.assessment.carbon_intensity,
                color_status(output.assessment.intensity_level.as_str())
            );
            for s in &output.assessment.suggestions {
                println!("  [{}] {}", color_status(&s.impact.to_string()), s.message);
            }
        }
    }
    Ok(())
}
