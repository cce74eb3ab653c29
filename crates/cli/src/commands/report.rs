//! Combined insights report

use anyhow::Result;
use carbon_lib::insights::{InsightsEngine, InsightsInput, InsightsReport, Outcome};
use carbon_lib::Constraints;
use colored::Colorize;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tabled::Tabled;

use super::deployments::{print_clusters, print_optimal};
use super::series::AnomalyRow;
use super::Context;
use crate::input::load_json;
use crate::output::{
    color_status, print_error, print_heading, print_info, print_json, print_table, print_warning,
    OutputFormat,
};

/// Input files for one report run
pub struct ReportInputs {
    pub records: PathBuf,
    pub series: PathBuf,
    pub constraints: Option<PathBuf>,
    pub intensity: Option<PathBuf>,
    pub training: Option<PathBuf>,
}

impl ReportInputs {
    fn load(&self) -> Result<InsightsInput> {
        Ok(InsightsInput {
            records: load_json(&self.records)?,
            emissions: load_json(&self.series)?,
            constraints: self
                .constraints
                .as_deref()
                .map(load_json::<Constraints>)
                .transpose()?,
            intensity_history: match &self.intensity {
                Some(path) => load_json(path)?,
                None => BTreeMap::new(),
            },
            training: match &self.training {
                Some(path) => load_json(path)?,
                None => Vec::new(),
            },
        })
    }
}

/// Row for the forecast table
#[derive(Tabled)]
struct ForecastRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Current")]
    current: String,
    #[tabled(rename = "Predicted")]
    predicted: String,
}

/// Print a section heading, reporting skipped or failed outcomes
fn section<'a, T>(title: &str, outcome: &'a Outcome<T>) -> Option<&'a T> {
    println!();
    println!("{}", title.bold());
    println!("{}", "-".repeat(50));
    match outcome {
        Outcome::Completed(value) => Some(value),
        Outcome::Skipped { reason } => {
            print_info(&format!("{} ({})", color_status("skipped"), reason));
            None
        }
        Outcome::Failed { reason } => {
            print_error(&format!("{}: {}", color_status("failed"), reason));
            None
        }
    }
}

fn print_report(report: &InsightsReport) {
    print_heading("Carbon Insights Report");
    println!(
        "Generated:              {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    println!();
    println!("{}", "Intensity Forecasts".bold());
    println!("{}", "-".repeat(50));
    let rows: Vec<ForecastRow> = report
        .forecasts
        .iter()
        .map(|f| ForecastRow {
            region: f.region.clone(),
            current: f
                .current
                .map(|v| format!("{:.1}", v))
                .unwrap_or_else(|| "-".to_string()),
            predicted: format!("{:.1}", f.predicted),
        })
        .collect();
    print_table(&rows, "No intensity histories supplied");

    println!();
    println!("{}", "Anomalies".bold());
    println!("{}", "-".repeat(50));
    println!("Flagged:                {}", report.anomaly_count);
    let rows: Vec<AnomalyRow> = report.top_anomalies.iter().map(AnomalyRow::from).collect();
    print_table(&rows, "No anomalies detected");
    if let Some(index) = report.drift.change_point {
        print_warning(&format!("Sustained drift detected at sample {}", index));
    }

    if let Some(best) = section("Optimal Configuration", &report.optimization) {
        print_optimal(best);
    }
    if let Some(clusters) = section("Deployment Patterns", &report.patterns) {
        print_clusters(clusters);
    }
    if let Some(model) = section("Emission Model", &report.regression) {
        println!("Samples:                {}", model.sample_count);
        println!("R²:                     {:.3}", model.r_squared);
        for (feature, value) in model.named_coefficients() {
            println!("  {:<10} {:>12.4}", feature, value);
        }
    }
}

/// Run the combined analysis
pub fn run(ctx: &Context, inputs: ReportInputs, seed: Option<u64>) -> Result<()> {
    let input = inputs.load()?;
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let engine = InsightsEngine::new(ctx.config.clone());
    let report = engine.run(&input, &mut rng);

    match ctx.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => print_report(&report),
    }
    Ok(())
}
