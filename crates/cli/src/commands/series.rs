//! Series commands: forecasting and anomaly screening

use anyhow::Result;
use carbon_lib::{Anomaly, AnomalyDetector, DriftResult, TrendForecaster};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use super::Context;
use crate::input::load_json;
use crate::output::{
    color_status, print_heading, print_info, print_json, print_table, print_warning, OutputFormat,
};

/// Row for the anomalies table
#[derive(Tabled)]
pub(crate) struct AnomalyRow {
    #[tabled(rename = "Index")]
    index: usize,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Z-Score")]
    z_score: String,
    #[tabled(rename = "Severity")]
    severity: String,
}

impl From<&Anomaly> for AnomalyRow {
    fn from(a: &Anomaly) -> Self {
        Self {
            index: a.index,
            value: format!("{:.2}", a.value),
            z_score: format!("{:.2}", a.z_score),
            severity: color_status(a.severity.as_str()),
        }
    }
}

#[derive(Serialize)]
struct AnomalyReport {
    threshold: f64,
    samples: usize,
    anomalies: Vec<Anomaly>,
    drift: DriftResult,
}

/// Forecast the next intensity value
pub fn forecast(ctx: &Context, path: &Path, steps: usize) -> Result<()> {
    let series: Vec<f64> = load_json(path)?;
    let forecaster = TrendForecaster::new();
    let parts = forecaster.decompose(&series, steps);

    match ctx.format {
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct ForecastOutput {
                samples: usize,
                steps_ahead: usize,
                trend: f64,
                seasonal: f64,
                cyclical: f64,
                forecast: f64,
            }
            print_json(&ForecastOutput {
                samples: series.len(),
                steps_ahead: steps,
                trend: parts.trend,
                seasonal: parts.seasonal,
                cyclical: parts.cyclical,
                forecast: parts.total(),
            })?;
        }
        OutputFormat::Table => {
            print_heading("Carbon Intensity Forecast");
            if series.len() < 2 {
                print_warning("Fewer than two samples, trend term disabled");
            }
            println!("Samples:                {}", series.len());
            println!("Steps ahead:            {}", steps);
            println!();
            println!("Trend:                  {:.3}", parts.trend);
            println!("Seasonal:               {:.3}", parts.seasonal);
            println!("Cyclical:               {:.3}", parts.cyclical);
            println!(
                "{}               {}",
                "Forecast:".bold(),
                format!("{:.3}", parts.total()).green().bold()
            );
        }
    }
    Ok(())
}

/// Flag anomalies and drift
pub fn anomalies(ctx: &Context, path: &Path, threshold: Option<f64>) -> Result<()> {
    let series: Vec<f64> = load_json(path)?;
    let mut config = ctx.config.anomaly.clone();
    if let Some(threshold) = threshold {
        config.threshold = threshold;
    }
    config.validate()?;

    let detector = AnomalyDetector::with_config(config);
    let report = AnomalyReport {
        threshold: detector.threshold(),
        samples: series.len(),
        anomalies: detector.detect_anomalies(&series),
        drift: detector.detect_drift(&series),
    };

    match ctx.format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Table => {
            print_heading("Emission Anomalies");
            println!("Samples:                {}", report.samples);
            println!("Threshold:              {:.2}σ", report.threshold);
            println!();

            let rows: Vec<AnomalyRow> = report.anomalies.iter().map(AnomalyRow::from).collect();
            print_table(&rows, "No anomalies detected");
            println!();

            match report.drift.change_point {
                Some(index) => {
                    print_warning(&format!("Sustained drift detected at sample {}", index))
                }
                None => print_info("No sustained drift"),
            }
        }
    }
    Ok(())
}
