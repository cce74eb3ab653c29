//! Carbon Insights CLI
//!
//! A command-line front end for the carbon analytics core: forecasts,
//! anomaly screening, deployment optimization, pattern analysis and
//! emission prediction over JSON inputs.

mod commands;
mod input;
mod output;

use anyhow::Result;
use carbon_lib::{AnalyticsConfig, AnalyticsMetrics};
use clap::{Parser, Subcommand};
use commands::{deployments, report, series, Context};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Carbon Insights CLI
#[derive(Parser)]
#[command(name = "carbon-insights")]
#[command(author, version, about = "Carbon analytics for cloud deployments", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Configuration file (TOML, YAML or JSON); CARBON_* variables override it
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Dump Prometheus metrics to stderr after the command finishes
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Forecast the next carbon intensity value of a series
    Forecast {
        /// JSON array of historical intensity samples
        #[arg(long, short)]
        series: PathBuf,

        /// Steps past the last sample
        #[arg(long, default_value_t = 6)]
        steps: usize,
    },

    /// Flag anomalous samples and drift in an emission series
    Anomalies {
        /// JSON array of emission samples
        #[arg(long, short)]
        series: PathBuf,

        /// Z-score threshold (overrides configuration)
        #[arg(long, short)]
        threshold: Option<f64>,
    },

    /// Search for the lowest-emission deployment configuration
    Optimize {
        /// JSON constraints: regions, time_windows, resource_limits, carbon_budget
        #[arg(long)]
        constraints: PathBuf,

        /// Random seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Cluster deployment records into behavioral patterns
    Patterns {
        /// JSON array of deployment records
        #[arg(long, short)]
        records: PathBuf,

        /// Number of clusters
        #[arg(short, long)]
        k: Option<usize>,

        /// Random seed for centroid seeding
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Train the emission model and predict one deployment
    Predict {
        /// JSON array of training samples
        #[arg(long)]
        training: PathBuf,

        /// JSON deployment description
        #[arg(long)]
        deployment: PathBuf,
    },

    /// Run every analysis and print a combined report
    Report {
        /// JSON array of deployment records
        #[arg(long, short)]
        records: PathBuf,

        /// JSON array of emission samples
        #[arg(long, short)]
        series: PathBuf,

        /// JSON optimizer constraints
        #[arg(long)]
        constraints: Option<PathBuf>,

        /// JSON object mapping region codes to intensity histories
        #[arg(long)]
        intensity: Option<PathBuf>,

        /// JSON array of training samples (regression is skipped when omitted)
        #[arg(long)]
        training: Option<PathBuf>,

        /// Random seed for the optimizer and clustering
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = AnalyticsConfig::load(cli.config.as_deref())?;
    let ctx = Context {
        config,
        format: cli.format,
    };

    match cli.command {
        Commands::Forecast { series, steps } => series::forecast(&ctx, &series, steps)?,
        Commands::Anomalies { series, threshold } => {
            series::anomalies(&ctx, &series, threshold)?
        }
        Commands::Optimize { constraints, seed } => {
            deployments::optimize(&ctx, &constraints, seed)?
        }
        Commands::Patterns { records, k, seed } => {
            deployments::patterns(&ctx, &records, k, seed)?
        }
        Commands::Predict {
            training,
            deployment,
        } => deployments::predict(&ctx, &training, &deployment)?,
        Commands::Report {
            records,
            series,
            constraints,
            intensity,
            training,
            seed,
        } => report::run(
            &ctx,
            report::ReportInputs {
                records,
                series,
                constraints,
                intensity,
                training,
            },
            seed,
        )?,
    }

    if cli.metrics {
        eprint!("{}", AnalyticsMetrics::new().gather_text());
    }
    Ok(())
}
