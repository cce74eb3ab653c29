//! Subcommand implementations

pub mod deployments;
pub mod report;
pub mod series;

use crate::output::OutputFormat;
use carbon_lib::AnalyticsConfig;

/// Settings shared by every subcommand
pub struct Context {
    pub config: AnalyticsConfig,
    pub format: OutputFormat,
}
