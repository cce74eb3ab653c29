//! Rule-based labelling of deployment clusters

use serde::Serialize;
use std::fmt;

/// Average emissions above which a cluster counts as high-emission
pub const EMISSION_THRESHOLD: f64 = 200.0;

/// Average CPU above which right-sizing is recommended
pub const CPU_THRESHOLD: f64 = 2.0;

const BUSINESS_START_HOUR: f64 = 9.0;
const BUSINESS_END_HOUR: f64 = 17.0;

/// Hours at or beyond which a cluster is considered outside the solar window
const EVENING_HOUR: f64 = 18.0;
const EARLY_MORNING_HOUR: f64 = 6.0;

pub const RECOMMEND_REGION: &str = "Consider deploying to lower carbon intensity regions";
pub const RECOMMEND_SOLAR_WINDOW: &str =
    "Schedule deployments during renewable energy peak hours (10 AM - 4 PM)";
pub const RECOMMEND_RIGHT_SIZE: &str = "Optimize resource allocation - CPU usage appears high";

/// Behavioral category of a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatternKind {
    #[serde(rename = "High-Emission Business Hours")]
    HighEmissionBusinessHours,
    #[serde(rename = "Optimized Business Hours")]
    OptimizedBusinessHours,
    #[serde(rename = "High-Emission Off-Hours")]
    HighEmissionOffHours,
    #[serde(rename = "Green Off-Hours")]
    GreenOffHours,
    Unknown,
}

impl PatternKind {
    pub fn label(&self) -> &'static str {
        match self {
            PatternKind::HighEmissionBusinessHours => "High-Emission Business Hours",
            PatternKind::OptimizedBusinessHours => "Optimized Business Hours",
            PatternKind::HighEmissionOffHours => "High-Emission Off-Hours",
            PatternKind::GreenOffHours => "Green Off-Hours",
            PatternKind::Unknown => "Unknown",
        }
    }

    /// Classify by representative hour and average emissions
    pub fn classify(avg_hour: f64, avg_emissions: f64) -> Self {
        let business = (BUSINESS_START_HOUR..=BUSINESS_END_HOUR).contains(&avg_hour);
        let high = avg_emissions > EMISSION_THRESHOLD;
        match (business, high) {
            (true, true) => PatternKind::HighEmissionBusinessHours,
            (true, false) => PatternKind::OptimizedBusinessHours,
            (false, true) => PatternKind::HighEmissionOffHours,
            (false, false) => PatternKind::GreenOffHours,
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub fn recommendations(avg_hour: f64, avg_emissions: f64, avg_cpu: f64) -> Vec<String> {
    let mut out = Vec::new();
    if avg_emissions > EMISSION_THRESHOLD {
        out.push(RECOMMEND_REGION.to_string());
    }
    if avg_hour >= EVENING_HOUR || avg_hour <= EARLY_MORNING_HOUR {
        out.push(RECOMMEND_SOLAR_WINDOW.to_string());
    }
    if avg_cpu > CPU_THRESHOLD {
        out.push(RECOMMEND_RIGHT_SIZE.to_string());
    }
    out
}
