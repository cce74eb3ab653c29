//! Region profiles
//!
//! Fixed, process-wide lookup table of cloud regions with their carbon
//! multiplier, grid intensity baseline and categorical clustering code.
//! Lookups never fail: unknown codes resolve to [`UNKNOWN_REGION`].

use serde::Serialize;
use std::fmt;

/// Qualitative grid carbon intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntensityLevel {
    Low,
    Medium,
    MediumHigh,
    High,
}

impl IntensityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntensityLevel::Low => "low",
            IntensityLevel::Medium => "medium",
            IntensityLevel::MediumHigh => "medium-high",
            IntensityLevel::High => "high",
        }
    }
}

impl fmt::Display for IntensityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of a region
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionProfile {
    pub code: &'static str,
    pub name: &'static str,
    /// Relative emission weight used by regression and optimization
    pub multiplier: f64,
    /// Grid intensity baseline in g CO₂/kWh
    pub carbon_intensity: f64,
    pub intensity_level: IntensityLevel,
    /// Categorical encoding used as a clustering feature (0 = unencoded)
    pub cluster_code: f64,
}

/// Profile returned for codes that are not in the table
pub const UNKNOWN_REGION: RegionProfile = RegionProfile {
    code: "unknown",
    name: "Unknown",
    multiplier: 1.0,
    carbon_intensity: 300.0,
    intensity_level: IntensityLevel::Medium,
    cluster_code: 0.0,
};

const REGIONS: [RegionProfile; 6] = [
    RegionProfile {
        code: "us-east-1",
        name: "US East (Virginia)",
        multiplier: 1.4,
        carbon_intensity: 420.0,
        intensity_level: IntensityLevel::High,
        cluster_code: 1.0,
    },
    RegionProfile {
        code: "us-west-2",
        name: "US West (Oregon)",
        multiplier: 0.6,
        carbon_intensity: 180.0,
        intensity_level: IntensityLevel::Low,
        cluster_code: 2.0,
    },
    RegionProfile {
        code: "eu-west-1",
        name: "EU West (Ireland)",
        multiplier: 1.0,
        carbon_intensity: 280.0,
        intensity_level: IntensityLevel::Medium,
        cluster_code: 3.0,
    },
    RegionProfile {
        code: "eu-north-1",
        name: "EU North (Sweden)",
        multiplier: 0.3,
        carbon_intensity: 95.0,
        intensity_level: IntensityLevel::Low,
        cluster_code: 4.0,
    },
    RegionProfile {
        code: "ap-southeast-1",
        name: "Asia Pacific (Singapore)",
        multiplier: 1.2,
        carbon_intensity: 350.0,
        intensity_level: IntensityLevel::MediumHigh,
        cluster_code: 0.0,
    },
    RegionProfile {
        code: "ap-northeast-1",
        name: "Asia Pacific (Tokyo)",
        multiplier: 1.1,
        carbon_intensity: 320.0,
        intensity_level: IntensityLevel::Medium,
        cluster_code: 0.0,
    },
];

/// All known regions
pub fn known_regions() -> &'static [RegionProfile] {
    &REGIONS
}

/// Look up a region profile, falling back to [`UNKNOWN_REGION`]
pub fn profile(code: &str) -> &'static RegionProfile {
    REGIONS
        .iter()
        .find(|r| r.code == code)
        .unwrap_or(&UNKNOWN_REGION)
}

pub fn is_known(code: &str) -> bool {
    REGIONS.iter().any(|r| r.code == code)
}

/// Carbon multiplier for a region
pub fn multiplier(code: &str) -> f64 {
    profile(code).multiplier
}

/// Categorical clustering code for a region
pub fn cluster_code(code: &str) -> f64 {
    profile(code).cluster_code
}
