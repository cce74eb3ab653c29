//! Deployment advisor
//!
//! Table-driven emission estimate and improvement suggestions for a single
//! planned deployment. Unlike the regressor this needs no training data.

use crate::models::DeploymentSpec;
use crate::region::{self, IntensityLevel, RegionProfile};
use serde::Serialize;
use std::fmt;

/// Emissions of one unit-sized deployment hour in a multiplier-1.0 region, in g CO₂
pub const BASE_HOURLY_EMISSION: f64 = 50.0;

/// CPU allocation above which right-sizing is suggested
const CPU_SUGGESTION_THRESHOLD: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Region,
    Resources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub message: String,
    pub impact: Impact,
}

/// Estimate and suggestions for one deployment
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentAssessment {
    pub region: String,
    pub estimated_emissions: f64,
    /// Grid intensity baseline of the region in g CO₂/kWh
    pub carbon_intensity: f64,
    pub intensity_level: IntensityLevel,
    pub suggestions: Vec<Suggestion>,
}

fn or_unit(value: f64) -> f64 {
    if value > 0.0 {
        value
    } else {
        1.0
    }
}

/// `50 × multiplier × cpu × memory × duration`, non-positive factors read as 1
pub fn estimate_deployment_emissions(spec: &DeploymentSpec) -> f64 {
    BASE_HOURLY_EMISSION
        * region::multiplier(&spec.region)
        * or_unit(spec.cpu)
        * or_unit(spec.memory)
        * or_unit(spec.duration)
}

/// Known region with the lowest grid intensity
pub fn lowest_intensity_region() -> &'static RegionProfile {
    region::known_regions()
        .iter()
        .min_by(|a, b| a.carbon_intensity.total_cmp(&b.carbon_intensity))
        .unwrap_or(&region::UNKNOWN_REGION)
}

/// Candidate with the lowest carbon multiplier
///
/// Unknown codes weigh 1.0. Returns `None` for an empty candidate list.
pub fn greenest_region<'a>(candidates: &'a [String]) -> Option<&'a str> {
    candidates
        .iter()
        .min_by(|a, b| region::multiplier(a).total_cmp(&region::multiplier(b)))
        .map(String::as_str)
}

pub fn suggestions(spec: &DeploymentSpec) -> Vec<Suggestion> {
    let mut out = Vec::new();
    let current = region::profile(&spec.region);

    if current.intensity_level == IntensityLevel::High {
        let greenest = lowest_intensity_region();
        let reduction = (1.0 - greenest.carbon_intensity / current.carbon_intensity) * 100.0;
        out.push(Suggestion {
            kind: SuggestionKind::Region,
            message: format!(
                "Consider deploying to {} for {:.0}% lower emissions",
                greenest.code, reduction
            ),
            impact: Impact::High,
        });
    }

    if or_unit(spec.cpu) > CPU_SUGGESTION_THRESHOLD {
        out.push(Suggestion {
            kind: SuggestionKind::Resources,
            message: "CPU allocation seems high, consider right-sizing".to_string(),
            impact: Impact::Medium,
        });
    }
    out
}

pub fn assess(spec: &DeploymentSpec) -> DeploymentAssessment {
    let profile = region::profile(&spec.region);
    DeploymentAssessment {
        region: spec.region.clone(),
        estimated_emissions: estimate_deployment_emissions(spec),
        carbon_intensity: profile.carbon_intensity,
        intensity_level: profile.intensity_level,
        suggestions: suggestions(spec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(region: &str, cpu: f64, memory: f64, duration: f64) -> DeploymentSpec {
        DeploymentSpec {
            region: region.to_string(),
            time: 12,
            cpu,
            memory,
            duration,
        }
    }

    #[test]
    fn test_estimate_uses_region_multiplier() {
        let e = estimate_deployment_emissions(&spec("us-east-1", 2.0, 4.0, 1.5));
        assert!((e - 50.0 * 1.4 * 2.0 * 4.0 * 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_defaults_missing_factors() {
        assert_eq!(estimate_deployment_emissions(&spec("eu-west-1", 0.0, -1.0, 0.0)), 50.0);
        assert_eq!(estimate_deployment_emissions(&spec("nowhere-1", 1.0, 1.0, 1.0)), 50.0);
    }

    #[test]
    fn test_high_intensity_region_suggests_greenest() {
        let s = suggestions(&spec("us-east-1", 1.0, 1.0, 1.0));
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].kind, SuggestionKind::Region);
        assert_eq!(s[0].impact, Impact::High);
        // 1 - 95/420 = 77.4%
        assert_eq!(s[0].message, "Consider deploying to eu-north-1 for 77% lower emissions");
    }

    #[test]
    fn test_cpu_suggestion() {
        let s = suggestions(&spec("eu-north-1", 4.0, 2.0, 1.0));
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].kind, SuggestionKind::Resources);
        assert_eq!(s[0].impact, Impact::Medium);
        assert!(suggestions(&spec("eu-north-1", 2.0, 2.0, 1.0)).is_empty());
    }

    #[test]
    fn test_greenest_region() {
        let candidates = vec![
            "us-east-1".to_string(),
            "eu-north-1".to_string(),
            "us-west-2".to_string(),
        ];
        assert_eq!(greenest_region(&candidates), Some("eu-north-1"));
        assert_eq!(greenest_region(&[]), None);
    }

    #[test]
    fn test_assessment_carries_profile() {
        let a = assess(&spec("ap-southeast-1", 1.0, 2.0, 1.0));
        assert_eq!(a.carbon_intensity, 350.0);
        assert_eq!(a.intensity_level, IntensityLevel::MediumHigh);
        assert!(a.suggestions.is_empty());
        assert!((a.estimated_emissions - 120.0).abs() < 1e-9);
    }
}
