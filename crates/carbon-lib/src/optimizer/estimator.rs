//! Emission estimation for candidate configurations

use crate::models::Resources;
use crate::region;
use std::f64::consts::PI;

/// Emissions per hour for a unit allocation in a neutral region
pub const BASE_EMISSION: f64 = 100.0;

/// Depth of the solar dip in the time multiplier
const SOLAR_DIP: f64 = 0.3;

/// Estimates the emissions of one deployment configuration
pub trait EmissionEstimator: Send + Sync {
    fn estimate(&self, region: &str, hour: u32, resources: &Resources) -> f64;
}

/// `base × regionMultiplier × cpu × memory × timeMultiplier`
#[derive(Debug, Clone, Copy)]
pub struct HeuristicEstimator {
    pub base_emission: f64,
}

impl Default for HeuristicEstimator {
    fn default() -> Self {
        Self {
            base_emission: BASE_EMISSION,
        }
    }
}

impl EmissionEstimator for HeuristicEstimator {
    fn estimate(&self, region: &str, hour: u32, resources: &Resources) -> f64 {
        self.base_emission
            * region::multiplier(region)
            * resources.cpu
            * resources.memory
            * time_multiplier(hour)
    }
}

/// Lower during the simulated solar peak: `1 − 0.3·sin((hour − 12)·π/12)`
pub fn time_multiplier(hour: u32) -> f64 {
    let solar = ((hour as f64 - 12.0) * PI / 12.0).sin();
    1.0 - solar * SOLAR_DIP
}
