//! Core data models shared by the analytics components

use serde::{Deserialize, Serialize};

/// CPU and memory allocation of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    pub cpu: f64,
    pub memory: f64,
}

impl Resources {
    pub fn new(cpu: f64, memory: f64) -> Self {
        Self { cpu, memory }
    }
}

/// Observed deployment, as reported by the monitoring side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    /// Hour of day (0-23); larger values are reduced modulo 24
    pub time: u32,
    pub region: String,
    /// Measured emissions in g CO₂
    pub emissions: f64,
    pub resources: Resources,
}

/// Deployment description used as input to emission prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentSpec {
    pub region: String,
    pub time: u32,
    pub cpu: f64,
    pub memory: f64,
    /// Run time in hours
    pub duration: f64,
}

/// Labelled regression sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub region: String,
    pub time: u32,
    pub cpu: f64,
    pub memory: f64,
    pub duration: f64,
    pub emissions: f64,
}

impl TrainingSample {
    /// The feature half of the sample
    pub fn spec(&self) -> DeploymentSpec {
        DeploymentSpec {
            region: self.region.clone(),
            time: self.time,
            cpu: self.cpu,
            memory: self.memory,
            duration: self.duration,
        }
    }
}
