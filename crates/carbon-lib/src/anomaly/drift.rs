//! CUSUM drift detection
//!
//! Tracks positive and negative cumulative sums of deviations from the
//! series mean, each reduced by a slack `k`. Drift is reported at the first
//! index where either sum's magnitude exceeds the decision interval `h`.

use super::series_moments;
use serde::Serialize;
use tracing::debug;

/// Slack as a multiple of the standard deviation
const DEFAULT_SLACK_SIGMAS: f64 = 0.5;

/// Decision interval as a multiple of the standard deviation
const DEFAULT_DECISION_SIGMAS: f64 = 5.0;

/// CUSUM parameters; unset values derive from the series' standard deviation
#[derive(Debug, Clone, Copy, Default)]
pub struct CusumParams {
    /// Slack `k` subtracted from every deviation
    pub slack: Option<f64>,
    /// Decision interval `h`
    pub decision_interval: Option<f64>,
}

/// Outcome of a drift scan
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DriftResult {
    pub is_drifting: bool,
    /// First index at which a cumulative sum crossed the decision interval
    pub change_point: Option<usize>,
}

impl DriftResult {
    pub fn stable() -> Self {
        Self {
            is_drifting: false,
            change_point: None,
        }
    }
}

pub(super) fn detect(series: &[f64], params: CusumParams) -> DriftResult {
    let Some((mean, std_dev)) = series_moments(series) else {
        return DriftResult::stable();
    };
    let slack = params.slack.unwrap_or(std_dev * DEFAULT_SLACK_SIGMAS);
    let decision = params
        .decision_interval
        .unwrap_or(std_dev * DEFAULT_DECISION_SIGMAS);

    let mut cusum_pos = 0.0_f64;
    let mut cusum_neg = 0.0_f64;
    for (i, value) in series.iter().enumerate() {
        let deviation = value - mean;
        cusum_pos = (cusum_pos + deviation - slack).max(0.0);
        cusum_neg = (cusum_neg + deviation + slack).min(0.0);

        if cusum_pos.abs() > decision || cusum_neg.abs() > decision {
            debug!(
                change_point = i,
                cusum_pos = cusum_pos,
                cusum_neg = cusum_neg,
                decision_interval = decision,
                "CUSUM decision interval crossed"
            );
            return DriftResult {
                is_drifting: true,
                change_point: Some(i),
            };
        }
    }
    DriftResult::stable()
}
