//! Carbon intensity forecasting
//!
//! Decomposes a historical intensity series into three additive terms:
//! - trend: least-squares line over sample positions, projected to the horizon
//! - seasonal: solar-noon sinusoid plus a weekday/weekend step
//! - cyclical: cosine correlation against daily, weekly and yearly periods,
//!   phased by the current instant
//!
//! The seasonal and cyclical terms read the wall clock through [`Clock`] so
//! callers can pin time in tests. The seasonal term uses the clock's local
//! hour and weekday.

use crate::observability::{components, AnalyticsMetrics};
use crate::stats::linear_fit;
use chrono::{DateTime, Datelike, FixedOffset, Local, Timelike, Utc, Weekday};
use serde::Serialize;
use std::f64::consts::PI;
use std::time::Instant;
use tracing::{debug, warn};

/// Amplitude of the solar-noon sinusoid
const SOLAR_WEIGHT: f64 = 0.3;

/// Seasonal step for weekdays (higher demand)
const WEEKDAY_ADJUSTMENT: f64 = 0.2;

/// Seasonal step for weekends
const WEEKEND_ADJUSTMENT: f64 = -0.1;

/// Candidate cycle lengths in hours: daily, weekly, yearly
pub const CYCLE_PERIODS_HOURS: [f64; 3] = [24.0, 168.0, 8760.0];

/// Scale applied to the summed cyclical correlations
const CYCLICAL_WEIGHT: f64 = 0.1;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Source of the current instant, in the caller's local offset
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the system time zone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().into()
    }
}

/// Clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Pin to a UTC instant
    pub fn utc(at: DateTime<Utc>) -> Self {
        Self(at.into())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}

/// The three additive forecast terms
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForecastComponents {
    pub trend: f64,
    pub seasonal: f64,
    pub cyclical: f64,
}

impl ForecastComponents {
    pub fn total(&self) -> f64 {
        self.trend + self.seasonal + self.cyclical
    }
}

/// Forecasts the next value of an intensity series
pub struct TrendForecaster<C: Clock = SystemClock> {
    clock: C,
    metrics: AnalyticsMetrics,
}

impl TrendForecaster<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for TrendForecaster<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> TrendForecaster<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            metrics: AnalyticsMetrics::new(),
        }
    }

    /// Forecast the series value `steps_ahead` positions past its last sample
    pub fn forecast(&self, series: &[f64], steps_ahead: usize) -> f64 {
        self.decompose(series, steps_ahead).total()
    }

    /// Forecast, keeping the individual terms
    pub fn decompose(&self, series: &[f64], steps_ahead: usize) -> ForecastComponents {
        let started = Instant::now();
        if series.is_empty() {
            warn!("Forecasting from an empty series, trend and cyclical terms disabled");
        }

        let now = self.clock.now();
        let parts = ForecastComponents {
            trend: trend_component(series, steps_ahead),
            seasonal: seasonal_component(now),
            cyclical: cyclical_component(series, now),
        };

        debug!(
            samples = series.len(),
            steps_ahead = steps_ahead,
            trend = parts.trend,
            seasonal = parts.seasonal,
            cyclical = parts.cyclical,
            "Forecast decomposed"
        );
        self.metrics.observe_run(components::FORECASTER, started);
        parts
    }
}

/// Fitted line evaluated at position `(n - 1) + steps_ahead`
///
/// Zero when the series has fewer than two samples.
pub fn trend_component(series: &[f64], steps_ahead: usize) -> f64 {
    match linear_fit(series) {
        Some(fit) => fit.at((series.len() - 1) as f64 + steps_ahead as f64),
        None => 0.0,
    }
}

/// Solar sinusoid for the local hour of day plus the weekday/weekend step
pub fn seasonal_component(at: DateTime<FixedOffset>) -> f64 {
    let hour = at.hour() as f64;
    let solar = ((hour - 12.0) * PI / 12.0).sin() * SOLAR_WEIGHT;
    let week = match at.weekday() {
        Weekday::Sat | Weekday::Sun => WEEKEND_ADJUSTMENT,
        _ => WEEKDAY_ADJUSTMENT,
    };
    solar + week
}

/// Mean cosine correlation of the series against one period (in samples)
pub fn period_amplitude(series: &[f64], period: f64) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series
        .iter()
        .enumerate()
        .map(|(i, v)| v * (2.0 * PI * i as f64 / period).cos())
        .sum::<f64>()
        / series.len() as f64
}

/// Cyclical term: each period's amplitude, phased by the current instant
pub fn cyclical_component(series: &[f64], at: DateTime<FixedOffset>) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    let millis = at.timestamp_millis() as f64;
    let cycle: f64 = CYCLE_PERIODS_HOURS
        .iter()
        .map(|&period| {
            let phase = (2.0 * PI * millis / (period * MILLIS_PER_HOUR)).sin();
            period_amplitude(series, period) * phase
        })
        .sum();
    cycle * CYCLICAL_WEIGHT
}
