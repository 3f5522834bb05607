//! Pipeline configuration.

use crate::selection::ModelOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a [`Pipeline`](super::Pipeline) run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Seasonal period in observations (12 for monthly data).
    pub period: usize,
    /// Significance level of the stationarity test.
    pub alpha: f64,
    /// Minimum seasonal share of variance counted as seasonal.
    pub seasonality_threshold: f64,
    /// Series shorter than `min_cycles * period` are rejected.
    ///
    /// Two cycles are enough for the detectors but not always for the
    /// model: the default seasonal order `(1, d, 1)(1, 1, 1)[12]` needs
    /// `30 + d` observations, so a seasonal series of 24 to 29 months
    /// (30 when `d = 1`) passes this check and then fails with
    /// `ModelFitFailed(InsufficientData)`. Raise it to 3 to reject such
    /// series up front.
    pub min_cycles: usize,
    /// Orders of the fitted model.
    pub options: ModelOptions,
    /// Prediction interval level; `None` yields point forecasts only.
    pub interval_level: Option<f64>,
    /// Wall-clock budget for model fitting.
    pub fit_time_budget: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            period: 12,
            alpha: 0.05,
            seasonality_threshold: 0.1,
            min_cycles: 2,
            options: ModelOptions::default(),
            interval_level: Some(0.95),
            fit_time_budget: None,
        }
    }
}

impl PipelineConfig {
    /// Create a configuration for the given seasonal period.
    pub fn new(period: usize) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    pub fn with_period(mut self, period: usize) -> Self {
        self.period = period;
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_seasonality_threshold(mut self, threshold: f64) -> Self {
        self.seasonality_threshold = threshold;
        self
    }

    pub fn with_min_cycles(mut self, cycles: usize) -> Self {
        self.min_cycles = cycles;
        self
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the interval level; `None` disables intervals.
    pub fn with_interval_level(mut self, level: Option<f64>) -> Self {
        self.interval_level = level;
        self
    }

    pub fn with_fit_time_budget(mut self, budget: Duration) -> Self {
        self.fit_time_budget = Some(budget);
        self
    }

    /// Minimum accepted series length.
    pub fn min_length(&self) -> usize {
        self.min_cycles.saturating_mul(self.period)
    }
}
