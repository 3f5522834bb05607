//! Pipeline outcome types.

use crate::core::Forecast;
use crate::error::ForecastError;
use crate::selection::ModelSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stages a run passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    Start,
    Tested,
    Selected,
    Fitted,
    Forecasted,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Start => "start",
            PipelineStage::Tested => "tested",
            PipelineStage::Selected => "selected",
            PipelineStage::Fitted => "fitted",
            PipelineStage::Forecasted => "forecasted",
            PipelineStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Why a run produced no forecast.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FailureReason {
    #[error("insufficient data: need at least {needed} observations, got {got}")]
    InsufficientData { needed: usize, got: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model fit failed: {0}")]
    ModelFitFailed(ForecastError),

    #[error("forecast failed: {0}")]
    ForecastFailed(ForecastError),
}

/// Either a forecast or the reason there is none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Forecast(Forecast),
    Failed(FailureReason),
}

/// Result of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    /// Requested number of steps ahead.
    pub horizon: usize,
    /// Model chosen by the selector; `None` when the input was rejected.
    pub model_used: Option<ModelSpec>,
    /// Terminal stage: `Forecasted` or `Failed`.
    pub stage: PipelineStage,
    /// Last stage completed before the run failed; `None` on success.
    pub failed_after: Option<PipelineStage>,
    pub outcome: Outcome,
    /// Timestamps of the forecast steps, when they can be projected.
    pub future_timestamps: Option<Vec<DateTime<Utc>>>,
}

impl ForecastResult {
    pub(crate) fn success(horizon: usize, model: ModelSpec, forecast: Forecast) -> Self {
        Self {
            horizon,
            model_used: Some(model),
            stage: PipelineStage::Forecasted,
            failed_after: None,
            outcome: Outcome::Forecast(forecast),
            future_timestamps: None,
        }
    }

    pub(crate) fn failure(
        horizon: usize,
        model: Option<ModelSpec>,
        completed: PipelineStage,
        reason: FailureReason,
    ) -> Self {
        Self {
            horizon,
            model_used: model,
            stage: PipelineStage::Failed,
            failed_after: Some(completed),
            outcome: Outcome::Failed(reason),
            future_timestamps: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Forecast(_))
    }

    pub fn forecast(&self) -> Option<&Forecast> {
        match &self.outcome {
            Outcome::Forecast(forecast) => Some(forecast),
            Outcome::Failed(_) => None,
        }
    }

    /// Point forecasts, `horizon` values on success.
    pub fn point_forecast(&self) -> Option<&[f64]> {
        self.forecast().map(Forecast::point)
    }

    pub fn lower_bound(&self) -> Option<&[f64]> {
        self.forecast().and_then(Forecast::lower)
    }

    pub fn upper_bound(&self) -> Option<&[f64]> {
        self.forecast().and_then(Forecast::upper)
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match &self.outcome {
            Outcome::Failed(reason) => Some(reason),
            Outcome::Forecast(_) => None,
        }
    }
}
