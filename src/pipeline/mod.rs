//! Automatic forecasting pipeline.
//!
//! A run moves through fixed stages:
//!
//! 1. validate input (period, horizon, length, finiteness)
//! 2. test stationarity and seasonality ([`crate::selection`])
//! 3. fit the selected ARIMA or SARIMA model on the original series
//! 4. forecast with prediction intervals
//!
//! Any failure ends the run with a [`FailureReason`] inside the returned
//! [`ForecastResult`]; no partial forecast is produced.

mod config;
mod orchestrator;
mod result;

pub use config::PipelineConfig;
pub use orchestrator::Pipeline;
pub use result::{FailureReason, ForecastResult, Outcome, PipelineStage};
