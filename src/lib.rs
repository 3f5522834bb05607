//! # sales-forecast
//!
//! Automatic univariate forecasting for sales-like time series.
//!
//! Given a series and its seasonal period, the [`pipeline`] runs an
//! augmented Dickey-Fuller test, checks seasonal strength with a classical
//! decomposition, picks an ARIMA or SARIMA model, fits it by conditional
//! sum of squares and returns point forecasts with prediction intervals.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod seasonality;
pub mod selection;
pub mod transform;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::Forecaster;
    pub use crate::pipeline::{FailureReason, ForecastResult, Pipeline, PipelineConfig};
    pub use crate::selection::{ModelFamily, ModelSpec};
}
