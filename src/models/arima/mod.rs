//! ARIMA and SARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - ARIMA models with (p, d, q) specifications
//! - SARIMA models with seasonal components (P, D, Q)\[s\]
//! - A default [`ModelFactory`] mapping a selected [`ModelSpec`] to one of them
//!
//! Both models are fitted on the original series and difference internally.

mod estimation;
mod model;
mod polynomial;
mod sarima;

pub use estimation::Coefficients;
pub use model::{ARIMASpec, ARIMA};
pub use polynomial::psi_weights;
pub use sarima::{SARIMASpec, SARIMA};

use crate::models::{BoxedForecaster, ModelFactory};
use crate::selection::{ModelFamily, ModelSpec};
use std::time::Duration;

/// Build an unfitted model for `spec`, optionally bounded by a fit time budget.
pub fn from_spec(spec: &ModelSpec, time_budget: Option<Duration>) -> BoxedForecaster {
    let (p, d, q) = spec.order;
    match (spec.family, spec.seasonal_order) {
        (ModelFamily::Seasonal, Some(seasonal)) => {
            let model = SARIMA::from_orders(spec.order, seasonal);
            match time_budget {
                Some(budget) => Box::new(model.with_time_budget(budget)),
                None => Box::new(model),
            }
        }
        _ => {
            let model = ARIMA::new(p, d, q);
            match time_budget {
                Some(budget) => Box::new(model.with_time_budget(budget)),
                None => Box::new(model),
            }
        }
    }
}

/// Factory used by the pipeline unless another one is configured.
pub fn default_factory(time_budget: Option<Duration>) -> ModelFactory {
    ModelFactory::new("arima", move |spec: &ModelSpec| from_spec(spec, time_budget))
}
