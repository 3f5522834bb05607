//! Forecaster trait defining the common interface for all models.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;
use crate::selection::ModelSpec;
use std::fmt;
use std::sync::Arc;

/// Common interface for all forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to a plain sequence of observations.
    fn fit_values(&mut self, values: &[f64]) -> Result<()>;

    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.fit_values(series.values())
    }

    /// Generate predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with confidence intervals.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        // Default implementation just returns point predictions
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use sales_forecast::models::{BoxedForecaster, Forecaster};
/// use sales_forecast::models::arima::ARIMA;
///
/// let model: BoxedForecaster = Box::new(ARIMA::new(1, 1, 1));
/// assert_eq!(model.name(), "ARIMA");
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;

/// Builds a fresh forecaster for a selected [`ModelSpec`].
///
/// Cheap to clone; the factory function is shared.
///
/// # Example
///
/// ```
/// use sales_forecast::models::ModelFactory;
/// use sales_forecast::models::arima::ARIMA;
/// use sales_forecast::selection::ModelSpec;
///
/// let factory = ModelFactory::new("ARIMA only", |spec: &ModelSpec| {
///     let (p, d, q) = spec.order;
///     Box::new(ARIMA::new(p, d, q))
/// });
///
/// let model = factory.create(&ModelSpec::non_seasonal((1, 0, 1)));
/// assert!(!model.is_fitted());
/// ```
#[derive(Clone)]
pub struct ModelFactory {
    name: &'static str,
    factory: Arc<dyn Fn(&ModelSpec) -> BoxedForecaster + Send + Sync>,
}

impl ModelFactory {
    /// Create a factory from a named construction function.
    pub fn new<F>(name: &'static str, factory: F) -> Self
    where
        F: Fn(&ModelSpec) -> BoxedForecaster + Send + Sync + 'static,
    {
        Self {
            name,
            factory: Arc::new(factory),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Create a new, unfitted model instance for `spec`.
    pub fn create(&self, spec: &ModelSpec) -> BoxedForecaster {
        (self.factory)(spec)
    }
}

impl fmt::Debug for ModelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelFactory")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
