//! ARIMA (Autoregressive Integrated Moving Average) model.

use super::sarima::{SARIMASpec, SARIMA};
use crate::core::Forecast;
use crate::error::Result;
use crate::models::Forecaster;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// ARIMA model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ARIMASpec {
    /// Create a new ARIMA specification.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    /// Number of estimated coefficients (a mean is added when `d == 0`).
    pub fn num_params(&self) -> usize {
        SARIMASpec::from(*self).num_params()
    }
}

impl Default for ARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1)
    }
}

impl From<ARIMASpec> for SARIMASpec {
    fn from(spec: ARIMASpec) -> Self {
        SARIMASpec::non_seasonal(spec.p, spec.d, spec.q)
    }
}

/// ARIMA forecasting model.
///
/// ARIMA(p, d, q) combines:
/// - AR(p): Autoregressive component
/// - I(d): Differencing, applied inside the model
/// - MA(q): Moving average component
///
/// It is the non-seasonal special case of [`SARIMA`] and shares its estimator.
#[derive(Debug, Clone)]
pub struct ARIMA {
    spec: ARIMASpec,
    inner: SARIMA,
}

impl ARIMA {
    /// Create a new ARIMA model.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        let spec = ARIMASpec::new(p, d, q);
        Self {
            spec,
            inner: SARIMA::new(spec.into()),
        }
    }

    /// Create an AR(p) model (ARIMA with d=0, q=0).
    pub fn ar(p: usize) -> Self {
        Self::new(p, 0, 0)
    }

    /// Abort fitting once `budget` of wall-clock time has passed.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.inner = self.inner.with_time_budget(budget);
        self
    }

    /// Get the model specification.
    pub fn spec(&self) -> ARIMASpec {
        self.spec
    }

    /// Get AR coefficients (empty until fitted).
    pub fn ar_coefficients(&self) -> &[f64] {
        self.inner
            .coefficients()
            .map(|c| c.ar.as_slice())
            .unwrap_or(&[])
    }

    /// Get MA coefficients (empty until fitted).
    pub fn ma_coefficients(&self) -> &[f64] {
        self.inner
            .coefficients()
            .map(|c| c.ma.as_slice())
            .unwrap_or(&[])
    }

    /// Estimated process mean; zero for differenced models.
    pub fn mean(&self) -> Option<f64> {
        self.inner.coefficients().map(|c| c.mean)
    }

    pub fn sigma2(&self) -> Option<f64> {
        self.inner.sigma2()
    }

    /// Get AIC.
    pub fn aic(&self) -> Option<f64> {
        self.inner.aic()
    }
}

impl Default for ARIMA {
    fn default() -> Self {
        let ARIMASpec { p, d, q } = ARIMASpec::default();
        Self::new(p, d, q)
    }
}

impl Forecaster for ARIMA {
    fn fit_values(&mut self, values: &[f64]) -> Result<()> {
        self.inner.fit_values(values)
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.inner.predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.inner.predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.inner.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.inner.residuals()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}
