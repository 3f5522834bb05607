//! Seasonal ARIMA model.

use super::estimation::{estimate, Coefficients, FittedState};
use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::utils::stats::quantile_normal;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// SARIMA(p, d, q)(P, D, Q)\[s\] model specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SARIMASpec {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
    /// Seasonal AR order (P)
    pub seasonal_p: usize,
    /// Seasonal differencing order (D)
    pub seasonal_d: usize,
    /// Seasonal MA order (Q)
    pub seasonal_q: usize,
    /// Seasonal period (s); ignored when every seasonal order is zero.
    pub period: usize,
}

impl SARIMASpec {
    pub fn new(
        p: usize,
        d: usize,
        q: usize,
        seasonal_p: usize,
        seasonal_d: usize,
        seasonal_q: usize,
        period: usize,
    ) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_p,
            seasonal_d,
            seasonal_q,
            period,
        }
    }

    /// A specification without a seasonal part.
    pub fn non_seasonal(p: usize, d: usize, q: usize) -> Self {
        Self::new(p, d, q, 0, 0, 0, 0)
    }

    pub fn is_seasonal(&self) -> bool {
        self.seasonal_p + self.seasonal_d + self.seasonal_q > 0
    }

    /// A mean is only estimated for undifferenced models.
    pub fn includes_mean(&self) -> bool {
        self.d + self.seasonal_d == 0
    }

    /// Number of estimated coefficients (mean included, variance excluded).
    pub fn num_params(&self) -> usize {
        self.p + self.q + self.seasonal_p + self.seasonal_q + usize::from(self.includes_mean())
    }

    fn period_or_zero(&self) -> usize {
        if self.is_seasonal() {
            self.period
        } else {
            0
        }
    }

    /// Degree of the integrated AR polynomial; the first observation with a
    /// complete conditioning window.
    pub fn ar_span(&self) -> usize {
        let s = self.period_or_zero();
        self.d + self.seasonal_d * s + self.p + self.seasonal_p * s
    }

    /// Shortest series the model can be fitted to.
    pub fn min_observations(&self) -> usize {
        let s = self.period_or_zero();
        let ar = self.p + self.seasonal_p * s;
        let ma = self.q + self.seasonal_q * s;
        self.d + self.seasonal_d * s + ar.max(ma) + self.num_params() + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_seasonal() && self.period < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal period must be at least 2, got {}",
                self.period
            )));
        }
        Ok(())
    }
}

impl Default for SARIMASpec {
    fn default() -> Self {
        Self::new(1, 1, 1, 1, 1, 1, 12)
    }
}

/// Seasonal ARIMA forecaster.
///
/// Fitted on the original series; differencing happens inside the model, so
/// forecasts and intervals come back on the original scale.
///
/// # Example
/// ```
/// use sales_forecast::models::arima::SARIMA;
/// use sales_forecast::models::Forecaster;
///
/// let values: Vec<f64> = (0..48)
///     .map(|i| 100.0 + i as f64 + 10.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin()
///         + ((i * 7) % 3) as f64)
///     .collect();
///
/// let mut model = SARIMA::from_orders((1, 1, 1), (1, 1, 1, 12));
/// model.fit_values(&values).unwrap();
/// let forecast = model.predict_with_intervals(12, 0.95).unwrap();
/// assert_eq!(forecast.horizon(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct SARIMA {
    spec: SARIMASpec,
    time_budget: Option<Duration>,
    state: Option<FittedState>,
    fitted: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
}

impl SARIMA {
    /// Create a new, unfitted model.
    pub fn new(spec: SARIMASpec) -> Self {
        Self {
            spec,
            time_budget: None,
            state: None,
            fitted: None,
            residuals: None,
        }
    }

    /// Create from `(p, d, q)` and `(P, D, Q, s)` tuples.
    pub fn from_orders(
        order: (usize, usize, usize),
        seasonal: (usize, usize, usize, usize),
    ) -> Self {
        let (p, d, q) = order;
        let (sp, sd, sq, period) = seasonal;
        Self::new(SARIMASpec::new(p, d, q, sp, sd, sq, period))
    }

    /// Abort fitting once `budget` of wall-clock time has passed.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn spec(&self) -> SARIMASpec {
        self.spec
    }

    /// Estimated coefficients, once fitted.
    pub fn coefficients(&self) -> Option<&Coefficients> {
        self.state.as_ref().map(|s| s.coefficients())
    }

    /// Innovation variance, once fitted.
    pub fn sigma2(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.sigma2())
    }

    pub fn aic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.aic())
    }

    /// Whether the parameter search converged.
    pub fn converged(&self) -> Option<bool> {
        self.state.as_ref().map(|s| s.converged())
    }

    /// Nelder-Mead iterations spent on the last fit.
    pub fn iterations(&self) -> Option<usize> {
        self.state.as_ref().map(|s| s.iterations())
    }

    pub(crate) fn state(&self) -> Result<&FittedState> {
        self.state.as_ref().ok_or(ForecastError::FitRequired)
    }
}

impl Default for SARIMA {
    fn default() -> Self {
        Self::new(SARIMASpec::default())
    }
}

impl Forecaster for SARIMA {
    fn fit_values(&mut self, values: &[f64]) -> Result<()> {
        let state = estimate(values, &self.spec, self.time_budget)?;
        self.fitted = Some(state.fitted_values());
        self.residuals = Some(state.residuals());
        self.state = Some(state);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state()?;
        if horizon == 0 {
            return Ok(Forecast::new());
        }
        Ok(Forecast::from_values(state.forecast(horizon)?))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval level must be in (0, 1), got {level}"
            )));
        }
        let state = self.state()?;
        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let preds = state.forecast(horizon)?;
        let z = quantile_normal((1.0 + level) / 2.0);
        let (lower, upper): (Vec<f64>, Vec<f64>) = preds
            .iter()
            .zip(state.forecast_variance(horizon))
            .map(|(&point, var)| {
                let se = var.sqrt();
                (point - z * se, point + z * se)
            })
            .unzip();

        let forecast = Forecast::from_values_with_intervals(preds, lower, upper, level)?;
        if !forecast.is_finite() {
            return Err(ForecastError::ComputationError(
                "prediction interval is not finite".to_string(),
            ));
        }
        Ok(forecast)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "SARIMA"
    }
}
