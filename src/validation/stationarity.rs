//! Augmented Dickey-Fuller unit-root test.
//!
//! The null hypothesis is that the series has a unit root. A p-value below
//! the tester's significance level rejects it, and the series is treated as
//! stationary.

use crate::utils::{cdf_normal, ols_fit, OLSResult};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Shortest series the test accepts.
pub const MIN_OBSERVATIONS: usize = 6;

/// Why a stationarity test could not produce a verdict.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StationarityTestError {
    #[error("series too short for unit-root test: need at least {needed}, got {got}")]
    TooShort { needed: usize, got: usize },

    #[error("series contains non-finite values")]
    NonFinite,

    #[error("series is constant")]
    ConstantSeries,

    #[error("unit-root regression is singular")]
    SingularRegression,
}

/// Critical values of the test statistic at common significance levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CriticalValues {
    /// Critical value at 1% significance
    pub cv_1pct: f64,
    /// Critical value at 5% significance
    pub cv_5pct: f64,
    /// Critical value at 10% significance
    pub cv_10pct: f64,
}

impl CriticalValues {
    /// MacKinnon (2010) response surface for the constant-only regression
    /// with `nobs` observations.
    pub fn for_constant(nobs: usize) -> Self {
        let inv = 1.0 / nobs as f64;
        let surface = |c: [f64; 4]| c[0] + inv * (c[1] + inv * (c[2] + inv * c[3]));
        Self {
            cv_1pct: surface([-3.43035, -6.5393, -16.786, -79.433]),
            cv_5pct: surface([-2.86154, -2.8903, -4.234, -40.040]),
            cv_10pct: surface([-2.56677, -1.5384, -2.809, 0.0]),
        }
    }
}

/// Outcome of the unit-root test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationarityVerdict {
    /// Whether the unit-root null was rejected at the tester's alpha.
    pub is_stationary: bool,
    /// Approximate p-value of the statistic.
    pub p_value: f64,
    /// t-statistic of the lagged level coefficient.
    pub statistic: f64,
    /// Number of lagged differences in the final regression.
    pub used_lag: usize,
    /// Observations in the final regression.
    pub nobs: usize,
    pub critical_values: CriticalValues,
}

/// How many lagged differences enter the regression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LagSelection {
    /// Minimise AIC over `0..=max_lag`. `None` uses `ceil(12 * (n/100)^(1/4))`.
    Aic { max_lag: Option<usize> },
    /// Use exactly this many lags (capped by the sample size).
    Fixed(usize),
}

impl Default for LagSelection {
    fn default() -> Self {
        LagSelection::Aic { max_lag: None }
    }
}

/// Augmented Dickey-Fuller tester with a constant term.
///
/// # Example
/// ```
/// use sales_forecast::validation::StationarityTester;
///
/// let series: Vec<f64> = (0..120)
///     .map(|i| ((i * 37 + 11) % 29) as f64 - 14.0)
///     .collect();
/// let verdict = StationarityTester::new().test(&series).unwrap();
/// assert!(verdict.p_value >= 0.0 && verdict.p_value <= 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StationarityTester {
    alpha: f64,
    lags: LagSelection,
}

impl Default for StationarityTester {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            lags: LagSelection::default(),
        }
    }
}

impl StationarityTester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Significance level used for the verdict.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Search lags up to `max_lag` by AIC.
    pub fn with_max_lag(mut self, max_lag: usize) -> Self {
        self.lags = LagSelection::Aic {
            max_lag: Some(max_lag),
        };
        self
    }

    pub fn with_lag_selection(mut self, lags: LagSelection) -> Self {
        self.lags = lags;
        self
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Run the test on `series`.
    pub fn test(&self, series: &[f64]) -> Result<StationarityVerdict, StationarityTestError> {
        let n = series.len();
        if n < MIN_OBSERVATIONS {
            return Err(StationarityTestError::TooShort {
                needed: MIN_OBSERVATIONS,
                got: n,
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(StationarityTestError::NonFinite);
        }
        let first = series[0];
        if series.iter().all(|&v| v == first) {
            return Err(StationarityTestError::ConstantSeries);
        }

        let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

        // Leave room for the constant, the level term and at least one
        // degree of freedom.
        let lag_cap = n / 2 - 2;
        let lag = match self.lags {
            LagSelection::Fixed(k) => k.min(lag_cap),
            LagSelection::Aic { max_lag } => {
                let max_lag = max_lag.unwrap_or_else(|| default_max_lag(n)).min(lag_cap);
                select_lag_aic(series, &diff, max_lag)?
            }
        };

        let nobs = diff.len() - lag;
        let fit = adf_regression(series, &diff, lag, nobs)?;
        let statistic = fit
            .t_statistic(0)
            .ok_or(StationarityTestError::SingularRegression)?;

        let p_value = mackinnon_p_value(statistic);
        let verdict = StationarityVerdict {
            is_stationary: p_value < self.alpha,
            p_value,
            statistic,
            used_lag: lag,
            nobs,
            critical_values: CriticalValues::for_constant(nobs),
        };

        debug!(
            statistic = verdict.statistic,
            p_value = verdict.p_value,
            lag = verdict.used_lag,
            nobs = verdict.nobs,
            is_stationary = verdict.is_stationary,
            "ADF test completed"
        );

        Ok(verdict)
    }
}

/// Schwert's rule: `ceil(12 * (n/100)^(1/4))`.
fn default_max_lag(n: usize) -> usize {
    (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize
}

/// Choose the lag count minimising AIC. All candidates are fitted on the
/// sample available to the largest lag so their AICs are comparable.
fn select_lag_aic(
    series: &[f64],
    diff: &[f64],
    max_lag: usize,
) -> Result<usize, StationarityTestError> {
    let nobs = diff.len() - max_lag;
    let mut best: Option<(usize, f64)> = None;

    for lag in 0..=max_lag {
        let Ok(fit) = adf_regression(series, diff, lag, nobs) else {
            continue;
        };
        let aic = fit.aic();
        if best.map_or(true, |(_, best_aic)| aic < best_aic) {
            best = Some((lag, aic));
        }
    }

    best.map(|(lag, _)| lag)
        .ok_or(StationarityTestError::SingularRegression)
}

/// Fit `Δy_t = α + γ·y_{t-1} + Σ δ_i·Δy_{t-i}` over the last `nobs` differences.
///
/// The level coefficient γ is the first regressor column.
fn adf_regression(
    series: &[f64],
    diff: &[f64],
    lag: usize,
    nobs: usize,
) -> Result<OLSResult, StationarityTestError> {
    let end = diff.len();
    let start = end - nobs;
    debug_assert!(start >= lag);

    let y = &diff[start..end];
    let mut columns = Vec::with_capacity(lag + 1);
    columns.push(series[start..end].to_vec());
    for i in 1..=lag {
        columns.push(diff[start - i..end - i].to_vec());
    }

    let fit = ols_fit(y, &columns).map_err(|_| StationarityTestError::SingularRegression)?;

    // An exact fit leaves the statistic as a ratio of rounding errors
    let scale: f64 = y.iter().map(|v| v * v).sum();
    if fit.rss <= f64::EPSILON * scale {
        return Err(StationarityTestError::SingularRegression);
    }
    Ok(fit)
}

/// MacKinnon (1994) approximate p-value for the constant-only ADF statistic.
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    const TAU_MAX: f64 = 2.74;
    const TAU_MIN: f64 = -18.83;
    const TAU_STAR: f64 = -1.61;

    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic > TAU_MAX {
        return 1.0;
    }
    if statistic < TAU_MIN {
        return 0.0;
    }

    let t = statistic;
    let z = if t <= TAU_STAR {
        2.1659 + 1.4412 * t + 0.038269 * t * t
    } else {
        1.7339 + 0.93202 * t - 0.12745 * t * t - 0.010368 * t * t * t
    };
    cdf_normal(z)
}
