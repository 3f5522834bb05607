//! Conditional-sum-of-squares estimation and forecasting shared by ARIMA and SARIMA.
//!
//! The model `φ(B)Φ(B^s)(1-B)^d(1-B^s)^D y_t = c + θ(B)Θ(B^s) ε_t` is kept in
//! expanded form: one integrated AR polynomial and one MA polynomial, both on
//! the original scale. Innovations before the first full AR window are taken
//! as zero.

use super::polynomial::{
    ar_polynomial, differencing_polynomial, evaluate_at_one, ma_polynomial, multiply, psi_weights,
};
use super::sarima::SARIMASpec;
use crate::error::{ForecastError, Result};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{all_finite, mean};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Bound on every AR/MA coefficient during the search.
const COEFFICIENT_BOUND: f64 = 0.99;

/// Estimated coefficients, grouped by polynomial.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coefficients {
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
    /// Process mean; zero whenever the model differences.
    pub mean: f64,
}

impl Coefficients {
    /// Unpack an optimiser vector laid out as `[ar, ma, sar, sma, mean?]`.
    fn from_params(params: &[f64], spec: &SARIMASpec) -> Self {
        let (ar, rest) = params.split_at(spec.p);
        let (ma, rest) = rest.split_at(spec.q);
        let (seasonal_ar, rest) = rest.split_at(spec.seasonal_p);
        let (seasonal_ma, rest) = rest.split_at(spec.seasonal_q);
        Self {
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            seasonal_ar: seasonal_ar.to_vec(),
            seasonal_ma: seasonal_ma.to_vec(),
            mean: rest.first().copied().unwrap_or(0.0),
        }
    }

    /// `φ(B)Φ(B^s)`.
    fn stationary_ar(&self, period: usize) -> Vec<f64> {
        multiply(
            &ar_polynomial(&self.ar, 1),
            &ar_polynomial(&self.seasonal_ar, period),
        )
    }

    /// `θ(B)Θ(B^s)`.
    fn full_ma(&self, period: usize) -> Vec<f64> {
        multiply(
            &ma_polynomial(&self.ma, 1),
            &ma_polynomial(&self.seasonal_ma, period),
        )
    }
}

/// Polynomials and constant of the expanded model on the original scale.
#[derive(Debug, Clone)]
struct Expanded {
    integrated_ar: Vec<f64>,
    ma: Vec<f64>,
    constant: f64,
}

impl Expanded {
    fn new(coefficients: &Coefficients, spec: &SARIMASpec) -> Self {
        let stationary_ar = coefficients.stationary_ar(spec.period);
        let constant = coefficients.mean * evaluate_at_one(&stationary_ar);
        let differencing = differencing_polynomial(spec.d, spec.seasonal_d, spec.period);
        Self {
            integrated_ar: multiply(&stationary_ar, &differencing),
            ma: coefficients.full_ma(spec.period),
            constant,
        }
    }

    /// Innovations of `values` (zero before `start`) and their sum of squares.
    fn innovations(&self, values: &[f64], start: usize) -> (Vec<f64>, f64) {
        let n = values.len();
        let mut eps = vec![0.0; n];
        let mut css = 0.0;

        for t in start..n {
            let mut e = values[t] - self.constant;
            for (j, a) in self.integrated_ar.iter().enumerate().skip(1) {
                if *a != 0.0 {
                    e += a * values[t - j];
                }
            }
            for (j, m) in self.ma.iter().enumerate().skip(1) {
                if t >= j && *m != 0.0 {
                    e -= m * eps[t - j];
                }
            }
            eps[t] = e;
            css += e * e;
        }
        (eps, css)
    }
}

/// A fitted model: data, estimates and innovations.
#[derive(Debug, Clone)]
pub struct FittedState {
    spec: SARIMASpec,
    coefficients: Coefficients,
    expanded: Expanded,
    values: Vec<f64>,
    innovations: Vec<f64>,
    start: usize,
    sigma2: f64,
    converged: bool,
    iterations: usize,
}

impl FittedState {
    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Innovation variance `CSS / n_eff`.
    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// In-sample one-step predictions, `NaN` before the first full AR window.
    pub fn fitted_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .zip(self.innovations.iter())
            .enumerate()
            .map(|(t, (y, e))| if t < self.start { f64::NAN } else { y - e })
            .collect()
    }

    /// In-sample innovations, `NaN` before the first full AR window.
    pub fn residuals(&self) -> Vec<f64> {
        self.innovations
            .iter()
            .enumerate()
            .map(|(t, &e)| if t < self.start { f64::NAN } else { e })
            .collect()
    }

    /// Akaike information criterion of the conditional Gaussian likelihood.
    pub fn aic(&self) -> f64 {
        let n_eff = (self.values.len() - self.start) as f64;
        let ll = -0.5 * n_eff * (1.0 + (2.0 * std::f64::consts::PI).ln() + self.sigma2.ln());
        -2.0 * ll + 2.0 * (self.spec.num_params() + 1) as f64
    }

    /// Point forecasts for `horizon` steps on the original scale.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>> {
        let n = self.values.len();
        let mut y = self.values.clone();
        let mut eps = self.innovations.clone();
        y.reserve(horizon);
        eps.resize(n + horizon, 0.0);

        for t in n..n + horizon {
            let mut pred = self.expanded.constant;
            for (j, a) in self.expanded.integrated_ar.iter().enumerate().skip(1) {
                if t >= j {
                    pred -= a * y[t - j];
                }
            }
            for (j, m) in self.expanded.ma.iter().enumerate().skip(1) {
                if t >= j {
                    pred += m * eps[t - j];
                }
            }
            y.push(pred);
        }

        let forecast = y.split_off(n);
        if !all_finite(&forecast) {
            return Err(ForecastError::ComputationError(
                "forecast recursion produced non-finite values".to_string(),
            ));
        }
        Ok(forecast)
    }

    /// Forecast error variance `σ² Σ_{j<h} ψ_j²` for `h = 1..=horizon`.
    pub fn forecast_variance(&self, horizon: usize) -> Vec<f64> {
        let psi = psi_weights(&self.expanded.integrated_ar, &self.expanded.ma, horizon);
        let mut cumulative = 0.0;
        psi.iter()
            .map(|w| {
                cumulative += w * w;
                self.sigma2 * cumulative
            })
            .collect()
    }
}

/// Fit `spec` to `values` by conditional sum of squares.
///
/// Coefficients are searched by Nelder-Mead inside `(-0.99, 0.99)`; a mean is
/// estimated only for undifferenced models. A non-converged search is
/// accepted. When `time_budget` is set and runs out, the fit fails with
/// [`ForecastError::Timeout`].
pub fn estimate(
    values: &[f64],
    spec: &SARIMASpec,
    time_budget: Option<Duration>,
) -> Result<FittedState> {
    spec.validate()?;
    if values.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if !all_finite(values) {
        return Err(ForecastError::MissingValues);
    }
    let min_len = spec.min_observations();
    if values.len() < min_len {
        return Err(ForecastError::InsufficientData {
            needed: min_len,
            got: values.len(),
        });
    }

    let with_mean = spec.includes_mean();
    let n_coef = spec.p + spec.q + spec.seasonal_p + spec.seasonal_q;
    let start = spec.ar_span();

    let mut initial: Vec<f64> = Vec::with_capacity(n_coef + 1);
    for count in [spec.p, spec.q, spec.seasonal_p, spec.seasonal_q] {
        initial.extend((0..count).map(|i| 0.1 / (i + 1) as f64));
    }
    let mut bounds = vec![(-COEFFICIENT_BOUND, COEFFICIENT_BOUND); n_coef];
    if with_mean {
        initial.push(mean(values));
        bounds.push((f64::NEG_INFINITY, f64::INFINITY));
    }

    let objective = |params: &[f64]| {
        let coefficients = Coefficients::from_params(params, spec);
        Expanded::new(&coefficients, spec)
            .innovations(values, start)
            .1
    };

    let (params, converged, iterations) = if initial.is_empty() {
        (Vec::new(), true, 0)
    } else {
        let config = NelderMeadConfig {
            max_iter: 2000,
            tolerance: 1e-8,
            deadline: time_budget.map(|budget| Instant::now() + budget),
            ..Default::default()
        };
        let result = nelder_mead(objective, &initial, Some(&bounds), config);

        if result.timed_out {
            warn!(
                iterations = result.iterations,
                "parameter search ran out of time"
            );
            return Err(ForecastError::Timeout {
                budget_ms: time_budget.map_or(0, |b| b.as_millis()),
            });
        }
        if !result.converged {
            warn!(
                iterations = result.iterations,
                objective = result.optimal_value,
                "parameter search did not converge, keeping best point"
            );
        }
        (result.optimal_point, result.converged, result.iterations)
    };

    let coefficients = Coefficients::from_params(&params, spec);
    let expanded = Expanded::new(&coefficients, spec);
    let (innovations, css) = expanded.innovations(values, start);
    if !css.is_finite() {
        return Err(ForecastError::ComputationError(
            "conditional sum of squares is not finite".to_string(),
        ));
    }

    let sigma2 = css / (values.len() - start) as f64;
    if !sigma2.is_finite() {
        return Err(ForecastError::ComputationError(
            "innovation variance is not finite".to_string(),
        ));
    }

    debug!(
        order = ?(spec.p, spec.d, spec.q),
        seasonal_order = ?(spec.seasonal_p, spec.seasonal_d, spec.seasonal_q, spec.period),
        css,
        sigma2,
        iterations,
        converged,
        "model estimated"
    );

    Ok(FittedState {
        spec: *spec,
        coefficients,
        expanded,
        values: values.to_vec(),
        innovations,
        start,
        sigma2,
        converged,
        iterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use statrs::distribution::Normal;

    fn shocks(n: usize, seed: u64) -> Vec<f64> {
        use rand::distributions::Distribution;
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    fn ar1(n: usize, phi: f64, level: f64, seed: u64) -> Vec<f64> {
        let mut x = 0.0;
        shocks(n, seed)
            .into_iter()
            .map(|e| {
                x = phi * x + e;
                level + x
            })
            .collect()
    }

    #[test]
    fn coefficients_unpack_in_order() {
        let spec = SARIMASpec::new(1, 0, 1, 1, 0, 1, 4);
        let c = Coefficients::from_params(&[0.1, 0.2, 0.3, 0.4, 5.0], &spec);
        assert_eq!(c.ar, vec![0.1]);
        assert_eq!(c.ma, vec![0.2]);
        assert_eq!(c.seasonal_ar, vec![0.3]);
        assert_eq!(c.seasonal_ma, vec![0.4]);
        assert_eq!(c.mean, 5.0);
    }

    #[test]
    fn estimates_ar1_with_mean() {
        let values = ar1(400, 0.7, 50.0, 9);
        let spec = SARIMASpec::non_seasonal(1, 0, 0);

        let state = estimate(&values, &spec, None).unwrap();

        assert!((state.coefficients().ar[0] - 0.7).abs() < 0.1);
        assert!((state.coefficients().mean - 50.0).abs() < 1.0);
        assert!((state.sigma2() - 1.0).abs() < 0.25);
    }

    #[test]
    fn random_walk_forecast_is_flat_and_variance_grows_linearly() {
        let mut level = 0.0;
        let values: Vec<f64> = shocks(100, 4)
            .into_iter()
            .map(|e| {
                level += e;
                level
            })
            .collect();
        let spec = SARIMASpec::non_seasonal(0, 1, 0);

        let state = estimate(&values, &spec, None).unwrap();
        let forecast = state.forecast(5).unwrap();
        let variance = state.forecast_variance(5);

        for f in &forecast {
            assert_relative_eq!(*f, values[99], epsilon = 1e-12);
        }
        for (h, v) in variance.iter().enumerate() {
            assert_relative_eq!(*v, state.sigma2() * (h + 1) as f64, epsilon = 1e-9);
        }
    }

    #[test]
    fn seasonal_differencing_repeats_last_cycle() {
        // Pure seasonal random walk (0,0,0)(0,1,0)[4] forecasts the last cycle
        let pattern = [10.0, 20.0, 15.0, 5.0];
        let values: Vec<f64> = (0..20).map(|i| pattern[i % 4] + (i / 4) as f64).collect();
        let spec = SARIMASpec::new(0, 0, 0, 0, 1, 0, 4);

        let state = estimate(&values, &spec, None).unwrap();
        let forecast = state.forecast(8).unwrap();

        assert_relative_eq!(forecast[0], values[16], epsilon = 1e-12);
        assert_relative_eq!(forecast[3], values[19], epsilon = 1e-12);
        assert_relative_eq!(forecast[4], values[16], epsilon = 1e-12);
    }

    #[test]
    fn fitted_plus_residuals_reproduce_series() {
        let values = ar1(80, 0.5, 10.0, 2);
        let spec = SARIMASpec::non_seasonal(1, 1, 1);
        let state = estimate(&values, &spec, None).unwrap();

        let fitted = state.fitted_values();
        let residuals = state.residuals();
        assert!(fitted[0].is_nan() && residuals[0].is_nan());
        for t in spec.ar_span()..values.len() {
            assert_relative_eq!(fitted[t] + residuals[t], values[t], epsilon = 1e-9);
        }
        assert!(state.aic().is_finite());
    }

    #[test]
    fn rejects_short_and_non_finite_input() {
        let spec = SARIMASpec::new(1, 1, 1, 1, 1, 1, 12);
        assert!(matches!(
            estimate(&[1.0; 20], &spec, None),
            Err(ForecastError::InsufficientData { needed: 31, got: 20 })
        ));

        let mut values = ar1(40, 0.3, 0.0, 1);
        values[3] = f64::NAN;
        assert_eq!(
            estimate(&values, &SARIMASpec::non_seasonal(1, 0, 0), None).unwrap_err(),
            ForecastError::MissingValues
        );
        assert_eq!(
            estimate(&[], &SARIMASpec::non_seasonal(1, 0, 0), None).unwrap_err(),
            ForecastError::EmptyData
        );
    }

    #[test]
    fn exhausted_budget_times_out() {
        let values = ar1(200, 0.4, 0.0, 5);
        let spec = SARIMASpec::non_seasonal(2, 0, 2);

        let result = estimate(&values, &spec, Some(Duration::ZERO));

        assert_eq!(result.unwrap_err(), ForecastError::Timeout { budget_ms: 0 });
    }
}
