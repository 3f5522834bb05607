//! Model selection from stationarity and seasonality verdicts.
//!
//! The selector runs the unit-root test and the seasonality check on the
//! series as given and maps the two verdicts to a fixed (S)ARIMA order:
//!
//! - stationary: `d = 0`; non-stationary, or the test failed: `d = 1`
//! - seasonal at the caller's period: SARIMA `(p, d, q)(P, D, Q)[period]`
//! - otherwise: ARIMA `(p, d, q)`
//!
//! Seasonality is always judged on the original series, independently of
//! the differencing decision.

use crate::detection::{SeasonalityDetector, SeasonalityTestError, SeasonalityVerdict};
use crate::transform::Differencer;
use crate::validation::{StationarityTestError, StationarityTester, StationarityVerdict};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Model class chosen for a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFamily {
    Seasonal,
    NonSeasonal,
}

/// Orders of the model to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    pub family: ModelFamily,
    /// `(p, d, q)`
    pub order: (usize, usize, usize),
    /// `(P, D, Q, period)`, present exactly for the seasonal family.
    pub seasonal_order: Option<(usize, usize, usize, usize)>,
}

impl ModelSpec {
    pub fn non_seasonal(order: (usize, usize, usize)) -> Self {
        Self {
            family: ModelFamily::NonSeasonal,
            order,
            seasonal_order: None,
        }
    }

    pub fn seasonal(
        order: (usize, usize, usize),
        seasonal_order: (usize, usize, usize, usize),
    ) -> Self {
        Self {
            family: ModelFamily::Seasonal,
            order,
            seasonal_order: Some(seasonal_order),
        }
    }

    pub fn is_seasonal(&self) -> bool {
        self.family == ModelFamily::Seasonal
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (p, d, q) = self.order;
        match self.seasonal_order {
            Some((sp, sd, sq, s)) => write!(f, "SARIMA({p},{d},{q})({sp},{sd},{sq})[{s}]"),
            None => write!(f, "ARIMA({p},{d},{q})"),
        }
    }
}

/// Fixed orders used by the selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelOptions {
    pub p: usize,
    /// Forces `d` regardless of the stationarity verdict.
    pub d_override: Option<usize>,
    pub q: usize,
    pub seasonal_p: usize,
    pub seasonal_d: usize,
    pub seasonal_q: usize,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            p: 1,
            d_override: None,
            q: 1,
            seasonal_p: 1,
            seasonal_d: 1,
            seasonal_q: 1,
        }
    }
}

impl ModelOptions {
    pub fn with_order(mut self, p: usize, q: usize) -> Self {
        self.p = p;
        self.q = q;
        self
    }

    pub fn with_d_override(mut self, d: usize) -> Self {
        self.d_override = Some(d);
        self
    }

    pub fn with_seasonal_order(mut self, p: usize, d: usize, q: usize) -> Self {
        self.seasonal_p = p;
        self.seasonal_d = d;
        self.seasonal_q = q;
        self
    }
}

/// Selected model plus the evidence behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub spec: ModelSpec,
    pub stationarity: Result<StationarityVerdict, StationarityTestError>,
    pub seasonality: Result<SeasonalityVerdict, SeasonalityTestError>,
    /// Series after the chosen regular differencing; kept for inspection,
    /// the model itself is fitted on the original series.
    pub differenced: Vec<f64>,
}

impl Selection {
    /// Differencing order chosen for the series.
    pub fn d(&self) -> usize {
        self.spec.order.1
    }
}

/// Combines the unit-root test and the seasonality check into a [`ModelSpec`].
///
/// # Example
/// ```
/// use sales_forecast::selection::{ModelFamily, ModelSelector};
///
/// let series: Vec<f64> = (0..48)
///     .map(|i| 100.0 + 2.0 * i as f64
///         + 20.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin())
///     .collect();
///
/// let selection = ModelSelector::new().select(&series, 12);
/// assert_eq!(selection.spec.family, ModelFamily::Seasonal);
/// assert_eq!(selection.spec.seasonal_order, Some((1, 1, 1, 12)));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelSelector {
    tester: StationarityTester,
    detector: SeasonalityDetector,
    options: ModelOptions,
}

impl ModelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tester(mut self, tester: StationarityTester) -> Self {
        self.tester = tester;
        self
    }

    pub fn with_detector(mut self, detector: SeasonalityDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_options(mut self, options: ModelOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ModelOptions {
        &self.options
    }

    /// Choose a model for `series` with seasonal period `period`.
    ///
    /// Never fails: detection errors are recorded in the returned
    /// [`Selection`] and fall back to "non-stationary" and "not seasonal".
    pub fn select(&self, series: &[f64], period: usize) -> Selection {
        let stationarity = self.tester.test(series);
        let tested_d = match &stationarity {
            Ok(verdict) if verdict.is_stationary => 0,
            Ok(_) => 1,
            Err(err) => {
                warn!(error = %err, "stationarity test failed, assuming a unit root");
                1
            }
        };
        let d = self.options.d_override.unwrap_or(tested_d);

        let mut differencer = Differencer::new();
        let mut differenced = series.to_vec();
        for _ in 0..d {
            match differencer.apply(&differenced) {
                Ok(next) => differenced = next,
                Err(_) => break,
            }
        }

        let seasonality = self.detector.try_detect(series, period);
        let seasonal = match &seasonality {
            Ok(verdict) => verdict.has_seasonality,
            Err(err) => {
                warn!(period, error = %err, "seasonality check failed, assuming none");
                false
            }
        };

        let order = (self.options.p, d, self.options.q);
        let spec = if seasonal {
            ModelSpec::seasonal(
                order,
                (
                    self.options.seasonal_p,
                    self.options.seasonal_d,
                    self.options.seasonal_q,
                    period,
                ),
            )
        } else {
            ModelSpec::non_seasonal(order)
        };

        debug!(model = %spec, differences = differencer.order(), "model selected");

        Selection {
            spec,
            stationarity,
            seasonality,
            differenced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use statrs::distribution::Normal;
    use std::f64::consts::PI;

    fn noise(n: usize, sd: f64, seed: u64) -> Vec<f64> {
        use rand::distributions::Distribution;
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, sd).unwrap();
        (0..n).map(|_| normal.sample(&mut rng)).collect()
    }

    fn monthly_sales(n: usize, seed: u64) -> Vec<f64> {
        noise(n, 2.0, seed)
            .into_iter()
            .enumerate()
            .map(|(t, e)| {
                100.0 + 2.0 * t as f64 + 20.0 * (2.0 * PI * t as f64 / 12.0).sin() + e
            })
            .collect()
    }

    #[test]
    fn white_noise_gets_undifferenced_arima() {
        let series: Vec<f64> = noise(600, 1.0, 42).iter().map(|e| 50.0 + e).collect();

        let selection = ModelSelector::new().select(&series, 12);

        assert_eq!(selection.spec, ModelSpec::non_seasonal((1, 0, 1)));
        assert_eq!(selection.d(), 0);
        assert_eq!(selection.differenced, series);
        assert!(selection.stationarity.unwrap().is_stationary);
        assert!(!selection.seasonality.unwrap().has_seasonality);
    }

    #[test]
    fn seasonal_sales_get_sarima() {
        let series = monthly_sales(36, 17);

        let selection = ModelSelector::new().select(&series, 12);

        assert_eq!(selection.spec.family, ModelFamily::Seasonal);
        assert_eq!(selection.spec.seasonal_order, Some((1, 1, 1, 12)));
        assert_eq!(selection.differenced.len(), series.len() - selection.d());
    }

    #[test]
    fn failed_test_defaults_to_differencing() {
        // Constant series: both detectors fail
        let series = vec![7.0; 30];

        let selection = ModelSelector::new().select(&series, 12);

        assert_eq!(
            selection.stationarity,
            Err(StationarityTestError::ConstantSeries)
        );
        assert_eq!(selection.seasonality, Err(SeasonalityTestError::ZeroVariance));
        assert_eq!(selection.spec, ModelSpec::non_seasonal((1, 1, 1)));
        assert_eq!(selection.differenced, vec![0.0; 29]);
    }

    #[test]
    fn selection_is_deterministic() {
        let series = monthly_sales(48, 5);
        let selector = ModelSelector::new();

        let first = selector.select(&series, 12);
        let second = selector.select(&series, 12);

        assert_eq!(first, second);
    }

    #[test]
    fn options_override_orders() {
        let series = monthly_sales(36, 17);
        let options = ModelOptions::default()
            .with_order(2, 0)
            .with_d_override(1)
            .with_seasonal_order(0, 1, 1);

        let selection = ModelSelector::new().with_options(options).select(&series, 12);

        assert_eq!(selection.spec.order, (2, 1, 0));
        assert_eq!(selection.spec.seasonal_order, Some((0, 1, 1, 12)));
    }

    #[test]
    fn detector_threshold_controls_family() {
        let series = monthly_sales(36, 17);
        let selector =
            ModelSelector::new().with_detector(SeasonalityDetector::new().with_threshold(0.99));

        let selection = selector.select(&series, 12);

        assert_eq!(selection.spec.family, ModelFamily::NonSeasonal);
        assert!(selection.spec.seasonal_order.is_none());
    }

    #[test]
    fn model_spec_display() {
        assert_eq!(
            ModelSpec::seasonal((1, 1, 1), (1, 1, 1, 12)).to_string(),
            "SARIMA(1,1,1)(1,1,1)[12]"
        );
        assert_eq!(ModelSpec::non_seasonal((1, 0, 1)).to_string(), "ARIMA(1,0,1)");
    }
}
