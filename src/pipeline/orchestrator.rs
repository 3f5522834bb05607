//! End-to-end forecasting run: validate, test, select, fit, forecast.

use super::config::PipelineConfig;
use super::result::{FailureReason, ForecastResult, PipelineStage};
use crate::core::{Forecast, TimeSeries};
use crate::detection::SeasonalityDetector;
use crate::error::ForecastError;
use crate::models::{arima, ModelFactory};
use crate::selection::{ModelSelector, ModelSpec};
use crate::utils::stats::all_finite;
use crate::validation::StationarityTester;
use rayon::prelude::*;
use tracing::{debug, debug_span, warn};

/// Automatic forecasting pipeline.
///
/// Every run returns a [`ForecastResult`]; failures are reported in it
/// rather than as errors.
///
/// # Example
/// ```
/// use sales_forecast::pipeline::{Pipeline, PipelineConfig};
///
/// let sales: Vec<f64> = (0..36)
///     .map(|i| 200.0 + 3.0 * i as f64
///         + 25.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin()
///         + ((i * 7) % 5) as f64)
///     .collect();
///
/// let pipeline = Pipeline::new(PipelineConfig::new(12));
/// let result = pipeline.run_values(&sales, 12);
///
/// let points = result.point_forecast().unwrap();
/// assert_eq!(points.len(), 12);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    selector: ModelSelector,
    factory: ModelFactory,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let selector = ModelSelector::new()
            .with_tester(StationarityTester::new().with_alpha(config.alpha))
            .with_detector(SeasonalityDetector::new().with_threshold(config.seasonality_threshold))
            .with_options(config.options);
        let factory = arima::default_factory(config.fit_time_budget);
        Self {
            config,
            selector,
            factory,
        }
    }

    /// Replace the model construction used after selection.
    pub fn with_model_factory(mut self, factory: ModelFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Forecast `horizon` steps past the end of `series`.
    ///
    /// On success the forecast timestamps are projected from the series'
    /// sampling frequency when it can be inferred.
    pub fn run(&self, series: &TimeSeries, horizon: usize) -> ForecastResult {
        let mut result = self.run_values(series.values(), horizon);
        if result.is_success() {
            match series.future_timestamps(horizon) {
                Ok(timestamps) => result.future_timestamps = Some(timestamps),
                Err(err) => debug!(error = %err, "no forecast timestamps"),
            }
        }
        result
    }

    /// Forecast `horizon` steps past the end of a plain series.
    pub fn run_values(&self, values: &[f64], horizon: usize) -> ForecastResult {
        let _span = debug_span!("pipeline", period = self.config.period, horizon).entered();

        if let Err(reason) = self.validate(values, horizon) {
            return Self::fail(horizon, None, PipelineStage::Start, reason);
        }

        let selection = self.selector.select(values, self.config.period);
        debug!(
            stage = %PipelineStage::Tested,
            stationary = ?selection.stationarity.as_ref().ok().map(|v| v.is_stationary),
            seasonal = ?selection.seasonality.as_ref().ok().map(|v| v.has_seasonality),
            "series tested"
        );
        let spec = selection.spec;
        debug!(stage = %PipelineStage::Selected, model = %spec, "model selected");

        let mut model = self.factory.create(&spec);
        if let Err(err) = model.fit_values(values) {
            return Self::fail(
                horizon,
                Some(spec),
                PipelineStage::Selected,
                FailureReason::ModelFitFailed(err),
            );
        }
        debug!(stage = %PipelineStage::Fitted, model = model.name(), "model fitted");

        let forecast = match self.config.interval_level {
            Some(level) => model.predict_with_intervals(horizon, level),
            None => model.predict(horizon),
        }
        .and_then(|forecast| check_forecast(forecast, horizon));

        match forecast {
            Ok(forecast) => {
                debug!(
                    stage = %PipelineStage::Forecasted,
                    steps = forecast.horizon(),
                    "forecast ready"
                );
                ForecastResult::success(horizon, spec, forecast)
            }
            Err(err) => Self::fail(
                horizon,
                Some(spec),
                PipelineStage::Fitted,
                FailureReason::ForecastFailed(err),
            ),
        }
    }

    /// Run independent series in parallel, preserving input order.
    pub fn run_batch(&self, series: &[TimeSeries], horizon: usize) -> Vec<ForecastResult> {
        series
            .par_iter()
            .map(|s| self.run(s, horizon))
            .collect()
    }

    fn validate(&self, values: &[f64], horizon: usize) -> Result<(), FailureReason> {
        let period = self.config.period;
        if period < 2 {
            return Err(FailureReason::InvalidInput(format!(
                "period must be at least 2, got {period}"
            )));
        }
        if horizon == 0 {
            return Err(FailureReason::InvalidInput(
                "horizon must be at least 1".to_string(),
            ));
        }
        if let Some(level) = self.config.interval_level {
            if !(level > 0.0 && level < 1.0) {
                return Err(FailureReason::InvalidInput(format!(
                    "interval level must be in (0, 1), got {level}"
                )));
            }
        }
        let needed = self.config.min_length();
        if values.len() < needed {
            return Err(FailureReason::InsufficientData {
                needed,
                got: values.len(),
            });
        }
        if !all_finite(values) {
            return Err(FailureReason::InvalidInput(
                "series contains non-finite values".to_string(),
            ));
        }
        Ok(())
    }

    fn fail(
        horizon: usize,
        model: Option<ModelSpec>,
        completed: PipelineStage,
        reason: FailureReason,
    ) -> ForecastResult {
        warn!(stage = %PipelineStage::Failed, after = %completed, reason = %reason, "no forecast");
        ForecastResult::failure(horizon, model, completed, reason)
    }
}

fn check_forecast(forecast: Forecast, horizon: usize) -> Result<Forecast, ForecastError> {
    if forecast.horizon() != horizon {
        return Err(ForecastError::DimensionMismatch {
            expected: horizon,
            got: forecast.horizon(),
        });
    }
    if !forecast.is_finite() {
        return Err(ForecastError::ComputationError(
            "forecast contains non-finite values".to_string(),
        ));
    }
    Ok(forecast)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Frequency;
    use crate::error::Result;
    use crate::models::{BoxedForecaster, Forecaster};
    use crate::selection::ModelFamily;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::f64::consts::PI;
    use std::time::Duration;

    fn monthly_sales(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| {
                120.0
                    + 1.5 * i as f64
                    + 15.0 * (2.0 * PI * i as f64 / 12.0).sin()
                    + ((i * 7) % 5) as f64 * 0.8
            })
            .collect()
    }

    /// Fails on every call.
    struct BrokenModel {
        fail_fit: bool,
    }

    impl Forecaster for BrokenModel {
        fn fit_values(&mut self, _values: &[f64]) -> Result<()> {
            if self.fail_fit {
                Err(ForecastError::ComputationError("diverged".to_string()))
            } else {
                Ok(())
            }
        }

        fn predict(&self, horizon: usize) -> Result<Forecast> {
            Ok(Forecast::from_values(vec![f64::NAN; horizon]))
        }

        fn fitted_values(&self) -> Option<&[f64]> {
            None
        }

        fn residuals(&self) -> Option<&[f64]> {
            None
        }

        fn name(&self) -> &str {
            "Broken"
        }
    }

    fn broken_factory(fail_fit: bool) -> ModelFactory {
        ModelFactory::new("broken", move |_spec: &ModelSpec| -> BoxedForecaster {
            Box::new(BrokenModel { fail_fit })
        })
    }

    #[test]
    fn seasonal_sales_forecast() {
        let pipeline = Pipeline::new(PipelineConfig::new(12));
        let result = pipeline.run_values(&monthly_sales(48), 12);

        assert!(result.is_success(), "{:?}", result.failure_reason());
        let spec = result.model_used.unwrap();
        assert_eq!(spec.family, ModelFamily::Seasonal);
        assert_eq!(spec.seasonal_order, Some((1, 1, 1, 12)));

        let point = result.point_forecast().unwrap();
        let lower = result.lower_bound().unwrap();
        let upper = result.upper_bound().unwrap();
        assert_eq!(point.len(), 12);
        for i in 0..12 {
            assert!(lower[i] <= point[i] && point[i] <= upper[i]);
        }
    }

    #[test]
    fn short_series_is_rejected() {
        let result = Pipeline::default().run_values(&[1.0, 2.0], 12);

        assert_eq!(
            result.failure_reason(),
            Some(&FailureReason::InsufficientData { needed: 24, got: 2 })
        );
        assert!(result.model_used.is_none());
        assert!(result.point_forecast().is_none());
        assert_eq!(result.stage, PipelineStage::Failed);
        assert_eq!(result.failed_after, Some(PipelineStage::Start));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let values = monthly_sales(48);

        let zero_horizon = Pipeline::default().run_values(&values, 0);
        assert!(matches!(
            zero_horizon.failure_reason(),
            Some(FailureReason::InvalidInput(_))
        ));

        let bad_period = Pipeline::new(PipelineConfig::new(1)).run_values(&values, 3);
        assert!(matches!(
            bad_period.failure_reason(),
            Some(FailureReason::InvalidInput(_))
        ));

        let bad_level = Pipeline::new(PipelineConfig::new(12).with_interval_level(Some(1.5)))
            .run_values(&values, 3);
        assert!(matches!(
            bad_level.failure_reason(),
            Some(FailureReason::InvalidInput(_))
        ));

        let mut with_nan = values;
        with_nan[10] = f64::NAN;
        let nan = Pipeline::default().run_values(&with_nan, 3);
        assert!(matches!(
            nan.failure_reason(),
            Some(FailureReason::InvalidInput(_))
        ));
    }

    #[test]
    fn fit_failure_is_reported() {
        let pipeline = Pipeline::default().with_model_factory(broken_factory(true));
        let result = pipeline.run_values(&monthly_sales(48), 6);

        assert_eq!(
            result.failure_reason(),
            Some(&FailureReason::ModelFitFailed(ForecastError::ComputationError(
                "diverged".to_string()
            )))
        );
        assert!(result.model_used.is_some());
        assert_eq!(result.stage, PipelineStage::Failed);
        assert_eq!(result.failed_after, Some(PipelineStage::Selected));
    }

    #[test]
    fn non_finite_forecast_is_reported() {
        let pipeline = Pipeline::new(PipelineConfig::new(12).with_interval_level(None))
            .with_model_factory(broken_factory(false));
        let result = pipeline.run_values(&monthly_sales(48), 6);

        assert!(matches!(
            result.failure_reason(),
            Some(FailureReason::ForecastFailed(ForecastError::ComputationError(_)))
        ));
        assert_eq!(result.stage, PipelineStage::Failed);
        assert_eq!(result.failed_after, Some(PipelineStage::Fitted));
        assert!(result.point_forecast().is_none());
    }

    #[test]
    fn exhausted_time_budget_fails_fit() {
        let config = PipelineConfig::new(12).with_fit_time_budget(Duration::ZERO);
        let result = Pipeline::new(config).run_values(&monthly_sales(48), 6);

        assert!(matches!(
            result.failure_reason(),
            Some(FailureReason::ModelFitFailed(ForecastError::Timeout { .. }))
        ));
    }

    #[test]
    fn point_only_forecast() {
        let pipeline = Pipeline::new(PipelineConfig::new(12).with_interval_level(None));
        let result = pipeline.run_values(&monthly_sales(48), 5);

        assert_eq!(result.point_forecast().map(<[f64]>::len), Some(5));
        assert!(result.lower_bound().is_none());
        assert!(result.upper_bound().is_none());
    }

    #[test]
    fn run_projects_monthly_timestamps() {
        let start = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let series = TimeSeries::regular(start, Frequency::Months(1), monthly_sales(36)).unwrap();

        let result = Pipeline::default().run(&series, 3);

        let timestamps = result.future_timestamps.unwrap();
        assert_eq!(
            timestamps,
            vec![
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn batch_preserves_order() {
        let start = Utc.with_ymd_and_hms(2022, 1, 3, 0, 0, 0).unwrap();
        let weekly = Frequency::Fixed(ChronoDuration::weeks(1));
        let series = vec![
            TimeSeries::regular(start, weekly, monthly_sales(48)).unwrap(),
            TimeSeries::regular(start, weekly, vec![1.0, 2.0]).unwrap(),
            TimeSeries::regular(start, weekly, monthly_sales(30)).unwrap(),
        ];

        let results = Pipeline::default().run_batch(&series, 4);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(!results[1].is_success());
        assert_eq!(results[2].horizon, 4);
        assert_eq!(results[0], Pipeline::default().run(&series[0], 4));
    }

    #[test]
    fn pipeline_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Pipeline>();
    }
}
