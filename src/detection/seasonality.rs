//! Seasonality detection at a known period.
//!
//! The series is decomposed additively at the caller's period and judged
//! seasonal when the seasonal component carries more than a threshold share
//! of the total variance.

use crate::seasonality::ClassicalDecomposition;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a seasonality check could not produce a verdict.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SeasonalityTestError {
    #[error("seasonal period must be at least 2, got {0}")]
    InvalidPeriod(usize),

    #[error("need at least two full cycles ({needed} observations), got {got}")]
    InsufficientLength { needed: usize, got: usize },

    #[error("series contains non-finite values")]
    NonFinite,

    #[error("series has zero variance")]
    ZeroVariance,
}

/// Outcome of a seasonality check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityVerdict {
    pub has_seasonality: bool,
    /// `Var(seasonal) / Var(series)`.
    pub variance_ratio: f64,
    pub period: usize,
}

impl SeasonalityVerdict {
    /// Verdict reported when the check could not run.
    pub fn absent(period: usize) -> Self {
        Self {
            has_seasonality: false,
            variance_ratio: 0.0,
            period,
        }
    }
}

/// Variance-ratio seasonality detector.
///
/// # Example
/// ```
/// use sales_forecast::detection::SeasonalityDetector;
///
/// let series: Vec<f64> = (0..48)
///     .map(|i| 100.0 + 20.0 * (2.0 * std::f64::consts::PI * i as f64 / 12.0).sin())
///     .collect();
/// let verdict = SeasonalityDetector::new().detect(&series, 12);
/// assert!(verdict.has_seasonality);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeasonalityDetector {
    threshold: f64,
}

impl Default for SeasonalityDetector {
    fn default() -> Self {
        Self { threshold: 0.1 }
    }
}

impl SeasonalityDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Minimum variance ratio counted as seasonal (exclusive).
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Check `series` for seasonality at `period`.
    pub fn try_detect(
        &self,
        series: &[f64],
        period: usize,
    ) -> Result<SeasonalityVerdict, SeasonalityTestError> {
        if period < 2 {
            return Err(SeasonalityTestError::InvalidPeriod(period));
        }
        if series.len() < 2 * period {
            return Err(SeasonalityTestError::InsufficientLength {
                needed: 2 * period,
                got: series.len(),
            });
        }
        if series.iter().any(|v| !v.is_finite()) {
            return Err(SeasonalityTestError::NonFinite);
        }

        let decomposition = ClassicalDecomposition::new(period)
            .decompose(series)
            .ok_or(SeasonalityTestError::InsufficientLength {
                needed: 2 * period,
                got: series.len(),
            })?;
        let variance_ratio = decomposition
            .seasonal_variance_ratio(series)
            .ok_or(SeasonalityTestError::ZeroVariance)?;

        let verdict = SeasonalityVerdict {
            has_seasonality: variance_ratio > self.threshold,
            variance_ratio,
            period,
        };
        debug!(
            period,
            variance_ratio,
            has_seasonality = verdict.has_seasonality,
            "seasonality check completed"
        );
        Ok(verdict)
    }

    /// Like [`try_detect`](Self::try_detect), but any error reads as "no seasonality".
    pub fn detect(&self, series: &[f64], period: usize) -> SeasonalityVerdict {
        self.try_detect(series, period).unwrap_or_else(|err| {
            warn!(period, error = %err, "seasonality check failed, assuming none");
            SeasonalityVerdict::absent(period)
        })
    }
}
