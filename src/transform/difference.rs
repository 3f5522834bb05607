//! Differencing and its inverse.

use crate::error::{ForecastError, Result};

/// First difference: `out[i] = series[i + 1] - series[i]`.
///
/// Returns an empty vector for series shorter than two.
///
/// # Example
/// ```
/// use sales_forecast::transform::difference;
///
/// assert_eq!(difference(&[1.0, 4.0, 9.0]), vec![3.0, 5.0]);
/// ```
pub fn difference(series: &[f64]) -> Vec<f64> {
    series.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Seasonal difference at lag `period`: `out[i] = series[i + period] - series[i]`.
pub fn seasonal_difference(series: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || series.len() <= period {
        return Vec::new();
    }
    series
        .iter()
        .skip(period)
        .zip(series.iter())
        .map(|(curr, prev)| curr - prev)
        .collect()
}

/// Invert [`difference`] given the first original value.
///
/// The result has one more element than `diffs` and starts with `first`.
pub fn undifference(diffs: &[f64], first: f64) -> Vec<f64> {
    let mut result = Vec::with_capacity(diffs.len() + 1);
    let mut level = first;
    result.push(level);
    for d in diffs {
        level += d;
        result.push(level);
    }
    result
}

/// Repeated first differencing that remembers how to undo itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Differencer {
    /// First value of the input to each application, oldest first.
    anchors: Vec<f64>,
}

impl Differencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Difference `series` once and record the application.
    pub fn apply(&mut self, series: &[f64]) -> Result<Vec<f64>> {
        if series.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: series.len(),
            });
        }
        self.anchors.push(series[0]);
        Ok(difference(series))
    }

    /// Number of differences applied so far.
    pub fn order(&self) -> usize {
        self.anchors.len()
    }

    pub fn anchors(&self) -> &[f64] {
        &self.anchors
    }

    /// Undo every recorded application, most recent first.
    pub fn restore(&self, differenced: &[f64]) -> Vec<f64> {
        self.anchors
            .iter()
            .rev()
            .fold(differenced.to_vec(), |acc, &first| undifference(&acc, first))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn difference_shortens_by_one() {
        let series = vec![3.0, 5.0, 4.0, 10.0];
        let diffs = difference(&series);

        assert_eq!(diffs.len(), series.len() - 1);
        for i in 0..diffs.len() {
            assert_relative_eq!(diffs[i], series[i + 1] - series[i]);
        }
    }

    #[test]
    fn difference_of_short_series_is_empty() {
        assert!(difference(&[]).is_empty());
        assert!(difference(&[1.0]).is_empty());
    }

    #[test]
    fn undifference_inverts_difference() {
        let series = vec![120.0, 118.5, 130.25, 127.0, 140.0, 139.5];
        let restored = undifference(&difference(&series), series[0]);

        assert_eq!(restored.len(), series.len());
        for (r, s) in restored.iter().zip(series.iter()) {
            assert_relative_eq!(r, s, epsilon = 1e-10);
        }
    }

    #[test]
    fn seasonal_difference_at_lag() {
        let series: Vec<f64> = (0..8).map(|i| (i % 4) as f64 + i as f64).collect();
        let diffs = seasonal_difference(&series, 4);

        assert_eq!(diffs, vec![4.0; 4]);
        assert!(seasonal_difference(&series, 8).is_empty());
        assert!(seasonal_difference(&series, 0).is_empty());
    }

    #[test]
    fn differencer_counts_and_restores() {
        let series: Vec<f64> = (0..10).map(|i| (i * i) as f64 + 1.0).collect();
        let mut differencer = Differencer::new();
        assert_eq!(differencer.order(), 0);

        let once = differencer.apply(&series).unwrap();
        let twice = differencer.apply(&once).unwrap();
        assert_eq!(differencer.order(), 2);
        assert_eq!(differencer.anchors(), &[1.0, 1.0]);
        // Second difference of i^2 is constant
        assert!(twice.iter().all(|&v| (v - 2.0).abs() < 1e-12));

        let restored = differencer.restore(&twice);
        assert_eq!(restored, series);
    }

    #[test]
    fn differencer_rejects_short_input() {
        let mut differencer = Differencer::new();
        assert!(matches!(
            differencer.apply(&[1.0]),
            Err(ForecastError::InsufficientData { needed: 2, got: 1 })
        ));
        assert_eq!(differencer.order(), 0);
    }
}
