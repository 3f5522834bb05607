//! Classical additive decomposition (moving-average trend, averaged seasonal indices).
//!
//! Decomposes a series as `y = trend + seasonal + remainder`:
//! - Trend: centered moving average over one full period (a 2×m average
//!   when the period is even). Undefined (`NaN`) for the first and last
//!   half-period.
//! - Seasonal: per-position mean of the detrended series, shifted to sum
//!   to zero over one cycle and tiled over the whole series.
//! - Remainder: what is left, `NaN` wherever the trend is.

use crate::utils::stats::population_variance;

/// Result of a classical decomposition.
#[derive(Debug, Clone)]
pub struct ClassicalResult {
    /// Trend component, `NaN` at the edges.
    pub trend: Vec<f64>,
    /// Seasonal component, same length as the input.
    pub seasonal: Vec<f64>,
    /// Remainder component, `NaN` at the edges.
    pub remainder: Vec<f64>,
    /// One cycle of seasonal indices (zero mean).
    pub indices: Vec<f64>,
}

impl ClassicalResult {
    /// Share of the series' variance carried by the seasonal component.
    ///
    /// Both variances are population variances over the full length. Returns
    /// `None` when the series has no variance.
    pub fn seasonal_variance_ratio(&self, series: &[f64]) -> Option<f64> {
        let total = population_variance(series);
        if !(total > 0.0) {
            return None;
        }
        Some(population_variance(&self.seasonal) / total)
    }

    /// Seasonal strength `1 - Var(R) / Var(S + R)` over the defined span.
    pub fn seasonal_strength(&self) -> f64 {
        let (remainder, sr): (Vec<f64>, Vec<f64>) = self
            .remainder
            .iter()
            .zip(self.seasonal.iter())
            .filter(|(r, _)| r.is_finite())
            .map(|(r, s)| (*r, r + s))
            .unzip();

        let var_sr = population_variance(&sr);
        if !(var_sr > 1e-10) {
            return 0.0;
        }
        (1.0 - population_variance(&remainder) / var_sr).max(0.0)
    }
}

/// Classical additive decomposition at a fixed period.
#[derive(Debug, Clone, Copy)]
pub struct ClassicalDecomposition {
    period: usize,
}

impl ClassicalDecomposition {
    /// Create a decomposition for the given seasonal period.
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Decompose `series`.
    ///
    /// Returns `None` if the period is below 2 or the series covers fewer
    /// than two full cycles.
    pub fn decompose(&self, series: &[f64]) -> Option<ClassicalResult> {
        let m = self.period;
        let n = series.len();
        if m < 2 || n < 2 * m {
            return None;
        }

        let trend = centered_moving_average(series, m);

        let mut sums = vec![0.0; m];
        let mut counts = vec![0usize; m];
        for (i, (&y, &t)) in series.iter().zip(trend.iter()).enumerate() {
            if t.is_finite() {
                sums[i % m] += y - t;
                counts[i % m] += 1;
            }
        }

        let mut indices: Vec<f64> = sums
            .iter()
            .zip(counts.iter())
            .map(|(&s, &c)| if c > 0 { s / c as f64 } else { 0.0 })
            .collect();
        let level = indices.iter().sum::<f64>() / m as f64;
        indices.iter_mut().for_each(|v| *v -= level);

        let seasonal: Vec<f64> = (0..n).map(|i| indices[i % m]).collect();
        let remainder: Vec<f64> = series
            .iter()
            .zip(trend.iter())
            .zip(seasonal.iter())
            .map(|((&y, &t), &s)| y - t - s)
            .collect();

        Some(ClassicalResult {
            trend,
            seasonal,
            remainder,
            indices,
        })
    }
}

/// Centered moving average of window `m`, `NaN` where the window is incomplete.
///
/// Even windows use weights `[0.5, 1, ..., 1, 0.5] / m` across `m + 1` points.
fn centered_moving_average(series: &[f64], m: usize) -> Vec<f64> {
    let n = series.len();
    let half = m / 2;
    let weights: Vec<f64> = if m % 2 == 0 {
        let mut w = vec![1.0 / m as f64; m + 1];
        w[0] = 0.5 / m as f64;
        w[m] = 0.5 / m as f64;
        w
    } else {
        vec![1.0 / m as f64; m]
    };

    let mut trend = vec![f64::NAN; n];
    if n < weights.len() {
        return trend;
    }
    for t in half..(n - half) {
        let window = &series[t - half..t - half + weights.len()];
        trend[t] = window.iter().zip(weights.iter()).map(|(y, w)| y * w).sum();
    }
    trend
}
