//! Ordinary Least Squares (OLS) regression utilities.
//!
//! Used by the augmented Dickey-Fuller test, which needs coefficient standard
//! errors and the residual sum of squares in addition to the point estimates.

use crate::error::{ForecastError, Result};

/// OLS regression estimates with inference statistics.
#[derive(Debug, Clone)]
pub struct OLSResult {
    /// Intercept term.
    pub intercept: f64,
    /// Regression coefficients (one per regressor column).
    pub coefficients: Vec<f64>,
    /// Standard error of the intercept.
    pub intercept_se: f64,
    /// Standard errors of the coefficients, in column order.
    pub standard_errors: Vec<f64>,
    /// Residual sum of squares.
    pub rss: f64,
    /// Number of observations used.
    pub nobs: usize,
}

impl OLSResult {
    /// Number of estimated parameters (intercept included).
    pub fn num_params(&self) -> usize {
        self.coefficients.len() + 1
    }

    /// t-statistic of the coefficient at `index`.
    pub fn t_statistic(&self, index: usize) -> Option<f64> {
        let coef = self.coefficients.get(index)?;
        let se = self.standard_errors.get(index)?;
        if *se > 0.0 && se.is_finite() {
            Some(coef / se)
        } else {
            None
        }
    }

    /// Akaike information criterion of the Gaussian likelihood.
    pub fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        if self.rss <= 0.0 || n == 0.0 {
            return f64::NEG_INFINITY;
        }
        let ll = -0.5 * n * (1.0 + (2.0 * std::f64::consts::PI).ln() + (self.rss / n).ln());
        -2.0 * ll + 2.0 * self.num_params() as f64
    }
}

/// Fit OLS regression: y = intercept + X @ coefficients
///
/// Solves the normal equations with a Cholesky decomposition.
///
/// # Arguments
/// * `y` - Target values (length n)
/// * `columns` - Regressor columns (each length n), intercept excluded
///
/// # Returns
/// OLS result with coefficients, standard errors and residual sum of squares.
pub fn ols_fit(y: &[f64], columns: &[Vec<f64>]) -> Result<OLSResult> {
    let n = y.len();
    if n == 0 {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }

    for col in columns {
        if col.len() != n {
            return Err(ForecastError::DimensionMismatch {
                expected: n,
                got: col.len(),
            });
        }
    }

    let k = columns.len();
    let num_params = k + 1;
    if n <= num_params {
        return Err(ForecastError::InsufficientData {
            needed: num_params + 1,
            got: n,
        });
    }

    // X'X and X'y with design row [1, x1, x2, ...]
    let mut xtx = vec![vec![0.0; num_params]; num_params];
    let mut xty = vec![0.0; num_params];
    let mut row = vec![0.0; num_params];

    for obs in 0..n {
        row[0] = 1.0;
        for j in 0..k {
            row[j + 1] = columns[j][obs];
        }
        for i in 0..num_params {
            xty[i] += row[i] * y[obs];
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..num_params {
        for j in (i + 1)..num_params {
            xtx[i][j] = xtx[j][i];
        }
    }

    let l = cholesky(&xtx).ok_or_else(|| {
        ForecastError::ComputationError("OLS design matrix is not positive definite".into())
    })?;
    let beta = cholesky_solve(&l, &xty);

    let mut rss = 0.0;
    for obs in 0..n {
        let mut fitted = beta[0];
        for j in 0..k {
            fitted += beta[j + 1] * columns[j][obs];
        }
        let resid = y[obs] - fitted;
        rss += resid * resid;
    }

    let sigma_sq = rss / (n - num_params) as f64;

    // Diagonal of (X'X)^-1 scaled by the residual variance
    let mut se = Vec::with_capacity(num_params);
    let mut unit = vec![0.0; num_params];
    for i in 0..num_params {
        unit.iter_mut().for_each(|u| *u = 0.0);
        unit[i] = 1.0;
        let col = cholesky_solve(&l, &unit);
        se.push((sigma_sq * col[i]).max(0.0).sqrt());
    }

    Ok(OLSResult {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
        intercept_se: se[0],
        standard_errors: se[1..].to_vec(),
        rss,
        nobs: n,
    })
}

/// Cholesky decomposition A = L @ L' of a symmetric positive definite matrix.
fn cholesky(a: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = a.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }

            if i == j {
                // Relative pivot tolerance catches exactly collinear columns.
                if sum <= 1e-12 * a[i][i].abs() || !sum.is_finite() {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

/// Solve L @ L' @ x = b given the Cholesky factor L.
fn cholesky_solve(l: &[Vec<f64>], b: &[f64]) -> Vec<f64> {
    let n = b.len();

    // Forward substitution: L @ y = b
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for j in 0..i {
            sum -= l[i][j] * y[j];
        }
        y[i] = sum / l[i][i];
    }

    // Backward substitution: L' @ x = y
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = y[i];
        for j in (i + 1)..n {
            sum -= l[j][i] * x[j];
        }
        x[i] = sum / l[i][i];
    }

    x
}
