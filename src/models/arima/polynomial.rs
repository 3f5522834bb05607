//! Lag-polynomial arithmetic for (seasonal) ARIMA models.
//!
//! Polynomials are coefficient vectors in the backshift operator `B`,
//! lowest power first, so `[1.0, -0.5]` is `1 - 0.5B`.

/// Product of two lag polynomials.
pub fn multiply(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (j, &y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// AR polynomial `1 - φ_1 B^lag - φ_2 B^{2·lag} - ...`.
pub fn ar_polynomial(coefficients: &[f64], lag: usize) -> Vec<f64> {
    spread(coefficients, lag, -1.0)
}

/// MA polynomial `1 + θ_1 B^lag + θ_2 B^{2·lag} + ...`.
pub fn ma_polynomial(coefficients: &[f64], lag: usize) -> Vec<f64> {
    spread(coefficients, lag, 1.0)
}

/// Differencing operator `(1 - B)^d (1 - B^period)^seasonal_d`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = multiply(&poly, &[1.0, -1.0]);
    }
    if period > 0 {
        let mut seasonal = vec![0.0; period + 1];
        seasonal[0] = 1.0;
        seasonal[period] = -1.0;
        for _ in 0..seasonal_d {
            poly = multiply(&poly, &seasonal);
        }
    }
    poly
}

/// First `n` coefficients of the MA(∞) expansion `ψ(B) = ma(B) / ar(B)`.
///
/// `ar` and `ma` must both start with 1.
pub fn psi_weights(ar: &[f64], ma: &[f64], n: usize) -> Vec<f64> {
    let mut psi = vec![0.0; n];
    for j in 0..n {
        let mut value = ma.get(j).copied().unwrap_or(0.0);
        for i in 1..ar.len().min(j + 1) {
            value -= ar[i] * psi[j - i];
        }
        psi[j] = value;
    }
    psi
}

/// Value of the polynomial at `B = 1`.
pub fn evaluate_at_one(poly: &[f64]) -> f64 {
    poly.iter().sum()
}

fn spread(coefficients: &[f64], lag: usize, sign: f64) -> Vec<f64> {
    if coefficients.is_empty() || lag == 0 {
        return vec![1.0];
    }
    let mut poly = vec![0.0; coefficients.len() * lag + 1];
    poly[0] = 1.0;
    for (i, &c) in coefficients.iter().enumerate() {
        poly[(i + 1) * lag] = sign * c;
    }
    poly
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn multiply_expands_products() {
        // (1 - B)(1 + B) = 1 - B^2
        assert_eq!(multiply(&[1.0, -1.0], &[1.0, 1.0]), vec![1.0, 0.0, -1.0]);
        assert!(multiply(&[], &[1.0]).is_empty());
    }

    #[test]
    fn seasonal_polynomials_place_coefficients_at_lag() {
        let ar = ar_polynomial(&[0.5], 4);
        assert_eq!(ar, vec![1.0, 0.0, 0.0, 0.0, -0.5]);

        let ma = ma_polynomial(&[0.3, 0.2], 1);
        assert_eq!(ma, vec![1.0, 0.3, 0.2]);

        assert_eq!(ar_polynomial(&[], 12), vec![1.0]);
    }

    #[test]
    fn differencing_polynomial_matches_operators() {
        assert_eq!(differencing_polynomial(0, 0, 12), vec![1.0]);
        assert_eq!(differencing_polynomial(2, 0, 0), vec![1.0, -2.0, 1.0]);

        // (1 - B)(1 - B^3) = 1 - B - B^3 + B^4
        assert_eq!(
            differencing_polynomial(1, 1, 3),
            vec![1.0, -1.0, 0.0, -1.0, 1.0]
        );
    }

    #[test]
    fn psi_weights_of_ar1_are_geometric() {
        let psi = psi_weights(&ar_polynomial(&[0.6], 1), &[1.0], 5);
        for (j, w) in psi.iter().enumerate() {
            assert_relative_eq!(*w, 0.6f64.powi(j as i32), epsilon = 1e-12);
        }
    }

    #[test]
    fn psi_weights_of_random_walk_are_ones() {
        let psi = psi_weights(&differencing_polynomial(1, 0, 0), &[1.0], 6);
        assert!(psi.iter().all(|&w| (w - 1.0).abs() < 1e-12));
    }

    #[test]
    fn psi_weights_of_ima11() {
        // (1 - B) y = (1 + θB) e  =>  ψ_0 = 1, ψ_j = 1 + θ
        let psi = psi_weights(&[1.0, -1.0], &ma_polynomial(&[0.4], 1), 4);
        assert_relative_eq!(psi[0], 1.0);
        for w in &psi[1..] {
            assert_relative_eq!(*w, 1.4, epsilon = 1e-12);
        }
    }

    #[test]
    fn evaluate_at_one_sums_coefficients() {
        assert_relative_eq!(evaluate_at_one(&ar_polynomial(&[0.25], 1)), 0.75);
        assert_relative_eq!(evaluate_at_one(&differencing_polynomial(1, 1, 12)), 0.0);
    }
}
