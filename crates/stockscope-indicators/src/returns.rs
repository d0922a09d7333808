//! Return-series statistics with SIMD kernels.
//!
//! Uses the `wide` crate for portable SIMD over the sum and sum of squares,
//! which dominate volatility estimation over long histories.

use wide::f64x4;

/// Simple percentage returns between consecutive closes.
///
/// Pairs with a non-positive previous close are skipped.
pub fn pct_returns(closes: &[f64]) -> Vec<f64> {
    closes
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| w[1] / w[0] - 1.0)
        .collect()
}

/// Sum and sum of squares of a slice.
fn sums_simd(data: &[f64]) -> (f64, f64) {
    let mut sum = f64x4::splat(0.0);
    let mut sum_sq = f64x4::splat(0.0);

    let chunks = data.chunks_exact(4);
    let remainder = chunks.remainder();

    for chunk in chunks {
        let v = f64x4::new([chunk[0], chunk[1], chunk[2], chunk[3]]);
        sum += v;
        sum_sq += v * v;
    }

    let mut total = sum.reduce_add();
    let mut total_sq = sum_sq.reduce_add();
    for &x in remainder {
        total += x;
        total_sq += x * x;
    }

    (total, total_sq)
}

/// Mean of a slice; 0 when empty.
pub fn mean_simd(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    sums_simd(data).0 / data.len() as f64
}

/// Sample standard deviation (n - 1 denominator); 0 for fewer than two points.
pub fn std_dev_simd(data: &[f64]) -> f64 {
    let n = data.len();
    if n < 2 {
        return 0.0;
    }
    let (sum, sum_sq) = sums_simd(data);
    let mean = sum / n as f64;
    let variance = (sum_sq - n as f64 * mean * mean) / (n as f64 - 1.0);
    variance.max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_returns() {
        let r = pct_returns(&[100.0, 110.0, 99.0]);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.10).abs() < 1e-12);
        assert!((r[1] + 0.10).abs() < 1e-12);
    }

    #[test]
    fn test_pct_returns_skips_zero_base() {
        assert_eq!(pct_returns(&[0.0, 10.0, 11.0]).len(), 1);
    }

    #[test]
    fn test_mean_and_std_match_scalar() {
        let data: Vec<f64> = (0..23).map(|i| (i as f64 * 0.37).sin()).collect();
        let mean: f64 = data.iter().sum::<f64>() / data.len() as f64;
        let var: f64 =
            data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (data.len() as f64 - 1.0);

        assert!((mean_simd(&data) - mean).abs() < 1e-12);
        assert!((std_dev_simd(&data) - var.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(mean_simd(&[]), 0.0);
        assert_eq!(std_dev_simd(&[1.0]), 0.0);
        assert_eq!(std_dev_simd(&[3.0, 3.0, 3.0, 3.0, 3.0]), 0.0);
    }
}
