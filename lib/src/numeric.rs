//! Shared numeric helpers.
//!
//! Every score derivation and both transformers go through these functions, so
//! "median", "percentile" and "clip and scale" have exactly one definition.
//! All helpers ignore NaN inputs where a statistic is computed.

use std::cmp::Ordering;

fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Median of the finite values, `None` if there are none.
pub fn median(values: &[f64]) -> Option<f64> {
    let sorted = sorted_finite(values);
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 0 {
        Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    } else {
        Some(sorted[n / 2])
    }
}

/// Quantile `q` in `[0, 1]` with linear interpolation between closest ranks.
///
/// Position is `q * (n - 1)` over the sorted finite values.
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    let sorted = sorted_finite(values);
    if sorted.is_empty() {
        return None;
    }
    let q = clip(q, 0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Largest finite value, `None` if there are none.
pub fn max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
}

/// Clamp `x` to `[lo, hi]`. NaN stays NaN.
pub fn clip(x: f64, lo: f64, hi: f64) -> f64 {
    if x < lo {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}

/// `clip((x - lo) / (hi - lo), 0, 1)`; a degenerate range scales to 0.
pub fn scale_clipped(x: f64, lo: f64, hi: f64) -> f64 {
    let span = hi - lo;
    if !span.is_finite() || span <= 0.0 || !x.is_finite() {
        return 0.0;
    }
    clip((x - lo) / span, 0.0, 1.0)
}

/// Ratio of `x` to a positive reference, clipped to `[0, 1]`.
pub fn ratio_clipped(x: f64, reference: f64) -> f64 {
    scale_clipped(x, 0.0, reference)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (x * factor).round() / factor
}

/// Replace NaN and infinities with 0.
pub fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&[4.0, 6.0]), Some(5.0));
    }

    #[test]
    fn test_median_ignores_nan() {
        assert_eq!(median(&[f64::NAN, 4.0, 6.0]), Some(5.0));
        assert_eq!(median(&[f64::NAN, f64::NAN]), None);
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        // pos = 0.9 * 4 = 3.6 -> 4 + 0.6 * (5 - 4)
        let q = quantile(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.9).unwrap();
        assert!((q - 4.6).abs() < 1e-12);
        assert_eq!(quantile(&[7.0], 0.9), Some(7.0));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_max_skips_non_finite() {
        assert_eq!(max(&[1.0, f64::NAN, 3.0, f64::INFINITY]), Some(3.0));
        assert_eq!(max(&[f64::NAN]), None);
    }

    #[test]
    fn test_scale_clipped() {
        assert_eq!(scale_clipped(5.0, 0.0, 10.0), 0.5);
        assert_eq!(scale_clipped(15.0, 0.0, 10.0), 1.0);
        assert_eq!(scale_clipped(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(scale_clipped(3.0, 2.0, 2.0), 0.0);
        assert_eq!(ratio_clipped(3.0, 0.0), 0.0);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.26, 1), 1.3);
        assert_eq!(round_to(2.345_67, 2), 2.35);
        assert_eq!(round_to(-0.25, 1), -0.3);
    }

    #[test]
    fn test_finite_or_zero() {
        assert_eq!(finite_or_zero(f64::NAN), 0.0);
        assert_eq!(finite_or_zero(f64::NEG_INFINITY), 0.0);
        assert_eq!(finite_or_zero(2.5), 2.5);
    }
}
