//! Small statistics helpers shared by validation and intervention.
//!
//! Every function guards against NaN/Inf and degenerate inputs; callers
//! never see a poisoned value.

use serde::{Deserialize, Serialize};

/// A two-sided confidence interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
    /// Nominal coverage level, e.g. 0.95.
    pub level: f64,
}

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    if m.is_finite() {
        m
    } else {
        0.0
    }
}

/// Unbiased sample variance. Returns 0.0 for fewer than two values.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let v = values.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

/// Linear-interpolated percentile of a sorted slice, `q` in [0, 1].
///
/// The slice must already be sorted ascending; pass unsorted data through
/// [`percentile_of`] instead.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = pos - lo as f64;
        sorted[lo] * (1.0 - frac) + sorted[hi] * frac
    }
}

/// Percentile of unsorted data; NaN values are dropped first.
pub fn percentile_of(values: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    percentile_sorted(&sorted, q)
}

/// Percentile interval over a sample, e.g. level 0.95 → [2.5th, 97.5th].
pub fn percentile_interval(values: &[f64], level: f64) -> ConfidenceInterval {
    let tail = (1.0 - level.clamp(0.0, 1.0)) / 2.0;
    ConfidenceInterval {
        low: percentile_of(values, tail),
        high: percentile_of(values, 1.0 - tail),
        level,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_variance() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((variance(&values) - 32.0 / 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_inputs_are_safe() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(variance(&[1.0]), 0.0);
        assert_eq!(percentile_of(&[], 0.5), 0.0);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile_of(&values, 0.5) - 2.5).abs() < 1e-12);
        assert_eq!(percentile_of(&values, 0.0), 1.0);
        assert_eq!(percentile_of(&values, 1.0), 4.0);
    }

    #[test]
    fn test_percentile_interval_covers_bulk() {
        let values: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let ci = percentile_interval(&values, 0.95);
        assert!((ci.low - 2.5).abs() < 1e-9);
        assert!((ci.high - 97.5).abs() < 1e-9);
    }

    #[test]
    fn test_nan_values_dropped() {
        let values = [1.0, f64::NAN, 3.0];
        assert!((percentile_of(&values, 0.5) - 2.0).abs() < 1e-12);
    }
}
