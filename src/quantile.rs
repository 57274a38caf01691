// 📦 Selection/Quantile Engine
// Floyd–Rivest selection + interpolated quantiles + five-number summaries
//
// Values are ordered with `f64::total_cmp`, so the selection loop always
// terminates and agrees with `sort_by(f64::total_cmp)`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Ranges wider than this get the sampling-based narrowing step first.
const NARROWING_THRESHOLD: usize = 600;

// ============================================================================
// SELECTION
// ============================================================================

#[inline]
fn less(a: f64, b: f64) -> bool {
    a.total_cmp(&b) == Ordering::Less
}

#[inline]
fn greater(a: f64, b: f64) -> bool {
    a.total_cmp(&b) == Ordering::Greater
}

/// Rearrange `values` in place so that `values[k]` holds the k-th smallest
/// element, everything left of it is `<=` and everything right of it is `>=`.
///
/// # Panics
/// Panics if `k` is out of bounds.
pub fn quickselect(values: &mut [f64], k: usize) {
    if values.is_empty() {
        return;
    }
    let right = values.len() - 1;
    quickselect_range(values, k, 0, right);
}

/// Same as [`quickselect`], restricted to `values[left..=right]`.
pub fn quickselect_range(values: &mut [f64], k: usize, mut left: usize, mut right: usize) {
    while right > left {
        if right - left > NARROWING_THRESHOLD {
            let n = (right - left + 1) as f64;
            let m = (k - left + 1) as f64;
            let z = n.ln();
            let s = 0.5 * (2.0 * z / 3.0).exp();
            let sign = if m - n / 2.0 < 0.0 { -1.0 } else { 1.0 };
            let sd = 0.5 * (z * s * (n - s) / n).sqrt() * sign;
            let lo = (k as f64 - m * s / n + sd).floor().max(0.0) as usize;
            let hi = (k as f64 + (n - m) * s / n + sd).floor().max(0.0) as usize;
            let new_left = left.max(lo);
            let new_right = right.min(hi);
            quickselect_range(values, k, new_left, new_right);
        }

        let pivot = values[k];
        let mut i = left;
        let mut j = right;

        values.swap(left, k);
        if greater(values[right], pivot) {
            values.swap(left, right);
        }

        while i < j {
            values.swap(i, j);
            i += 1;
            j -= 1;
            while less(values[i], pivot) {
                i += 1;
            }
            while greater(values[j], pivot) {
                j -= 1;
            }
        }

        if values[left].total_cmp(&pivot) == Ordering::Equal {
            values.swap(left, j);
        } else {
            j += 1;
            values.swap(j, right);
        }

        if j <= k {
            left = j + 1;
        }
        if k <= j {
            if j == 0 {
                break;
            }
            right = j - 1;
        }
    }
}

// ============================================================================
// QUANTILE
// ============================================================================

/// Linearly interpolated p-quantile at sample index `(n - 1) * p`.
///
/// Returns `None` for empty input or when `p` is not within `[0, 1]`.
/// The caller's slice is never reordered; selection runs on a private copy.
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    if values.len() == 1 {
        return Some(values[0]);
    }

    let mut work = values.to_vec();
    let index = (work.len() - 1) as f64 * p;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;

    quickselect(&mut work, lower);
    let value_lower = work[lower];

    if lower == upper {
        return Some(value_lower);
    }

    // Everything left of `lower` is already <= value_lower.
    let right = work.len() - 1;
    quickselect_range(&mut work, upper, lower, right);
    let value_upper = work[upper];

    let interpolated = value_lower + (value_upper - value_lower) * (index - lower as f64);
    Some(value_lower.max(interpolated))
}

// ============================================================================
// FIVE-NUMBER SUMMARY
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FiveNumberSummary {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// `q1 - 1.5 * IQR`, may be below every sample
    pub lower_whisker: f64,
    /// `q3 + 1.5 * IQR`
    pub upper_whisker: f64,
    pub count: usize,
}

impl FiveNumberSummary {
    /// `None` when there are no samples.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let q1 = quantile(values, 0.25)?;
        let median = quantile(values, 0.5)?;
        let q3 = quantile(values, 0.75)?;

        let mut summary = FiveNumberSummary {
            q1,
            median,
            q3,
            lower_whisker: q1,
            upper_whisker: q3,
            count: values.len(),
        };
        let reach = 1.5 * summary.iqr();
        summary.lower_whisker -= reach;
        summary.upper_whisker += reach;
        Some(summary)
    }

    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }

    /// Lower whisker as drawn on an age axis that starts at 1.
    pub fn display_lower_whisker(&self) -> f64 {
        self.lower_whisker.max(1.0)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sorted_quantile(values: &[f64], p: f64) -> f64 {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let index = (sorted.len() - 1) as f64 * p;
        let lo = index.floor() as usize;
        let hi = index.ceil() as usize;
        let lower = sorted[lo];
        lower.max(lower + (sorted[hi] - lower) * (index - lo as f64))
    }

    #[test]
    fn test_median_of_odd_sample() {
        assert_eq!(quantile(&[7.0, 2.0, 9.0, 4.0, 1.0], 0.5), Some(4.0));
    }

    #[test]
    fn test_interpolates_between_order_statistics() {
        // sorted [1, 2, 4, 7], index 0.75 * 3 = 2.25 → 4 + 3 * 0.25
        let q = quantile(&[7.0, 1.0, 4.0, 2.0], 0.75).unwrap();
        assert_relative_eq!(q, 4.75);
    }

    #[test]
    fn test_invalid_input_returns_none() {
        assert_eq!(quantile(&[], 0.5), None);
        assert_eq!(quantile(&[1.0, 2.0], -0.1), None);
        assert_eq!(quantile(&[1.0, 2.0], 1.1), None);
        assert_eq!(quantile(&[1.0, 2.0], f64::NAN), None);
    }

    #[test]
    fn test_single_element() {
        assert_eq!(quantile(&[42.0], 0.0), Some(42.0));
        assert_eq!(quantile(&[42.0], 0.9), Some(42.0));
    }

    #[test]
    fn test_does_not_reorder_caller_slice() {
        let values = vec![5.0, 3.0, 1.0];
        let _ = quantile(&values, 0.5);
        assert_eq!(values, vec![5.0, 3.0, 1.0]);
    }

    #[test]
    fn test_quickselect_places_kth_element() {
        let mut values = vec![9.0, 1.0, 8.0, 2.0, 7.0, 3.0, 6.0, 4.0, 5.0];
        quickselect(&mut values, 4);
        assert_eq!(values[4], 5.0);
        assert!(values[..4].iter().all(|v| *v <= 5.0));
        assert!(values[5..].iter().all(|v| *v >= 5.0));
    }

    #[test]
    fn test_matches_full_sort_on_random_samples() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let probabilities = [0.0, 0.1, 0.25, 0.33, 0.5, 0.75, 0.9, 1.0];

        for _ in 0..200 {
            let len = rng.random_range(1..60);
            let values: Vec<f64> = (0..len)
                .map(|_| f64::from(rng.random_range(-50..50)))
                .collect();
            for &p in &probabilities {
                assert_eq!(quantile(&values, p), Some(sorted_quantile(&values, p)));
            }
        }
    }

    #[test]
    fn test_matches_full_sort_above_narrowing_threshold() {
        let mut rng = StdRng::seed_from_u64(17);
        for len in [601, 1_000, 5_003] {
            let values: Vec<f64> = (0..len).map(|_| rng.random_range(0.0..120.0)).collect();
            for p in [0.25, 0.5, 0.75, 0.999] {
                assert_eq!(quantile(&values, p), Some(sorted_quantile(&values, p)));
            }
        }
    }

    #[test]
    fn test_handles_heavy_duplicates() {
        let values: Vec<f64> = (0..2_000).map(|i| f64::from(i % 3)).collect();
        for p in [0.0, 0.2, 0.5, 0.8, 1.0] {
            assert_eq!(quantile(&values, p), Some(sorted_quantile(&values, p)));
        }
    }

    #[test]
    fn test_five_number_summary() {
        let summary = FiveNumberSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(summary.q1, 2.0);
        assert_eq!(summary.median, 3.0);
        assert_eq!(summary.q3, 4.0);
        assert_eq!(summary.iqr(), 2.0);
        assert_eq!(summary.lower_whisker, -1.0);
        assert_eq!(summary.upper_whisker, 7.0);
        assert_eq!(summary.display_lower_whisker(), 1.0);
        assert_eq!(summary.count, 5);
    }

    #[test]
    fn test_five_number_summary_empty() {
        assert!(FiveNumberSummary::from_values(&[]).is_none());
    }

    #[test]
    fn test_summary_is_monotone() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let len = rng.random_range(1..300);
            let values: Vec<f64> = (0..len).map(|_| rng.random_range(0.0..110.0)).collect();
            let s = FiveNumberSummary::from_values(&values).unwrap();
            assert!(s.q1 <= s.median && s.median <= s.q3, "{:?}", s);
            assert!(s.lower_whisker <= s.q1 && s.q3 <= s.upper_whisker);
        }
    }
}
