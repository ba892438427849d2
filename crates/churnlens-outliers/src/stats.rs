//! Descriptive statistics over one-dimensional samples.
//!
//! Spread is always the population standard deviation (divide by `n`), so a
//! single value or a constant sample has zero spread.

use std::cmp::Ordering;

/// Arithmetic mean. `None` for an empty sample.
///
/// # Examples
///
/// ```
/// use churnlens_outliers::stats::mean;
///
/// assert_eq!(mean(&[9.0, 2.0, 100.0]), Some(37.0));
/// assert_eq!(mean(&[]), None);
/// ```
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median. Even-length samples average the two middle values.
///
/// # Examples
///
/// ```
/// use churnlens_outliers::stats::median;
///
/// assert_eq!(median(&[1.0, 50.0, 1.0, 1.0]), Some(1.0));
/// assert_eq!(median(&[1.0, 2.0, 3.0, 10.0]), Some(2.5));
/// ```
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Population standard deviation around `mean`. `None` for an empty sample.
///
/// # Examples
///
/// ```
/// use churnlens_outliers::stats::population_std_dev;
///
/// let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
/// assert_eq!(population_std_dev(&values, 5.0), Some(2.0));
/// ```
pub fn population_std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let variance = values
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}
