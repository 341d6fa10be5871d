//! Small numeric helpers shared by the aggregation and report code.
//!
//! Callers sort their samples with [`sorted`] before summing so that the
//! result does not depend on input order.

/// Collects the values and sorts them ascending with a total order.
pub fn sorted(values: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut values: Vec<f64> = values.into_iter().collect();
    values.sort_by(f64::total_cmp);
    values
}

/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median of an ascending slice. Returns `None` for empty input.
pub fn median(sorted_values: &[f64]) -> Option<f64> {
    let n = sorted_values.len();
    match n {
        0 => None,
        _ if n % 2 == 0 => Some((sorted_values[n / 2 - 1] + sorted_values[n / 2]) / 2.0),
        _ => Some(sorted_values[n / 2]),
    }
}

/// Computes the population standard deviation given a pre-computed mean.
/// Returns 0.0 for empty input.
pub fn stddev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;

    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_handles_negative_values() {
        assert_eq!(sorted([-6.0, -10.0, 3.0]), vec![-10.0, -6.0, 3.0]);
    }

    #[test]
    fn test_mean_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[-10.0, -6.0]), Some(-8.0));
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[-15.0]), Some(-15.0));
        assert_eq!(median(&[-10.0, -6.0]), Some(-8.0));
        assert_eq!(median(&[-20.0, -10.0, -1.0]), Some(-10.0));
    }

    #[test]
    fn test_stddev() {
        assert_eq!(stddev(&[], 0.0), 0.0);
        assert_eq!(stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0], 5.0), 2.0);
    }
}
