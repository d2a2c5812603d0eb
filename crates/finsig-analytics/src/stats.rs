//! Small numeric helpers shared by the analytics modules.

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator), 0 for fewer than two points.
pub(crate) fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let sum_sq = values
        .iter()
        .map(|value| (value - avg) * (value - avg))
        .sum::<f64>();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

/// Sample covariance of two equal-length slices.
pub(crate) fn sample_covariance(left: &[f64], right: &[f64]) -> f64 {
    debug_assert_eq!(left.len(), right.len());
    if left.len() < 2 {
        return 0.0;
    }
    let mean_left = mean(left);
    let mean_right = mean(right);
    let sum = left
        .iter()
        .zip(right)
        .map(|(a, b)| (a - mean_left) * (b - mean_right))
        .sum::<f64>();
    sum / (left.len() - 1) as f64
}

/// Ordinary least squares over `values` against index 0..n.
///
/// A zero-variance input is a perfect fit for the flat line, so it reports
/// slope 0 and r-squared 1.
pub(crate) fn linear_regression(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n < 2 {
        return (0.0, 1.0);
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = mean(values);

    let mut ss_xy = 0.0;
    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    for (index, value) in values.iter().enumerate() {
        let dx = index as f64 - x_mean;
        let dy = value - y_mean;
        ss_xy += dx * dy;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
    }

    if ss_yy == 0.0 {
        return (0.0, 1.0);
    }

    let slope = ss_xy / ss_xx;
    let r_squared = (ss_xy * ss_xy) / (ss_xx * ss_yy);
    (slope, r_squared)
}

/// Simple percentage returns between consecutive values.
pub(crate) fn simple_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|pair| {
            if pair[0] == 0.0 {
                0.0
            } else {
                pair[1] / pair[0] - 1.0
            }
        })
        .collect()
}

/// Natural-log returns between consecutive values; zero for non-positive inputs.
pub(crate) fn log_returns(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|pair| {
            if pair[0] > 0.0 && pair[1] > 0.0 {
                (pair[1] / pair[0]).ln()
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_of_constant_series_is_zero() {
        assert_eq!(sample_std(&[5.0, 5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn regression_on_line_is_exact() {
        let values: Vec<f64> = (0..10).map(|i| 3.0 + 2.0 * i as f64).collect();
        let (slope, r_squared) = linear_regression(&values);
        assert!((slope - 2.0).abs() < 1e-12);
        assert!((r_squared - 1.0).abs() < 1e-12);
    }

    #[test]
    fn regression_on_flat_series_is_zero_slope_perfect_fit() {
        let (slope, r_squared) = linear_regression(&[4.0; 8]);
        assert_eq!(slope, 0.0);
        assert_eq!(r_squared, 1.0);
    }

    #[test]
    fn covariance_of_identical_series_equals_variance() {
        let values = [1.0, 2.0, 4.0, 8.0];
        let cov = sample_covariance(&values, &values);
        let var = sample_std(&values).powi(2);
        assert!((cov - var).abs() < 1e-12);
    }
}
