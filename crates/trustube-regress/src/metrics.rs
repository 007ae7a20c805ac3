//! Regression scoring metrics.

/// Computes the coefficient of determination (R²).
///
/// R² = 1 − `SS_res` / `SS_tot`, where `SS_res` is the residual sum of
/// squares of the predictions and `SS_tot` the total sum of squares of the
/// observations. Returns `0.0` when the observations are empty or have zero
/// variance, so a degenerate validation sample scores as "no better than
/// the mean" instead of producing a NaN.
///
/// # Examples
///
/// ```
/// use trustube_regress::metrics::r_squared;
///
/// let y_true = [3.0, -0.5, 2.0, 7.0];
/// let y_pred = [2.5, 0.0, 2.0, 8.0];
/// assert!(r_squared(&y_pred, &y_true) > 0.9);
/// ```
///
/// # Panics
///
/// Panics if the slices have different lengths.
#[expect(clippy::cast_precision_loss)]
#[must_use]
pub fn r_squared(y_pred: &[f64], y_true: &[f64]) -> f64 {
    assert_eq!(
        y_pred.len(),
        y_true.len(),
        "predictions and observations must have the same length"
    );
    if y_true.is_empty() {
        return 0.0;
    }

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return 0.0;
    }
    1.0 - ss_res / ss_tot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_prediction_scores_one() {
        let y = [1.0, 2.0, 3.0];
        assert!((r_squared(&y, &y) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_prediction_scores_zero() {
        let y_true = [1.0, 2.0, 3.0];
        let y_pred = [2.0, 2.0, 2.0];
        assert!(r_squared(&y_pred, &y_true).abs() < 1e-12);
    }

    #[test]
    fn test_zero_variance_observations_score_zero() {
        let y_true = [5.0, 5.0, 5.0];
        let y_pred = [4.0, 5.0, 6.0];
        assert_eq!(r_squared(&y_pred, &y_true), 0.0);
    }

    #[test]
    fn test_empty_input_scores_zero() {
        assert_eq!(r_squared(&[], &[]), 0.0);
    }
}
