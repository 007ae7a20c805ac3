//! Ordinary least squares behind the [`Regressor`] capability.

use std::{fmt, iter};

use crate::metrics::r_squared;

/// Errors raised when fitting a regression model.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum FitError {
    /// No feature columns were supplied.
    #[display("at least one feature column is required")]
    NoFeatures,
    /// Feature columns and target do not share one length.
    #[display("feature columns and target must share the same length")]
    LengthMismatch,
    /// Fewer samples than unknowns; the system is underdetermined.
    #[display("need at least {required} samples, got {samples}")]
    TooFewSamples { samples: usize, required: usize },
    /// The normal equations are singular (e.g. duplicated or constant
    /// feature columns); no unique least-squares solution exists.
    #[display("normal equations are not positive definite")]
    NotPositiveDefinite,
}

/// A fitted predictor usable as a tube ensemble member.
///
/// Feature data is column-major: `x[j]` is the full value column of feature
/// `j`, and all columns share one length (the number of rows).
pub trait Regressor: fmt::Debug + Send + Sync {
    /// Fits the model on feature columns `x` against the target `y`.
    fn fit(&mut self, x: &[&[f64]], y: &[f64]) -> Result<(), FitError>;

    /// Predicts one value per row of the feature columns.
    fn predict(&self, x: &[&[f64]]) -> Vec<f64>;

    /// Scores predictions on `x` against `y` with the coefficient of
    /// determination (R²).
    fn score(&self, x: &[&[f64]], y: &[f64]) -> f64 {
        r_squared(&self.predict(x), y)
    }
}

/// Ordinary Least Squares (OLS) linear regression with intercept.
///
/// Solves the normal equations `(XᵀX) β = Xᵀy` via Cholesky decomposition,
/// with the intercept folded in as a leading all-ones design column.
///
/// # Examples
///
/// ```
/// use trustube_regress::{LinearRegression, Regressor};
///
/// // y = 3a - b + 2
/// let x: [&[f64]; 2] = [&[0.0, 1.0, 2.0, 3.0], &[1.0, 0.0, 1.0, 0.0]];
/// let y = [1.0, 5.0, 7.0, 11.0];
///
/// let mut model = LinearRegression::new();
/// model.fit(&x, &y).unwrap();
///
/// assert!((model.intercept() - 2.0).abs() < 1e-9);
/// assert!((model.coefficients()[0] - 3.0).abs() < 1e-9);
/// assert!((model.coefficients()[1] + 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    coefficients: Option<Vec<f64>>,
    intercept: f64,
}

impl LinearRegression {
    /// Creates an unfitted model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the fitted feature coefficients (excluding the intercept).
    ///
    /// # Panics
    ///
    /// Panics if the model has not been fitted.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        self.coefficients
            .as_deref()
            .expect("model not fitted, call fit() first")
    }

    /// Returns the intercept term.
    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Returns `true` once the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

impl Regressor for LinearRegression {
    fn fit(&mut self, x: &[&[f64]], y: &[f64]) -> Result<(), FitError> {
        let features = x.len();
        if features == 0 {
            return Err(FitError::NoFeatures);
        }
        let samples = y.len();
        if x.iter().any(|column| column.len() != samples) {
            return Err(FitError::LengthMismatch);
        }
        // One unknown per feature plus the intercept.
        let unknowns = features + 1;
        if samples < unknowns {
            return Err(FitError::TooFewSamples {
                samples,
                required: unknowns,
            });
        }

        // Accumulate XᵀX and Xᵀy over the design rows [1, x₀, x₁, …].
        let mut xtx = vec![0.0; unknowns * unknowns];
        let mut xty = vec![0.0; unknowns];
        let mut design = vec![0.0; unknowns];
        for row in 0..samples {
            design[0] = 1.0;
            for (slot, column) in design[1..].iter_mut().zip(x) {
                *slot = column[row];
            }
            for i in 0..unknowns {
                xty[i] += design[i] * y[row];
                for j in 0..unknowns {
                    xtx[i * unknowns + j] += design[i] * design[j];
                }
            }
        }

        let beta = cholesky_solve(&xtx, &xty, unknowns)?;
        self.intercept = beta[0];
        self.coefficients = Some(beta[1..].to_vec());
        Ok(())
    }

    /// # Panics
    ///
    /// Panics if the model has not been fitted or if the number of feature
    /// columns differs from the fitted model.
    fn predict(&self, x: &[&[f64]]) -> Vec<f64> {
        let coefficients = self.coefficients();
        assert_eq!(
            x.len(),
            coefficients.len(),
            "feature count must match the fitted model"
        );
        let rows = x.first().map_or(0, |column| column.len());
        (0..rows)
            .map(|row| {
                self.intercept
                    + iter::zip(coefficients, x)
                        .map(|(weight, column)| weight * column[row])
                        .sum::<f64>()
            })
            .collect()
    }
}

/// Solves `A x = b` for a symmetric positive definite `A` (row-major,
/// `n × n`) via Cholesky decomposition `A = L Lᵀ`.
fn cholesky_solve(a: &[f64], b: &[f64], n: usize) -> Result<Vec<f64>, FitError> {
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            if i == j {
                for k in 0..j {
                    sum += l[j * n + k] * l[j * n + k];
                }
                let diag = a[j * n + j] - sum;
                if diag <= 0.0 {
                    return Err(FitError::NotPositiveDefinite);
                }
                l[j * n + j] = diag.sqrt();
            } else {
                for k in 0..j {
                    sum += l[i * n + k] * l[j * n + k];
                }
                l[i * n + j] = (a[i * n + j] - sum) / l[j * n + j];
            }
        }
    }

    // Forward substitution: L z = b.
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[i * n + j] * z[j];
        }
        z[i] = (b[i] - sum) / l[i * n + i];
    }

    // Backward substitution: Lᵀ x = z.
    let mut solution = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[j * n + i] * solution[j];
        }
        solution[i] = (z[i] - sum) / l[i * n + i];
    }
    Ok(solution)
}
