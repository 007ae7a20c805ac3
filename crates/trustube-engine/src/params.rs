//! Explicit training configuration.
//!
//! Parameters are passed into [`TubeModel::fit`](crate::TubeModel::fit)
//! rather than stored on the model, so retraining with different settings
//! has no side effects on the trained state until the run succeeds. No
//! validation happens at construction; out-of-range values surface as
//! training errors or degenerate output at the next `fit`.

use serde::{Deserialize, Serialize};

/// Candidate-generation and selection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LearnParams {
    /// Number of random-subspace trials attempted per target variable.
    pub retry_number: usize,
    /// Population size: how many best candidates are retained. Also the
    /// consecutive-miss count that stops the trials early. Assumed to be
    /// at most `retry_number`; a larger value simply never fills the
    /// population.
    pub keep_best_number: usize,
    /// Fraction of each unit's rows drawn (with replacement) for training,
    /// and again for validation from the remaining rows. Expected in
    /// `(0, 1]`.
    pub samples_percent: f64,
    /// Upper bound on the number of predictor columns per candidate.
    pub max_features: usize,
}

impl Default for LearnParams {
    fn default() -> Self {
        Self {
            retry_number: 10,
            keep_best_number: 5,
            samples_percent: 0.01,
            max_features: 5,
        }
    }
}

/// Envelope calibration parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TubeParams {
    /// Target tail fraction of residuals the envelope should keep inside
    /// on each side. Expected in `(0, 1]`.
    pub tube_threshold: f64,
}

impl Default for TubeParams {
    fn default() -> Self {
        Self {
            tube_threshold: 0.01,
        }
    }
}

/// Complete configuration for one training run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
pub struct TrainConfig {
    /// Candidate generation and selection.
    pub learn: LearnParams,
    /// Envelope calibration.
    pub tube: TubeParams,
}
