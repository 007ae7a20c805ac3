//! Random-subspace candidate generation for one target variable.

use rand::{Rng, seq::IndexedRandom};
use trustube_collection::{SignalSet, Unit};
use trustube_regress::{LinearRegression, Regressor};

use crate::{
    TrainError,
    candidate::{CandidatePopulation, RegressionCandidate},
    params::LearnParams,
    progress::ProgressObserver,
};

/// Outcome of one candidate-generation pass for a single target.
#[derive(Debug)]
pub(crate) struct GeneratedEnsemble {
    /// Retained candidates, at most `keep_best_number`.
    pub candidates: Vec<RegressionCandidate>,
    /// Sum of row counts across all units, accumulated on the first trial.
    pub total_rows: usize,
}

/// Runs up to `retry_number` random-subspace trials for `target`.
///
/// Each trial draws a random predictor subset, pools a with-replacement
/// training sample and a disjoint-by-row validation sample from every unit,
/// fits an OLS candidate and offers it to the best-K population. A run of
/// `keep_best_number` non-improving trials stops the search early; skipped
/// trials are reported to the progress observer in one bulk advance.
///
/// The cursor is moved across all units; the caller wraps the training run
/// in a cursor scope that restores the original position.
pub(crate) fn generate<R>(
    set: &mut SignalSet,
    target: &str,
    factors: &[String],
    params: &LearnParams,
    rng: &mut R,
    progress: &mut dyn ProgressObserver,
) -> Result<GeneratedEnsemble, TrainError>
where
    R: Rng + ?Sized,
{
    let target_index = set.column_index(target)?;
    let mut cols = Vec::with_capacity(factors.len());
    for name in factors {
        if name != target {
            cols.push((name.clone(), set.column_index(name)?));
        }
    }
    if cols.is_empty() {
        return Err(TrainError::NoPredictors {
            variable: target.to_owned(),
        });
    }
    if params.max_features == 0 {
        return Err(TrainError::NoFeatureBudget);
    }

    let mut population = CandidatePopulation::new(params.keep_best_number);
    let mut total_rows = 0_usize;

    for trial in 0..params.retry_number {
        progress.advance(1);

        // Random subspace: n = min(r, max_features, |cols|) distinct
        // predictors, r uniform in [1, |cols|].
        let r = rng.random_range(1..=cols.len());
        let n = r.min(params.max_features);
        let selected: Vec<(String, usize)> = cols.choose_multiple(rng, n).cloned().collect();

        // Pool split-sample rows from every unit into one training table
        // and one validation table.
        let mut train_x = vec![Vec::new(); selected.len()];
        let mut train_y = Vec::new();
        let mut valid_x = vec![Vec::new(); selected.len()];
        let mut valid_y = Vec::new();

        for pos in 0..set.len() {
            set.seek(pos)?;
            let unit = set.current()?;
            let rows = unit.rows();
            if trial == 0 {
                total_rows += rows;
            }
            if rows == 0 {
                continue;
            }

            let want = sample_size(rows, params.samples_percent);
            let mut in_train = vec![false; rows];
            for _ in 0..want {
                let row = rng.random_range(0..rows);
                in_train[row] = true;
                push_row(unit, &selected, target_index, row, &mut train_x, &mut train_y);
            }
            // Validation rows come from the complement of the training
            // draw, again sampled with replacement.
            let holdout: Vec<usize> = (0..rows).filter(|&row| !in_train[row]).collect();
            if holdout.is_empty() {
                continue;
            }
            for _ in 0..want {
                let row = holdout[rng.random_range(0..holdout.len())];
                push_row(unit, &selected, target_index, row, &mut valid_x, &mut valid_y);
            }
        }

        if train_y.is_empty() || valid_y.is_empty() {
            population.record_miss();
        } else {
            let mut model = LinearRegression::new();
            let x: Vec<&[f64]> = train_x.iter().map(Vec::as_slice).collect();
            match model.fit(&x, &train_y) {
                Ok(()) => {
                    let vx: Vec<&[f64]> = valid_x.iter().map(Vec::as_slice).collect();
                    let score = model.score(&vx, &valid_y);
                    let features = selected.into_iter().map(|(name, _)| name).collect();
                    population.offer(RegressionCandidate::new(Box::new(model), features, score));
                }
                // A singular or undersized draw must not abort training;
                // the trial simply fails to improve the population.
                Err(_) => population.record_miss(),
            }
        }

        if population.exhausted() {
            let skipped = params.retry_number - trial - 1;
            if skipped > 0 {
                progress.advance(skipped);
            }
            break;
        }
    }

    Ok(GeneratedEnsemble {
        candidates: population.into_candidates(),
        total_rows,
    })
}

/// Rows drawn per unit: `ceil(rows × samples_percent)`.
#[expect(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn sample_size(rows: usize, samples_percent: f64) -> usize {
    ((rows as f64) * samples_percent).ceil() as usize
}

/// Appends one unit row to the pooled feature columns and target.
fn push_row(
    unit: &Unit,
    selected: &[(String, usize)],
    target_index: usize,
    row: usize,
    x: &mut [Vec<f64>],
    y: &mut Vec<f64>,
) {
    for (slot, (_, index)) in x.iter_mut().zip(selected) {
        slot.push(unit.column(*index)[row]);
    }
    y.push(unit.column(target_index)[row]);
}
