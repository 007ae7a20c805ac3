//! The tube model: training, estimation and diagnostics.

use rand::Rng;
use trustube_collection::{CollectionError, SignalSet};
use trustube_stats::summary::Summary;

use crate::{
    TrainError, calibrate,
    candidate::RegressionCandidate,
    diagnose::FactorUsage,
    envelope::{self, Envelope, ScalePair},
    generator,
    params::TrainConfig,
    progress::{NullProgress, ProgressObserver},
};

/// Trained state for one target variable: the retained candidates and the
/// calibration scale pair.
#[derive(Debug)]
pub struct VariableEnsemble {
    variable: String,
    candidates: Vec<RegressionCandidate>,
    scale: ScalePair,
}

impl VariableEnsemble {
    pub(crate) fn new(variable: String, candidates: Vec<RegressionCandidate>) -> Self {
        Self {
            variable,
            candidates,
            scale: ScalePair::default(),
        }
    }

    /// Returns the target variable this ensemble predicts.
    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Returns the retained candidates in insertion order.
    #[must_use]
    pub fn candidates(&self) -> &[RegressionCandidate] {
        &self.candidates
    }

    /// Returns the calibration scale pair (`(1, 1)` until calibrated).
    #[must_use]
    pub fn scale(&self) -> ScalePair {
        self.scale
    }

    pub(crate) fn set_scale(&mut self, scale: ScalePair) {
        self.scale = scale;
    }
}

/// A trust envelope over the signals of a recording collection.
///
/// The model owns its [`SignalSet`]: training scans all units (restoring
/// the cursor afterwards), estimation reads the unit currently under the
/// cursor, and external consumers keep driving the cursor and selected
/// column through [`TubeModel::collection_mut`].
///
/// Targets default to the collection's first column and predictors to all
/// columns; both are adjustable before training. Between trainings the
/// model answers estimates from whatever trained state exists, degenerate
/// NaN envelopes included.
#[derive(Debug)]
pub struct TubeModel {
    set: SignalSet,
    variables: Vec<String>,
    factors: Vec<String>,
    ensembles: Vec<VariableEnsemble>,
    total_rows: usize,
}

impl TubeModel {
    /// Wraps a collection with default targets (the first column) and
    /// factors (every column).
    #[must_use]
    pub fn new(set: SignalSet) -> Self {
        let variables = vec![set.columns()[0].clone()];
        let factors = set.columns().to_vec();
        Self {
            set,
            variables,
            factors,
            ensembles: Vec::new(),
            total_rows: 0,
        }
    }

    /// Returns the wrapped collection.
    #[must_use]
    pub fn collection(&self) -> &SignalSet {
        &self.set
    }

    /// Returns the wrapped collection mutably, for cursor and column
    /// selection by the consumer.
    pub fn collection_mut(&mut self) -> &mut SignalSet {
        &mut self.set
    }

    /// Returns the target variables.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Returns the candidate predictor columns.
    #[must_use]
    pub fn factors(&self) -> &[String] {
        &self.factors
    }

    /// Replaces the target variables.
    ///
    /// # Errors
    ///
    /// Rejects an empty list and names that do not resolve against the
    /// collection schema.
    pub fn set_variables<I>(&mut self, variables: I) -> Result<&mut Self, TrainError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let variables: Vec<String> = variables.into_iter().map(Into::into).collect();
        if variables.is_empty() {
            return Err(TrainError::NoVariables);
        }
        for name in &variables {
            self.set.column_index(name)?;
        }
        self.variables = variables;
        Ok(self)
    }

    /// Replaces the candidate predictor columns.
    ///
    /// # Errors
    ///
    /// Rejects names that do not resolve against the collection schema. An
    /// insufficient factor list only surfaces at the next training run.
    pub fn set_factors<I>(&mut self, factors: I) -> Result<&mut Self, TrainError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let factors: Vec<String> = factors.into_iter().map(Into::into).collect();
        for name in &factors {
            self.set.column_index(name)?;
        }
        self.factors = factors;
        Ok(self)
    }

    /// Returns the trained ensemble for a variable, if any.
    #[must_use]
    pub fn ensemble(&self, variable: &str) -> Option<&VariableEnsemble> {
        self.ensembles
            .iter()
            .find(|ensemble| ensemble.variable() == variable)
    }

    /// Returns all trained ensembles in training order.
    #[must_use]
    pub fn ensembles(&self) -> &[VariableEnsemble] {
        &self.ensembles
    }

    /// Returns the row count cached during the last training run.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.total_rows
    }

    /// Trains ensembles and calibration for every target variable using the
    /// thread-local RNG and no progress reporting.
    ///
    /// # Errors
    ///
    /// See [`TubeModel::fit_with`].
    pub fn fit(&mut self, config: &TrainConfig) -> Result<&mut Self, TrainError> {
        let mut rng = rand::rng();
        self.fit_with(config, &mut rng, &mut NullProgress)
    }

    /// Trains ensembles and calibration for every target variable.
    ///
    /// Runs the candidate generator per target, then one calibration pass
    /// over the whole collection, and installs the new trained state
    /// wholesale. The collection cursor is restored on every exit path.
    /// Reproducible for a fixed seed; returns `&mut self` for chaining.
    ///
    /// # Errors
    ///
    /// [`TrainError::NoData`] if the collection is empty (checked before
    /// any work; no state is mutated), configuration errors from the
    /// candidate generator, and collection errors surfaced unchanged. On
    /// error the previous trained state is kept.
    pub fn fit_with<R>(
        &mut self,
        config: &TrainConfig,
        rng: &mut R,
        progress: &mut dyn ProgressObserver,
    ) -> Result<&mut Self, TrainError>
    where
        R: Rng + ?Sized,
    {
        if self.set.is_empty() {
            return Err(TrainError::NoData {
                name: self.set.name().to_owned(),
            });
        }
        progress.begin(self.variables.len() * config.learn.retry_number + 1);

        let mut trained = Vec::with_capacity(self.variables.len());
        let mut total_rows = 0_usize;
        {
            let mut scope = self.set.cursor_scope();
            for variable in &self.variables {
                progress.status(&format!("learning target {variable}"));
                let generated = generator::generate(
                    &mut scope,
                    variable,
                    &self.factors,
                    &config.learn,
                    rng,
                    progress,
                )?;
                total_rows = generated.total_rows;
                let scores = generated.candidates.iter().map(RegressionCandidate::score);
                if let Some(summary) = Summary::new(scores) {
                    progress.status(&format!(
                        "target {variable}: kept {} candidates, R2 mean {:.3} in [{:.3}, {:.3}]",
                        summary.count, summary.mean, summary.min, summary.max
                    ));
                }
                trained.push(VariableEnsemble::new(variable.clone(), generated.candidates));
            }

            progress.status("computing extreme quantiles");
            progress.advance(1);
            calibrate::calibrate(&mut scope, &mut trained, &config.tube, total_rows)?;
        }
        self.ensembles = trained;
        self.total_rows = total_rows;
        Ok(self)
    }

    /// Estimates the collection's currently selected column on the current
    /// unit. See [`TubeModel::estimate_for`].
    ///
    /// # Errors
    ///
    /// See [`TubeModel::estimate_for`].
    pub fn estimate(&self) -> Result<Envelope, CollectionError> {
        let variable = self.set.selected_column().to_owned();
        self.estimate_for(&variable)
    }

    /// Estimates a target variable on the unit under the cursor.
    ///
    /// For a trained variable, every ensemble candidate predicts the unit
    /// and the per-row mean/min/max across candidates is rescaled by the
    /// calibration pair. For an untrained variable the result is the
    /// degenerate all-NaN envelope with one entry per row. Pure: no cursor
    /// movement, no state change.
    ///
    /// # Errors
    ///
    /// [`CollectionError::UnknownColumn`] if the name does not resolve,
    /// [`CollectionError::NoData`] if the collection has no current unit.
    pub fn estimate_for(&self, variable: &str) -> Result<Envelope, CollectionError> {
        self.set.column_index(variable)?;
        let unit = self.set.current()?;
        let ensemble = self
            .ensemble(variable)
            .filter(|ensemble| !ensemble.candidates().is_empty());
        let Some(ensemble) = ensemble else {
            return Ok(Envelope::degenerate(unit.rows()));
        };
        let raw = envelope::raw_envelope(ensemble.candidates(), &self.set, unit)?;
        Ok(raw.scaled(ensemble.scale()))
    }

    /// Reports how often each factor was selected across every target's
    /// ensemble.
    #[must_use]
    pub fn describe(&self) -> FactorUsage {
        FactorUsage::from_ensembles(&self.variables, &self.factors, &self.ensembles)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_distr::{Distribution as _, Normal};
    use rand_pcg::Pcg64;
    use trustube_collection::Unit;

    use super::*;
    use crate::{params::LearnParams, progress::testing::RecordingProgress};

    /// Two units of 50 rows each over columns `[A, B, C]`, with `A`
    /// linearly driven by `B` and `C` plus small Gaussian noise.
    fn scenario_set() -> SignalSet {
        let mut rng = Pcg64::seed_from_u64(99);
        let noise = Normal::new(0.0, 0.05).unwrap();
        let mut set = SignalSet::new("bench", ["A", "B", "C"]).unwrap();
        for u in 0..2_usize {
            #[expect(clippy::cast_precision_loss)]
            let b: Vec<f64> = (0..50).map(|i| (u * 50 + i) as f64 * 0.2).collect();
            let c: Vec<f64> = b.iter().map(|v| (v * 0.65).sin() * 3.0).collect();
            let a: Vec<f64> = b
                .iter()
                .zip(&c)
                .map(|(b, c)| 1.5 * b - 0.7 * c + noise.sample(&mut rng))
                .collect();
            set.push(Unit::new(format!("u{u}"), vec![a, b, c]).unwrap())
                .unwrap();
        }
        set
    }

    fn scenario_config() -> TrainConfig {
        TrainConfig {
            learn: LearnParams {
                retry_number: 5,
                keep_best_number: 2,
                samples_percent: 0.2,
                max_features: 2,
            },
            ..TrainConfig::default()
        }
    }

    #[test]
    fn test_scenario_end_to_end() {
        let mut model = TubeModel::new(scenario_set());
        let mut rng = Pcg64::seed_from_u64(42);
        model
            .fit_with(&scenario_config(), &mut rng, &mut NullProgress)
            .unwrap();

        // Ensemble size bound and feature subsets drawn from {B, C}.
        let ensemble = model.ensemble("A").unwrap();
        assert!(!ensemble.candidates().is_empty());
        assert!(ensemble.candidates().len() <= 2);
        for candidate in ensemble.candidates() {
            assert!(!candidate.features().is_empty());
            assert!(candidate.features().len() <= 2);
            for feature in candidate.features() {
                assert!(feature == "B" || feature == "C");
            }
        }
        let scale = ensemble.scale();
        assert!(scale.qmin >= 0.0 && scale.qmax >= 0.0);

        // Envelope ordering over all rows of the current unit.
        let envelope = model.estimate_for("A").unwrap();
        assert_eq!(envelope.len(), 50);
        for row in 0..envelope.len() {
            assert!(
                envelope.lower[row] <= envelope.center[row]
                    && envelope.center[row] <= envelope.upper[row],
                "row {row}: {} ≰ {} ≰ {}",
                envelope.lower[row],
                envelope.center[row],
                envelope.upper[row],
            );
        }

        // Diagnostics consistency: cell counts sum to the total subset
        // sizes across the ensemble.
        let usage = model.describe();
        assert_eq!(usage.variables().len(), 1);
        assert_eq!(usage.variables()[0], "A");
        assert_eq!(usage.count("A", "A"), Some(0));
        let subset_sizes: usize = ensemble
            .candidates()
            .iter()
            .map(|candidate| candidate.features().len())
            .sum();
        assert_eq!(usage.row_total("A"), Some(subset_sizes));
    }

    #[test]
    fn test_estimate_before_training_is_degenerate() {
        let model = TubeModel::new(scenario_set());
        let envelope = model.estimate_for("A").unwrap();

        assert_eq!(envelope.len(), 50);
        assert!(envelope.is_degenerate());
        assert!(envelope.lower.iter().all(|v| v.is_nan()));
        assert!(envelope.upper.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_fit_on_empty_collection_fails_without_mutation() {
        let set = SignalSet::new("empty", ["A", "B"]).unwrap();
        let mut model = TubeModel::new(set);
        let mut rng = Pcg64::seed_from_u64(0);

        let err = model
            .fit_with(&scenario_config(), &mut rng, &mut NullProgress)
            .unwrap_err();
        assert!(matches!(err, TrainError::NoData { .. }));
        assert!(model.ensembles().is_empty());
        assert_eq!(model.total_rows(), 0);
    }

    #[test]
    fn test_unknown_variable_surfaces_collection_error() {
        let model = TubeModel::new(scenario_set());
        let err = model.estimate_for("Z").unwrap_err();
        assert!(matches!(err, CollectionError::UnknownColumn { .. }));
    }

    #[test]
    fn test_estimate_defaults_to_selected_column() {
        let mut model = TubeModel::new(scenario_set());
        let mut rng = Pcg64::seed_from_u64(42);
        model
            .fit_with(&scenario_config(), &mut rng, &mut NullProgress)
            .unwrap();

        // "B" was never a target, so the default estimate degenerates once
        // the consumer selects it.
        model.collection_mut().select("B").unwrap();
        assert!(model.estimate().unwrap().is_degenerate());

        model.collection_mut().select("A").unwrap();
        assert!(!model.estimate().unwrap().is_degenerate());
    }

    #[test]
    fn test_cursor_restored_after_training() {
        let mut model = TubeModel::new(scenario_set());
        model.collection_mut().seek(1).unwrap();
        let mut rng = Pcg64::seed_from_u64(7);
        model
            .fit_with(&scenario_config(), &mut rng, &mut NullProgress)
            .unwrap();
        assert_eq!(model.collection().cursor(), 1);
    }

    #[test]
    fn test_cursor_restored_when_training_fails() {
        let mut model = TubeModel::new(scenario_set());
        model.collection_mut().seek(1).unwrap();
        model.set_factors(["A"]).unwrap();

        let mut rng = Pcg64::seed_from_u64(7);
        let err = model
            .fit_with(&scenario_config(), &mut rng, &mut NullProgress)
            .unwrap_err();
        assert!(matches!(err, TrainError::NoPredictors { .. }));
        assert_eq!(model.collection().cursor(), 1);
        assert!(model.ensembles().is_empty(), "failed run must not install state");
    }

    #[test]
    fn test_refit_replaces_trained_state() {
        let mut model = TubeModel::new(scenario_set());
        let mut rng = Pcg64::seed_from_u64(11);
        model
            .fit_with(&scenario_config(), &mut rng, &mut NullProgress)
            .unwrap();

        let tighter = TrainConfig {
            learn: LearnParams {
                keep_best_number: 1,
                ..scenario_config().learn
            },
            ..TrainConfig::default()
        };
        model
            .fit_with(&tighter, &mut rng, &mut NullProgress)
            .unwrap();
        assert_eq!(model.ensemble("A").unwrap().candidates().len(), 1);
    }

    #[test]
    fn test_multiple_targets() {
        let mut model = TubeModel::new(scenario_set());
        model.set_variables(["A", "B"]).unwrap();
        let mut rng = Pcg64::seed_from_u64(21);
        model
            .fit_with(&scenario_config(), &mut rng, &mut NullProgress)
            .unwrap();

        assert_eq!(model.ensembles().len(), 2);
        assert!(model.ensemble("B").is_some());
        let usage = model.describe();
        assert_eq!(usage.variables().len(), 2);
        for candidate in model.ensemble("B").unwrap().candidates() {
            for feature in candidate.features() {
                assert_ne!(feature, "B");
            }
        }
        assert!(!model.estimate_for("B").unwrap().is_degenerate());
    }

    #[test]
    fn test_progress_steps_add_up() {
        let mut model = TubeModel::new(scenario_set());
        model.set_variables(["A", "B"]).unwrap();
        let mut rng = Pcg64::seed_from_u64(5);
        let mut progress = RecordingProgress::default();
        model
            .fit_with(&scenario_config(), &mut rng, &mut progress)
            .unwrap();

        let retry = scenario_config().learn.retry_number;
        assert_eq!(progress.total, 2 * retry + 1);
        assert_eq!(progress.advanced(), progress.total);
        assert!(
            progress
                .statuses
                .iter()
                .any(|status| status.contains("extreme quantiles"))
        );
    }

    #[test]
    fn test_variable_and_factor_validation() {
        let mut model = TubeModel::new(scenario_set());
        assert!(matches!(
            model.set_variables(Vec::<String>::new()).unwrap_err(),
            TrainError::NoVariables
        ));
        assert!(matches!(
            model.set_variables(["Z"]).unwrap_err(),
            TrainError::Collection(CollectionError::UnknownColumn { .. })
        ));
        assert!(matches!(
            model.set_factors(["A", "Z"]).unwrap_err(),
            TrainError::Collection(CollectionError::UnknownColumn { .. })
        ));
        // Unchanged defaults after the failed updates.
        assert_eq!(model.variables().len(), 1);
        assert_eq!(model.factors().len(), 3);
    }

    #[test]
    fn test_fit_returns_self_for_chaining() {
        let mut model = TubeModel::new(scenario_set());
        let mut rng = Pcg64::seed_from_u64(3);
        let envelope = model
            .fit_with(&scenario_config(), &mut rng, &mut NullProgress)
            .unwrap()
            .estimate_for("A")
            .unwrap();
        assert_eq!(envelope.len(), 50);
    }

    #[test]
    fn test_total_rows_cached_from_training() {
        let mut model = TubeModel::new(scenario_set());
        let expected = model.collection().total_rows();
        let mut rng = Pcg64::seed_from_u64(13);
        model
            .fit_with(&scenario_config(), &mut rng, &mut NullProgress)
            .unwrap();
        assert_eq!(model.total_rows(), expected);
    }
}
