//! Trust-envelope estimation over recorded signal collections.
//!
//! This crate trains a statistically calibrated "tube" around target
//! signals observed across a collection of time-indexed recordings, then
//! serves point estimates with lower/upper bounds on the collection's
//! current unit. Values escaping the tube flag anomalous behavior.
//!
//! # How a tube is built
//!
//! 1. **Candidate generation** - For each target variable, repeated
//!    random-subspace trials fit a linear model on a random sample of rows
//!    and score it on a disjoint held-out sample.
//! 2. **Selection** - A best-K population keeps the highest-scoring
//!    candidates, replacing the worst; a run of non-improving trials stops
//!    the search early.
//! 3. **Calibration** - Residuals over the whole collection widen or narrow
//!    the raw ensemble spread so the envelope empirically contains the
//!    configured tail fraction on each side.
//! 4. **Prediction** - The ensemble's per-row mean/min/max, rescaled by the
//!    calibration pair, yields the envelope for the current unit.
//!
//! ```text
//! Candidate Generator ──> Ensemble (per target variable)
//!                              │
//!                 Calibrator (whole-collection residuals)
//!                              │
//!                  Predictor ──> Envelope (center, lower, upper)
//!                              │
//!                  Diagnostics ──> FactorUsage (selection counts)
//! ```
//!
//! The engine is single-threaded and synchronous: selection state makes the
//! trials inherently sequential, and training runs to completion once
//! invoked, reporting through a write-only [`ProgressObserver`]. While
//! scanning all units it repositions the collection cursor and restores it
//! on every exit path.
//!
//! # Examples
//!
//! ```
//! use rand::SeedableRng as _;
//! use rand_pcg::Pcg64;
//! use trustube_collection::{SignalSet, Unit};
//! use trustube_engine::{LearnParams, NullProgress, TrainConfig, TubeModel};
//!
//! // Two recordings of three signals; EGT tracks N1 and FF linearly.
//! let mut set = SignalSet::new("bench", ["EGT", "N1", "FF"]).unwrap();
//! for start in [0, 40] {
//!     let n1: Vec<f64> = (start..start + 40).map(|i| f64::from(i) * 0.5).collect();
//!     let ff: Vec<f64> = (start..start + 40)
//!         .map(|i| 100.0 + f64::from(i) + (f64::from(i) * 0.3).sin() * 5.0)
//!         .collect();
//!     let egt: Vec<f64> = n1.iter().zip(&ff).map(|(a, b)| 2.0 * a + 0.1 * b).collect();
//!     set.push(Unit::new(format!("run-{start}"), vec![egt, n1, ff]).unwrap())
//!         .unwrap();
//! }
//!
//! let mut model = TubeModel::new(set);
//! let config = TrainConfig {
//!     learn: LearnParams {
//!         retry_number: 8,
//!         keep_best_number: 3,
//!         samples_percent: 0.4,
//!         max_features: 2,
//!     },
//!     ..TrainConfig::default()
//! };
//! let mut rng = Pcg64::seed_from_u64(7);
//! model.fit_with(&config, &mut rng, &mut NullProgress).unwrap();
//!
//! let envelope = model.estimate_for("EGT").unwrap();
//! assert_eq!(envelope.len(), 40);
//! ```

pub use self::{candidate::*, diagnose::*, envelope::*, params::*, progress::*, tube::*};

mod calibrate;
pub mod candidate;
pub mod diagnose;
pub mod envelope;
mod generator;
pub mod params;
pub mod progress;
pub mod tube;

use trustube_collection::CollectionError;

/// Errors raised by the training entry point.
///
/// Estimation never raises on an untrained variable; it returns a
/// degenerate NaN [`Envelope`](crate::Envelope) instead.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainError {
    /// The collection holds no units; nothing can be learned.
    #[display("collection '{name}' has no units")]
    NoData { name: String },
    /// At least one target variable is required.
    #[display("at least one target variable is required")]
    NoVariables,
    /// A target has no predictor columns besides itself.
    #[display("target '{variable}' has no candidate predictor columns")]
    NoPredictors { variable: String },
    /// `max_features` was configured to zero.
    #[display("max_features must be at least 1")]
    NoFeatureBudget,
    /// An error surfaced unchanged from the collection collaborator.
    #[display("{_0}")]
    #[from]
    Collection(CollectionError),
}
