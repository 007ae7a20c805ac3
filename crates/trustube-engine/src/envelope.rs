//! Envelope data and ensemble aggregation.

use serde::{Deserialize, Serialize};
use trustube_collection::{CollectionError, SignalSet, Unit};

use crate::candidate::RegressionCandidate;

/// Per-variable envelope scale factors.
///
/// `lower = center − qmin · (center − min)` and
/// `upper = center + qmax · (max − center)`; the pair `(1, 1)` leaves the
/// raw ensemble spread untouched and is the default before calibration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ScalePair {
    /// Factor applied to the spread below the center.
    pub qmin: f64,
    /// Factor applied to the spread above the center.
    pub qmax: f64,
}

impl Default for ScalePair {
    fn default() -> Self {
        Self {
            qmin: 1.0,
            qmax: 1.0,
        }
    }
}

/// Point estimate and confidence bounds, one entry per row of a unit.
///
/// Whenever the scale factors are non-negative the arrays satisfy
/// `lower ≤ center ≤ upper` elementwise. An untrained target yields the
/// degenerate all-NaN form with `lower == center == upper`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Envelope {
    /// Elementwise mean of the ensemble predictions.
    pub center: Vec<f64>,
    /// Calibrated lower bound.
    pub lower: Vec<f64>,
    /// Calibrated upper bound.
    pub upper: Vec<f64>,
}

impl Envelope {
    /// Returns the number of rows covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.center.len()
    }

    /// Returns `true` if the envelope covers no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.center.is_empty()
    }

    /// Returns `true` when the estimate carries no information (every
    /// entry NaN) - the signature of an untrained target variable.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.center.iter().all(|value| value.is_nan())
    }

    /// Flags the rows whose observed value escapes the tube.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not match the envelope length.
    #[must_use]
    pub fn excursions(&self, values: &[f64]) -> Vec<bool> {
        assert_eq!(
            values.len(),
            self.len(),
            "observations must match the envelope length"
        );
        values
            .iter()
            .enumerate()
            .map(|(row, &value)| value < self.lower[row] || value > self.upper[row])
            .collect()
    }

    /// The all-NaN result for a target without a trained ensemble.
    pub(crate) fn degenerate(rows: usize) -> Self {
        let nan = vec![f64::NAN; rows];
        Self {
            center: nan.clone(),
            lower: nan.clone(),
            upper: nan,
        }
    }

    /// Applies calibration factors to a raw ensemble spread.
    pub(crate) fn scaled(mut self, scale: ScalePair) -> Self {
        for row in 0..self.center.len() {
            let center = self.center[row];
            self.lower[row] = center - scale.qmin * (center - self.lower[row]);
            self.upper[row] = center + scale.qmax * (self.upper[row] - center);
        }
        self
    }
}

/// Aggregates candidate predictions on one unit into the raw envelope:
/// elementwise mean (center), min (lower) and max (upper) across the
/// ensemble, before any calibration.
///
/// The caller guarantees a non-empty candidate list.
#[expect(clippy::cast_precision_loss)]
pub(crate) fn raw_envelope(
    candidates: &[RegressionCandidate],
    set: &SignalSet,
    unit: &Unit,
) -> Result<Envelope, CollectionError> {
    let rows = unit.rows();
    let mut center = vec![0.0; rows];
    let mut lower = vec![f64::INFINITY; rows];
    let mut upper = vec![f64::NEG_INFINITY; rows];

    for candidate in candidates {
        let mut columns = Vec::with_capacity(candidate.features().len());
        for name in candidate.features() {
            columns.push(unit.column(set.column_index(name)?));
        }
        let predicted = candidate.model().predict(&columns);
        for (row, &value) in predicted.iter().enumerate() {
            center[row] += value;
            lower[row] = lower[row].min(value);
            upper[row] = upper[row].max(value);
        }
    }

    let count = candidates.len() as f64;
    for value in &mut center {
        *value /= count;
    }
    Ok(Envelope {
        center,
        lower,
        upper,
    })
}
