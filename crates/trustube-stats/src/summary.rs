//! Compact aggregates for reporting.

/// Count, minimum, maximum and mean of a set of values.
///
/// A lighter aggregate than a full descriptive-statistics pass; it carries
/// exactly what training status lines report about an ensemble's scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Number of values aggregated.
    pub count: usize,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// Arithmetic mean.
    pub mean: f64,
}

impl Summary {
    /// Aggregates an iterator of values; `None` on empty input.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut count = 0_usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for value in values {
            count += 1;
            min = min.min(value);
            max = max.max(value);
            sum += value;
        }
        (count > 0).then(|| Self {
            count,
            min,
            max,
            mean: sum / count as f64,
        })
    }
}
