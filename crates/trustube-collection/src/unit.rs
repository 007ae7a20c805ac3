//! A single time-indexed recording.

use serde::{Deserialize, Serialize};

use crate::CollectionError;

/// One recorded unit: a fixed set of numeric signal columns indexed by time.
///
/// Values are stored column-major; the column *names* live on the owning
/// [`SignalSet`](crate::SignalSet), whose schema every unit must match.
/// The row index is the time order of the recording.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Unit {
    name: String,
    columns: Vec<Vec<f64>>,
}

impl Unit {
    /// Creates a unit from column-major values.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::RaggedUnit`] if the columns do not all
    /// share the same length.
    pub fn new<S>(name: S, columns: Vec<Vec<f64>>) -> Result<Self, CollectionError>
    where
        S: Into<String>,
    {
        let name = name.into();
        let rows = columns.first().map_or(0, Vec::len);
        if columns.iter().any(|c| c.len() != rows) {
            return Err(CollectionError::RaggedUnit { unit: name });
        }
        Ok(Self { name, columns })
    }

    /// Returns the unit's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of rows (time samples) in this unit.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.columns.first().map_or(0, Vec::len)
    }

    /// Returns the number of columns in this unit.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns the values of one column.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a valid schema position.
    #[must_use]
    pub fn column(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangular_unit() {
        let unit = Unit::new("u", vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(unit.rows(), 2);
        assert_eq!(unit.column_count(), 2);
        assert_eq!(unit.column(1), &[3.0, 4.0]);
    }

    #[test]
    fn test_ragged_unit_rejected() {
        let err = Unit::new("u", vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, CollectionError::RaggedUnit { .. }));
    }

    #[test]
    fn test_empty_unit() {
        let unit = Unit::new("u", vec![vec![], vec![]]).unwrap();
        assert_eq!(unit.rows(), 0);
    }
}
