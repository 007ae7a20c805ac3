//! Ordered unit collections with a shared schema and a cursor.
//!
//! [`SignalSet`] holds the recordings the engine trains on. Besides the
//! units themselves it tracks two pieces of view state observed by external
//! consumers: the cursor ([`SignalSet::cursor`], the "current unit") and the
//! selected display column ([`SignalSet::selected_column`]). Code that scans
//! every unit repositions the cursor as it goes and is expected to restore
//! it before returning; [`SignalSet::cursor_scope`] makes that restoration
//! automatic on every exit path.
//!
//! # Examples
//!
//! ```
//! use trustube_collection::{SignalSet, Unit};
//!
//! let mut set = SignalSet::new("bench", ["N1", "EGT"]).unwrap();
//! for name in ["run-1", "run-2"] {
//!     let unit = Unit::new(name, vec![vec![0.2, 0.4, 0.9], vec![410.0, 440.0, 515.0]]).unwrap();
//!     set.push(unit).unwrap();
//! }
//!
//! // Scan all units without disturbing the externally visible cursor.
//! set.seek(1).unwrap();
//! {
//!     let mut scope = set.cursor_scope();
//!     for pos in 0..scope.len() {
//!         scope.seek(pos).unwrap();
//!         let _rows = scope.current().unwrap().rows();
//!     }
//! }
//! assert_eq!(set.cursor(), 1);
//! ```

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::{CollectionError, Unit};

/// An ordered collection of [`Unit`]s sharing one column schema.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignalSet {
    name: String,
    columns: Vec<String>,
    phase: Option<String>,
    units: Vec<Unit>,
    #[serde(skip)]
    position: usize,
    #[serde(skip)]
    selected: usize,
}

impl SignalSet {
    /// Creates an empty collection with the given column schema.
    ///
    /// The first column starts out as the selected display column.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::EmptySchema`] if `columns` is empty.
    pub fn new<S, I>(name: S, columns: I) -> Result<Self, CollectionError>
    where
        S: Into<String>,
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(CollectionError::EmptySchema);
        }
        Ok(Self {
            name: name.into(),
            columns,
            phase: None,
            units: Vec::new(),
            position: 0,
            selected: 0,
        })
    }

    /// Returns the collection's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the shared column schema.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Resolves a column name to its schema position.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnknownColumn`] if the name is not part of
    /// the schema.
    pub fn column_index(&self, name: &str) -> Result<usize, CollectionError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| CollectionError::UnknownColumn {
                column: name.to_owned(),
            })
    }

    /// Appends a unit to the collection.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::SchemaMismatch`] if the unit's column
    /// count differs from the schema.
    pub fn push(&mut self, unit: Unit) -> Result<&mut Self, CollectionError> {
        if unit.column_count() != self.columns.len() {
            return Err(CollectionError::SchemaMismatch {
                unit: unit.name().to_owned(),
                got: unit.column_count(),
                expected: self.columns.len(),
            });
        }
        self.units.push(unit);
        Ok(self)
    }

    /// Returns the number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Returns `true` if the collection holds no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Returns all units in collection order.
    #[must_use]
    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Returns the unit at a position.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::PositionOutOfRange`] for positions beyond
    /// the last unit.
    pub fn unit(&self, position: usize) -> Result<&Unit, CollectionError> {
        self.units
            .get(position)
            .ok_or(CollectionError::PositionOutOfRange {
                position,
                len: self.units.len(),
            })
    }

    /// Returns the sum of row counts over all units.
    #[must_use]
    pub fn total_rows(&self) -> usize {
        self.units.iter().map(Unit::rows).sum()
    }

    /// Returns the cursor position (the current unit).
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.position
    }

    /// Moves the cursor to `position`.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::PositionOutOfRange`] if no unit exists at
    /// that position.
    pub fn seek(&mut self, position: usize) -> Result<&mut Self, CollectionError> {
        if position >= self.units.len() {
            return Err(CollectionError::PositionOutOfRange {
                position,
                len: self.units.len(),
            });
        }
        self.position = position;
        Ok(self)
    }

    /// Moves the cursor back to the first unit.
    pub fn rewind(&mut self) -> &mut Self {
        self.position = 0;
        self
    }

    /// Returns the unit under the cursor.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::NoData`] if the collection is empty.
    pub fn current(&self) -> Result<&Unit, CollectionError> {
        self.units.get(self.position).ok_or(CollectionError::NoData {
            name: self.name.clone(),
        })
    }

    /// Returns the name of the selected display column.
    #[must_use]
    pub fn selected_column(&self) -> &str {
        &self.columns[self.selected]
    }

    /// Selects the display column by name.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnknownColumn`] if the name is not part of
    /// the schema.
    pub fn select(&mut self, name: &str) -> Result<&mut Self, CollectionError> {
        self.selected = self.column_index(name)?;
        Ok(self)
    }

    /// Returns the name of the boolean phase column, if one is set.
    #[must_use]
    pub fn phase(&self) -> Option<&str> {
        self.phase.as_deref()
    }

    /// Sets or clears the boolean phase column.
    ///
    /// The phase column marks a sub-interval of rows (0/1 values) inside
    /// each unit. It is collection metadata; the engine does not read it.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionError::UnknownColumn`] if the name is not part of
    /// the schema.
    pub fn set_phase(&mut self, phase: Option<&str>) -> Result<&mut Self, CollectionError> {
        match phase {
            Some(name) => {
                self.column_index(name)?;
                self.phase = Some(name.to_owned());
            }
            None => self.phase = None,
        }
        Ok(self)
    }

    /// Opens a scope that restores the cursor when dropped.
    ///
    /// The returned guard dereferences to the collection, so the caller can
    /// `seek` freely inside the scope; the original position is reinstated
    /// on every exit path, early returns included.
    pub fn cursor_scope(&mut self) -> CursorScope<'_> {
        let saved = self.position;
        CursorScope { set: self, saved }
    }
}

/// Guard that restores a [`SignalSet`]'s cursor on drop.
#[derive(Debug)]
pub struct CursorScope<'a> {
    set: &'a mut SignalSet,
    saved: usize,
}

impl Deref for CursorScope<'_> {
    type Target = SignalSet;

    fn deref(&self) -> &SignalSet {
        self.set
    }
}

impl DerefMut for CursorScope<'_> {
    fn deref_mut(&mut self) -> &mut SignalSet {
        self.set
    }
}

impl Drop for CursorScope<'_> {
    fn drop(&mut self) {
        self.set.position = self.saved;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_unit_set() -> SignalSet {
        let mut set = SignalSet::new("bench", ["A", "B"]).unwrap();
        for name in ["run-1", "run-2"] {
            let unit = Unit::new(name, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
            set.push(unit).unwrap();
        }
        set
    }

    #[test]
    fn test_empty_schema_rejected() {
        let err = SignalSet::new("bench", Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, CollectionError::EmptySchema));
    }

    #[test]
    fn test_schema_mismatch_rejected() {
        let mut set = two_unit_set();
        let unit = Unit::new("bad", vec![vec![1.0]]).unwrap();
        let err = set.push(unit).unwrap_err();
        assert!(matches!(
            err,
            CollectionError::SchemaMismatch {
                got: 1,
                expected: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_cursor_seek_and_current() {
        let mut set = two_unit_set();
        assert_eq!(set.cursor(), 0);
        set.seek(1).unwrap();
        assert_eq!(set.current().unwrap().name(), "run-2");
        assert!(matches!(
            set.seek(2),
            Err(CollectionError::PositionOutOfRange { position: 2, len: 2 })
        ));
        set.rewind();
        assert_eq!(set.cursor(), 0);
    }

    #[test]
    fn test_units_iterate_in_collection_order() {
        let set = two_unit_set();
        let names: Vec<&str> = set.units().iter().map(Unit::name).collect();
        assert_eq!(names, ["run-1", "run-2"]);
    }

    #[test]
    fn test_current_on_empty_is_no_data() {
        let set = SignalSet::new("bench", ["A"]).unwrap();
        assert!(matches!(
            set.current(),
            Err(CollectionError::NoData { .. })
        ));
    }

    #[test]
    fn test_cursor_scope_restores_on_early_exit() {
        let mut set = two_unit_set();
        set.seek(1).unwrap();

        let failed: Result<(), CollectionError> = (|| {
            let mut scope = set.cursor_scope();
            scope.seek(0)?;
            scope.seek(7)?; // errors out of the scope
            Ok(())
        })();
        assert!(failed.is_err());
        assert_eq!(set.cursor(), 1, "cursor must be restored after failure");
    }

    #[test]
    fn test_column_selection() {
        let mut set = two_unit_set();
        assert_eq!(set.selected_column(), "A");
        set.select("B").unwrap();
        assert_eq!(set.selected_column(), "B");
        assert!(matches!(
            set.select("C"),
            Err(CollectionError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_phase_column_is_validated() {
        let mut set = two_unit_set();
        assert_eq!(set.phase(), None);
        set.set_phase(Some("B")).unwrap();
        assert_eq!(set.phase(), Some("B"));
        assert!(set.set_phase(Some("INTERVAL")).is_err());
        set.set_phase(None).unwrap();
        assert_eq!(set.phase(), None);
    }

    #[test]
    fn test_total_rows() {
        let set = two_unit_set();
        assert_eq!(set.total_rows(), 6);
    }

    #[test]
    fn test_json_round_trip_resets_view_state() {
        let mut set = two_unit_set();
        set.seek(1).unwrap();
        set.select("B").unwrap();

        let json = serde_json::to_string(&set).unwrap();
        let loaded: SignalSet = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.columns(), set.columns());
        assert_eq!(loaded.cursor(), 0);
        assert_eq!(loaded.selected_column(), "A");
        assert_eq!(loaded.unit(1).unwrap().column(0), &[1.0, 2.0, 3.0]);
    }
}
