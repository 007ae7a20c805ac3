//! Time-indexed recording collections consumed by the tube engine.
//!
//! A [`SignalSet`] is an ordered collection of [`Unit`]s (one tabular
//! recording per observed entity) sharing a single column schema, together
//! with a cursor designating the "current" unit and a selected display
//! column. The estimation engine reads units through this cursor and, while
//! scanning the whole collection, repositions it inside a [`CursorScope`]
//! so that external observers always see the cursor restored afterwards.
//!
//! # Data layout
//!
//! ```text
//! SignalSet
//! ├─ columns: shared schema (names, one per signal)
//! ├─ phase:   optional boolean interval column name
//! ├─ cursor:  current unit position + selected display column
//! └─ units: Vec<Unit>
//!     └─ columns: Vec<Vec<f64>>   (column-major, equal lengths)
//! ```
//!
//! # Examples
//!
//! ```
//! use trustube_collection::{SignalSet, Unit};
//!
//! let mut set = SignalSet::new("bench", ["ALT", "EGT"]).unwrap();
//! set.push(Unit::new("run-1", vec![vec![0.0, 1.0], vec![520.0, 540.0]]).unwrap())
//!     .unwrap();
//!
//! assert_eq!(set.len(), 1);
//! assert_eq!(set.current().unwrap().rows(), 2);
//! assert_eq!(set.selected_column(), "ALT");
//! ```

pub use self::{set::*, unit::*};

pub mod set;
pub mod unit;

/// Errors raised by collection construction and access.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CollectionError {
    /// The collection contains no units.
    #[display("collection '{name}' has no units")]
    NoData { name: String },
    /// A column name does not resolve against the schema.
    #[display("unknown column '{column}'")]
    UnknownColumn { column: String },
    /// A unit's columns do not all share the same length.
    #[display("columns of unit '{unit}' do not share one length")]
    RaggedUnit { unit: String },
    /// A unit's column count does not match the collection schema.
    #[display("unit '{unit}' has {got} columns, schema has {expected}")]
    SchemaMismatch {
        unit: String,
        got: usize,
        expected: usize,
    },
    /// A cursor position beyond the last unit.
    #[display("unit position {position} is out of range ({len} units)")]
    PositionOutOfRange { position: usize, len: usize },
    /// A collection must carry at least one column.
    #[display("a collection needs at least one column")]
    EmptySchema,
}
