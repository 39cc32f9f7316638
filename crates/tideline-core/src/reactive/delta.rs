//! Delta<T> - incremental changes to ordered collections
//!
//! An [`ObservableCollection`](super::ObservableCollection) describes each
//! mutation as a `Delta` so renderers can patch their row list instead of
//! rebuilding it.

/// An incremental change to an ordered collection.
///
/// ```rust,ignore
/// use tideline_core::reactive::{apply_delta, Delta};
///
/// let mut rows = vec!["a", "c"];
/// apply_delta(&mut rows, Delta::insert(1, "b"))?;
/// assert_eq!(rows, vec!["a", "b", "c"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta<T> {
    /// Replace the entire collection.
    Reset(Vec<T>),

    /// Insert an item; items at and after `index` shift right.
    Insert {
        /// Final position of the item (0-indexed)
        index: usize,
        /// Inserted item
        item: T,
    },

    /// Several deltas applied in order.
    Batch(Vec<Delta<T>>),
}

impl<T> Delta<T> {
    /// Create a reset delta.
    pub fn reset(items: Vec<T>) -> Self {
        Delta::Reset(items)
    }

    /// Create an insert delta.
    pub fn insert(index: usize, item: T) -> Self {
        Delta::Insert { index, item }
    }

    /// Create a batch delta.
    pub fn batch(deltas: Vec<Delta<T>>) -> Self {
        Delta::Batch(deltas)
    }

    /// Whether applying this delta changes nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Delta::Batch(deltas) => deltas.iter().all(Delta::is_empty),
            _ => false,
        }
    }

    /// Number of inserted items.
    pub fn insert_count(&self) -> usize {
        match self {
            Delta::Reset(_) => 0,
            Delta::Insert { .. } => 1,
            Delta::Batch(deltas) => deltas.iter().map(Delta::insert_count).sum(),
        }
    }
}

/// Error type for delta operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeltaError {
    /// Index was out of bounds for the operation.
    #[error("delta {operation} failed: index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The invalid index
        index: usize,
        /// The current length of the collection
        len: usize,
        /// The operation that failed
        operation: &'static str,
    },
}

/// Apply a delta to a vector mirroring the collection.
///
/// # Errors
///
/// Returns `DeltaError::IndexOutOfBounds` if an insert lies past the end.
pub fn apply_delta<T>(items: &mut Vec<T>, delta: Delta<T>) -> Result<(), DeltaError> {
    match delta {
        Delta::Reset(new_items) => {
            *items = new_items;
            Ok(())
        }
        Delta::Insert { index, item } => {
            if index > items.len() {
                return Err(DeltaError::IndexOutOfBounds {
                    index,
                    len: items.len(),
                    operation: "insert",
                });
            }
            items.insert(index, item);
            Ok(())
        }
        Delta::Batch(deltas) => {
            for d in deltas {
                apply_delta(items, d)?;
            }
            Ok(())
        }
    }
}
