//! Ordered, optionally unique key sequence
//!
//! `SortedCollection<K>` keeps its items sorted by a caller-supplied
//! comparator at all times. Storage is an `Rc<Vec<K>>` that is copied on
//! write, so [`SortedCollection::snapshot`] is cheap and never observes later
//! inserts.

use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

/// Comparator shared between a collection and its clones.
pub type Comparator<K> = Rc<dyn Fn(&K, &K) -> Ordering>;

/// Immutable view of a collection at one point in time.
pub type Snapshot<K> = Rc<Vec<K>>;

/// An ordered sequence of keys with comparator-driven insertion.
///
/// # Invariants
///
/// - `items` is sorted by `compare`
/// - if `unique`, no two items compare equal
///
/// Non-unique collections place a new item after every item it compares
/// equal to, so insertion order is preserved among equals.
pub struct SortedCollection<K> {
    items: Rc<Vec<K>>,
    compare: Comparator<K>,
    unique: bool,
}

impl<K: Clone> Clone for SortedCollection<K> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            compare: self.compare.clone(),
            unique: self.unique,
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for SortedCollection<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SortedCollection")
            .field("items", &self.items)
            .field("unique", &self.unique)
            .finish()
    }
}

impl<K: Ord + Clone + 'static> SortedCollection<K> {
    /// Unique collection ordered by `K`'s natural order.
    pub fn natural() -> Self {
        Self::new(|a: &K, b: &K| a.cmp(b), true)
    }
}

impl<K: Clone> SortedCollection<K> {
    /// Create an empty collection.
    pub fn new(compare: impl Fn(&K, &K) -> Ordering + 'static, unique: bool) -> Self {
        Self::with_comparator(Rc::new(compare), unique)
    }

    /// Create an empty collection from a shared comparator.
    pub fn with_comparator(compare: Comparator<K>, unique: bool) -> Self {
        Self {
            items: Rc::new(Vec::new()),
            compare,
            unique,
        }
    }

    // ─── Queries ─────────────────────────────────────────────

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether equal items are rejected.
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Item at `index`.
    pub fn get(&self, index: usize) -> Option<&K> {
        self.items.get(index)
    }

    /// Smallest item.
    pub fn first(&self) -> Option<&K> {
        self.items.first()
    }

    /// Largest item.
    pub fn last(&self) -> Option<&K> {
        self.items.last()
    }

    /// Items in order.
    pub fn iter(&self) -> std::slice::Iter<'_, K> {
        self.items.iter()
    }

    /// Items as a slice.
    pub fn as_slice(&self) -> &[K] {
        &self.items
    }

    /// Index of an item comparing equal to `item`.
    pub fn position(&self, item: &K) -> Option<usize> {
        self.items.binary_search_by(|probe| (self.compare)(probe, item)).ok()
    }

    /// Whether an item comparing equal to `item` is present.
    pub fn contains(&self, item: &K) -> bool {
        self.position(item).is_some()
    }

    /// Shared view of the current items; later inserts copy instead of
    /// mutating it.
    pub fn snapshot(&self) -> Snapshot<K> {
        self.items.clone()
    }

    /// The comparator.
    pub fn comparator(&self) -> &Comparator<K> {
        &self.compare
    }

    // ─── Mutations ───────────────────────────────────────────

    /// Insert one item at its sorted position.
    ///
    /// Returns `false` (and leaves the collection untouched) when the
    /// collection is unique and an equal item is already present.
    pub fn insert_one(&mut self, item: K) -> bool {
        let compare = self.compare.clone();
        // first index whose item sorts strictly after `item`
        let upper = self
            .items
            .partition_point(|probe| compare(probe, &item) != Ordering::Greater);
        if self.unique && upper > 0 && compare(&self.items[upper - 1], &item) == Ordering::Equal {
            return false;
        }
        Rc::make_mut(&mut self.items).insert(upper, item);
        true
    }

    /// Insert many items; observably the same as calling
    /// [`insert_one`](Self::insert_one) for each item in iteration order.
    ///
    /// The batch is sorted (stably) and merged with the existing items in a
    /// single pass. Returns the final indices of the inserted items in
    /// ascending order.
    pub fn insert(&mut self, items: impl IntoIterator<Item = K>) -> Vec<usize> {
        let compare = self.compare.clone();
        let mut batch: Vec<K> = items.into_iter().collect();
        if batch.is_empty() {
            return Vec::new();
        }
        batch.sort_by(|a, b| compare(a, b));
        if self.unique {
            // stable sort keeps the first occurrence of each run first
            batch.dedup_by(|later, earlier| compare(earlier, later) == Ordering::Equal);
        }

        let existing = std::mem::take(Rc::make_mut(&mut self.items));
        let mut merged = Vec::with_capacity(existing.len() + batch.len());
        let mut inserted = Vec::with_capacity(batch.len());
        let mut existing = existing.into_iter().peekable();

        for item in batch {
            // existing items sorting before or equal to `item` come first
            while let Some(current) = existing.peek() {
                if compare(current, &item) == Ordering::Greater {
                    break;
                }
                if let Some(current) = existing.next() {
                    merged.push(current);
                }
            }
            let duplicate = self.unique
                && merged
                    .last()
                    .is_some_and(|last| compare(last, &item) == Ordering::Equal);
            if !duplicate {
                inserted.push(merged.len());
                merged.push(item);
            }
        }
        merged.extend(existing);

        *Rc::make_mut(&mut self.items) = merged;
        inserted
    }
}

impl<'a, K: Clone> IntoIterator for &'a SortedCollection<K> {
    type Item = &'a K;
    type IntoIter = std::slice::Iter<'a, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn by_first(a: &(u32, char), b: &(u32, char)) -> Ordering {
        a.0.cmp(&b.0)
    }

    #[test]
    fn test_insert_one_keeps_order() {
        let mut c = SortedCollection::natural();
        assert!(c.insert_one(5));
        assert!(c.insert_one(1));
        assert!(c.insert_one(3));
        assert_eq!(c.as_slice(), &[1, 3, 5]);
    }

    #[test]
    fn test_unique_duplicate_is_noop() {
        let mut c = SortedCollection::natural();
        c.insert_one(2);
        assert!(!c.insert_one(2));
        assert_eq!(c.len(), 1);
        assert!(c.insert(vec![2, 2]).is_empty());
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_non_unique_inserts_after_equals() {
        let mut c = SortedCollection::new(by_first, false);
        c.insert_one((1, 'a'));
        c.insert_one((1, 'b'));
        c.insert_one((0, 'z'));
        assert_eq!(c.as_slice(), &[(0, 'z'), (1, 'a'), (1, 'b')]);

        c.insert(vec![(1, 'c'), (1, 'd')]);
        assert_eq!(
            c.as_slice(),
            &[(0, 'z'), (1, 'a'), (1, 'b'), (1, 'c'), (1, 'd')]
        );
    }

    #[test]
    fn test_batch_keeps_first_occurrence() {
        let mut c = SortedCollection::new(by_first, true);
        c.insert(vec![(2, 'x'), (1, 'a'), (2, 'y')]);
        assert_eq!(c.as_slice(), &[(1, 'a'), (2, 'x')]);
    }

    #[test]
    fn test_insert_returns_final_indices() {
        let mut c = SortedCollection::natural();
        c.insert(vec![10, 30, 50]);
        let indices = c.insert(vec![40, 20, 30, 60]);
        assert_eq!(c.as_slice(), &[10, 20, 30, 40, 50, 60]);
        assert_eq!(indices, vec![1, 3, 5]);
    }

    #[test]
    fn test_insert_into_empty() {
        let mut c = SortedCollection::natural();
        assert_eq!(c.insert(vec![3, 1, 2]), vec![0, 1, 2]);
        assert_eq!(c.first(), Some(&1));
        assert_eq!(c.last(), Some(&3));
    }

    #[test]
    fn test_snapshot_is_copy_on_write() {
        let mut c = SortedCollection::natural();
        c.insert(vec![1, 2]);
        let snap = c.snapshot();
        c.insert_one(0);
        assert_eq!(snap.as_slice(), &[1, 2]);
        assert_eq!(c.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_position_and_contains() {
        let mut c = SortedCollection::natural();
        c.insert(vec!["b", "d", "a"]);
        assert_eq!(c.position(&"d"), Some(2));
        assert!(c.contains(&"a"));
        assert!(!c.contains(&"c"));
        assert_eq!(c.get(1), Some(&"b"));
    }
}
