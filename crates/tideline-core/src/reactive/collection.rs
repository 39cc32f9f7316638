//! ObservableCollection<K> - a sorted collection that announces its changes

use super::delta::Delta;
use super::derive::derive;
use super::event::EventStream;
use super::property::{Property, ReadProperty};
use super::runtime;
use crate::collections::{Snapshot, SortedCollection};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

struct CollectionInner<K> {
    items: RefCell<SortedCollection<K>>,
    version: Property<u64>,
    changes: EventStream<Delta<K>>,
}

/// A [`SortedCollection`] whose mutations are observable.
///
/// Every insert that changes the collection bumps [`version`](Self::version)
/// and emits one [`Delta`] on [`changes`](Self::changes).
pub struct ObservableCollection<K> {
    inner: Rc<CollectionInner<K>>,
}

impl<K> Clone for ObservableCollection<K> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K: Clone + Ord + 'static> ObservableCollection<K> {
    /// Unique collection ordered by `K`'s natural order.
    pub fn natural() -> Self {
        Self::from_collection(SortedCollection::natural())
    }
}

impl<K: Clone + 'static> ObservableCollection<K> {
    /// Create an empty collection.
    pub fn new(compare: impl Fn(&K, &K) -> Ordering + 'static, unique: bool) -> Self {
        Self::from_collection(SortedCollection::new(compare, unique))
    }

    /// Wrap an existing collection.
    pub fn from_collection(items: SortedCollection<K>) -> Self {
        Self {
            inner: Rc::new(CollectionInner {
                items: RefCell::new(items),
                version: Property::new(0),
                changes: EventStream::new(),
            }),
        }
    }

    /// Insert many items; returns the final indices of those inserted.
    pub fn insert(&self, items: impl IntoIterator<Item = K>) -> Vec<usize> {
        let (indices, delta) = {
            let mut collection = self.inner.items.borrow_mut();
            let indices = collection.insert(items);
            let inserts = indices
                .iter()
                .filter_map(|&index| collection.get(index).map(|item| Delta::insert(index, item.clone())))
                .collect();
            (indices, Delta::batch(inserts))
        };
        if !indices.is_empty() {
            self.announce(delta);
        }
        indices
    }

    /// Insert one item; returns whether it was added.
    pub fn insert_one(&self, item: K) -> bool {
        self.insert(std::iter::once(item)).len() == 1
    }

    fn announce(&self, delta: Delta<K>) {
        runtime::batch(|| {
            self.inner.version.update(|v| v.wrapping_add(1));
            self.inner.changes.emit(delta);
        });
    }

    // ─── Queries ─────────────────────────────────────────────

    /// Number of items.
    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }

    /// Item at `index`.
    pub fn get(&self, index: usize) -> Option<K> {
        self.inner.items.borrow().get(index).cloned()
    }

    /// Smallest item.
    pub fn first(&self) -> Option<K> {
        self.inner.items.borrow().first().cloned()
    }

    /// Largest item.
    pub fn last(&self) -> Option<K> {
        self.inner.items.borrow().last().cloned()
    }

    /// Index of an item comparing equal to `item`.
    pub fn position(&self, item: &K) -> Option<usize> {
        self.inner.items.borrow().position(item)
    }

    /// Whether an equal item is present.
    pub fn contains(&self, item: &K) -> bool {
        self.inner.items.borrow().contains(item)
    }

    /// Immutable view of the current items.
    pub fn snapshot(&self) -> Snapshot<K> {
        self.inner.items.borrow().snapshot()
    }

    /// Borrow the underlying collection.
    pub fn with<R>(&self, f: impl FnOnce(&SortedCollection<K>) -> R) -> R {
        f(&self.inner.items.borrow())
    }

    /// Structural version, bumped once per changing insert.
    pub fn version(&self) -> ReadProperty<u64> {
        self.inner.version.read()
    }

    /// Deltas describing each changing insert.
    pub fn changes(&self) -> &EventStream<Delta<K>> {
        &self.inner.changes
    }

    /// Property recomputed from the collection after every mutation.
    pub fn derive<U>(&self, f: impl Fn(&SortedCollection<K>) -> U + 'static) -> ReadProperty<U>
    where
        U: Clone + PartialEq + 'static,
    {
        let inner = self.inner.clone();
        derive(&self.inner.version, move |_| f(&inner.items.borrow()))
    }
}

impl<K: fmt::Debug> fmt::Debug for ObservableCollection<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableCollection")
            .field("items", &*self.inner.items.borrow())
            .finish()
    }
}
