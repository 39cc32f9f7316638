//! Registry<K, T> - deduplicating owner of live cells
//!
//! At most one cell exists per `(source, key)`. Listeners share it; the
//! registry keeps idle cells until a sweep evicts them.

use crate::cell::{CellState, Fetcher, LiveCell, Loader};
use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use tideline_core::{SharedSpawner, SourceId};

struct RegistryInner<K, T> {
    cells: RefCell<IndexMap<(SourceId, K), Rc<CellState<K, T>>>>,
    loader: Rc<Loader<K, T>>,
    max_idle: usize,
}

/// Keyed live cells for one record type.
pub struct Registry<K, T> {
    inner: Rc<RegistryInner<K, T>>,
}

impl<K, T> Clone for Registry<K, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, T> Registry<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    /// Create a registry. Without a fetcher, cells only change through
    /// [`apply`](Self::apply).
    pub fn new(
        name: &'static str,
        spawner: SharedSpawner,
        fetcher: Option<Fetcher<K, T>>,
        max_idle: usize,
    ) -> Self {
        Self {
            inner: Rc::new(RegistryInner {
                cells: RefCell::new(IndexMap::new()),
                loader: Rc::new(Loader {
                    name,
                    fetcher,
                    spawner,
                    idle: Cell::new(0),
                }),
                max_idle,
            }),
        }
    }

    fn entry(&self, key: &K, source: &SourceId) -> Rc<CellState<K, T>> {
        let mut cells = self.inner.cells.borrow_mut();
        cells
            .entry((source.clone(), key.clone()))
            .or_insert_with(|| CellState::new(key.clone(), source.clone(), self.inner.loader.clone()))
            .clone()
    }

    /// Acquire the shared cell for `key`, creating it on first use.
    ///
    /// The first listener of an unresolved cell triggers a fetch.
    pub fn listen(&self, key: &K, source: &SourceId) -> LiveCell<K, T> {
        if self.idle_count() > self.inner.max_idle {
            self.sweep();
        }
        let state = self.entry(key, source);
        let cell = LiveCell::acquire(state.clone());
        if !state.is_resolved() && !state.is_fetching() {
            state.fetch();
        }
        cell
    }

    /// Resolved value, without acquiring the cell.
    pub fn peek(&self, key: &K, source: &SourceId) -> Option<T> {
        self.inner
            .cells
            .borrow()
            .get(&(source.clone(), key.clone()))
            .and_then(|state| state.get())
    }

    /// Store-side write of a fresh value; creates an idle cell if needed.
    pub fn apply(&self, source: &SourceId, key: &K, value: T) {
        self.entry(key, source).apply(value);
    }

    /// Store-side edit of a resolved value. Returns whether it changed.
    pub fn modify(&self, source: &SourceId, key: &K, f: impl FnOnce(&mut T)) -> bool {
        let state = self
            .inner
            .cells
            .borrow()
            .get(&(source.clone(), key.clone()))
            .cloned();
        state.is_some_and(|state| state.modify(f))
    }

    /// Evict every idle cell. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut evicted = Vec::new();
        self.inner.cells.borrow_mut().retain(|_, state| {
            if state.refs() == 0 {
                evicted.push(state.clone());
                false
            } else {
                true
            }
        });
        for state in &evicted {
            state.evicted();
        }
        if !evicted.is_empty() {
            tracing::debug!(registry = self.inner.loader.name, evicted = evicted.len(), "swept idle cells");
        }
        evicted.len()
    }

    /// Cells currently held, idle or not.
    pub fn len(&self) -> usize {
        self.inner.cells.borrow().len()
    }

    /// Whether the registry holds no cells.
    pub fn is_empty(&self) -> bool {
        self.inner.cells.borrow().is_empty()
    }

    /// Cells with no live handle.
    pub fn idle_count(&self) -> usize {
        self.inner.loader.idle.get()
    }

    /// Whether a cell for `key` exists.
    pub fn contains(&self, key: &K, source: &SourceId) -> bool {
        self.inner
            .cells
            .borrow()
            .contains_key(&(source.clone(), key.clone()))
    }
}

impl<K, T> fmt::Debug for Registry<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.inner.loader.name)
            .field("cells", &self.inner.cells.borrow().len())
            .finish()
    }
}
