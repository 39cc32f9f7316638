//! LiveCell<K, T> - a reference-counted handle to one remote record
//!
//! Every clone of a `LiveCell` is an acquire and every drop a release. A
//! cell whose count reaches zero stays in its registry as *idle* until the
//! next sweep, so a record that scrolls out of view and straight back in is
//! not refetched.

use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::Cell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use tideline_core::reactive::{derive, Property, ReadProperty};
use tideline_core::{Result, SharedSpawner, SourceId};

/// Loads one record from the remote service.
pub type Fetcher<K, T> = Rc<dyn Fn(SourceId, K) -> LocalBoxFuture<'static, Result<Option<T>>>>;

/// State shared by every cell of one registry.
pub(crate) struct Loader<K, T> {
    pub(crate) name: &'static str,
    pub(crate) fetcher: Option<Fetcher<K, T>>,
    pub(crate) spawner: SharedSpawner,
    pub(crate) idle: Cell<usize>,
}

pub(crate) struct CellState<K, T> {
    key: K,
    source: SourceId,
    value: Property<Option<T>>,
    refs: Cell<usize>,
    fetching: Cell<bool>,
    stale: Cell<bool>,
    loader: Rc<Loader<K, T>>,
}

impl<K, T> CellState<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    /// A new idle cell.
    pub(crate) fn new(key: K, source: SourceId, loader: Rc<Loader<K, T>>) -> Rc<Self> {
        loader.idle.set(loader.idle.get() + 1);
        Rc::new(Self {
            key,
            source,
            value: Property::new(None),
            refs: Cell::new(0),
            fetching: Cell::new(false),
            stale: Cell::new(false),
            loader,
        })
    }

    pub(crate) fn refs(&self) -> usize {
        self.refs.get()
    }

    pub(crate) fn get(&self) -> Option<T> {
        self.value.get()
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.value.with(Option::is_some)
    }

    pub(crate) fn is_fetching(&self) -> bool {
        self.fetching.get()
    }

    /// Store-side write: a fresh value from an event or fetch.
    pub(crate) fn apply(&self, value: T) {
        self.stale.set(false);
        self.value.set(Some(value));
    }

    /// Store-side in-place edit of a resolved value.
    pub(crate) fn modify(&self, f: impl FnOnce(&mut T)) -> bool {
        let Some(mut value) = self.value.get() else {
            return false;
        };
        f(&mut value);
        self.value.set(Some(value))
    }

    fn acquire(&self) {
        let refs = self.refs.get();
        if refs == 0 {
            self.loader.idle.set(self.loader.idle.get().saturating_sub(1));
        }
        self.refs.set(refs + 1);
    }

    fn release(&self) {
        let refs = self.refs.get().saturating_sub(1);
        self.refs.set(refs);
        if refs == 0 {
            self.loader.idle.set(self.loader.idle.get() + 1);
            tracing::trace!(registry = self.loader.name, key = ?self.key, "cell idle");
        }
    }

    /// Removed from the registry by a sweep.
    pub(crate) fn evicted(&self) {
        if self.refs.get() == 0 {
            self.loader.idle.set(self.loader.idle.get().saturating_sub(1));
        }
    }

    /// Start a fetch unless one is already running.
    pub(crate) fn fetch(self: &Rc<Self>) {
        let Some(fetcher) = self.loader.fetcher.clone() else {
            return;
        };
        if self.fetching.replace(true) {
            tracing::trace!(registry = self.loader.name, key = ?self.key, "fetch already in flight");
            return;
        }
        tracing::debug!(registry = self.loader.name, key = ?self.key, source = %self.source, "fetching record");
        let request = fetcher(self.source.clone(), self.key.clone());
        let weak = Rc::downgrade(self);
        self.loader.spawner.spawn(
            async move {
                let outcome = request.await;
                let Some(state) = weak.upgrade() else {
                    return;
                };
                state.fetching.set(false);
                match outcome {
                    Ok(Some(value)) => state.apply(value),
                    Ok(None) => {
                        tracing::debug!(registry = state.loader.name, key = ?state.key, "record not found");
                    }
                    Err(err) => {
                        tracing::warn!(
                            registry = state.loader.name,
                            key = ?state.key,
                            error = %err,
                            "fetch failed; keeping current value"
                        );
                    }
                }
            }
            .boxed_local(),
        );
    }
}

/// Shared handle to one remote record.
///
/// The value is observed through [`value`](Self::value); consumers never
/// write it. [`invalidate`](Self::invalidate) asks the store for a fresh copy
/// without clearing the current one.
pub struct LiveCell<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    state: Rc<CellState<K, T>>,
}

impl<K, T> LiveCell<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    pub(crate) fn acquire(state: Rc<CellState<K, T>>) -> Self {
        state.acquire();
        Self { state }
    }

    /// Record key.
    pub fn key(&self) -> &K {
        &self.state.key
    }

    /// Account the record belongs to.
    pub fn source(&self) -> &SourceId {
        &self.state.source
    }

    /// Observable value; `None` until resolved.
    pub fn value(&self) -> ReadProperty<Option<T>> {
        self.state.value.read()
    }

    /// Current value.
    pub fn get(&self) -> Option<T> {
        self.state.get()
    }

    /// Whether a value has arrived.
    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }

    /// Whether the value was invalidated and no fresh copy arrived yet.
    pub fn is_stale(&self) -> bool {
        self.state.stale.get()
    }

    /// Whether a fetch is in flight.
    pub fn is_fetching(&self) -> bool {
        self.state.is_fetching()
    }

    /// Live handles to this cell, including this one.
    pub fn ref_count(&self) -> usize {
        self.state.refs()
    }

    /// Mark the value unusable and schedule a refetch; the current value is
    /// kept until the new one arrives. Repeated calls while a fetch is in
    /// flight are coalesced.
    pub fn invalidate(&self) {
        self.state.stale.set(true);
        self.state.fetch();
    }

    /// Property mapping the value through `f`.
    ///
    /// The mapped property does not hold a reference on the cell; keep the
    /// handle alive for as long as the mapping is needed.
    pub fn map<U>(&self, f: impl Fn(&T) -> U + 'static) -> ReadProperty<Option<U>>
    where
        U: Clone + PartialEq + 'static,
    {
        derive(&self.value(), move |value| value.as_ref().map(&f))
    }

    /// Whether two handles refer to the same cell.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl<K, T> Clone for LiveCell<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    fn clone(&self) -> Self {
        Self::acquire(self.state.clone())
    }
}

impl<K, T> Drop for LiveCell<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + PartialEq + 'static,
{
    fn drop(&mut self) {
        self.state.release();
    }
}

impl<K, T> fmt::Debug for LiveCell<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug + 'static,
    T: Clone + PartialEq + fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveCell")
            .field("key", &self.state.key)
            .field("source", &self.state.source)
            .field("value", &self.state.get())
            .field("refs", &self.state.refs())
            .finish()
    }
}
