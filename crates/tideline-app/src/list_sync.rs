//! ViewModelListSync - pooled per-row view-models over an ordered key list
//!
//! The rendering layer asks for rows by position; the pool holds one
//! view-model per *identity*, so rows that move when keys are inserted keep
//! their view-model. Only identities inside the current window (plus
//! overscan) are kept alive.

use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::Hash;
use std::ops::Range;
use std::rc::{Rc, Weak};
use tideline_core::reactive::{Delta, EventStream, Model, ObservableCollection};

/// A view-model with a teardown bag.
pub trait ViewModel {
    /// Subscriptions owned by this view-model; torn down when it leaves
    /// its list.
    fn lifecycle(&self) -> &Model;
}

type Identity<K, I> = Box<dyn Fn(&K) -> I>;
type Factory<K, V> = Box<dyn Fn(&K) -> V>;

struct SyncState<K, I, V> {
    keys: ObservableCollection<K>,
    identity: Identity<K, I>,
    factory: Factory<K, V>,
    pool: RefCell<IndexMap<I, Rc<V>>>,
    window: RefCell<Option<Range<usize>>>,
    overscan: usize,
    should_render: EventStream<()>,
    subscriptions: Model,
    closed: Cell<bool>,
}

fn inserted_indices<K>(delta: &Delta<K>, out: &mut Vec<usize>) {
    match delta {
        Delta::Reset(_) => {}
        Delta::Insert { index, .. } => out.push(*index),
        Delta::Batch(deltas) => {
            for delta in deltas {
                inserted_indices(delta, out);
            }
        }
    }
}

// `inserted` holds final indices in ascending order. A window start stays on
// its first row, so inserts landing right before that row move it; a window
// end stays after its last row.
fn shift_start(start: usize, inserted: &[usize]) -> usize {
    inserted
        .iter()
        .fold(start, |bound, &index| if index <= bound { bound + 1 } else { bound })
}

fn shift_end(end: usize, inserted: &[usize]) -> usize {
    inserted
        .iter()
        .fold(end, |bound, &index| if index < bound { bound + 1 } else { bound })
}

impl<K, I, V> SyncState<K, I, V>
where
    K: Clone + 'static,
    I: Clone + Eq + Hash + fmt::Debug + 'static,
    V: ViewModel + 'static,
{
    fn needed_range(&self, len: usize) -> Range<usize> {
        match &*self.window.borrow() {
            None => 0..len,
            Some(window) => {
                let start = window.start.saturating_sub(self.overscan).min(len);
                let end = window.end.saturating_add(self.overscan).min(len);
                start..end.max(start)
            }
        }
    }

    /// Keep the window on the same identities across an insert: rows
    /// inserted before or inside it widen it instead of pushing rows out.
    fn follow_insert(&self, delta: &Delta<K>) {
        let mut window = self.window.borrow_mut();
        let Some(range) = window.as_mut() else {
            return;
        };
        let mut inserted = Vec::new();
        inserted_indices(delta, &mut inserted);
        let start = shift_start(range.start, &inserted);
        let shifted = start..shift_end(range.end, &inserted).max(start);
        if shifted != *range {
            tracing::trace!(from = ?*range, to = ?shifted, "window follows inserted rows");
            *range = shifted;
        }
    }

    /// Tear down every pooled view-model and stop following the keys.
    fn close(&self) {
        if self.closed.replace(true) {
            return;
        }
        self.subscriptions.teardown();
        let pool = std::mem::take(&mut *self.pool.borrow_mut());
        tracing::debug!(pooled = pool.len(), "closing view-model list");
        for view_model in pool.values() {
            view_model.lifecycle().teardown();
        }
    }

    /// Bring the pool in line with the needed set. Returns whether it changed.
    fn reconcile(&self) -> bool {
        if self.closed.get() {
            return false;
        }
        let snapshot = self.keys.snapshot();
        let range = self.needed_range(snapshot.len());
        let needed: IndexMap<I, &K> = snapshot[range]
            .iter()
            .map(|key| ((self.identity)(key), key))
            .collect();

        let mut released = Vec::new();
        self.pool.borrow_mut().retain(|id, view_model| {
            let keep = needed.contains_key(id);
            if !keep {
                released.push(view_model.clone());
            }
            keep
        });
        for view_model in &released {
            view_model.lifecycle().teardown();
        }

        let missing: Vec<(I, &K)> = {
            let pool = self.pool.borrow();
            needed
                .into_iter()
                .filter(|(id, _)| !pool.contains_key(id))
                .collect()
        };
        let created = missing.len();
        for (id, key) in missing {
            // the factory may read the store, so no pool borrow is held here
            let view_model = Rc::new((self.factory)(key));
            self.pool.borrow_mut().insert(id, view_model);
        }

        let changed = created > 0 || !released.is_empty();
        if changed {
            tracing::debug!(
                created,
                released = released.len(),
                pooled = self.pool.borrow().len(),
                "view-model pool updated"
            );
        }
        changed
    }
}

/// Maps an [`ObservableCollection`] onto a pool of per-row view-models.
///
/// Each identity's view-model is built exactly once while it stays needed
/// and torn down exactly once when it leaves. One `should_render` event is
/// emitted per propagation tick that changed the keys.
pub struct ViewModelListSync<K, I, V>
where
    K: Clone + 'static,
    I: Clone + Eq + Hash + fmt::Debug + 'static,
    V: ViewModel + 'static,
{
    state: Rc<SyncState<K, I, V>>,
}

impl<K, I, V> ViewModelListSync<K, I, V>
where
    K: Clone + 'static,
    I: Clone + Eq + Hash + fmt::Debug + 'static,
    V: ViewModel + 'static,
{
    /// Build view-models for every key of `keys`, then follow its changes.
    pub fn new(
        keys: ObservableCollection<K>,
        overscan: usize,
        identity: impl Fn(&K) -> I + 'static,
        factory: impl Fn(&K) -> V + 'static,
    ) -> Self {
        let state = Rc::new(SyncState {
            keys,
            identity: Box::new(identity),
            factory: Box::new(factory),
            pool: RefCell::new(IndexMap::new()),
            window: RefCell::new(None),
            overscan,
            should_render: EventStream::new(),
            subscriptions: Model::new(),
            closed: Cell::new(false),
        });
        state.reconcile();

        let weak: Weak<SyncState<K, I, V>> = Rc::downgrade(&state);
        state.subscriptions.add_teardown(state.keys.changes().listen({
            let weak = weak.clone();
            move |delta: &Delta<K>| {
                if let Some(state) = weak.upgrade() {
                    state.follow_insert(delta);
                }
            }
        }));
        state.subscriptions.add_teardown(state.keys.version().subscribe(move |_: &u64| {
            if let Some(state) = weak.upgrade() {
                state.reconcile();
                state.should_render.emit(());
            }
        }));
        Self { state }
    }

    /// Tear down the pool and stop following the keys. Idempotent; the list
    /// builds no view-models and emits nothing afterwards.
    pub fn close(&self) {
        self.state.close();
    }

    /// Close this list when `owner` is torn down.
    pub fn close_with(&self, owner: &Model) {
        let weak = Rc::downgrade(&self.state);
        owner.on_teardown(move || {
            if let Some(state) = weak.upgrade() {
                state.close();
            }
        });
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.state.closed.get()
    }

    /// The keys this list follows.
    pub fn keys(&self) -> &ObservableCollection<K> {
        &self.state.keys
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.state.keys.len()
    }

    /// Key of the row at `index`.
    pub fn key_at(&self, index: usize) -> Option<K> {
        self.state.keys.get(index)
    }

    /// View-model of the row at `index`, if that row is needed.
    pub fn get_view_model(&self, index: usize) -> Option<Rc<V>> {
        let key = self.state.keys.get(index)?;
        let id = (self.state.identity)(&key);
        self.state.pool.borrow().get(&id).cloned()
    }

    /// View-model for an identity.
    pub fn view_model_for(&self, id: &I) -> Option<Rc<V>> {
        self.state.pool.borrow().get(id).cloned()
    }

    /// Number of live view-models.
    pub fn pool_len(&self) -> usize {
        self.state.pool.borrow().len()
    }

    /// Set the visible row range; `None` keeps every row alive.
    pub fn set_window(&self, window: Option<Range<usize>>) {
        if *self.state.window.borrow() == window {
            return;
        }
        tracing::trace!(?window, "list window moved");
        *self.state.window.borrow_mut() = window;
        if self.state.reconcile() {
            self.state.should_render.emit(());
        }
    }

    /// Current visible row range.
    pub fn window(&self) -> Option<Range<usize>> {
        self.state.window.borrow().clone()
    }

    /// Fired once per tick in which the rows or the pool changed.
    pub fn should_render(&self) -> &EventStream<()> {
        &self.state.should_render
    }
}

impl<K, I, V> Drop for ViewModelListSync<K, I, V>
where
    K: Clone + 'static,
    I: Clone + Eq + Hash + fmt::Debug + 'static,
    V: ViewModel + 'static,
{
    fn drop(&mut self) {
        self.state.close();
    }
}

impl<K, I, V> fmt::Debug for ViewModelListSync<K, I, V>
where
    K: Clone + 'static,
    I: Clone + Eq + Hash + fmt::Debug + 'static,
    V: ViewModel + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModelListSync")
            .field("rows", &self.state.keys.len())
            .field("pooled", &self.state.pool.borrow().keys().collect::<Vec<_>>())
            .field("window", &*self.state.window.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Row {
        key: u32,
        model: Model,
    }

    impl ViewModel for Row {
        fn lifecycle(&self) -> &Model {
            &self.model
        }
    }

    fn counted(
        keys: &ObservableCollection<u32>,
        built: &Rc<Cell<usize>>,
    ) -> ViewModelListSync<u32, u32, Row> {
        let built = built.clone();
        ViewModelListSync::new(keys.clone(), 0, |k| *k, move |k| {
            built.set(built.get() + 1);
            Row {
                key: *k,
                model: Model::new(),
            }
        })
    }

    #[test]
    fn test_rows_follow_keys() {
        let keys = ObservableCollection::natural();
        keys.insert(vec![10, 30]);
        let built = Rc::new(Cell::new(0));
        let list = counted(&keys, &built);
        assert_eq!(list.row_count(), 2);
        assert_eq!(built.get(), 2);

        keys.insert_one(20);
        assert_eq!(list.key_at(1), Some(20));
        assert_eq!(list.get_view_model(1).map(|row| row.key), Some(20));
        assert_eq!(built.get(), 3);
        assert!(list.get_view_model(5).is_none());
    }

    #[test]
    fn test_window_releases_rows() {
        let keys = ObservableCollection::natural();
        keys.insert(0..10u32);
        let built = Rc::new(Cell::new(0));
        let list = counted(&keys, &built);
        let first = list.get_view_model(0).unwrap();

        list.set_window(Some(4..6));
        assert_eq!(list.pool_len(), 2);
        assert!(first.lifecycle().is_torn_down());
        assert!(list.get_view_model(0).is_none());

        list.set_window(None);
        assert_eq!(list.pool_len(), 10);
        assert!(!list.get_view_model(0).unwrap().lifecycle().is_torn_down());
        assert_eq!(built.get(), 18);
    }

    #[test]
    fn test_overscan_widens_window() {
        let keys = ObservableCollection::natural();
        keys.insert(0..20u32);
        let list = ViewModelListSync::new(keys, 2, |k| *k, |k| Row {
            key: *k,
            model: Model::new(),
        });
        list.set_window(Some(5..7));
        assert_eq!(list.pool_len(), 6);
        list.set_window(Some(18..25));
        assert_eq!(list.pool_len(), 4);
    }

    #[test]
    fn test_one_render_per_tick() {
        let keys = ObservableCollection::natural();
        let list = counted(&keys, &Rc::new(Cell::new(0)));
        let renders = Rc::new(Cell::new(0));
        let _sub = {
            let renders = renders.clone();
            list.should_render().listen(move |_| renders.set(renders.get() + 1))
        };
        tideline_core::reactive::batch(|| {
            keys.insert_one(1);
            keys.insert_one(2);
        });
        assert_eq!(renders.get(), 1);
        keys.insert_one(2);
        assert_eq!(renders.get(), 1);
    }

    #[test]
    fn test_drop_tears_down_pool() {
        let keys = ObservableCollection::natural();
        keys.insert(vec![1u32, 2]);
        let list = counted(&keys, &Rc::new(Cell::new(0)));
        let row = list.get_view_model(0).unwrap();
        drop(list);
        assert!(row.lifecycle().is_torn_down());
    }

    #[test]
    fn test_window_keeps_rows_across_inserts() {
        let keys = ObservableCollection::natural();
        keys.insert(vec![10u32, 30, 40, 50]);
        let built = Rc::new(Cell::new(0));
        let list = counted(&keys, &built);
        list.set_window(Some(0..3));
        let held: Vec<_> = (0..3).map(|i| list.get_view_model(i).unwrap()).collect();
        assert_eq!(built.get(), 4);

        keys.insert_one(20);
        assert_eq!(list.window(), Some(0..4));
        assert_eq!(built.get(), 5);
        assert!(held.iter().all(|row| !row.lifecycle().is_torn_down()));

        keys.insert(vec![1, 2, 60]);
        assert_eq!(list.window(), Some(2..6));
        assert_eq!(built.get(), 5);
        assert_eq!(list.pool_len(), 4);
        assert!(held.iter().all(|row| !row.lifecycle().is_torn_down()));
    }

    #[test]
    fn test_window_bounds_count_earlier_inserts() {
        assert_eq!(shift_start(2, &[]), 2);
        assert_eq!(shift_start(2, &[0, 1, 4]), 5);
        assert_eq!(shift_end(2, &[0, 1, 4]), 4);
        assert_eq!(shift_start(2, &[2]), 3);
        assert_eq!(shift_end(2, &[2]), 2);
        assert_eq!(shift_start(0, &[0]), 1);
    }

    #[test]
    fn test_closed_list_ignores_keys() {
        let keys = ObservableCollection::natural();
        keys.insert(vec![1u32, 2]);
        let built = Rc::new(Cell::new(0));
        let list = counted(&keys, &built);
        let renders = Rc::new(Cell::new(0));
        let _sub = {
            let renders = renders.clone();
            list.should_render().listen(move |_| renders.set(renders.get() + 1))
        };
        let row = list.get_view_model(0).unwrap();

        let owner = Model::new();
        list.close_with(&owner);
        owner.teardown();
        assert!(list.is_closed());
        assert!(row.lifecycle().is_torn_down());

        keys.insert_one(3);
        list.set_window(Some(0..1));
        assert_eq!(list.pool_len(), 0);
        assert_eq!(built.get(), 2);
        assert_eq!(renders.get(), 0);
    }
}
