//! Property<T> - an observable value with push-based change propagation
//!
//! A [`Property`] is a settable source; a [`ReadProperty`] is the read-only
//! view handed to consumers. Both share the same cell. Writes that do not
//! change the value (by `PartialEq`) are dropped, so observers only ever see
//! real changes.
//!
//! ```rust,ignore
//! use tideline_core::reactive::{derive, Property};
//!
//! let count = Property::new(1);
//! let doubled = derive(&count, |n| n * 2);
//! count.set(5);
//! assert_eq!(doubled.get(), 10);
//! ```

use super::runtime::{self, Reaction, RENDER_HEIGHT};
use super::subscription::Subscription;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

pub(crate) struct PropertyInner<T> {
    value: RefCell<T>,
    version: Cell<u64>,
    height: Cell<u32>,
    observers: RefCell<Vec<Weak<Reaction>>>,
    /// Reactions feeding this property; dropping the property stops them.
    links: RefCell<Vec<Subscription>>,
}

impl<T> PropertyInner<T> {
    fn new(value: T, height: u32) -> Self {
        Self {
            value: RefCell::new(value),
            version: Cell::new(0),
            height: Cell::new(height),
            observers: RefCell::new(Vec::new()),
            links: RefCell::new(Vec::new()),
        }
    }
}

impl<T: Clone + PartialEq + 'static> PropertyInner<T> {
    pub(crate) fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.version.set(self.version.get().wrapping_add(1));
        self.notify();
        true
    }

    fn notify(&self) {
        let live: Vec<Rc<Reaction>> = {
            let mut observers = self.observers.borrow_mut();
            observers.retain(|weak| weak.upgrade().is_some_and(|r| !r.is_disposed()));
            observers.iter().filter_map(Weak::upgrade).collect()
        };
        for reaction in &live {
            reaction.schedule();
        }
        runtime::flush();
    }
}

/// Read-only view of a property.
pub struct ReadProperty<T> {
    pub(crate) inner: Rc<PropertyInner<T>>,
}

impl<T> Clone for ReadProperty<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> ReadProperty<T> {
    pub(crate) fn with_height(value: T, height: u32) -> Self {
        Self {
            inner: Rc::new(PropertyInner::new(value, height)),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Number of changes applied so far.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Distance from the sources of the graph.
    pub(crate) fn height(&self) -> u32 {
        self.inner.height.get()
    }

    pub(crate) fn raise_height(&self, height: u32) {
        if height > self.inner.height.get() {
            self.inner.height.set(height);
        }
    }

    /// Register `reaction` to run whenever this property changes.
    pub(crate) fn add_observer(&self, reaction: &Rc<Reaction>) {
        self.inner
            .observers
            .borrow_mut()
            .push(Rc::downgrade(reaction));
    }

    /// Keep `link` alive for as long as this property.
    pub(crate) fn add_link(&self, link: Subscription) {
        self.inner.links.borrow_mut().push(link);
    }

    /// Call `f` after every change, once all derivations have settled.
    pub fn subscribe(&self, mut f: impl FnMut(&T) + 'static) -> Subscription {
        let weak = Rc::downgrade(&self.inner);
        let reaction = Reaction::new(RENDER_HEIGHT, move || {
            if let Some(inner) = weak.upgrade() {
                // clone so the callback may write back into the graph
                let value = inner.value.borrow().clone();
                f(&value);
            }
        });
        self.add_observer(&reaction);
        Subscription::from_reaction(reaction)
    }

    /// Like [`subscribe`](Self::subscribe), but also calls `f` with the
    /// current value right away.
    pub fn observe(&self, mut f: impl FnMut(&T) + 'static) -> Subscription {
        f(&self.get());
        self.subscribe(f)
    }

    /// Resolve once `pred` holds for the value.
    pub fn wait_for(&self, pred: impl Fn(&T) -> bool + 'static) -> LocalBoxFuture<'static, T> {
        let current = self.get();
        if pred(&current) {
            return futures::future::ready(current).boxed_local();
        }
        let (tx, rx) = oneshot::channel();
        let tx = RefCell::new(Some(tx));
        let subscription = self.subscribe(move |value| {
            if pred(value) {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(value.clone());
                }
            }
        });
        let this = self.clone();
        async move {
            let _subscription = subscription;
            rx.await.unwrap_or_else(|_| this.get())
        }
        .boxed_local()
    }

    /// Weak handle that does not keep the property alive.
    pub fn downgrade(&self) -> WeakProperty<T> {
        WeakProperty {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Whether two handles refer to the same property.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Mirror the value into a `futures_signals` Mutable for signal-based
    /// renderers. The mirror lives as long as this property.
    #[cfg(feature = "signals")]
    pub fn to_mutable(&self) -> futures_signals::signal::Mutable<T> {
        let mutable = futures_signals::signal::Mutable::new(self.get());
        let mirror = mutable.clone();
        let subscription = self.subscribe(move |value| mirror.set(value.clone()));
        self.add_link(subscription);
        mutable
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadProperty")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .finish()
    }
}

/// A settable property.
///
/// Dereferences to [`ReadProperty`] for all read access.
pub struct Property<T> {
    read: ReadProperty<T>,
}

impl<T> Clone for Property<T> {
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> Property<T> {
    /// Create a source property.
    pub fn new(value: T) -> Self {
        Self {
            read: ReadProperty::with_height(value, 0),
        }
    }

    /// Replace the value, notifying observers if it changed.
    ///
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        self.read.inner.set(value)
    }

    /// Replace the value with `f(current)`.
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = self.read.with(f);
        self.set(next)
    }

    /// Read-only view sharing this property's value.
    pub fn read(&self) -> ReadProperty<T> {
        self.read.clone()
    }

    /// Stop every derivation feeding this property; the value is kept.
    pub fn dispose(&self) {
        let links = std::mem::take(&mut *self.read.inner.links.borrow_mut());
        drop(links);
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Deref for Property<T> {
    type Target = ReadProperty<T>;

    fn deref(&self) -> &Self::Target {
        &self.read
    }
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &*self.read.inner.value.borrow())
            .field("version", &self.read.inner.version.get())
            .finish()
    }
}

/// Non-owning handle to a property.
pub struct WeakProperty<T> {
    inner: Weak<PropertyInner<T>>,
}

impl<T> Clone for WeakProperty<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Clone + PartialEq + 'static> WeakProperty<T> {
    /// Read handle, if the property is still alive.
    pub fn upgrade(&self) -> Option<ReadProperty<T>> {
        self.inner.upgrade().map(|inner| ReadProperty { inner })
    }

    /// Write through the weak handle; no-op once the property is gone.
    pub(crate) fn set(&self, value: T) -> bool {
        self.inner.upgrade().is_some_and(|inner| inner.set(value))
    }
}

/// Anything that can be read as a [`ReadProperty`].
///
/// Derivation functions accept any `Observable`, so both settable and
/// read-only properties can feed them.
pub trait Observable<T>: sealed::Sealed {
    /// Read-only view of the underlying property.
    fn read(&self) -> ReadProperty<T>;
}

mod sealed {
    pub trait Sealed {}

    impl<T> Sealed for super::Property<T> {}
    impl<T> Sealed for super::ReadProperty<T> {}
}

impl<T: Clone + PartialEq + 'static> Observable<T> for Property<T> {
    fn read(&self) -> ReadProperty<T> {
        self.read.clone()
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> for ReadProperty<T> {
    fn read(&self) -> ReadProperty<T> {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn test_property_new_and_get() {
        let p = Property::new(42);
        assert_eq!(p.get(), 42);
        assert_eq!(p.version(), 0);
    }

    #[test]
    fn test_set_notifies_only_on_change() {
        let p = Property::new(1);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = seen.clone();
            p.subscribe(move |v| seen.borrow_mut().push(*v))
        };

        assert!(p.set(2));
        assert!(!p.set(2));
        assert!(p.update(|v| v + 1));
        assert_eq!(*seen.borrow(), vec![2, 3]);
        assert_eq!(p.version(), 2);
    }

    #[test]
    fn test_observe_delivers_current_value() {
        let p = Property::new("a".to_string());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let _sub = {
            let seen = seen.clone();
            p.observe(move |v| seen.borrow_mut().push(v.clone()))
        };
        p.set("b".to_string());
        assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_dropped_subscription_stops_delivery() {
        let p = Property::new(0);
        let count = Rc::new(Cell::new(0));
        let sub = {
            let count = count.clone();
            p.subscribe(move |_| count.set(count.get() + 1))
        };
        p.set(1);
        drop(sub);
        p.set(2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_subscriber_may_write_back() {
        let p = Property::new(0);
        let _sub = {
            let p2 = p.clone();
            p.subscribe(move |v| {
                if *v < 3 {
                    p2.set(v + 1);
                }
            })
        };
        p.set(1);
        assert_eq!(p.get(), 3);
    }

    #[test]
    fn test_wait_for() {
        let p = Property::new(0);
        let ready = p.wait_for(|v| *v == 0);
        assert_eq!(block_on(ready), 0);

        let pending = p.wait_for(|v| *v >= 2);
        p.set(1);
        p.set(2);
        assert_eq!(block_on(pending), 2);
    }

    #[test]
    fn test_weak_property() {
        let p = Property::new(1);
        let weak = p.downgrade();
        assert!(weak.set(5));
        assert_eq!(p.get(), 5);
        drop(p);
        assert!(weak.upgrade().is_none());
        assert!(!weak.set(6));
    }
}
