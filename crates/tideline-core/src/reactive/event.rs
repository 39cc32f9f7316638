//! EventStream<T> - discrete events with synchronous delivery
//!
//! Unlike a property, an event stream has no current value. Listeners run
//! synchronously inside a propagation batch, so property writes they make
//! settle once after every listener has seen the event.

use super::runtime;
use super::subscription::Subscription;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Callback<T> = Rc<RefCell<dyn FnMut(&T)>>;

struct Listener<T> {
    active: Rc<Cell<bool>>,
    callback: Callback<T>,
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            active: self.active.clone(),
            callback: self.callback.clone(),
        }
    }
}

/// A broadcast stream of events.
pub struct EventStream<T> {
    listeners: Rc<RefCell<Vec<Listener<T>>>>,
}

impl<T> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
        }
    }
}

impl<T> Default for EventStream<T> {
    fn default() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

impl<T: 'static> EventStream<T> {
    /// Create a stream with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `f` for every subsequent event.
    pub fn listen(&self, f: impl FnMut(&T) + 'static) -> Subscription {
        let active = Rc::new(Cell::new(true));
        self.listeners.borrow_mut().push(Listener {
            active: active.clone(),
            callback: Rc::new(RefCell::new(f)),
        });
        Subscription::from_fn(move || active.set(false))
    }

    /// Deliver `event` to every active listener.
    pub fn emit(&self, event: T) {
        let listeners: Vec<Listener<T>> = {
            let mut listeners = self.listeners.borrow_mut();
            listeners.retain(|l| l.active.get());
            listeners.clone()
        };
        runtime::batch(|| {
            for listener in listeners {
                // a listener disposed by an earlier one in this round is skipped
                if !listener.active.get() {
                    continue;
                }
                match listener.callback.try_borrow_mut() {
                    Ok(mut callback) => (&mut *callback)(&event),
                    Err(_) => tracing::trace!("skipping re-entrant event listener"),
                }
            }
        });
    }

    /// Number of active listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.active.get())
            .count()
    }
}

impl<T: Clone + 'static> EventStream<T> {
    /// Resolve with the next event.
    pub fn next(&self) -> LocalBoxFuture<'static, Option<T>> {
        let (tx, rx) = oneshot::channel();
        let tx = RefCell::new(Some(tx));
        let subscription = self.listen(move |event: &T| {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(event.clone());
            }
        });
        async move {
            let _subscription = subscription;
            rx.await.ok()
        }
        .boxed_local()
    }
}

impl<T> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}
