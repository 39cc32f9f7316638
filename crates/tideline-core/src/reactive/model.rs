//! Teardown bags for view-models

use super::subscription::Subscription;
use std::cell::{Cell, RefCell};
use std::fmt;

/// Owns the subscriptions of one view-model.
///
/// Tearing the model down (explicitly or by dropping it) disposes every
/// subscription it owns; anything added afterwards is disposed immediately.
#[derive(Default)]
pub struct Model {
    subscriptions: RefCell<Vec<Subscription>>,
    torn_down: Cell<bool>,
}

impl Model {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispose `subscription` when this model is torn down.
    pub fn add_teardown(&self, subscription: Subscription) {
        if self.torn_down.get() {
            subscription.dispose();
            return;
        }
        self.subscriptions.borrow_mut().push(subscription);
    }

    /// Run `f` when this model is torn down.
    pub fn on_teardown(&self, f: impl FnOnce() + 'static) {
        self.add_teardown(Subscription::from_fn(f));
    }

    /// Dispose everything this model owns. Idempotent.
    pub fn teardown(&self) {
        if self.torn_down.replace(true) {
            return;
        }
        let subscriptions = std::mem::take(&mut *self.subscriptions.borrow_mut());
        tracing::trace!(count = subscriptions.len(), "tearing down model");
        drop(subscriptions);
    }

    /// Whether [`teardown`](Self::teardown) has run.
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.get()
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("subscriptions", &self.subscriptions.borrow().len())
            .field("torn_down", &self.torn_down.get())
            .finish()
    }
}
