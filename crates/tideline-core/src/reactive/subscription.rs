//! Subscription handles

use super::runtime::Reaction;
use std::fmt;
use std::rc::Rc;

enum Teardown {
    Reaction(Rc<Reaction>),
    Fn(Box<dyn FnOnce()>),
}

/// Keeps a reaction, listener or other registration alive.
///
/// Dropping the subscription stops delivery synchronously, including runs
/// already queued for the current propagation tick.
#[must_use = "dropping a Subscription immediately stops delivery"]
pub struct Subscription {
    teardown: Option<Teardown>,
}

impl Subscription {
    /// A subscription that owns nothing.
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// Run `f` when the subscription is disposed.
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Teardown::Fn(Box::new(f))),
        }
    }

    pub(crate) fn from_reaction(reaction: Rc<Reaction>) -> Self {
        Self {
            teardown: Some(Teardown::Reaction(reaction)),
        }
    }

    /// Whether this subscription still owns a registration.
    pub fn is_active(&self) -> bool {
        match &self.teardown {
            Some(Teardown::Reaction(reaction)) => !reaction.is_disposed(),
            Some(Teardown::Fn(_)) => true,
            None => false,
        }
    }

    /// Stop delivery now.
    pub fn dispose(mut self) {
        self.run_teardown();
    }

    fn run_teardown(&mut self) {
        match self.teardown.take() {
            Some(Teardown::Reaction(reaction)) => reaction.dispose(),
            Some(Teardown::Fn(f)) => f(),
            None => {}
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_teardown();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}
