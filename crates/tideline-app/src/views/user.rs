//! The user cell a view-model currently follows

use std::cell::RefCell;
use std::rc::Rc;
use tideline_core::reactive::ReadProperty;
use tideline_core::{SourceId, UserId};
use tideline_store::{LiveCell, Store, User};

/// Holds the live cell of the one user a view-model shows (a DM peer, a
/// message sender). Following another user releases the previous cell.
pub(crate) struct UserSlot {
    store: Store,
    source: SourceId,
    cell: RefCell<Option<LiveCell<UserId, User>>>,
}

impl UserSlot {
    pub(crate) fn new(store: &Store, source: &SourceId) -> Rc<Self> {
        Rc::new(Self {
            store: store.clone(),
            source: source.clone(),
            cell: RefCell::new(None),
        })
    }

    /// Value of `id`'s cell, acquiring it unless already held.
    pub(crate) fn follow(&self, id: &UserId) -> ReadProperty<Option<User>> {
        let mut slot = self.cell.borrow_mut();
        if let Some(current) = slot.as_ref().filter(|cell| cell.key() == id) {
            return current.value();
        }
        let cell = self.store.users().listen(id, &self.source);
        let value = cell.value();
        *slot = Some(cell);
        value
    }

    /// Ask for a fresh copy of the held user.
    pub(crate) fn invalidate(&self) {
        if let Some(cell) = self.cell.borrow().as_ref() {
            tracing::debug!(user = %cell.key(), "user record incomplete; refetching");
            cell.invalidate();
        }
    }

    pub(crate) fn release(&self) {
        let released = self.cell.borrow_mut().take();
        drop(released);
    }
}
