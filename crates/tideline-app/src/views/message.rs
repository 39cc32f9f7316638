//! MessageViewModel - one row of a message list

use super::user::UserSlot;
use crate::list_sync::ViewModel;
use std::fmt;
use tideline_core::reactive::{derive, derive2, switch_map, Model, ReadProperty};
use tideline_core::{MessageKey, Timestamp, UserId};
use tideline_store::{LiveCell, Message, Store, User};

/// View state of one message.
pub struct MessageViewModel {
    lifecycle: Model,
    cell: LiveCell<MessageKey, Message>,
    text: ReadProperty<String>,
    author: ReadProperty<String>,
}

impl MessageViewModel {
    /// Build the view-model for `cell`.
    pub fn new(store: &Store, cell: LiveCell<MessageKey, Message>) -> Self {
        let message = cell.value();
        let text = derive(&message, |m: &Option<Message>| {
            m.as_ref().map(|m| m.text.clone()).unwrap_or_default()
        });
        let sender = derive(&message, |m: &Option<Message>| {
            m.as_ref().and_then(|m| m.user.clone())
        });

        let slot = UserSlot::new(store, cell.source());
        let user = {
            let slot = slot.clone();
            switch_map(&sender, None, move |id: &Option<UserId>| {
                id.as_ref().map(|id| slot.follow(id))
            })
        };
        let author = derive2(&sender, &user, |id: &Option<UserId>, user: &Option<User>| {
            let Some(id) = id else {
                return String::new();
            };
            user.as_ref()
                .filter(|u| &u.id == id)
                .and_then(User::display_name)
                .unwrap_or(id.as_str())
                .to_string()
        });

        let lifecycle = Model::new();
        lifecycle.on_teardown(move || slot.release());
        Self {
            lifecycle,
            cell,
            text,
            author,
        }
    }

    /// Message key.
    pub fn key(&self) -> &MessageKey {
        self.cell.key()
    }

    /// Posting time.
    pub fn timestamp(&self) -> Timestamp {
        self.cell.key().timestamp
    }

    /// Message text; empty until resolved.
    pub fn text(&self) -> ReadProperty<String> {
        self.text.clone()
    }

    /// Sender's display name, else the sender id.
    pub fn author(&self) -> ReadProperty<String> {
        self.author.clone()
    }

    /// Whether the record has arrived.
    pub fn is_loaded(&self) -> bool {
        self.cell.is_resolved()
    }
}

impl ViewModel for MessageViewModel {
    fn lifecycle(&self) -> &Model {
        &self.lifecycle
    }
}

impl fmt::Debug for MessageViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageViewModel")
            .field("key", self.key())
            .field("author", &self.author.get())
            .finish()
    }
}
