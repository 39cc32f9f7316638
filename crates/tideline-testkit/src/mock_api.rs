//! In-memory chat service for tests

use async_trait::async_trait;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use tideline_core::{ChannelId, Page, Result, SourceId, TidelineError, Timestamp, UserId};
use tideline_store::{Channel, ChatApi, Message, User};

/// One recorded `history` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryCall {
    /// Channel asked for
    pub channel: ChannelId,
    /// Inclusive lower bound
    pub oldest: Timestamp,
    /// Exclusive upper bound
    pub latest: Timestamp,
}

impl HistoryCall {
    /// Page this request covers.
    pub fn page(&self, page_span_secs: u64) -> Page {
        self.oldest.page(page_span_secs)
    }
}

/// A [`ChatApi`] backed by in-memory tables.
///
/// Lookups answer from the tables unless a scripted response is queued;
/// `history` calls are logged and can be made to fail.
#[derive(Debug)]
pub struct MockChatApi {
    source: SourceId,
    channels: RefCell<HashMap<ChannelId, Channel>>,
    users: RefCell<HashMap<UserId, User>>,
    scripted_users: RefCell<HashMap<UserId, VecDeque<Option<User>>>>,
    messages: RefCell<Vec<Message>>,
    history_calls: RefCell<Vec<HistoryCall>>,
    user_calls: RefCell<Vec<UserId>>,
    channel_calls: Cell<usize>,
    failing_history: Cell<usize>,
}

impl MockChatApi {
    /// Empty service for `source`.
    pub fn new(source: impl Into<SourceId>) -> Self {
        Self {
            source: source.into(),
            channels: RefCell::default(),
            users: RefCell::default(),
            scripted_users: RefCell::default(),
            messages: RefCell::default(),
            history_calls: RefCell::default(),
            user_calls: RefCell::default(),
            channel_calls: Cell::new(0),
            failing_history: Cell::new(0),
        }
    }

    /// Add or replace a channel.
    pub fn add_channel(&self, channel: Channel) {
        self.channels.borrow_mut().insert(channel.id.clone(), channel);
    }

    /// Add or replace a user.
    pub fn add_user(&self, user: User) {
        self.users.borrow_mut().insert(user.id.clone(), user);
    }

    /// Add a message to its channel's history.
    pub fn add_message(&self, message: Message) {
        self.messages.borrow_mut().push(message);
    }

    /// Queue a one-shot answer for the next lookup of `id`; `None` answers
    /// "not found".
    pub fn script_user(&self, id: &UserId, response: Option<User>) {
        self.scripted_users
            .borrow_mut()
            .entry(id.clone())
            .or_default()
            .push_back(response);
    }

    /// Make the next `count` history requests fail with a network error.
    pub fn fail_next_history(&self, count: usize) {
        self.failing_history.set(count);
    }

    /// Every history request so far, in order.
    pub fn history_calls(&self) -> Vec<HistoryCall> {
        self.history_calls.borrow().clone()
    }

    /// Pages requested so far, in order.
    pub fn requested_pages(&self, page_span_secs: u64) -> Vec<Page> {
        self.history_calls
            .borrow()
            .iter()
            .map(|call| call.page(page_span_secs))
            .collect()
    }

    /// Users looked up so far, in order.
    pub fn user_calls(&self) -> Vec<UserId> {
        self.user_calls.borrow().clone()
    }

    /// Number of channel lookups so far.
    pub fn channel_calls(&self) -> usize {
        self.channel_calls.get()
    }
}

#[async_trait(?Send)]
impl ChatApi for MockChatApi {
    fn source(&self) -> SourceId {
        self.source.clone()
    }

    async fn channel_info(&self, channel: &ChannelId) -> Result<Option<Channel>> {
        self.channel_calls.set(self.channel_calls.get() + 1);
        Ok(self.channels.borrow().get(channel).cloned())
    }

    async fn user_info(&self, user: &UserId) -> Result<Option<User>> {
        self.user_calls.borrow_mut().push(user.clone());
        let scripted = self
            .scripted_users
            .borrow_mut()
            .get_mut(user)
            .and_then(VecDeque::pop_front);
        match scripted {
            Some(response) => Ok(response),
            None => Ok(self.users.borrow().get(user).cloned()),
        }
    }

    async fn history(
        &self,
        channel: &ChannelId,
        oldest: Timestamp,
        latest: Timestamp,
    ) -> Result<Vec<Message>> {
        self.history_calls.borrow_mut().push(HistoryCall {
            channel: channel.clone(),
            oldest,
            latest,
        });
        let failing = self.failing_history.get();
        if failing > 0 {
            self.failing_history.set(failing - 1);
            return Err(TidelineError::network(format!("history of {channel} unavailable")));
        }
        Ok(self
            .messages
            .borrow()
            .iter()
            .filter(|m| &m.channel == channel && m.ts >= oldest && m.ts < latest)
            .cloned()
            .collect())
    }
}
