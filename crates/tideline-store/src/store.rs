//! Store - the context object every component receives
//!
//! The store owns one [`Registry`] per record type, the page cache, the
//! registered [`ChatApi`]s and the remote event stream. It is the only
//! writer of live cells.

use crate::api::ChatApi;
use crate::cell::Fetcher;
use crate::events::StoreEvent;
use crate::models::{Channel, Message, User};
use crate::registry::Registry;
use futures::future::{LocalBoxFuture, Shared};
use futures::FutureExt;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use tideline_core::reactive::{EventStream, Subscription};
use tideline_core::{
    ChannelId, ClientConfig, Clock, MessageKey, Page, Result, SharedSpawner, SourceId,
    TidelineError, Timestamp, UserId,
};

type PageKey = (SourceId, ChannelId, Page);
type PageResult = Result<Rc<[MessageKey]>>;
type PendingPage = Shared<LocalBoxFuture<'static, PageResult>>;

struct StoreInner {
    config: ClientConfig,
    spawner: SharedSpawner,
    clock: Rc<dyn Clock>,
    apis: RefCell<HashMap<SourceId, Rc<dyn ChatApi>>>,
    channels: Registry<ChannelId, Channel>,
    users: Registry<UserId, User>,
    messages: Registry<MessageKey, Message>,
    pages: RefCell<HashMap<PageKey, Rc<[MessageKey]>>>,
    pending: RefCell<HashMap<PageKey, PendingPage>>,
    events: EventStream<StoreEvent>,
}

impl StoreInner {
    fn api(&self, source: &SourceId) -> Result<Rc<dyn ChatApi>> {
        self.apis
            .borrow()
            .get(source)
            .cloned()
            .ok_or_else(|| TidelineError::not_found(format!("no API registered for {source}")))
    }
}

/// Shared handle to the engine's data layer.
#[derive(Clone)]
pub struct Store {
    inner: Rc<StoreInner>,
}

fn api_fetcher<K, T, F>(store: Weak<StoreInner>, lookup: F) -> Fetcher<K, T>
where
    K: 'static,
    T: 'static,
    F: Fn(Rc<dyn ChatApi>, K) -> LocalBoxFuture<'static, Result<Option<T>>> + 'static,
{
    Rc::new(move |source: SourceId, key: K| {
        let api = store
            .upgrade()
            .ok_or_else(|| TidelineError::cancelled("store dropped"))
            .and_then(|store| store.api(&source));
        match api {
            Ok(api) => lookup(api, key),
            Err(err) => futures::future::ready(Err(err)).boxed_local(),
        }
    })
}

/// Messages have no single-record lookup: an evicted message comes back by
/// reloading its page, bypassing the page cache.
fn page_fetcher(store: Weak<StoreInner>) -> Fetcher<MessageKey, Message> {
    Rc::new(move |source: SourceId, key: MessageKey| {
        let Some(inner) = store.upgrade() else {
            let err = TidelineError::cancelled("store dropped");
            return futures::future::ready(Err(err)).boxed_local();
        };
        let store = Store { inner };
        let page = store.page_of(key.timestamp);
        let reload = store.request_page((source.clone(), key.channel.clone(), page), true);
        async move {
            reload.await?;
            Ok(store.inner.messages.peek(&key, &source))
        }
        .boxed_local()
    })
}

impl Store {
    /// Create a store.
    pub fn new(config: ClientConfig, spawner: SharedSpawner, clock: Rc<dyn Clock>) -> Self {
        let max_idle = config.cache.max_idle_cells;
        let inner = Rc::new_cyclic(|weak: &Weak<StoreInner>| {
            let channel_fetcher = api_fetcher(weak.clone(), |api, id: ChannelId| {
                async move { api.channel_info(&id).await }.boxed_local()
            });
            let user_fetcher = api_fetcher(weak.clone(), |api, id: UserId| {
                async move { api.user_info(&id).await }.boxed_local()
            });
            let message_fetcher = page_fetcher(weak.clone());
            StoreInner {
                channels: Registry::new("channels", spawner.clone(), Some(channel_fetcher), max_idle),
                users: Registry::new("users", spawner.clone(), Some(user_fetcher), max_idle),
                messages: Registry::new("messages", spawner.clone(), Some(message_fetcher), max_idle),
                config,
                spawner,
                clock,
                apis: RefCell::new(HashMap::new()),
                pages: RefCell::new(HashMap::new()),
                pending: RefCell::new(HashMap::new()),
                events: EventStream::new(),
            }
        });
        Self { inner }
    }

    /// Register the API for one account, replacing any previous one.
    pub fn register_api(&self, api: Rc<dyn ChatApi>) {
        let source = api.source();
        tracing::debug!(%source, "registering chat API");
        self.inner.apis.borrow_mut().insert(source, api);
    }

    /// API registered for `source`.
    pub fn api(&self, source: &SourceId) -> Result<Rc<dyn ChatApi>> {
        self.inner.api(source)
    }

    /// Engine configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Spawner for background work.
    pub fn spawner(&self) -> SharedSpawner {
        self.inner.spawner.clone()
    }

    /// Clock used for the current page.
    pub fn clock(&self) -> &Rc<dyn Clock> {
        &self.inner.clock
    }

    /// Page containing the clock's current time.
    pub fn current_page(&self) -> Page {
        self.page_of(self.inner.clock.now())
    }

    /// Page containing `ts`.
    pub fn page_of(&self, ts: Timestamp) -> Page {
        ts.page(self.inner.config.paging.page_span_secs)
    }

    /// Channel cells.
    pub fn channels(&self) -> &Registry<ChannelId, Channel> {
        &self.inner.channels
    }

    /// User cells.
    pub fn users(&self) -> &Registry<UserId, User> {
        &self.inner.users
    }

    /// Message cells.
    pub fn messages(&self) -> &Registry<MessageKey, Message> {
        &self.inner.messages
    }

    /// Remote events, after the store has applied them.
    pub fn events(&self) -> &EventStream<StoreEvent> {
        &self.inner.events
    }

    /// Listen to events of one account.
    pub fn listen_events(
        &self,
        source: &SourceId,
        mut f: impl FnMut(&StoreEvent) + 'static,
    ) -> Subscription {
        let source = source.clone();
        self.inner.events.listen(move |event| {
            if event.source() == &source {
                f(event);
            }
        })
    }

    /// Keys of the messages on one page of a channel, oldest first.
    ///
    /// Pages are fetched once and cached; concurrent calls for the same page
    /// share one request. The messages are merged into the message registry.
    /// Negative pages are rejected without a request.
    pub fn message_page(
        &self,
        source: &SourceId,
        channel: &ChannelId,
        page: Page,
    ) -> LocalBoxFuture<'static, PageResult> {
        if page < 0 {
            let err = TidelineError::invalid(format!(
                "page {page} of {channel} is before the start of the timeline"
            ));
            return futures::future::ready(Err(err)).boxed_local();
        }
        self.request_page((source.clone(), channel.clone(), page), false)
    }

    fn request_page(&self, key: PageKey, reload: bool) -> LocalBoxFuture<'static, PageResult> {
        let (_, channel, page) = &key;
        if !reload {
            if let Some(cached) = self.inner.pages.borrow().get(&key).cloned() {
                tracing::trace!(%channel, page, "page cache hit");
                return futures::future::ready(Ok(cached)).boxed_local();
            }
        }
        if let Some(pending) = self.inner.pending.borrow().get(&key).cloned() {
            tracing::trace!(%channel, page, "joining in-flight page request");
            return pending.boxed_local();
        }

        let weak = Rc::downgrade(&self.inner);
        let request = {
            let key = key.clone();
            async move {
                let result = match weak.upgrade() {
                    Some(inner) => Store { inner }.fetch_page(&key).await,
                    None => Err(TidelineError::cancelled("store dropped")),
                };
                if let Some(inner) = weak.upgrade() {
                    inner.pending.borrow_mut().remove(&key);
                }
                result
            }
            .boxed_local()
            .shared()
        };
        self.inner.pending.borrow_mut().insert(key, request.clone());
        request.boxed_local()
    }

    async fn fetch_page(&self, key: &PageKey) -> PageResult {
        let (source, channel, page) = key;
        let api = self.api(source)?;
        let span = self.inner.config.paging.page_span_secs;
        let start = u64::try_from(*page).unwrap_or(0).saturating_mul(span);
        let oldest = Timestamp::from_secs(start);
        let latest = Timestamp::from_secs(start.saturating_add(span));
        tracing::debug!(%channel, page, %oldest, %latest, "fetching message page");

        let messages = api.history(channel, oldest, latest).await?;
        let keys: Rc<[MessageKey]> = self.merge_messages(source, messages).into();
        self.inner.pages.borrow_mut().insert(key.clone(), keys.clone());
        Ok(keys)
    }

    /// A page's keys, if it was fetched already.
    pub fn cached_page(
        &self,
        source: &SourceId,
        channel: &ChannelId,
        page: Page,
    ) -> Option<Rc<[MessageKey]>> {
        self.inner
            .pages
            .borrow()
            .get(&(source.clone(), channel.clone(), page))
            .cloned()
    }

    /// Write messages into the message registry; returns their sorted keys.
    pub fn merge_messages(&self, source: &SourceId, messages: Vec<Message>) -> Vec<MessageKey> {
        let mut keys = Vec::with_capacity(messages.len());
        tideline_core::reactive::batch(|| {
            for message in messages {
                let key = message.key();
                self.inner.messages.apply(source, &key, message);
                keys.push(key);
            }
        });
        keys.sort();
        keys.dedup();
        keys
    }

    /// Apply a remote event, then announce it on [`events`](Self::events).
    pub fn ingest(&self, event: StoreEvent) {
        tideline_core::reactive::batch(|| {
            match &event {
                StoreEvent::Message { source, message } => {
                    let key = message.key();
                    self.inner.messages.apply(source, &key, message.clone());
                    self.add_to_cached_page(source, &key);
                }
                StoreEvent::Channel { source, channel } => {
                    self.inner.channels.apply(source, &channel.id, channel.clone());
                }
                StoreEvent::ChannelMarked { source, channel, .. } => {
                    self.inner.channels.modify(source, channel, |c| {
                        c.has_unreads = false;
                        c.mention_count = 0;
                    });
                }
                StoreEvent::User { source, user } => {
                    self.inner.users.apply(source, &user.id, user.clone());
                }
            }
            self.inner.events.emit(event);
        });
    }

    /// Decode and apply one raw real-time event.
    pub fn ingest_json(&self, source: &SourceId, text: &str) -> Result<()> {
        if let Some(event) = StoreEvent::from_json(source, text)? {
            self.ingest(event);
        }
        Ok(())
    }

    fn add_to_cached_page(&self, source: &SourceId, key: &MessageKey) {
        let page_key = (source.clone(), key.channel.clone(), self.page_of(key.timestamp));
        let mut pages = self.inner.pages.borrow_mut();
        if let Some(keys) = pages.get_mut(&page_key) {
            if let Err(index) = keys.binary_search(key) {
                let mut updated = keys.to_vec();
                updated.insert(index, key.clone());
                *keys = updated.into();
            }
        }
    }

    /// Evict idle cells from every registry.
    pub fn sweep(&self) -> usize {
        self.inner.channels.sweep() + self.inner.users.sweep() + self.inner.messages.sweep()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("apis", &self.inner.apis.borrow().len())
            .field("channels", &self.inner.channels)
            .field("users", &self.inner.users)
            .field("messages", &self.inner.messages)
            .field("pages", &self.inner.pages.borrow().len())
            .field("pending", &self.inner.pending.borrow().len())
            .finish()
    }
}
