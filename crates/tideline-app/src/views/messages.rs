//! MessagesViewModel - the paginated message window of one channel
//!
//! The window starts at the current page and grows backwards (or forwards)
//! one non-empty page at a time. Three actions move it:
//! `scroll_previous_page`, `scroll_next_page` and
//! `get_messages_for_current_page`. They share one lock, so each invocation
//! sees the state the previous one left behind.
//!
//! Page loading runs through a single request pipeline fed by
//! `message_page` changes, action results and live messages. Consecutive
//! requests for the same page are dropped; every other request fetches the
//! page from the store and merges its keys into `messages`. Overlapping
//! fetches for different pages are allowed to run concurrently, the merge is
//! order independent.

use crate::list_sync::ViewModel;
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use tideline_core::action::new_lock;
use tideline_core::reactive::{Model, ObservableCollection, Property, ReadProperty};
use tideline_core::{
    message_key_compare, Action, ChannelId, MessageKey, Page, Result, SourceId,
};
use tideline_store::{next_page_number, Direction, Store, StoreEvent};

struct Pager {
    store: Store,
    source: SourceId,
    channel: ChannelId,
    message_page: Property<Page>,
    messages: ObservableCollection<MessageKey>,
    last_request: Cell<Option<Page>>,
    in_flight: Property<usize>,
    closed: Cell<bool>,
}

impl Pager {
    /// Feed one page into the request pipeline.
    fn request(self: &Rc<Self>, page: Page) {
        if self.closed.get() {
            return;
        }
        if page < 0 {
            tracing::trace!(channel = %self.channel, page, "dropping request before page 0");
            return;
        }
        if self.last_request.replace(Some(page)) == Some(page) {
            tracing::trace!(channel = %self.channel, page, "suppressing repeated page request");
            return;
        }
        tracing::debug!(channel = %self.channel, page, "requesting page");
        self.in_flight.update(|n| n + 1);
        let fetch = self.store.message_page(&self.source, &self.channel, page);
        let this = self.clone();
        self.store.spawner().spawn(
            async move {
                match fetch.await {
                    Ok(_) if this.closed.get() => {
                        tracing::trace!(channel = %this.channel, page, "dropping page for closed window");
                    }
                    Ok(keys) => {
                        this.messages.insert(keys.iter().cloned());
                    }
                    Err(err) => {
                        tracing::warn!(channel = %this.channel, page, error = %err, "page request failed");
                        // let the same page be asked for again
                        if this.last_request.get() == Some(page) {
                            this.last_request.set(None);
                        }
                    }
                }
                this.in_flight.update(|n| n.saturating_sub(1));
            }
            .boxed_local(),
        );
    }

    async fn previous_page(&self) -> Result<Page> {
        let anchor = match self.messages.first() {
            Some(oldest) => self.store.page_of(oldest.timestamp) - 1,
            None => self.message_page.get(),
        };
        if anchor < 0 {
            tracing::trace!(channel = %self.channel, "already at the start of the timeline");
            return Ok(0);
        }
        let page = next_page_number(
            &self.store,
            &self.channel,
            anchor,
            Direction::Backward,
            &self.source,
        )
        .await?;
        self.message_page.set(page);
        Ok(page)
    }

    async fn next_page(&self) -> Result<Page> {
        let anchor = match self.messages.last() {
            Some(newest) => self.store.page_of(newest.timestamp) + 1,
            None => self.message_page.get(),
        };
        let page = next_page_number(
            &self.store,
            &self.channel,
            anchor,
            Direction::Forward,
            &self.source,
        )
        .await?;
        self.message_page.set(page);
        Ok(page)
    }

    async fn current_page(&self) -> Result<Page> {
        let page = next_page_number(
            &self.store,
            &self.channel,
            self.message_page.get() + 1,
            Direction::Backward,
            &self.source,
        )
        .await?;
        self.message_page.set(page);
        Ok(page)
    }
}

fn pager_action<F>(
    name: &'static str,
    lock: &tideline_core::ActionLock,
    pager: &Rc<Pager>,
    step: F,
) -> Action<Page>
where
    F: Fn(Rc<Pager>) -> LocalBoxFuture<'static, Result<Page>> + 'static,
{
    let pager = pager.clone();
    Action::with_lock(name, lock.clone(), move || step(pager.clone()))
}

/// Paginated message window of one channel.
pub struct MessagesViewModel {
    lifecycle: Model,
    pager: Rc<Pager>,
    scroll_previous: Action<Page>,
    scroll_next: Action<Page>,
    load_current: Action<Page>,
}

impl MessagesViewModel {
    /// Window over `channel`, starting at the current page.
    ///
    /// The current page is requested right away; call
    /// [`get_messages_for_current_page`](Self::get_messages_for_current_page)
    /// to move to the newest non-empty page.
    pub fn new(store: &Store, source: &SourceId, channel: &ChannelId) -> Self {
        let pager = Rc::new(Pager {
            store: store.clone(),
            source: source.clone(),
            channel: channel.clone(),
            message_page: Property::new(store.current_page()),
            messages: ObservableCollection::new(message_key_compare, true),
            last_request: Cell::new(None),
            in_flight: Property::new(0),
            closed: Cell::new(false),
        });

        let lock = new_lock();
        let scroll_previous = pager_action("scroll_previous_page", &lock, &pager, |p| {
            async move { p.previous_page().await }.boxed_local()
        });
        let scroll_next = pager_action("scroll_next_page", &lock, &pager, |p| {
            async move { p.next_page().await }.boxed_local()
        });
        let load_current = pager_action("get_messages_for_current_page", &lock, &pager, |p| {
            async move { p.current_page().await }.boxed_local()
        });

        let lifecycle = Model::new();
        lifecycle.on_teardown({
            let pager = pager.clone();
            move || pager.closed.set(true)
        });
        lifecycle.add_teardown(pager.message_page.observe({
            let pager = pager.clone();
            move |page: &Page| pager.request(*page)
        }));
        for action in [&scroll_previous, &scroll_next, &load_current] {
            lifecycle.add_teardown(action.results().listen({
                let pager = pager.clone();
                move |page: &Page| pager.request(*page)
            }));
        }
        lifecycle.add_teardown(store.listen_events(source, {
            let pager = pager.clone();
            move |event| {
                let StoreEvent::Message { message, .. } = event else {
                    return;
                };
                if message.channel != pager.channel {
                    return;
                }
                pager.messages.insert_one(message.key());
                pager.request(pager.store.page_of(message.ts));
            }
        }));

        Self {
            lifecycle,
            pager,
            scroll_previous,
            scroll_next,
            load_current,
        }
    }

    /// Channel shown.
    pub fn channel(&self) -> &ChannelId {
        &self.pager.channel
    }

    /// Account the channel belongs to.
    pub fn source(&self) -> &SourceId {
        &self.pager.source
    }

    /// Page the window is anchored on.
    pub fn message_page(&self) -> ReadProperty<Page> {
        self.pager.message_page.read()
    }

    /// Keys of every message loaded so far, oldest first.
    pub fn messages(&self) -> &ObservableCollection<MessageKey> {
        &self.pager.messages
    }

    /// Page fetches the pipeline is waiting for.
    pub fn in_flight(&self) -> ReadProperty<usize> {
        self.pager.in_flight.read()
    }

    /// Resolve once no pipeline fetch is in flight.
    pub fn settled(&self) -> LocalBoxFuture<'static, ()> {
        self.pager
            .in_flight
            .wait_for(|n| *n == 0)
            .map(|_| ())
            .boxed_local()
    }

    /// Load the nearest non-empty page before the oldest loaded message.
    pub fn scroll_previous_page(&self) -> LocalBoxFuture<'static, Result<Page>> {
        self.scroll_previous.execute()
    }

    /// Load the nearest non-empty page after the newest loaded message.
    pub fn scroll_next_page(&self) -> LocalBoxFuture<'static, Result<Page>> {
        self.scroll_next.execute()
    }

    /// Move to the newest non-empty page at or before the current one.
    pub fn get_messages_for_current_page(&self) -> LocalBoxFuture<'static, Result<Page>> {
        self.load_current.execute()
    }

    /// The backward scroll action, for its in-flight state and errors.
    pub fn scroll_previous_action(&self) -> &Action<Page> {
        &self.scroll_previous
    }

    /// The forward scroll action.
    pub fn scroll_next_action(&self) -> &Action<Page> {
        &self.scroll_next
    }

    /// The current-page action.
    pub fn current_page_action(&self) -> &Action<Page> {
        &self.load_current
    }
}

impl ViewModel for MessagesViewModel {
    fn lifecycle(&self) -> &Model {
        &self.lifecycle
    }
}

impl fmt::Debug for MessagesViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagesViewModel")
            .field("channel", &self.pager.channel)
            .field("message_page", &self.pager.message_page.get())
            .field("messages", &self.pager.messages.len())
            .field("in_flight", &self.pager.in_flight.get())
            .finish()
    }
}
