//! MessagesView - rows and infinite loading for one channel's messages

use super::message::MessageViewModel;
use super::messages::MessagesViewModel;
use crate::list_sync::{ViewModel, ViewModelListSync};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use std::fmt;
use std::rc::Rc;
use tideline_core::reactive::Model;
use tideline_core::{ChannelId, MessageKey, Result, SourceId, Timestamp};
use tideline_store::Store;

/// Message list of one channel, as the windowing widget sees it.
///
/// Rows are keyed by message timestamp. Creating the view starts loading
/// the newest non-empty page.
pub struct MessagesView {
    lifecycle: Model,
    store: Store,
    messages: Rc<MessagesViewModel>,
    list: ViewModelListSync<MessageKey, Timestamp, MessageViewModel>,
}

impl MessagesView {
    /// Open `channel` of `source`.
    pub fn new(store: &Store, source: &SourceId, channel: &ChannelId) -> Self {
        let messages = Rc::new(MessagesViewModel::new(store, source, channel));
        let list = {
            let overscan = store.config().list.overscan;
            let store = store.clone();
            let source = source.clone();
            ViewModelListSync::new(
                messages.messages().clone(),
                overscan,
                |key: &MessageKey| key.timestamp,
                move |key| MessageViewModel::new(&store, store.messages().listen(key, &source)),
            )
        };

        let initial = messages.get_messages_for_current_page();
        let channel = channel.clone();
        store.spawner().spawn(
            async move {
                if let Err(err) = initial.await {
                    tracing::warn!(%channel, error = %err, "initial message load failed");
                }
            }
            .boxed_local(),
        );

        let lifecycle = Model::new();
        lifecycle.on_teardown({
            let messages = messages.clone();
            move || messages.lifecycle().teardown()
        });
        list.close_with(&lifecycle);
        Self {
            lifecycle,
            store: store.clone(),
            messages,
            list,
        }
    }

    /// The pagination state behind the rows.
    pub fn view_model(&self) -> &MessagesViewModel {
        &self.messages
    }

    /// Per-row view-models.
    pub fn list(&self) -> &ViewModelListSync<MessageKey, Timestamp, MessageViewModel> {
        &self.list
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.list.row_count()
    }

    /// Whether the message at `index` has arrived in the store.
    pub fn is_row_loaded(&self, index: usize) -> bool {
        self.list.key_at(index).is_some_and(|key| {
            self.store
                .messages()
                .peek(&key, self.messages.source())
                .is_some()
        })
    }

    /// Load older messages until `paging.load_more_batch` more rows exist,
    /// the start of the timeline is reached, or a step stops making
    /// progress. Resolves to the row count.
    pub fn load_more_rows(&self) -> LocalBoxFuture<'static, Result<usize>> {
        let messages = self.messages.clone();
        let batch = self.store.config().paging.load_more_batch;
        async move {
            let target = messages.messages().len() + batch;
            let page = messages.message_page();
            while messages.messages().len() < target {
                let before = page.get();
                if before <= 0 {
                    break;
                }
                messages.scroll_previous_page().await?;
                messages.settled().await;
                if page.get() >= before {
                    tracing::debug!(channel = %messages.channel(), page = before, "no older pages");
                    break;
                }
            }
            Ok(messages.messages().len())
        }
        .boxed_local()
    }
}

impl ViewModel for MessagesView {
    fn lifecycle(&self) -> &Model {
        &self.lifecycle
    }
}

impl fmt::Debug for MessagesView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessagesView")
            .field("messages", &self.messages)
            .field("list", &self.list)
            .finish()
    }
}
