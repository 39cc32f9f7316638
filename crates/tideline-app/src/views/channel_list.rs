//! ChannelListViewModel - the channel sidebar of one account

use super::channel::{ChannelList, ChannelViewModel};
use crate::list_sync::{ViewModel, ViewModelListSync};
use std::fmt;
use std::rc::Rc;
use tideline_core::reactive::{Model, ObservableCollection, Property, ReadProperty};
use tideline_core::{ChannelId, SourceId};
use tideline_store::{Channel, Store, StoreEvent};

struct Selection {
    selected: Property<Option<Channel>>,
}

impl ChannelList for Selection {
    fn set_selected_channel(&self, channel: Channel) {
        tracing::debug!(channel = %channel.id, "channel selected");
        self.selected.set(Some(channel));
    }
}

/// Sorted channels of one account with a selection.
///
/// Channels announced by remote events join the list as they arrive.
pub struct ChannelListViewModel {
    lifecycle: Model,
    source: SourceId,
    selection: Rc<Selection>,
    list: ViewModelListSync<ChannelId, ChannelId, ChannelViewModel>,
}

impl ChannelListViewModel {
    /// List `channels` of `source`.
    pub fn new(
        store: &Store,
        source: &SourceId,
        channels: impl IntoIterator<Item = ChannelId>,
    ) -> Self {
        let ids = ObservableCollection::natural();
        ids.insert(channels);
        let selection = Rc::new(Selection {
            selected: Property::new(None),
        });

        let list = {
            let overscan = store.config().list.overscan;
            let store = store.clone();
            let source = source.clone();
            let parent: Rc<dyn ChannelList> = selection.clone();
            ViewModelListSync::new(ids.clone(), overscan, ChannelId::clone, move |id| {
                let cell = store.channels().listen(id, &source);
                ChannelViewModel::new(&store, cell, parent.clone())
            })
        };

        let lifecycle = Model::new();
        list.close_with(&lifecycle);
        lifecycle.add_teardown(store.listen_events(source, move |event| {
            if let StoreEvent::Channel { channel, .. } = event {
                if ids.insert_one(channel.id.clone()) {
                    tracing::debug!(channel = %channel.id, "channel joined list");
                }
            }
        }));

        Self {
            lifecycle,
            source: source.clone(),
            selection,
            list,
        }
    }

    /// Account the list belongs to.
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Sorted channel ids.
    pub fn channels(&self) -> &ObservableCollection<ChannelId> {
        self.list.keys()
    }

    /// Add channels to the list.
    pub fn add_channels(&self, channels: impl IntoIterator<Item = ChannelId>) {
        self.list.keys().insert(channels);
    }

    /// Currently selected channel.
    pub fn selected(&self) -> ReadProperty<Option<Channel>> {
        self.selection.selected.read()
    }

    /// Per-row view-models.
    pub fn list(&self) -> &ViewModelListSync<ChannelId, ChannelId, ChannelViewModel> {
        &self.list
    }
}

impl ChannelList for ChannelListViewModel {
    fn set_selected_channel(&self, channel: Channel) {
        self.selection.set_selected_channel(channel);
    }
}

impl ViewModel for ChannelListViewModel {
    fn lifecycle(&self) -> &Model {
        &self.lifecycle
    }
}

impl fmt::Debug for ChannelListViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelListViewModel")
            .field("source", &self.source)
            .field("list", &self.list)
            .field("selected", &self.selection.selected.with(|c| c.as_ref().map(|c| c.id.clone())))
            .finish()
    }
}
