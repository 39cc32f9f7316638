//! ChannelViewModel - display state of one channel row

use super::naming::truncate_display_name;
use super::user::UserSlot;
use crate::list_sync::ViewModel;
use std::fmt;
use std::rc::Rc;
use tideline_core::reactive::{derive, derive2, filter_map, switch_map, Model, ReadProperty};
use tideline_core::ChannelId;
use tideline_store::{Channel, LiveCell, Store, User};

/// The list a channel row belongs to.
pub trait ChannelList {
    /// Make `channel` the selected one.
    fn set_selected_channel(&self, channel: Channel);
}

/// View state of one channel.
///
/// Every property follows the channel's live cell. Direct message channels
/// also follow the peer user's cell for their name and avatar.
pub struct ChannelViewModel {
    lifecycle: Model,
    cell: LiveCell<ChannelId, Channel>,
    parent: Rc<dyn ChannelList>,
    channel: ReadProperty<Option<Channel>>,
    starred: ReadProperty<bool>,
    mentions: ReadProperty<u32>,
    highlighted: ReadProperty<bool>,
    display_name: ReadProperty<String>,
    profile_image: ReadProperty<String>,
}

impl ChannelViewModel {
    /// Build the view-model for `cell`.
    pub fn new(
        store: &Store,
        cell: LiveCell<ChannelId, Channel>,
        parent: Rc<dyn ChannelList>,
    ) -> Self {
        let display = &store.config().display;
        let channel = cell.value();

        let starred = derive(&channel, |c: &Option<Channel>| {
            c.as_ref().is_some_and(|c| c.is_starred)
        });
        let mentions = derive(&channel, |c: &Option<Channel>| {
            c.as_ref().map_or(0, |c| c.mention_count)
        });
        let has_unreads = derive(&channel, |c: &Option<Channel>| {
            c.as_ref().is_some_and(|c| c.has_unreads)
        });
        let highlighted = derive2(&mentions, &has_unreads, |mentions: &u32, unreads: &bool| {
            *mentions > 0 || *unreads
        });

        let peer = UserSlot::new(store, cell.source());
        let peer_user = {
            let peer = peer.clone();
            switch_map(&channel, None, move |c: &Option<Channel>| {
                let id = c.as_ref()?.dm_peer()?;
                Some(peer.follow(id))
            })
        };

        let display_name = {
            let max = display.max_display_name_len;
            let fallback = cell.key().to_string();
            derive2(&channel, &peer_user, move |c: &Option<Channel>, user: &Option<User>| {
                let name = match c {
                    None => fallback.as_str(),
                    Some(c) => match c.dm_peer() {
                        Some(peer) => user
                            .as_ref()
                            .filter(|u| &u.id == peer)
                            .and_then(User::display_name)
                            .unwrap_or(c.name.as_str()),
                        None => c.name.as_str(),
                    },
                };
                truncate_display_name(name, max)
            })
        };

        let profile_image = filter_map(
            &peer_user,
            display.default_avatar.clone(),
            |user: &Option<User>| {
                user.as_ref()?
                    .profile
                    .as_ref()
                    .map(|profile| profile.image_72.clone())
            },
        );

        let lifecycle = Model::new();
        // a user without a profile is a partial record
        lifecycle.add_teardown(peer_user.observe({
            let peer = peer.clone();
            move |user: &Option<User>| {
                if user.as_ref().is_some_and(|u| u.profile.is_none()) {
                    peer.invalidate();
                }
            }
        }));
        lifecycle.on_teardown(move || peer.release());

        Self {
            lifecycle,
            cell,
            parent,
            channel,
            starred,
            mentions,
            highlighted,
            display_name,
            profile_image,
        }
    }

    /// Channel id.
    pub fn id(&self) -> &ChannelId {
        self.cell.key()
    }

    /// The channel record; `None` until resolved.
    pub fn model(&self) -> ReadProperty<Option<Channel>> {
        self.channel.clone()
    }

    /// Whether the channel is starred.
    pub fn starred(&self) -> ReadProperty<bool> {
        self.starred.clone()
    }

    /// Unread mentions.
    pub fn mentions(&self) -> ReadProperty<u32> {
        self.mentions.clone()
    }

    /// Whether the row should stand out: mentions or unread messages.
    pub fn highlighted(&self) -> ReadProperty<bool> {
        self.highlighted.clone()
    }

    /// Name shown in the list, truncated.
    pub fn display_name(&self) -> ReadProperty<String> {
        self.display_name.clone()
    }

    /// Avatar URL; the default avatar until a peer profile is known.
    pub fn profile_image(&self) -> ReadProperty<String> {
        self.profile_image.clone()
    }

    /// The underlying live cell.
    pub fn cell(&self) -> &LiveCell<ChannelId, Channel> {
        &self.cell
    }

    /// Select this channel in its list. Ignored until the channel resolves.
    pub fn select_channel(&self) {
        match self.channel.get() {
            Some(channel) => self.parent.set_selected_channel(channel),
            None => tracing::debug!(channel = %self.id(), "ignoring selection of unresolved channel"),
        }
    }
}

impl ViewModel for ChannelViewModel {
    fn lifecycle(&self) -> &Model {
        &self.lifecycle
    }
}

impl fmt::Debug for ChannelViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelViewModel")
            .field("id", self.id())
            .field("display_name", &self.display_name.get())
            .field("highlighted", &self.highlighted.get())
            .finish()
    }
}
