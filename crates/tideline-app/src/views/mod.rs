//! # View-models
//!
//! Domain view-models built on the store: channel rows and the channel
//! list, message rows and the paginated message window. Every view-model
//! owns a teardown [`Model`](tideline_core::reactive::Model) and exposes its
//! state as read-only properties.

mod user;

pub mod channel;
pub mod channel_list;
pub mod message;
pub mod messages;
pub mod messages_view;
pub mod naming;

pub use channel::{ChannelList, ChannelViewModel};
pub use channel_list::ChannelListViewModel;
pub use message::MessageViewModel;
pub use messages::MessagesViewModel;
pub use messages_view::MessagesView;
