//! Tideline App - view-models over the store
//!
//! This crate turns live store data into the state a chat UI renders:
//!
//! - [`list_sync`]: [`ViewModelListSync`], which keeps one pooled view-model
//!   per visible row of an ordered key list
//! - [`views`]: channel and message view-models, including the paginated
//!   [`MessagesViewModel`](views::MessagesViewModel) and the
//!   [`MessagesView`](views::MessagesView) row/infinite-loading surface
//!
//! Rendering and windowing are left to the host: it reads properties,
//! listens to `should_render`, and reports the visible range through
//! [`ViewModelListSync::set_window`].

#![forbid(unsafe_code)]

/// Pooled per-row view-models
pub mod list_sync;

/// Domain view-models
pub mod views;

pub use list_sync::{ViewModel, ViewModelListSync};
pub use views::{
    ChannelList, ChannelListViewModel, ChannelViewModel, MessageViewModel, MessagesView,
    MessagesViewModel,
};
