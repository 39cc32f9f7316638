//! Tideline Store - the data layer of the client engine
//!
//! Remote records live in reference-counted [`LiveCell`]s, deduplicated per
//! `(source, key)` by a [`Registry`]. The [`Store`] context object bundles
//! one registry per record type with the page cache, the registered
//! [`ChatApi`]s and the stream of remote events, and is handed to every
//! view-model.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::rc::Rc;
//! use futures::executor::LocalPool;
//! use tideline_core::{ChannelId, ClientConfig, SourceId, SystemClock};
//! use tideline_store::Store;
//!
//! let pool = LocalPool::new();
//! let store = Store::new(ClientConfig::default(), Rc::new(pool.spawner()), Rc::new(SystemClock));
//! let cell = store.channels().listen(&ChannelId::new("C1"), &SourceId::new("T1"));
//! let _name = cell.map(|channel| channel.name.clone());
//! ```

#![forbid(unsafe_code)]

/// Remote chat service contract
pub mod api;

/// Reference-counted live cells
pub mod cell;

/// Remote event decoding
pub mod events;

/// Wire models
pub mod models;

/// Nearest non-empty page search
pub mod pagination;

/// Keyed cell registries
pub mod registry;

/// The store context object
pub mod store;

pub use api::ChatApi;
pub use cell::{Fetcher, LiveCell};
pub use events::StoreEvent;
pub use models::{Channel, Message, Profile, User};
pub use pagination::{next_page_number, Direction};
pub use registry::Registry;
pub use store::Store;
