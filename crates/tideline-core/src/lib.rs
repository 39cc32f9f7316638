//! Tideline Core - foundations of the client engine
//!
//! This crate holds everything the store and view-model layers share:
//!
//! - [`collections`]: the ordered, optionally unique [`SortedCollection`]
//! - [`reactive`]: properties, derivations, event streams and teardown bags
//! - [`action`]: serialized async actions with observable outcome
//! - [`identifiers`] and [`time`]: record keys, timestamps and page arithmetic
//! - [`config`]: engine configuration
//! - [`effects`]: task spawning
//!
//! The engine is single-threaded. All state lives behind `Rc`/`RefCell`, and
//! asynchronous work runs as `!Send` futures on the owning thread.

#![forbid(unsafe_code)]

/// Serialized async actions
pub mod action;

/// Ordered collections
pub mod collections;

/// Engine configuration
pub mod config;

/// Task spawning
pub mod effects;

/// Unified error handling
pub mod errors;

/// Record identifiers
pub mod identifiers;

/// Reactive properties and derivations
pub mod reactive;

/// Timestamps, pages and clocks
pub mod time;

pub use action::{Action, ActionLock};
pub use collections::SortedCollection;
pub use config::{ClientConfig, TidelineConfig};
pub use effects::{SharedSpawner, TaskSpawner};
pub use errors::{Result, TidelineError};
pub use identifiers::{message_key_compare, ChannelId, MessageKey, SourceId, UserId};
pub use time::{timestamp_to_page, Clock, FixedClock, Page, SystemClock, Timestamp};
