//! Configuration for the client engine
//!
//! Configuration is loaded from TOML (or JSON), optionally overridden by
//! `TIDELINE_<SECTION>_<KEY>` environment variables, then validated once
//! before the [`ClientConfig`] is handed to the store.

mod client;
mod traits;

pub use client::{
    CacheConfig, ClientConfig, DisplayConfig, ListConfig, PagingConfig, ENV_PREFIX,
};
pub use traits::{ConfigValidation, TidelineConfig};
