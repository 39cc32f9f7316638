//! Tideline Testing Infrastructure
//!
//! Shared setup for the store and view-model tests: a deterministic
//! [`TestHarness`], an in-memory [`MockChatApi`], record fixtures and
//! proptest strategies.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
//!
//! # Usage
//!
//! ```rust,no_run
//! use tideline_testkit::*;
//!
//! let mut harness = TestHarness::new(10_000);
//! harness.api.add_message(fixtures::message("C1", 9_000, "U1", "hi"));
//! let store = harness.store.clone();
//! let keys = harness
//!     .run(store.message_page(&harness.source(), &"C1".into(), 0))
//!     .unwrap();
//! assert_eq!(keys.len(), 1);
//! ```

pub mod fixtures;
pub mod harness;
pub mod mock_api;
pub mod strategies;

pub use harness::{TestHarness, TEST_SOURCE};
pub use mock_api::{HistoryCall, MockChatApi};

use tracing_subscriber::EnvFilter;

/// Install a test-friendly tracing subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
