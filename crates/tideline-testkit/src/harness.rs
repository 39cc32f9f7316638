//! Deterministic single-threaded test harness

use crate::mock_api::MockChatApi;
use futures::executor::LocalPool;
use std::future::Future;
use std::rc::Rc;
use tideline_core::{ClientConfig, FixedClock, SharedSpawner, SourceId, Timestamp};
use tideline_store::Store;

/// Account id every harness registers its mock API under.
pub const TEST_SOURCE: &str = "T1";

/// A store wired to a [`MockChatApi`], a [`FixedClock`] and a `LocalPool`.
///
/// Nothing runs until the test drives the pool, so every interleaving is
/// explicit.
pub struct TestHarness {
    /// Executor for every spawned task
    pub pool: LocalPool,
    /// Store under test
    pub store: Store,
    /// Mock service registered for [`TEST_SOURCE`]
    pub api: Rc<MockChatApi>,
    /// Clock the store pages against
    pub clock: Rc<FixedClock>,
}

impl TestHarness {
    /// Harness with default configuration, the clock at `now_secs`.
    pub fn new(now_secs: u64) -> Self {
        Self::with_config(ClientConfig::default(), now_secs)
    }

    /// Harness with a custom configuration.
    pub fn with_config(config: ClientConfig, now_secs: u64) -> Self {
        crate::init_tracing();
        let pool = LocalPool::new();
        let clock = Rc::new(FixedClock::new(Timestamp::from_secs(now_secs)));
        let spawner: SharedSpawner = Rc::new(pool.spawner());
        let store = Store::new(config, spawner, clock.clone());
        let api = Rc::new(MockChatApi::new(TEST_SOURCE));
        store.register_api(api.clone());
        Self {
            pool,
            store,
            api,
            clock,
        }
    }

    /// Harness with a given page span and clock, other settings default.
    pub fn with_page_span(page_span_secs: u64, now_secs: u64) -> Self {
        let mut config = ClientConfig::default();
        config.paging.page_span_secs = page_span_secs;
        Self::with_config(config, now_secs)
    }

    /// The harness account.
    pub fn source(&self) -> SourceId {
        SourceId::new(TEST_SOURCE)
    }

    /// The store's spawner.
    pub fn spawner(&self) -> SharedSpawner {
        self.store.spawner()
    }

    /// Run every ready task.
    pub fn settle(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Drive `future` to completion, running spawned tasks alongside.
    pub fn run<F: Future>(&mut self, future: F) -> F::Output {
        self.pool.run_until(future)
    }

    /// Pages the mock API has been asked for, in order.
    pub fn requested_pages(&self) -> Vec<i64> {
        self.api
            .requested_pages(self.store.config().paging.page_span_secs)
    }
}
