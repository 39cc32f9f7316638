//! Runtime-agnostic task spawning.
//!
//! The engine is single-threaded: every future it spawns is `!Send` and must
//! run on the thread that owns the store.

use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use std::rc::Rc;

/// Task spawning contract for runtime implementations.
pub trait TaskSpawner {
    /// Spawn a background task on the current thread.
    fn spawn(&self, fut: LocalBoxFuture<'static, ()>);
}

/// Shared handle to a spawner.
pub type SharedSpawner = Rc<dyn TaskSpawner>;

impl TaskSpawner for futures::executor::LocalSpawner {
    fn spawn(&self, fut: LocalBoxFuture<'static, ()>) {
        if let Err(err) = self.spawn_local(fut) {
            tracing::error!(error = %err, "failed to spawn local task");
        }
    }
}

impl<S: TaskSpawner + ?Sized> TaskSpawner for Rc<S> {
    fn spawn(&self, fut: LocalBoxFuture<'static, ()>) {
        (**self).spawn(fut);
    }
}

/// Spawner for hosts running the engine inside a `tokio::task::LocalSet`.
#[cfg(feature = "tokio")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioLocalSpawner;

#[cfg(feature = "tokio")]
impl TaskSpawner for TokioLocalSpawner {
    fn spawn(&self, fut: LocalBoxFuture<'static, ()>) {
        drop(tokio::task::spawn_local(fut));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::LocalPool;
    use futures::FutureExt;
    use std::cell::Cell;

    #[test]
    fn test_local_spawner_runs_tasks() {
        let mut pool = LocalPool::new();
        let spawner: SharedSpawner = Rc::new(pool.spawner());
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        spawner.spawn(async move { flag.set(true) }.boxed_local());
        assert!(!ran.get());

        pool.run_until_stalled();
        assert!(ran.get());
    }
}
