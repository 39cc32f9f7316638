//! Effect interfaces the engine depends on

mod task;

#[cfg(feature = "tokio")]
pub use task::TokioLocalSpawner;
pub use task::{SharedSpawner, TaskSpawner};
