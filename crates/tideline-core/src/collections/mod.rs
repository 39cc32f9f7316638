//! Ordered collections

mod sorted;

pub use sorted::{Comparator, Snapshot, SortedCollection};
