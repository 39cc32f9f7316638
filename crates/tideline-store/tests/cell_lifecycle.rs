//! Property-Based Tests for LiveCell reference counting
//!
//! ## Properties Verified
//!
//! - A cell is never evicted while a handle to it is alive
//! - A cell becomes evictable as soon as its last handle is released
//! - Every handle for the same `(source, key)` refers to the same cell

#![allow(clippy::unwrap_used, clippy::expect_used)]

use futures::executor::LocalPool;
use proptest::prelude::*;
use std::collections::HashMap;
use std::rc::Rc;
use tideline_core::SourceId;
use tideline_store::{LiveCell, Registry};
use tideline_testkit::strategies::{arb_cell_ops, CellOp};

fn registry(pool: &LocalPool) -> Registry<u8, String> {
    Registry::new("props", Rc::new(pool.spawner()), None, usize::MAX)
}

proptest! {
    /// Property: held cells survive any sweep; released cells go at the next one
    #[test]
    fn prop_no_eviction_while_held(ops in arb_cell_ops(6, 60)) {
        let pool = LocalPool::new();
        let registry = registry(&pool);
        let source = SourceId::new("T1");
        let mut held: HashMap<u8, Vec<LiveCell<u8, String>>> = HashMap::new();

        for op in ops {
            match op {
                CellOp::Listen(key) => {
                    let cell = registry.listen(&key, &source);
                    if let Some(existing) = held.get(&key).and_then(|cells| cells.first()) {
                        prop_assert!(existing.ptr_eq(&cell));
                    }
                    held.entry(key).or_default().push(cell);
                }
                CellOp::Release(key) => {
                    let emptied = match held.get_mut(&key) {
                        Some(cells) if !cells.is_empty() => {
                            cells.remove(0);
                            cells.is_empty()
                        }
                        _ => false,
                    };
                    if emptied {
                        prop_assert!(registry.contains(&key, &source));
                        registry.sweep();
                        prop_assert!(!registry.contains(&key, &source));
                    }
                }
                CellOp::Sweep => {
                    registry.sweep();
                }
            }

            for (key, cells) in &held {
                if let Some(cell) = cells.first() {
                    prop_assert!(registry.contains(key, &source));
                    prop_assert_eq!(cell.ref_count(), cells.len());
                }
            }
        }

        let live = held.values().filter(|cells| !cells.is_empty()).count();
        registry.sweep();
        prop_assert_eq!(registry.len(), live);
        prop_assert_eq!(registry.idle_count(), 0);
    }
}

#[test]
fn test_cloned_handles_count_as_references() {
    let pool = LocalPool::new();
    let registry = registry(&pool);
    let source = SourceId::new("T1");

    let first = registry.listen(&1, &source);
    let second = first.clone();
    assert_eq!(first.ref_count(), 2);

    drop(first);
    assert_eq!(registry.sweep(), 0);
    assert_eq!(second.ref_count(), 1);

    drop(second);
    assert_eq!(registry.idle_count(), 1);
    assert_eq!(registry.sweep(), 1);
    assert!(registry.is_empty());
}
