//! Property test strategies for Tideline types
//!
//! Ids come from small pools so generated keys collide often enough to
//! exercise uniqueness handling.

use proptest::prelude::*;

// Re-export proptest for convenience
pub use proptest;

use tideline_core::{ChannelId, MessageKey, SourceId, Timestamp};

/// Channel ids `C0`..`C3`.
pub fn arb_channel_id() -> impl Strategy<Value = ChannelId> {
    (0u8..4).prop_map(|n| ChannelId::new(format!("C{n}")))
}

/// Source ids `T0`..`T1`.
pub fn arb_source_id() -> impl Strategy<Value = SourceId> {
    (0u8..2).prop_map(|n| SourceId::new(format!("T{n}")))
}

/// Timestamps within the first `max_secs` seconds, microsecond precision.
pub fn arb_timestamp(max_secs: u64) -> impl Strategy<Value = Timestamp> {
    (0..max_secs.saturating_mul(1_000_000).max(1)).prop_map(Timestamp::from_micros)
}

/// Message keys over a small id and time space.
pub fn arb_message_key() -> impl Strategy<Value = MessageKey> {
    (arb_channel_id(), (0u64..64).prop_map(Timestamp::from_secs))
        .prop_map(|(channel, ts)| MessageKey::new(channel, ts))
}

/// Up to `max` message keys, duplicates allowed.
pub fn arb_message_keys(max: usize) -> impl Strategy<Value = Vec<MessageKey>> {
    prop::collection::vec(arb_message_key(), 0..=max)
}

/// A sequence of registry operations for ref-counting properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellOp {
    /// Acquire a handle for key `n`
    Listen(u8),
    /// Drop the oldest live handle for key `n`, if any
    Release(u8),
    /// Run a sweep
    Sweep,
}

/// Registry operations over keys `0..keys`.
pub fn arb_cell_ops(keys: u8, max: usize) -> impl Strategy<Value = Vec<CellOp>> {
    let keys = keys.max(1);
    let op = prop_oneof![
        3 => (0..keys).prop_map(CellOp::Listen),
        2 => (0..keys).prop_map(CellOp::Release),
        1 => Just(CellOp::Sweep),
    ];
    prop::collection::vec(op, 0..=max)
}
