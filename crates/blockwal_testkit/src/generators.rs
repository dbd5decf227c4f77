//! Property-based test generators using proptest.
//!
//! Provides strategies for generating payloads and block sizes that
//! exercise the fragmentation paths: payloads larger than a block, block
//! sizes at the minimum, and everything between.

use blockwal_core::MIN_BLOCK_SIZE;
use proptest::prelude::*;

/// Strategy for arbitrary payloads, empty included.
pub fn payload_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Strategy for non-empty payloads.
pub fn nonempty_payload_strategy(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len)
}

/// Strategy for block sizes small enough to force record splits.
pub fn block_size_strategy() -> impl Strategy<Value = usize> {
    MIN_BLOCK_SIZE..=256usize
}

/// Strategy for a batch of non-empty payloads written as one log.
pub fn payload_batch_strategy(
    max_records: usize,
    max_len: usize,
) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(nonempty_payload_strategy(max_len), 0..=max_records)
}
