//! Shared helpers for blockwal benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// Builds a deterministic payload of the given size.
#[must_use]
pub fn sequential_payload(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}
