//! Error types for the log core.

use thiserror::Error;

/// Result type for log operations.
pub type WalResult<T> = Result<T, WalError>;

/// Errors that can occur while writing or reading the log.
///
/// Variants are tagged so callers can distinguish recoverable conditions
/// (a malformed fragment in an otherwise-readable stream) from fatal ones
/// (store I/O failure, checksum mismatch).
#[derive(Debug, Error)]
pub enum WalError {
    /// Underlying store failure, surfaced verbatim.
    #[error("store error: {0}")]
    Store(#[from] blockwal_store::StoreError),

    /// Block size outside the supported range.
    ///
    /// The block size must be at least 11 bytes (7-byte header plus room
    /// for the split path to make forward progress) and small enough that
    /// every fragment body length fits the header's u16 length field.
    #[error("invalid block size {got}: must be between 11 and 65542 bytes")]
    InvalidBlockSize {
        /// The rejected block size.
        got: usize,
    },

    /// Recomputed fragment checksum does not match the stored one.
    #[error("checksum mismatch at offset {offset}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// File offset of the offending fragment header.
        offset: u64,
        /// The stored (masked) checksum.
        expected: u32,
        /// The recomputed (masked) checksum.
        actual: u32,
    },

    /// A fragment-type transition violated the reassembly state machine.
    #[error("malformed fragment sequence at offset {offset}: {message}")]
    MalformedSequence {
        /// File offset of the offending fragment header.
        offset: u64,
        /// Description of the violation.
        message: String,
    },

    /// End of source reached while reassembling a split record.
    #[error("record truncated: log ended mid-record (record starts at offset {offset})")]
    TruncatedRecord {
        /// File offset of the record's FIRST fragment header.
        offset: u64,
    },
}

impl WalError {
    /// Creates a malformed-sequence error.
    pub fn malformed(offset: u64, message: impl Into<String>) -> Self {
        Self::MalformedSequence {
            offset,
            message: message.into(),
        }
    }

    /// Returns `true` if the reader can keep scanning past this error.
    ///
    /// Only malformed fragment sequences are recoverable; store failures,
    /// checksum mismatches, and truncation end the scan.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedSequence { .. })
    }
}
