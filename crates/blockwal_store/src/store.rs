//! Store trait definition.

use crate::error::StoreResult;

/// A low-level byte store for a blockwal log.
///
/// Stores are **opaque byte stores**. They provide simple operations for
/// reading, appending, and flushing data. The log core owns all format
/// interpretation - stores do not understand blocks, fragments, or
/// checksums.
///
/// # Invariants
///
/// - `append` returns the offset where data was written
/// - `read_at` returns flushed bytes exactly as they were appended
/// - A store may buffer appends; `flush` makes them visible to reads
/// - Stores must be `Send + Sync` so they can sit behind a trait object
///
/// # Implementors
///
/// - [`super::MemStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait LogStore: Send + Sync {
    /// Reads `len` bytes starting at `offset`.
    ///
    /// Stores that buffer appends expose only flushed bytes here.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The range runs past the readable stream
    /// - An I/O error occurs
    fn read_at(&self, offset: u64, len: usize) -> StoreResult<Vec<u8>>;

    /// Appends data to the end of the store.
    ///
    /// Returns the offset where the data was written.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&mut self, data: &[u8]) -> StoreResult<u64>;

    /// Flushes any buffered appends toward the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush operation fails.
    fn flush(&mut self) -> StoreResult<()>;

    /// Returns the current size of the store in bytes, buffered appends
    /// included.
    ///
    /// This is the offset where the next `append` will write.
    ///
    /// # Errors
    ///
    /// Returns an error if the size cannot be determined.
    fn size(&self) -> StoreResult<u64>;

    /// Syncs all data and metadata to durable storage.
    ///
    /// This is a stronger guarantee than `flush` - after it returns
    /// successfully, all previously appended data survives process
    /// termination.
    ///
    /// # Errors
    ///
    /// Returns an error if the sync operation fails.
    fn sync(&mut self) -> StoreResult<()>;

    /// Truncates the store to the given size.
    ///
    /// This removes all data after the specified offset.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The truncation fails
    /// - `new_size` is greater than the current size
    fn truncate(&mut self, new_size: u64) -> StoreResult<()>;
}
