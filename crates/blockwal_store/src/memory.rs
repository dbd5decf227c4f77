//! In-memory store.

use crate::error::{StoreError, StoreResult};
use crate::store::LogStore;

/// A byte store over a growable in-memory buffer.
///
/// Used by the log's own test suites: a writer pointed at a `MemStore`
/// produces the exact byte stream a file would hold, and
/// [`MemStore::with_data`] turns any byte vector - hand-built, golden,
/// or deliberately corrupted - back into a readable source.
///
/// # Example
///
/// ```rust
/// use blockwal_store::{LogStore, MemStore};
///
/// let mut store = MemStore::with_data(vec![0xDE, 0xAD]);
/// store.append(&[0xBE, 0xEF]).unwrap();
/// assert_eq!(store.read_at(0, 4).unwrap(), [0xDE, 0xAD, 0xBE, 0xEF]);
/// ```
#[derive(Debug, Default)]
pub struct MemStore {
    data: Vec<u8>,
}

impl MemStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing byte vector as a store.
    #[must_use]
    pub fn with_data(data: Vec<u8>) -> Self {
        Self { data }
    }
}

impl LogStore for MemStore {
    fn read_at(&self, offset: u64, len: usize) -> StoreResult<Vec<u8>> {
        let start = usize::try_from(offset).ok();
        let end = start.and_then(|s| s.checked_add(len));
        start
            .zip(end)
            .and_then(|(s, e)| self.data.get(s..e))
            .map(<[u8]>::to_vec)
            .ok_or(StoreError::ReadPastEnd {
                offset,
                len,
                size: self.data.len() as u64,
            })
    }

    fn append(&mut self, new_data: &[u8]) -> StoreResult<u64> {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(new_data);
        Ok(offset)
    }

    fn flush(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn size(&self) -> StoreResult<u64> {
        Ok(self.data.len() as u64)
    }

    fn sync(&mut self) -> StoreResult<()> {
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StoreResult<()> {
        let size = self.data.len() as u64;
        if new_size > size {
            return Err(StoreError::TruncateBeyondEnd {
                requested: new_size,
                size,
            });
        }
        self.data.truncate(new_size as usize);
        Ok(())
    }
}
