//! File-backed store.

use crate::error::{StoreError, StoreResult};
use crate::store::LogStore;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A buffered, file-backed byte store.
///
/// Appends go through an append-mode handle wrapped in a [`BufWriter`],
/// so a burst of small fragment writes costs one syscall instead of
/// many; the OS places every write at the end of the file, even after a
/// truncate. Reads use a second handle so positioned reads work through
/// a shared `&dyn LogStore`.
///
/// # Visibility and durability
///
/// Buffered appends are invisible to `read_at` (and to other processes)
/// until [`LogStore::flush`] or [`LogStore::sync`] runs. `size` counts
/// buffered bytes, since that is where the next append lands. The log
/// core never flushes on its own; when to flush or sync is the caller's
/// durability policy.
///
/// # Example
///
/// ```no_run
/// use blockwal_store::{FileStore, LogStore};
///
/// let mut store = FileStore::open("records.wal").unwrap();
/// store.append(b"fragment bytes").unwrap();
/// store.sync().unwrap(); // make the appended fragments durable
/// ```
#[derive(Debug)]
pub struct FileStore {
    /// Append-mode handle; every write lands at end of file.
    appender: BufWriter<File>,
    /// Positioned-read handle.
    reader: Mutex<File>,
    /// Stream length in bytes, buffered appends included.
    size: u64,
}

impl FileStore {
    /// Opens or creates a file store at the given path.
    ///
    /// An existing log is opened as-is; the next append continues the
    /// stream at its current end.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or opened.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let appender = OpenOptions::new().append(true).create(true).open(path)?;
        let size = appender.metadata()?.len();
        let reader = File::open(path)?;

        Ok(Self {
            appender: BufWriter::new(appender),
            reader: Mutex::new(reader),
            size,
        })
    }
}

impl LogStore for FileStore {
    fn read_at(&self, offset: u64, len: usize) -> StoreResult<Vec<u8>> {
        let mut file = self.reader.lock();
        file.seek(SeekFrom::Start(offset))?;

        let mut buffer = Vec::with_capacity(len);
        (&mut *file).take(len as u64).read_to_end(&mut buffer)?;

        // A short read means the range runs past the flushed stream
        if buffer.len() < len {
            return Err(StoreError::ReadPastEnd {
                offset,
                len,
                size: self.size,
            });
        }
        Ok(buffer)
    }

    fn append(&mut self, data: &[u8]) -> StoreResult<u64> {
        let offset = self.size;
        self.appender.write_all(data)?;
        self.size += data.len() as u64;
        Ok(offset)
    }

    fn flush(&mut self) -> StoreResult<()> {
        self.appender.flush()?;
        Ok(())
    }

    fn size(&self) -> StoreResult<u64> {
        Ok(self.size)
    }

    fn sync(&mut self) -> StoreResult<()> {
        self.appender.flush()?;
        self.appender.get_ref().sync_all()?;
        Ok(())
    }

    fn truncate(&mut self, new_size: u64) -> StoreResult<()> {
        if new_size > self.size {
            return Err(StoreError::TruncateBeyondEnd {
                requested: new_size,
                size: self.size,
            });
        }

        // Drain the buffer first so no buffered tail outlives the cut
        self.appender.flush()?;
        self.appender.get_ref().set_len(new_size)?;
        self.size = new_size;
        Ok(())
    }
}
