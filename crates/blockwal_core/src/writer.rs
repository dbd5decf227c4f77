//! Log writer.
//!
//! The writer appends user records to an opaque byte sink, framing each
//! into one or more fragments and zero-padding block tails too small to
//! hold a fragment header.

use crate::config::WalOptions;
use crate::error::WalResult;
use crate::fragment::{encode_header, fragment_checksum, FragmentType, HEADER_SIZE};
use blockwal_store::LogStore;

/// Appends user records to a store as a block-aligned fragment stream.
///
/// The writer tracks its position modulo the block size and decides per
/// fragment whether the remaining payload fits the current block. It
/// never flushes or syncs on its own; buffering and durability belong to
/// the store.
///
/// A writer is single-threaded: it is not safe for concurrent invocation.
/// Serialize producers upstream if more than one is required.
///
/// # Example
///
/// ```rust
/// use blockwal_core::{WalOptions, WalWriter};
/// use blockwal_store::MemStore;
///
/// let mut writer = WalWriter::new(Box::new(MemStore::new()), WalOptions::default()).unwrap();
/// writer.write(b"first record").unwrap();
/// writer.write(b"second record").unwrap();
/// ```
pub struct WalWriter {
    /// Destination byte sink.
    store: Box<dyn LogStore>,
    /// Physical block size.
    block_size: usize,
    /// Total bytes emitted since the writer was created, padding included.
    pos: u64,
}

impl WalWriter {
    /// Creates a writer over an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`crate::WalError::InvalidBlockSize`] if the configured
    /// block size is out of range.
    pub fn new(store: Box<dyn LogStore>, options: WalOptions) -> WalResult<Self> {
        options.validate()?;
        Ok(Self {
            store,
            block_size: options.block_size,
            pos: 0,
        })
    }

    /// Creates a writer that appends to an existing log.
    ///
    /// The position counter resumes at the store's current size, so block
    /// alignment is preserved across reopen.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or the store size
    /// cannot be determined.
    pub fn resume(store: Box<dyn LogStore>, options: WalOptions) -> WalResult<Self> {
        options.validate()?;
        let pos = store.size()?;
        Ok(Self {
            store,
            block_size: options.block_size,
            pos,
        })
    }

    /// Returns the configured block size.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Returns the total bytes emitted so far, padding included.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Returns a shared view of the underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn LogStore {
        self.store.as_ref()
    }

    /// Consumes the writer and returns the underlying store.
    #[must_use]
    pub fn into_store(self) -> Box<dyn LogStore> {
        self.store
    }

    /// Bytes left in the current block.
    fn space_in_block(&self) -> usize {
        self.block_size - (self.pos % self.block_size as u64) as usize
    }

    /// Appends one user record to the log.
    ///
    /// The payload is split into FULL, or FIRST / MIDDLE* / LAST
    /// fragments as needed; block tails shorter than a header are
    /// zero-padded first. An empty payload writes nothing.
    ///
    /// # Errors
    ///
    /// Propagates any store error. After a failure the stream may hold a
    /// torn record; readers will detect it as a checksum or truncation
    /// condition.
    pub fn write(&mut self, payload: &[u8]) -> WalResult<()> {
        let mut written = 0;
        let mut ftype = FragmentType::Full;

        while written < payload.len() {
            let space = self.space_in_block();
            if space < HEADER_SIZE {
                self.pad(space)?;
                continue;
            }

            let remaining = payload.len() - written;
            let fits = remaining + HEADER_SIZE <= space;
            let outgoing = match (ftype, fits) {
                (FragmentType::Full, true) => FragmentType::Full,
                (FragmentType::Full, false) => FragmentType::First,
                (_, true) => FragmentType::Last,
                (_, false) => FragmentType::Middle,
            };

            let frag_len = if fits { remaining } else { space - HEADER_SIZE };
            self.emit(outgoing, &payload[written..written + frag_len])?;

            written += frag_len;
            ftype = outgoing;
        }

        Ok(())
    }

    /// Emits one fragment header and body.
    fn emit(&mut self, ftype: FragmentType, body: &[u8]) -> WalResult<()> {
        let checksum = fragment_checksum(ftype.as_byte(), body);
        // Safe: block size validation bounds frag_len to u16 range
        let length = body.len() as u16;

        let mut buf = Vec::with_capacity(HEADER_SIZE + body.len());
        buf.extend_from_slice(&encode_header(checksum, length, ftype));
        buf.extend_from_slice(body);

        self.store.append(&buf)?;
        self.pos += buf.len() as u64;
        Ok(())
    }

    /// Zero-fills a block tail too small to hold a header.
    fn pad(&mut self, len: usize) -> WalResult<()> {
        const ZEROS: [u8; HEADER_SIZE - 1] = [0; HEADER_SIZE - 1];
        if len == 0 {
            return Ok(());
        }
        self.store.append(&ZEROS[..len])?;
        self.pos += len as u64;
        Ok(())
    }

    /// Flushes the underlying store.
    ///
    /// Provided as a convenience passthrough; the writer never flushes on
    /// its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the store flush fails.
    pub fn flush(&mut self) -> WalResult<()> {
        self.store.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for WalWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalWriter")
            .field("block_size", &self.block_size)
            .field("pos", &self.pos)
            .finish_non_exhaustive()
    }
}
