//! Log reader.
//!
//! Scans a fragment stream one physical block at a time, verifies every
//! fragment checksum, and reassembles fragments into user records.
//!
//! # Recovery Policy
//!
//! The reader distinguishes between conditions it can scan past and
//! conditions that end the scan:
//!
//! ## Recoverable (yielded as an error, scanning continues)
//!
//! - **Malformed sequence**: a fragment-type transition that violates the
//!   reassembly state machine (a MIDDLE or LAST with no open record, a
//!   FULL or FIRST inside one), or an unknown type byte under a valid
//!   checksum. The offending fragment is reported and the scan resumes
//!   with the state the transition table prescribes.
//!
//! ## Fatal (yielded as an error, scan ends)
//!
//! - **Checksum mismatch**: recomputed CRC-32C of `type ‖ body` does not
//!   match the stored value. Everything past the corrupt fragment is
//!   unreliable, so no further records are produced.
//! - **Truncated record**: the source ended while a split record was
//!   still open.
//! - **Store error**: surfaced verbatim.
//!
//! ## Clean end-of-log (no error)
//!
//! - End of source at a record boundary.
//! - A zero u32 in a checksum slot: the rest of the block is padding.
//! - A block tail too short for a header, or a fragment body that would
//!   run past the end of a (short, final) block: the incomplete tail is
//!   discarded, matching a crash mid-write before the block was filled.

use crate::config::WalOptions;
use crate::error::{WalError, WalResult};
use crate::fragment::{fragment_checksum, FragmentType, HEADER_SIZE};
use blockwal_store::LogStore;
use tracing::warn;

/// Reads user records back out of a fragment stream.
///
/// The reader consumes a seekable byte source positioned at a block
/// boundary and yields `(offset, record)` pairs in emission order, where
/// `offset` is the file offset of the record's first fragment header.
/// Every yielded record passed checksum and sequence verification.
///
/// Implemented as an iterator in the usual way:
///
/// ```rust
/// use blockwal_core::{WalOptions, WalReader, WalWriter};
/// use blockwal_store::MemStore;
///
/// let mut writer = WalWriter::new(Box::new(MemStore::new()), WalOptions::default()).unwrap();
/// writer.write(b"payload").unwrap();
///
/// let reader = WalReader::new(writer.into_store(), WalOptions::default()).unwrap();
/// for result in reader {
///     let (offset, record) = result.unwrap();
///     assert_eq!(offset, 0);
///     assert_eq!(record, b"payload");
/// }
/// ```
///
/// A reader is single-threaded; two readers over separate stores are
/// independent.
pub struct WalReader {
    /// Source of log bytes.
    store: Box<dyn LogStore>,
    /// Physical block size, matching the writer's.
    block_size: usize,
    /// Source size, captured at construction.
    size: u64,
    /// Absolute offset of the next unread block.
    offset: u64,
    /// Current block buffer.
    block: Vec<u8>,
    /// Absolute offset of `block[0]`.
    block_start: u64,
    /// Cursor within the current block.
    cursor: usize,
    /// Body bytes of a partially reassembled record.
    pending: Vec<u8>,
    /// Offset of the open record's FIRST fragment header.
    record_start: u64,
    /// Whether a FIRST has been seen without its LAST.
    in_record: bool,
    /// A record displaced by a malformed transition, emitted next.
    stashed: Option<(u64, Vec<u8>)>,
    /// Set once the scan has ended.
    finished: bool,
}

impl WalReader {
    /// Creates a reader positioned at the start of the log.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or the store size
    /// cannot be determined.
    pub fn new(store: Box<dyn LogStore>, options: WalOptions) -> WalResult<Self> {
        Self::from_block(store, options, 0)
    }

    /// Creates a reader positioned at the given block index.
    ///
    /// Records whose FIRST fragment lies in an earlier block surface as
    /// malformed-sequence reports, since their leading fragments are not
    /// visible from here.
    ///
    /// # Errors
    ///
    /// Returns an error if the options are invalid or the store size
    /// cannot be determined.
    pub fn from_block(
        store: Box<dyn LogStore>,
        options: WalOptions,
        block_index: u64,
    ) -> WalResult<Self> {
        options.validate()?;
        let size = store.size()?;
        let offset = block_index.saturating_mul(options.block_size as u64);
        Ok(Self {
            store,
            block_size: options.block_size,
            size,
            offset,
            block: Vec::new(),
            block_start: offset,
            cursor: 0,
            pending: Vec::new(),
            record_start: 0,
            in_record: false,
            stashed: None,
            finished: false,
        })
    }

    /// Returns the configured block size.
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Reads all remaining records, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error the scan produces, including recoverable
    /// malformed-sequence reports; iterate the reader directly to scan
    /// past those.
    pub fn read_all(self) -> WalResult<Vec<(u64, Vec<u8>)>> {
        self.collect()
    }

    /// Loads the next block into the buffer.
    ///
    /// Returns `false` at end of source. The final block may be short.
    fn fill_block(&mut self) -> WalResult<bool> {
        if self.offset >= self.size {
            return Ok(false);
        }
        let want = (self.size - self.offset).min(self.block_size as u64) as usize;
        let data = self.store.read_at(self.offset, want)?;
        self.block_start = self.offset;
        self.offset += data.len() as u64;
        self.block = data;
        self.cursor = 0;
        Ok(true)
    }

    /// Extracts the next checksum-verified fragment from the stream.
    ///
    /// Returns `Ok(None)` at end of source. Skips block trailers: a zero
    /// checksum slot, a tail too short for a header, or a body that
    /// would run past the block's end all advance to the next block.
    fn next_fragment(&mut self) -> WalResult<Option<(u64, FragmentType, Vec<u8>)>> {
        loop {
            if self.cursor >= self.block.len() {
                if !self.fill_block()? {
                    return Ok(None);
                }
            }

            let at = self.cursor;
            let rest = self.block.len() - at;
            if rest < 4 {
                self.cursor = self.block.len();
                continue;
            }

            let stored = u32::from_le_bytes([
                self.block[at],
                self.block[at + 1],
                self.block[at + 2],
                self.block[at + 3],
            ]);
            if stored == 0 {
                // End-of-block sentinel: the remainder is padding
                self.cursor = self.block.len();
                continue;
            }
            if rest < HEADER_SIZE {
                self.cursor = self.block.len();
                continue;
            }

            let length = usize::from(u16::from_le_bytes([self.block[at + 4], self.block[at + 5]]));
            let type_byte = self.block[at + 6];
            if HEADER_SIZE + length > rest {
                // Body runs past the block: a torn tail, not a fragment
                self.cursor = self.block.len();
                continue;
            }

            let header_offset = self.block_start + at as u64;
            let body = &self.block[at + HEADER_SIZE..at + HEADER_SIZE + length];

            // Verify before trusting the type byte; the checksum covers it
            let actual = fragment_checksum(type_byte, body);
            if actual != stored {
                warn!(
                    target: "blockwal::reader",
                    offset = header_offset,
                    "fragment checksum mismatch"
                );
                return Err(WalError::ChecksumMismatch {
                    offset: header_offset,
                    expected: stored,
                    actual,
                });
            }

            let Some(ftype) = FragmentType::from_byte(type_byte) else {
                warn!(
                    target: "blockwal::reader",
                    offset = header_offset,
                    type_byte,
                    "unknown fragment type"
                );
                self.cursor = at + HEADER_SIZE + length;
                return Err(WalError::malformed(
                    header_offset,
                    format!("unknown fragment type {type_byte}"),
                ));
            };

            let body = body.to_vec();
            self.cursor = at + HEADER_SIZE + length;
            return Ok(Some((header_offset, ftype, body)));
        }
    }

    /// Drives the reassembly state machine to the next complete record.
    fn read_next_record(&mut self) -> WalResult<Option<(u64, Vec<u8>)>> {
        if let Some(displaced) = self.stashed.take() {
            return Ok(Some(displaced));
        }

        loop {
            let Some((offset, ftype, body)) = self.next_fragment()? else {
                if self.in_record {
                    self.in_record = false;
                    self.pending.clear();
                    return Err(WalError::TruncatedRecord {
                        offset: self.record_start,
                    });
                }
                return Ok(None);
            };

            match (self.in_record, ftype) {
                (false, FragmentType::Full) => return Ok(Some((offset, body))),
                (false, FragmentType::First) => {
                    self.record_start = offset;
                    self.pending = body;
                    self.in_record = true;
                }
                (false, FragmentType::Middle) => {
                    warn!(target: "blockwal::reader", offset, "MIDDLE fragment with no open record");
                    return Err(WalError::malformed(offset, "MIDDLE fragment with no open record"));
                }
                (false, FragmentType::Last) => {
                    warn!(target: "blockwal::reader", offset, "LAST fragment with no open record");
                    return Err(WalError::malformed(offset, "LAST fragment with no open record"));
                }
                (true, FragmentType::Full) => {
                    // The open record is torn; the FULL itself is intact
                    warn!(target: "blockwal::reader", offset, "FULL fragment inside an open record");
                    self.pending.clear();
                    self.in_record = false;
                    self.stashed = Some((offset, body));
                    return Err(WalError::malformed(offset, "FULL fragment inside an open record"));
                }
                (true, FragmentType::First) => {
                    // The open record is torn; the new FIRST opens afresh
                    warn!(target: "blockwal::reader", offset, "FIRST fragment inside an open record");
                    self.record_start = offset;
                    self.pending = body;
                    return Err(WalError::malformed(offset, "FIRST fragment inside an open record"));
                }
                (true, FragmentType::Middle) => {
                    self.pending.extend_from_slice(&body);
                }
                (true, FragmentType::Last) => {
                    self.pending.extend_from_slice(&body);
                    self.in_record = false;
                    let record = std::mem::take(&mut self.pending);
                    return Ok(Some((self.record_start, record)));
                }
            }
        }
    }
}

impl Iterator for WalReader {
    type Item = WalResult<(u64, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.read_next_record() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                if !e.is_recoverable() {
                    self.finished = true;
                }
                Some(Err(e))
            }
        }
    }
}

impl std::fmt::Debug for WalReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalReader")
            .field("block_size", &self.block_size)
            .field("offset", &self.offset)
            .field("in_record", &self.in_record)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::encode_header;
    use crate::writer::WalWriter;
    use blockwal_store::{FileStore, MemStore};

    fn options(block_size: usize) -> WalOptions {
        WalOptions::new().block_size(block_size)
    }

    fn encode(payloads: &[&[u8]], block_size: usize) -> Vec<u8> {
        let mut writer = WalWriter::new(Box::new(MemStore::new()), options(block_size)).unwrap();
        for p in payloads {
            writer.write(p).unwrap();
        }
        let size = writer.store().size().unwrap();
        writer.store().read_at(0, size as usize).unwrap()
    }

    fn reader_over(data: Vec<u8>, block_size: usize) -> WalReader {
        WalReader::new(Box::new(MemStore::with_data(data)), options(block_size)).unwrap()
    }

    /// A hand-built fragment with a valid checksum and arbitrary type byte.
    fn frag(type_byte: u8, body: &[u8]) -> Vec<u8> {
        let checksum = fragment_checksum(type_byte, body);
        let mut buf = checksum.to_le_bytes().to_vec();
        buf.extend_from_slice(&(body.len() as u16).to_le_bytes());
        buf.push(type_byte);
        buf.extend_from_slice(body);
        buf
    }

    #[test]
    fn roundtrip_single_record() {
        let data = encode(&[&[0x01]], 32 * 1024);
        let records = reader_over(data, 32 * 1024).read_all().unwrap();
        assert_eq!(records, vec![(0, vec![0x01])]);
    }

    #[test]
    fn roundtrip_multiple_records() {
        let payloads: &[&[u8]] = &[b"alpha", b"beta", b"gamma"];
        let data = encode(payloads, 64);
        let records = reader_over(data, 64).read_all().unwrap();

        assert_eq!(records.len(), 3);
        for ((_, record), expected) in records.iter().zip(payloads) {
            assert_eq!(record, expected);
        }
    }

    #[test]
    fn record_offsets_are_header_offsets() {
        let data = encode(&[&[0xAA], &[0xBB]], 32 * 1024);
        let records = reader_over(data, 32 * 1024).read_all().unwrap();
        assert_eq!(records[0].0, 0);
        assert_eq!(records[1].0, 8);
    }

    #[test]
    fn reassembles_record_split_across_blocks() {
        let payload: &[u8] = &[1, 2, 3, 4, 5, 6, 7, 8];
        let data = encode(&[payload], 10);
        assert_eq!(data.len(), 29); // final block is short

        let records = reader_over(data, 10).read_all().unwrap();
        assert_eq!(records, vec![(0, payload.to_vec())]);
    }

    #[test]
    fn empty_first_fragment_at_block_tail_roundtrips() {
        // A 7-byte block tail carries a zero-length FIRST fragment
        let data = encode(&[&[0x44], &[1, 2, 3]], 15);
        let records = reader_over(data, 15).read_all().unwrap();
        assert_eq!(records, vec![(0, vec![0x44]), (8, vec![1, 2, 3])]);
    }

    #[test]
    fn empty_source_yields_nothing() {
        let mut reader = reader_over(Vec::new(), 32 * 1024);
        assert!(reader.next().is_none());
    }

    #[test]
    fn skips_zero_padded_block_tail() {
        let data = encode(&[&[0xAA], &[0xBB]], 10);
        // [0xAA] leaves a 2-byte zeroed tail in block 0
        let records = reader_over(data, 10).read_all().unwrap();
        assert_eq!(records, vec![(0, vec![0xAA]), (10, vec![0xBB])]);
    }

    #[test]
    fn zero_checksum_terminates_block() {
        // A preallocated, zero-filled block tail longer than a header:
        // the zero checksum slot ends the block, not the log.
        let mut data = frag(1, b"aa");
        data.resize(32, 0);
        data.extend_from_slice(&frag(1, b"bb"));

        let records = reader_over(data, 32).read_all().unwrap();
        assert_eq!(records, vec![(0, b"aa".to_vec()), (32, b"bb".to_vec())]);
    }

    #[test]
    fn corrupted_body_reports_checksum_mismatch() {
        let mut data = encode(&[&[0x01]], 32 * 1024);
        *data.last_mut().unwrap() = 0x02;

        let mut reader = reader_over(data, 32 * 1024);
        match reader.next() {
            Some(Err(WalError::ChecksumMismatch { offset: 0, .. })) => {}
            other => panic!("expected checksum mismatch, got {other:?}"),
        }
        // Corruption is fatal: the scan ends
        assert!(reader.next().is_none());
    }

    #[test]
    fn every_bit_flip_in_checksummed_region_is_detected() {
        // The checksum covers the type byte and the body: offsets 6 and 7
        // of the single-fragment stream for payload [0x01].
        let data = encode(&[&[0x01]], 32 * 1024);

        for byte_index in [6, 7] {
            for bit in 0..8 {
                let mut corrupt = data.clone();
                corrupt[byte_index] ^= 1 << bit;

                let mut reader = reader_over(corrupt, 32 * 1024);
                match reader.next() {
                    Some(Err(WalError::ChecksumMismatch { .. })) => {}
                    other => panic!(
                        "flip of byte {byte_index} bit {bit} undetected, got {other:?}"
                    ),
                }
            }
        }
    }

    #[test]
    fn checksum_error_suppresses_later_records() {
        let mut data = encode(&[&[0xAA], &[0xBB]], 32 * 1024);
        data[7] ^= 0xFF; // body of the first record

        let mut reader = reader_over(data, 32 * 1024);
        assert!(matches!(
            reader.next(),
            Some(Err(WalError::ChecksumMismatch { .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn truncation_mid_record_is_reported() {
        let data = encode(&[&[1, 2, 3, 4, 5, 6, 7, 8]], 10);
        // Keep exactly the FIRST fragment's block
        let truncated = data[..10].to_vec();

        let mut reader = reader_over(truncated, 10);
        match reader.next() {
            Some(Err(WalError::TruncatedRecord { offset: 0 })) => {}
            other => panic!("expected truncated record, got {other:?}"),
        }
        assert!(reader.next().is_none());
    }

    #[test]
    fn torn_fragment_tail_is_a_clean_end() {
        // Truncation mid-body of the FIRST fragment: the fragment never
        // parses, so nothing was consumed and nothing is reported.
        let data = encode(&[&[1, 2, 3, 4, 5, 6, 7, 8]], 10);
        let truncated = data[..8].to_vec();

        let mut reader = reader_over(truncated, 10);
        assert!(reader.next().is_none());
    }

    #[test]
    fn middle_with_no_open_record_is_malformed() {
        let mut data = frag(3, &[1, 2]);
        data.extend_from_slice(&frag(1, &[9]));

        let mut reader = reader_over(data, 64);
        assert!(matches!(
            reader.next(),
            Some(Err(WalError::MalformedSequence { offset: 0, .. }))
        ));
        // Recoverable: the following FULL record still comes through
        assert_eq!(reader.next().unwrap().unwrap().1, vec![9]);
        assert!(reader.next().is_none());
    }

    #[test]
    fn last_with_no_open_record_is_malformed() {
        let data = frag(4, &[1, 2]);
        let mut reader = reader_over(data, 64);
        assert!(matches!(
            reader.next(),
            Some(Err(WalError::MalformedSequence { .. }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn full_inside_open_record_drops_pending_and_keeps_full() {
        let mut data = frag(2, &[1, 2]); // FIRST with no LAST
        data.extend_from_slice(&frag(1, &[9]));

        let mut reader = reader_over(data, 64);
        let err_offset = match reader.next() {
            Some(Err(WalError::MalformedSequence { offset, .. })) => offset,
            other => panic!("expected malformed sequence, got {other:?}"),
        };
        assert_eq!(err_offset, 9);

        // The displaced FULL record survives
        assert_eq!(reader.next().unwrap().unwrap(), (9, vec![9]));
        assert!(reader.next().is_none());
    }

    #[test]
    fn first_inside_open_record_restarts_reassembly() {
        let mut data = frag(2, &[1]); // torn FIRST
        data.extend_from_slice(&frag(2, &[2]));
        data.extend_from_slice(&frag(4, &[3]));

        let mut reader = reader_over(data, 64);
        assert!(matches!(
            reader.next(),
            Some(Err(WalError::MalformedSequence { .. }))
        ));
        // The second FIRST plus the LAST reassemble normally
        assert_eq!(reader.next().unwrap().unwrap(), (8, vec![2, 3]));
        assert!(reader.next().is_none());
    }

    #[test]
    fn unknown_fragment_type_is_malformed_and_skipped() {
        let mut data = frag(9, &[1, 2]);
        data.extend_from_slice(&frag(1, &[7]));

        let mut reader = reader_over(data, 64);
        assert!(matches!(
            reader.next(),
            Some(Err(WalError::MalformedSequence { .. }))
        ));
        assert_eq!(reader.next().unwrap().unwrap().1, vec![7]);
    }

    #[test]
    fn zero_length_full_fragment_yields_empty_record() {
        let data = frag(1, &[]);
        let records = reader_over(data, 64).read_all().unwrap();
        assert_eq!(records, vec![(0, Vec::new())]);
    }

    #[test]
    fn from_block_skips_earlier_blocks() {
        let data = encode(&[&[0xAA], &[0xBB]], 10); // one record per block
        let reader = WalReader::from_block(
            Box::new(MemStore::with_data(data)),
            options(10),
            1,
        )
        .unwrap();

        let records = reader.read_all().unwrap();
        assert_eq!(records, vec![(10, vec![0xBB])]);
    }

    #[test]
    fn rejects_invalid_block_size() {
        let result = WalReader::new(Box::new(MemStore::new()), options(10));
        assert!(matches!(result, Err(WalError::InvalidBlockSize { got: 10 })));
    }

    #[test]
    fn header_decode_matches_manual_encoding() {
        // A stream assembled from the framing primitives alone reads back
        let checksum = fragment_checksum(FragmentType::Full.as_byte(), b"xyz");
        let mut data = encode_header(checksum, 3, FragmentType::Full).to_vec();
        data.extend_from_slice(b"xyz");

        let records = reader_over(data, 64).read_all().unwrap();
        assert_eq!(records, vec![(0, b"xyz".to_vec())]);
    }

    #[test]
    fn file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.wal");

        {
            let store = FileStore::open(&path).unwrap();
            let mut writer = WalWriter::new(Box::new(store), options(32)).unwrap();
            writer.write(b"first").unwrap();
            writer.write(&[0x42; 100]).unwrap(); // splits across blocks
            writer.write(b"last").unwrap();
            writer.flush().unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        let reader = WalReader::new(Box::new(store), options(32)).unwrap();
        let records: Vec<_> = reader.map(|r| r.unwrap().1).collect();

        assert_eq!(
            records,
            vec![b"first".to_vec(), vec![0x42; 100], b"last".to_vec()]
        );
    }
}
