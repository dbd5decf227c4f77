//! # blockwal core
//!
//! A block-oriented write-ahead log in the LevelDB / RocksDB log format.
//!
//! The log persists opaque byte payloads ("user records") as a stream of
//! fixed-size physical blocks. Each record is framed into one or more
//! fragments, each carrying a 7-byte header with a masked CRC-32C
//! checksum, a body length, and a fragment type. A record that does not
//! fit the tail of the current block is split across consecutive blocks;
//! a block tail too small to hold a header is zero-padded.
//!
//! ## Wire Format
//!
//! ```text
//! | masked crc32c (4, LE) | length (2, LE) | type (1) | body (length) |
//! ```
//!
//! Fragment types: `FULL=1`, `FIRST=2`, `MIDDLE=3`, `LAST=4`. A record is
//! either one FULL fragment or a FIRST, zero or more MIDDLEs, and a LAST.
//!
//! ## Usage
//!
//! ```rust
//! use blockwal_core::{WalOptions, WalReader, WalWriter};
//! use blockwal_store::MemStore;
//!
//! let mut writer = WalWriter::new(Box::new(MemStore::new()), WalOptions::default()).unwrap();
//! writer.write(b"hello").unwrap();
//! writer.write(b"world").unwrap();
//!
//! let reader = WalReader::new(writer.into_store(), WalOptions::default()).unwrap();
//! let records: Vec<_> = reader.map(|r| r.unwrap().1).collect();
//! assert_eq!(records, vec![b"hello".to_vec(), b"world".to_vec()]);
//! ```
//!
//! The writer and reader treat their store as an opaque byte sink/source
//! (see `blockwal_store`). Durability policy - buffering, flushing,
//! fsync - belongs to the store and its caller, never to the log core.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod fragment;
mod reader;
mod writer;

pub use config::{WalOptions, DEFAULT_BLOCK_SIZE, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};
pub use error::{WalError, WalResult};
pub use fragment::{
    crc32c, decode_header, encode_header, fragment_checksum, mask_crc, unmask_crc,
    verify_fragment, FragmentType, HEADER_SIZE,
};
pub use reader::WalReader;
pub use writer::WalWriter;
