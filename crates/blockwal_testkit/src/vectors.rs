//! Golden wire vectors.
//!
//! Byte-exact expected encodings, independently derived, that any
//! implementation of the format must reproduce. Used by the golden
//! tests to pin the on-disk layout.

/// The masked checksum of a FULL fragment with body `[0x01]`.
pub const SINGLE_BYTE_MASKED_CRC: u32 = 2_077_166_632;

/// The complete stream for one record `[0x01]` at the default block size.
///
/// ```text
/// | 28 0C CF 7B | 01 00 | 01 | 01 |
///   masked crc    len    FULL  body
/// ```
pub const SINGLE_BYTE_RECORD_STREAM: [u8; 8] =
    [0x28, 0x0C, 0xCF, 0x7B, 0x01, 0x00, 0x01, 0x01];

/// The stream for payload `[1..=8]` at block size 10: FIRST(3) /
/// MIDDLE(3) / LAST(2) across three consecutive blocks, the final block
/// short.
#[must_use]
pub fn split_record_stream() -> Vec<u8> {
    #[rustfmt::skip]
    let stream = vec![
        // block 0: FIRST, body [1, 2, 3]
        0x80, 0xB7, 0xC7, 0x14, 0x03, 0x00, 0x02, 0x01, 0x02, 0x03,
        // block 1: MIDDLE, body [4, 5, 6]
        0xFC, 0x88, 0xD2, 0x93, 0x03, 0x00, 0x03, 0x04, 0x05, 0x06,
        // block 2: LAST, body [7, 8]
        0xF5, 0x06, 0x57, 0xD0, 0x02, 0x00, 0x04, 0x07, 0x08,
    ];
    stream
}

/// The payload that [`split_record_stream`] encodes.
pub const SPLIT_RECORD_PAYLOAD: [u8; 8] = [1, 2, 3, 4, 5, 6, 7, 8];
