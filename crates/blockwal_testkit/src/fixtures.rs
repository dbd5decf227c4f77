//! Stream fixtures: encode, decode, and corrupt fragment streams.

use blockwal_core::{WalOptions, WalReader, WalResult, WalWriter, HEADER_SIZE};
use blockwal_store::MemStore;

/// Encodes a sequence of payloads into a fragment stream.
pub fn encode_stream(payloads: &[Vec<u8>], options: &WalOptions) -> Vec<u8> {
    let mut writer = WalWriter::new(Box::new(MemStore::new()), options.clone())
        .expect("invalid options for fixture");
    for payload in payloads {
        writer.write(payload).expect("MemStore append cannot fail");
    }
    let size = writer.store().size().expect("MemStore size cannot fail");
    writer
        .store()
        .read_at(0, size as usize)
        .expect("MemStore read cannot fail")
}

/// Decodes a fragment stream, stopping at the first error.
///
/// # Errors
///
/// Returns the first error the scan produces.
pub fn decode_stream(data: Vec<u8>, options: &WalOptions) -> WalResult<Vec<(u64, Vec<u8>)>> {
    WalReader::new(Box::new(MemStore::with_data(data)), options.clone())?.read_all()
}

/// Decodes a fragment stream, collecting every item including errors.
pub fn scan_stream(data: Vec<u8>, options: &WalOptions) -> Vec<WalResult<(u64, Vec<u8>)>> {
    match WalReader::new(Box::new(MemStore::with_data(data)), options.clone()) {
        Ok(reader) => reader.collect(),
        Err(e) => vec![Err(e)],
    }
}

/// Flips one bit in the stream, counting bits from the first byte's LSB.
pub fn flip_bit(data: &mut [u8], bit_index: usize) {
    data[bit_index / 8] ^= 1 << (bit_index % 8);
}

/// Walks the stream's framing and returns `(header_offset, body_length)`
/// for every fragment, without verifying checksums.
///
/// Follows the block-scan rules: a zero checksum slot, a tail shorter
/// than a header, or a body running past the block end all terminate
/// that block.
pub fn fragment_offsets(data: &[u8], block_size: usize) -> Vec<(u64, u16)> {
    let mut fragments = Vec::new();

    for (index, block) in data.chunks(block_size).enumerate() {
        let block_start = (index * block_size) as u64;
        let mut cursor = 0;

        while block.len() - cursor >= HEADER_SIZE {
            let checksum = u32::from_le_bytes([
                block[cursor],
                block[cursor + 1],
                block[cursor + 2],
                block[cursor + 3],
            ]);
            if checksum == 0 {
                break;
            }
            let length = u16::from_le_bytes([block[cursor + 4], block[cursor + 5]]);
            if cursor + HEADER_SIZE + length as usize > block.len() {
                break;
            }
            fragments.push((block_start + cursor as u64, length));
            cursor += HEADER_SIZE + length as usize;
        }
    }

    fragments
}
