//! Log configuration.

use crate::error::{WalError, WalResult};
use crate::fragment::HEADER_SIZE;

/// Default physical block size: 32 KiB, the LevelDB / RocksDB convention.
pub const DEFAULT_BLOCK_SIZE: usize = 32 * 1024;

/// Smallest supported block size: a 7-byte header plus 4 bytes of body,
/// the minimum for the split path to make forward progress.
pub const MIN_BLOCK_SIZE: usize = HEADER_SIZE + 4;

/// Largest supported block size, chosen so that every fragment body
/// length (at most `block_size - 7`) fits the header's u16 length field.
pub const MAX_BLOCK_SIZE: usize = u16::MAX as usize + HEADER_SIZE;

/// Configuration for a log writer or reader.
///
/// Producers and consumers of the same stream must agree on the block
/// size; it is not recorded in the stream itself.
#[derive(Debug, Clone)]
pub struct WalOptions {
    /// Physical block size in bytes.
    pub block_size: usize,
}

impl Default for WalOptions {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}

impl WalOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the block size.
    #[must_use]
    pub const fn block_size(mut self, value: usize) -> Self {
        self.block_size = value;
        self
    }

    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns [`WalError::InvalidBlockSize`] if the block size lies
    /// outside `MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE`.
    pub fn validate(&self) -> WalResult<()> {
        if self.block_size < MIN_BLOCK_SIZE || self.block_size > MAX_BLOCK_SIZE {
            return Err(WalError::InvalidBlockSize {
                got: self.block_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_block_size_is_32k() {
        assert_eq!(WalOptions::default().block_size, 32 * 1024);
    }

    #[test]
    fn builder_sets_block_size() {
        let options = WalOptions::new().block_size(4096);
        assert_eq!(options.block_size, 4096);
    }

    #[test]
    fn validate_accepts_bounds() {
        assert!(WalOptions::new().block_size(MIN_BLOCK_SIZE).validate().is_ok());
        assert!(WalOptions::new().block_size(MAX_BLOCK_SIZE).validate().is_ok());
        assert!(WalOptions::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let too_small = WalOptions::new().block_size(MIN_BLOCK_SIZE - 1);
        assert!(matches!(
            too_small.validate(),
            Err(WalError::InvalidBlockSize { got: 10 })
        ));

        let too_large = WalOptions::new().block_size(MAX_BLOCK_SIZE + 1);
        assert!(matches!(
            too_large.validate(),
            Err(WalError::InvalidBlockSize { .. })
        ));
    }
}
