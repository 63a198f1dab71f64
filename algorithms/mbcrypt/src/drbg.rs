//! Byte Sources
//!
//! A `ByteSource` hands out one byte at a time. [`HmacCounterByteSource`] is
//! a deterministic HMAC-SHA256 counter-mode generator; [`FixedByteSource`]
//! replays a slice.

use crate::sha256::HmacSha256;
use crate::types::{MbcryptError, Result};
use std::io;
use zeroize::Zeroize;

/// A stream of bytes read one at a time.
pub trait ByteSource {
    /// Next byte of the stream.
    ///
    /// # Errors
    /// Returns [`MbcryptError::Exhausted`] once the source has no more bytes.
    fn next_byte(&mut self) -> Result<u8>;
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn next_byte(&mut self) -> Result<u8> {
        (**self).next_byte()
    }
}

// =============================================================================
// HMAC COUNTER DRBG
// =============================================================================

/// Deterministic stream `HMAC(key, BE32(0)) || HMAC(key, BE32(1)) || ...`.
///
/// The first block is computed eagerly, so `max_counter` blocks after the
/// first are never produced: exactly `max(1, max_counter)` blocks are read
/// before the source is spent. Spent is permanent.
pub struct HmacCounterByteSource {
    mac: HmacSha256,
    counter: u32,
    max_counter: u32,
    block: [u8; 32],
    block_offset: usize,
}

impl HmacCounterByteSource {
    /// Key a new generator that stops once `counter` reaches `max_counter`.
    #[must_use]
    pub fn new(key: &[u8], max_counter: u32) -> Self {
        let mut src = Self {
            mac: HmacSha256::new(key),
            counter: 0,
            max_counter,
            block: [0; 32],
            block_offset: 0,
        };
        src.next_block();
        src
    }

    fn next_block(&mut self) {
        self.block.zeroize();
        self.mac.reset();
        self.mac.absorb(&self.counter.to_be_bytes());
        self.block = self.mac.finish();
        self.block_offset = 0;
        self.counter = self.counter.wrapping_add(1);
    }

    /// Counter value of the next block to be generated.
    pub const fn counter(&self) -> u32 {
        self.counter
    }
}

impl ByteSource for HmacCounterByteSource {
    fn next_byte(&mut self) -> Result<u8> {
        if self.block_offset >= self.block.len() {
            if self.counter >= self.max_counter {
                return Err(MbcryptError::Exhausted);
            }
            self.next_block();
        }

        let b = self.block[self.block_offset];
        self.block_offset += 1;
        Ok(b)
    }
}

impl Drop for HmacCounterByteSource {
    fn drop(&mut self) {
        self.block.zeroize();
        self.mac.clean();
    }
}

// =============================================================================
// FIXED SOURCE
// =============================================================================

/// Replays a byte slice, then reports exhaustion.
#[derive(Debug, Clone)]
pub struct FixedByteSource<'a> {
    bytes: &'a [u8],
    index: usize,
}

impl<'a> FixedByteSource<'a> {
    /// Source over `bytes`.
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, index: 0 }
    }

    /// Bytes not yet consumed.
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.index
    }
}

impl ByteSource for FixedByteSource<'_> {
    fn next_byte(&mut self) -> Result<u8> {
        let b = *self.bytes.get(self.index).ok_or(MbcryptError::Exhausted)?;
        self.index += 1;
        Ok(b)
    }
}

// =============================================================================
// IO ADAPTER
// =============================================================================

/// Exposes a [`ByteSource`] as [`std::io::Read`].
///
/// Exhaustion ends the stream (`Ok(0)` on the next call).
pub struct ByteSourceReader<S: ByteSource> {
    source: S,
}

impl<S: ByteSource> ByteSourceReader<S> {
    /// Wrap `source`.
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Unwrap the inner source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: ByteSource> io::Read for ByteSourceReader<S> {
    fn read(&mut self, dest: &mut [u8]) -> io::Result<usize> {
        for (n, slot) in dest.iter_mut().enumerate() {
            match self.source.next_byte() {
                Ok(b) => *slot = b,
                Err(MbcryptError::Exhausted) => return Ok(n),
                Err(e) => return Err(io::Error::other(e)),
            }
        }
        Ok(dest.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::sha256::hmac_sha256;

    fn key() -> Vec<u8> {
        (1..=32).collect()
    }

    #[test]
    fn counter_is_32bit_big_endian() {
        let mut src = HmacCounterByteSource::new(&key(), u32::MAX);
        src.counter = 0xABCD_EF98;
        src.block_offset = 32;

        let block: Vec<u8> = (0..32).map(|_| src.next_byte().unwrap()).collect();
        assert_eq!(
            hex::encode(block),
            "5c126654874aef85c6e34130183cf70e36749eae73fa3d095c23063d6086e3af"
        );
        assert_eq!(src.counter(), 0xABCD_EF99);
    }

    #[test]
    fn previous_block_is_erased_before_regeneration() {
        let mut src = HmacCounterByteSource::new(&key(), 2);
        for _ in 0..32 {
            src.next_byte().unwrap();
        }
        let first = src.block;
        src.next_byte().unwrap();
        assert_ne!(src.block, first);
    }

    #[test]
    fn final_counter_value_stops_the_stream() {
        let mut src = HmacCounterByteSource::new(&key(), u32::MAX);
        src.counter = u32::MAX - 1;
        src.block_offset = 32;
        for _ in 0..32 {
            src.next_byte().unwrap();
        }
        assert_eq!(src.counter(), u32::MAX);
        assert_eq!(src.next_byte(), Err(MbcryptError::Exhausted));
    }

    #[test]
    fn blocks_follow_one_shot_hmac() {
        let mut src = HmacCounterByteSource::new(&key(), 4);
        let stream: Vec<u8> = (0..4 * 32).map(|_| src.next_byte().unwrap()).collect();
        for (counter, block) in (0u32..).zip(stream.chunks_exact(32)) {
            assert_eq!(block, hmac_sha256(&key(), &counter.to_be_bytes()));
        }
    }

    #[test]
    fn fixed_source_reports_exhaustion() {
        let mut src = FixedByteSource::new(&[7, 8]);
        assert_eq!(src.next_byte(), Ok(7));
        assert_eq!(src.remaining(), 1);
        assert_eq!(src.next_byte(), Ok(8));
        assert_eq!(src.next_byte(), Err(MbcryptError::Exhausted));
    }

    #[test]
    fn reader_stops_at_exhaustion() {
        use std::io::Read;

        let mut reader = ByteSourceReader::new(HmacCounterByteSource::new(&key(), 3));
        let mut all = Vec::new();
        reader.read_to_end(&mut all).unwrap();
        assert_eq!(all.len(), 96);
    }
}
