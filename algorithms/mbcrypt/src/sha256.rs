//! SHA-256 and HMAC-SHA256
//!
//! Incremental hashing with explicit lifecycle: `update` until `finish`,
//! `reset` to reuse, `clean` to wipe. HMAC caches the padded key states so
//! `reset` never rehashes the key.

use crate::kernels::constants::{SHA256_BLOCK_SIZE, SHA256_DIGEST_SIZE, SHA256_IV};
use crate::kernels::sha256::compress_blocks;
use crate::types::{MbcryptError, Result};
use zeroize::Zeroize;

#[cfg(feature = "digest-trait")]
use digest::typenum::U32;
#[cfg(feature = "digest-trait")]
use digest::Output;
#[cfg(feature = "digest-trait")]
use digest::{FixedOutput, HashMarker, OutputSizeUser, Reset, Update};

// =============================================================================
// SHA-256
// =============================================================================

/// Incremental SHA-256 hasher.
#[derive(Clone)]
pub struct Sha256 {
    /// Running hash words
    state: [u32; 8],
    /// Message schedule scratch (wiped by `clean`)
    schedule: [u32; 64],
    /// Pending bytes; 128 so padding can spill into a second block
    buffer: [u8; 2 * SHA256_BLOCK_SIZE],
    buffer_len: usize,
    /// Total bytes absorbed
    bytes_hashed: u64,
    finished: bool,
}

impl Sha256 {
    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Create a fresh hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SHA256_IV,
            schedule: [0; 64],
            buffer: [0; 2 * SHA256_BLOCK_SIZE],
            buffer_len: 0,
            bytes_hashed: 0,
            finished: false,
        }
    }

    /// Reinitialize for another message. Buffers keep their contents until
    /// overwritten; use [`clean`](Self::clean) to wipe them.
    pub fn reset(&mut self) {
        self.state = SHA256_IV;
        self.buffer_len = 0;
        self.bytes_hashed = 0;
        self.finished = false;
    }

    /// Zero every internal buffer and reinitialize.
    pub fn clean(&mut self) {
        self.buffer.zeroize();
        self.schedule.zeroize();
        self.state.zeroize();
        self.reset();
    }

    // =========================================================================
    // STATE MODIFICATION
    // =========================================================================

    /// Absorb more data.
    ///
    /// # Errors
    /// Returns [`MbcryptError::HashFinished`] if the hash was finished and not reset.
    pub fn update(&mut self, data: &[u8]) -> Result<&mut Self> {
        if self.finished {
            return Err(MbcryptError::HashFinished);
        }
        self.absorb(data);
        Ok(self)
    }

    /// Absorb without the finished check. Callers hold a fresh or reset hasher.
    pub(crate) fn absorb(&mut self, mut data: &[u8]) {
        debug_assert!(!self.finished);
        self.bytes_hashed = self.bytes_hashed.wrapping_add(data.len() as u64);

        // Top up a partial block first
        if self.buffer_len > 0 {
            let take = (SHA256_BLOCK_SIZE - self.buffer_len).min(data.len());
            self.buffer[self.buffer_len..self.buffer_len + take].copy_from_slice(&data[..take]);
            self.buffer_len += take;
            data = &data[take..];

            if self.buffer_len == SHA256_BLOCK_SIZE {
                compress_blocks(
                    &mut self.state,
                    &mut self.schedule,
                    &self.buffer[..SHA256_BLOCK_SIZE],
                );
                self.buffer_len = 0;
            }
        }

        // Whole blocks straight from the input
        let consumed = compress_blocks(&mut self.state, &mut self.schedule, data);
        let rest = &data[consumed..];
        self.buffer[self.buffer_len..self.buffer_len + rest.len()].copy_from_slice(rest);
        self.buffer_len += rest.len();
    }

    /// Pad, compress and return the digest. Calling it again returns the
    /// same value until [`reset`](Self::reset).
    #[allow(clippy::cast_possible_truncation)]
    pub fn finish(&mut self) -> [u8; SHA256_DIGEST_SIZE] {
        if !self.finished {
            let left = self.buffer_len;
            // Bit length as two 32-bit halves
            let bit_len_hi = (self.bytes_hashed >> 29) as u32;
            let bit_len_lo = (self.bytes_hashed << 3) as u32;
            let pad_len = if self.bytes_hashed % 64 < 56 {
                SHA256_BLOCK_SIZE
            } else {
                2 * SHA256_BLOCK_SIZE
            };

            self.buffer[left] = 0x80;
            self.buffer[left + 1..pad_len - 8].fill(0);
            self.buffer[pad_len - 8..pad_len - 4].copy_from_slice(&bit_len_hi.to_be_bytes());
            self.buffer[pad_len - 4..pad_len].copy_from_slice(&bit_len_lo.to_be_bytes());

            compress_blocks(&mut self.state, &mut self.schedule, &self.buffer[..pad_len]);
            self.buffer_len = 0;
            self.finished = true;
        }

        let mut out = [0u8; SHA256_DIGEST_SIZE];
        for (chunk, word) in out.chunks_exact_mut(4).zip(self.state.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    /// Alias of [`finish`](Self::finish).
    pub fn digest(&mut self) -> [u8; SHA256_DIGEST_SIZE] {
        self.finish()
    }

    /// Whether `finish` has been called since the last reset.
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    // =========================================================================
    // HMAC SUPPORT
    // =========================================================================

    const fn save_state(&self) -> [u32; 8] {
        self.state
    }

    fn restore_state(&mut self, from: &[u32; 8], bytes_hashed: u64) {
        self.state = *from;
        self.bytes_hashed = bytes_hashed;
        self.buffer_len = 0;
        self.finished = false;
    }
}

impl Default for Sha256 {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Sha256 {
    fn drop(&mut self) {
        self.clean();
    }
}

// =============================================================================
// HMAC-SHA256
// =============================================================================

/// HMAC-SHA256 with cached inner/outer pad states.
#[derive(Clone)]
pub struct HmacSha256 {
    inner: Sha256,
    outer: Sha256,
    inner_state: [u32; 8],
    outer_state: [u32; 8],
}

impl HmacSha256 {
    /// Key a new HMAC instance. Keys longer than one block are hashed first.
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        let mut pad = [0u8; SHA256_BLOCK_SIZE];
        if key.len() > SHA256_BLOCK_SIZE {
            let mut h = Sha256::new();
            h.absorb(key);
            pad[..SHA256_DIGEST_SIZE].copy_from_slice(&h.finish());
        } else {
            pad[..key.len()].copy_from_slice(key);
        }

        let mut inner = Sha256::new();
        let mut outer = Sha256::new();

        pad.iter_mut().for_each(|b| *b ^= 0x36);
        inner.absorb(&pad);
        pad.iter_mut().for_each(|b| *b ^= 0x36 ^ 0x5c);
        outer.absorb(&pad);
        pad.zeroize();

        let inner_state = inner.save_state();
        let outer_state = outer.save_state();

        Self {
            inner,
            outer,
            inner_state,
            outer_state,
        }
    }

    /// Return to the freshly keyed state without rehashing the key.
    pub fn reset(&mut self) {
        self.inner
            .restore_state(&self.inner_state, SHA256_BLOCK_SIZE as u64);
        self.outer
            .restore_state(&self.outer_state, SHA256_BLOCK_SIZE as u64);
    }

    /// Wipe the cached key states and both hashers. The instance is unkeyed afterwards.
    pub fn clean(&mut self) {
        self.inner_state.zeroize();
        self.outer_state.zeroize();
        self.inner.clean();
        self.outer.clean();
    }

    /// Absorb message data.
    ///
    /// # Errors
    /// Returns [`MbcryptError::HashFinished`] after `finish` without `reset`.
    pub fn update(&mut self, data: &[u8]) -> Result<&mut Self> {
        self.inner.update(data)?;
        Ok(self)
    }

    /// Absorb message data into a hasher known to be unfinished.
    pub(crate) fn absorb(&mut self, data: &[u8]) {
        self.inner.absorb(data);
    }

    /// Compute the MAC. Repeated calls return the same value until `reset`.
    pub fn finish(&mut self) -> [u8; SHA256_DIGEST_SIZE] {
        if !self.outer.is_finished() {
            let mut inner_digest = self.inner.finish();
            self.outer.absorb(&inner_digest);
            inner_digest.zeroize();
        }
        self.outer.finish()
    }

    /// Alias of [`finish`](Self::finish).
    pub fn digest(&mut self) -> [u8; SHA256_DIGEST_SIZE] {
        self.finish()
    }
}

impl Drop for HmacSha256 {
    fn drop(&mut self) {
        self.inner_state.zeroize();
        self.outer_state.zeroize();
    }
}

// =============================================================================
// ONE-SHOT HELPERS
// =============================================================================

/// SHA-256 of `data`.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; SHA256_DIGEST_SIZE] {
    let mut h = Sha256::new();
    h.absorb(data);
    h.finish()
}

/// HMAC-SHA256 of `data` under `key`.
#[must_use]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; SHA256_DIGEST_SIZE] {
    let mut h = HmacSha256::new(key);
    h.absorb(data);
    h.finish()
}

// =============================================================================
// TRAIT IMPL
// =============================================================================

#[cfg(feature = "digest-trait")]
impl OutputSizeUser for Sha256 {
    type OutputSize = U32;
}

#[cfg(feature = "digest-trait")]
impl Update for Sha256 {
    fn update(&mut self, data: &[u8]) {
        // A hasher finished through the inherent API starts a new message
        if self.finished {
            self.reset();
        }
        self.absorb(data);
    }
}

#[cfg(feature = "digest-trait")]
impl FixedOutput for Sha256 {
    fn finalize_into(mut self, out: &mut Output<Self>) {
        let res = self.finish();
        out.copy_from_slice(&res);
    }
}

#[cfg(feature = "digest-trait")]
impl Reset for Sha256 {
    fn reset(&mut self) {
        Self::reset(self);
    }
}

#[cfg(feature = "digest-trait")]
impl HashMarker for Sha256 {}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn update_after_finish_fails_until_reset() {
        let mut h = Sha256::new();
        h.update(b"abc").unwrap();
        let first = h.finish();
        assert_eq!(h.update(b"more").err(), Some(MbcryptError::HashFinished));
        assert_eq!(h.finish(), first, "finish must be idempotent");

        h.reset();
        h.update(b"abc").unwrap();
        assert_eq!(h.finish(), first);
    }

    #[test]
    fn clean_wipes_buffers() {
        let mut h = Sha256::new();
        h.update(&[0xAA; 100]).unwrap();
        h.clean();
        assert!(h.buffer.iter().all(|&b| b == 0));
        assert!(h.schedule.iter().all(|&w| w == 0));
        assert_eq!(h.state, SHA256_IV);
        assert_eq!(h.finish(), sha256(b""));
    }

    #[test]
    fn hmac_reset_reuses_cached_key_state() {
        let mut mac = HmacSha256::new(b"key");
        mac.update(b"first").unwrap();
        let a = mac.finish();
        assert_eq!(a, hmac_sha256(b"key", b"first"));

        mac.reset();
        mac.update(b"second").unwrap();
        assert_eq!(mac.finish(), hmac_sha256(b"key", b"second"));

        mac.reset();
        mac.update(b"first").unwrap();
        assert_eq!(mac.finish(), a);
    }

    #[test]
    fn hmac_update_after_finish_fails() {
        let mut mac = HmacSha256::new(b"key");
        let _ = mac.finish();
        assert!(mac.update(b"x").is_err());
    }
}
