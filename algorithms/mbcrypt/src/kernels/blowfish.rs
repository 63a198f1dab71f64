//! Blowfish state and the bcrypt key schedules.
//!
//! All arithmetic is explicit `u32` wrapping arithmetic. The expanded key is
//! key material: it is wiped when the state is dropped.

use super::constants::{
    BCRYPT_MAGIC, BCRYPT_MAGIC_PASSES, BLOWFISH_ROUNDS, P_INIT, P_WORDS, S_INIT, S_WORDS,
};
use zeroize::{Zeroize, ZeroizeOnDrop};

// =============================================================================
// WORD READER
// =============================================================================

/// Cyclic big-endian word reader over a key or salt.
///
/// Every byte index wraps modulo the data length, so keys shorter than four
/// bytes are read correctly.
pub struct WordReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> WordReader<'a> {
    /// Start reading at offset 0. `data` must be non-empty.
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Read the next word and advance by four bytes (modulo length).
    #[inline]
    pub fn next_word(&mut self) -> u32 {
        let len = self.data.len();
        let off = self.offset;
        let word = u32::from(self.data[off]) << 24
            | u32::from(self.data[(off + 1) % len]) << 16
            | u32::from(self.data[(off + 2) % len]) << 8
            | u32::from(self.data[(off + 3) % len]);
        self.offset = (off + 4) % len;
        word
    }
}

/// Expand `data` into one word per P-array entry, reading cyclically.
pub fn key_words(data: &[u8]) -> KeyWords {
    let mut reader = WordReader::new(data);
    let mut words = KeyWords([0; P_WORDS]);
    for w in &mut words.0 {
        *w = reader.next_word();
    }
    words
}

/// P-array-sized key expansion, wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct KeyWords(pub [u32; P_WORDS]);

// =============================================================================
// BLOWFISH STATE
// =============================================================================

/// Expanded Blowfish key: P-array plus four S-boxes.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct BlowfishState {
    p: [u32; P_WORDS],
    s: [u32; S_WORDS],
}

impl Default for BlowfishState {
    fn default() -> Self {
        Self::new()
    }
}

impl BlowfishState {
    /// Fresh state from the pi-derived constants.
    pub const fn new() -> Self {
        Self {
            p: P_INIT,
            s: S_INIT,
        }
    }

    #[inline(always)]
    fn feistel(&self, x: u32) -> u32 {
        let [a, b, c, d] = x.to_be_bytes();
        (self.s[usize::from(a)].wrapping_add(self.s[0x100 | usize::from(b)])
            ^ self.s[0x200 | usize::from(c)])
            .wrapping_add(self.s[0x300 | usize::from(d)])
    }

    /// Encrypt one 64-bit block given as two words.
    #[inline]
    pub fn encipher(&self, mut l: u32, mut r: u32) -> (u32, u32) {
        l ^= self.p[0];
        let mut i = 1;
        while i < BLOWFISH_ROUNDS {
            r ^= self.feistel(l) ^ self.p[i];
            l ^= self.feistel(r) ^ self.p[i + 1];
            i += 2;
        }
        (r ^ self.p[BLOWFISH_ROUNDS + 1], l)
    }

    /// Expensive key schedule: mix `key` into P, then refill P and S while
    /// folding `salt` words into the running block.
    pub fn expensive_key_schedule(&mut self, salt: &[u8], key: &[u8]) {
        let mut key_reader = WordReader::new(key);
        for p in &mut self.p {
            *p ^= key_reader.next_word();
        }

        let mut salt_reader = WordReader::new(salt);
        let (mut l, mut r) = (0u32, 0u32);

        for i in (0..P_WORDS).step_by(2) {
            l ^= salt_reader.next_word();
            r ^= salt_reader.next_word();
            (l, r) = self.encipher(l, r);
            self.p[i] = l;
            self.p[i + 1] = r;
        }
        for i in (0..S_WORDS).step_by(2) {
            l ^= salt_reader.next_word();
            r ^= salt_reader.next_word();
            (l, r) = self.encipher(l, r);
            self.s[i] = l;
            self.s[i + 1] = r;
        }
    }

    /// Plain Blowfish re-key with precomputed key words (no salt).
    pub fn rekey(&mut self, words: &KeyWords) {
        for (p, w) in self.p.iter_mut().zip(words.0.iter()) {
            *p ^= *w;
        }

        let (mut l, mut r) = (0u32, 0u32);
        for i in (0..P_WORDS).step_by(2) {
            (l, r) = self.encipher(l, r);
            self.p[i] = l;
            self.p[i + 1] = r;
        }
        for i in (0..S_WORDS).step_by(2) {
            (l, r) = self.encipher(l, r);
            self.s[i] = l;
            self.s[i + 1] = r;
        }
    }

    /// Encrypt the 24-byte bcrypt magic text 64 times, returning it big-endian.
    pub fn encrypt_magic(&self) -> [u8; 24] {
        let mut cdata = BCRYPT_MAGIC;
        for _ in 0..BCRYPT_MAGIC_PASSES {
            for pair in cdata.chunks_exact_mut(2) {
                let (l, r) = self.encipher(pair[0], pair[1]);
                pair[0] = l;
                pair[1] = r;
            }
        }

        let mut out = [0u8; 24];
        for (chunk, word) in out.chunks_exact_mut(4).zip(cdata.iter()) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        cdata.zeroize();
        out
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_reader_wraps_short_keys() {
        // "a\0": every read cycles through two bytes.
        let mut reader = WordReader::new(&[0x61, 0x00]);
        assert_eq!(reader.next_word(), 0x6100_6100);
        assert_eq!(reader.next_word(), 0x6100_6100);
    }

    #[test]
    fn word_reader_wraps_unaligned_lengths() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut reader = WordReader::new(&data);
        assert_eq!(reader.next_word(), 0x0102_0304);
        assert_eq!(reader.next_word(), 0x0506_0102);
        assert_eq!(reader.next_word(), 0x0304_0506);
    }

    #[test]
    fn blowfish_zero_key_vector() {
        // Schneier's test vector: all-zero key and plaintext.
        let mut state = BlowfishState::new();
        state.rekey(&key_words(&[0u8; 8]));

        assert_eq!(state.encipher(0, 0), (0x4EF9_9745, 0x6198_DD78));
    }
}
