//! Bias-free sampling over a [`ByteSource`].

use crate::drbg::ByteSource;
use crate::types::{MbcryptError, Result};
use std::collections::HashSet;

/// Largest sequence [`secure_shuffle`] accepts (half the 16-bit key space).
pub const MAX_SHUFFLE_LEN: usize = 0x8000;

/// Uniform integer in `[0, n)` for `n` in `1..=256`.
///
/// Draws bytes until one falls at or below `255 - (256 % n)`, so every
/// residue is equally likely. Rejected draws are discarded.
///
/// # Errors
/// [`MbcryptError::InvalidRange`] if `n` is 0 or above 256, or the source's
/// error (usually [`MbcryptError::Exhausted`]) before a draw is accepted.
pub fn unbiased_small_int<S: ByteSource + ?Sized>(source: &mut S, n: usize) -> Result<usize> {
    if n == 0 || n > 256 {
        return Err(MbcryptError::InvalidRange(n));
    }
    let limit = 255 - (256 % n);

    loop {
        let r = usize::from(source.next_byte()?);
        if r <= limit {
            return Ok(r % n);
        }
    }
}

/// Random permutation of `items`.
///
/// Each element gets a distinct 16-bit key built from two bytes (first byte
/// high), redrawing on collision; elements are then ordered by key.
///
/// # Errors
/// [`MbcryptError::SequenceTooLong`] above [`MAX_SHUFFLE_LEN`] elements, or the
/// source's error if it runs dry.
pub fn secure_shuffle<T, S: ByteSource + ?Sized>(items: Vec<T>, source: &mut S) -> Result<Vec<T>> {
    if items.len() > MAX_SHUFFLE_LEN {
        return Err(MbcryptError::SequenceTooLong(items.len()));
    }

    let mut used = HashSet::with_capacity(items.len());
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let key = loop {
            let hi = source.next_byte()?;
            let lo = source.next_byte()?;
            let r = u16::from_be_bytes([hi, lo]);
            if used.insert(r) {
                break r;
            }
        };
        keyed.push((key, item));
    }

    keyed.sort_by_key(|(key, _)| *key);
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::drbg::FixedByteSource;

    #[test]
    fn rejected_draws_are_skipped() {
        // 250 and 255 are above the n=10 limit of 249
        let mut src = FixedByteSource::new(&[250, 255, 17]);
        assert_eq!(unbiased_small_int(&mut src, 10), Ok(7));
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn colliding_keys_are_redrawn() {
        // Keys: 0x0102, 0x0102 (collision), 0x0001
        let bytes = [1, 2, 1, 2, 0, 1];
        let mut src = FixedByteSource::new(&bytes);
        let out = secure_shuffle(vec!['a', 'b'], &mut src).unwrap();
        assert_eq!(out, vec!['b', 'a']);
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn empty_sequence_draws_nothing() {
        let mut src = FixedByteSource::new(&[]);
        let out: Vec<u8> = secure_shuffle(Vec::new(), &mut src).unwrap();
        assert!(out.is_empty());
    }
}
