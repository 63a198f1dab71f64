//! Sampling Utilities
//!
//! Spot checks for rejection sampling and shuffle behavior on fixed sources.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use mbcrypt::{
    secure_shuffle, unbiased_small_int, ErrorKind, FixedByteSource, HmacCounterByteSource,
    MbcryptError,
};

/// One draw from a single-byte source; `None` when the byte is rejected or
/// `n` is invalid.
fn spot_check(byte: u8, n: usize) -> Option<usize> {
    let bytes = [byte];
    let mut src = FixedByteSource::new(&bytes);
    unbiased_small_int(&mut src, n).ok()
}

#[test]
fn test_n_out_of_range() {
    let mut src = FixedByteSource::new(&[10]);
    assert_eq!(
        unbiased_small_int(&mut src, 0),
        Err(MbcryptError::InvalidRange(0))
    );
    assert_eq!(
        unbiased_small_int(&mut src, 257),
        Err(MbcryptError::InvalidRange(257))
    );
    assert_eq!(
        unbiased_small_int(&mut src, 0).unwrap_err().kind(),
        ErrorKind::Validation
    );
    // Nothing was consumed
    assert_eq!(src.remaining(), 1);
}

#[test]
fn test_spot_checks_n26() {
    assert_eq!(spot_check(10, 26), Some(10));
    assert_eq!(spot_check(26, 26), Some(0));
    assert_eq!(spot_check(100, 26), Some(22));
    assert_eq!(spot_check(232, 26), Some(24));
    assert_eq!(spot_check(233, 26), Some(25));
    for byte in 234..=255 {
        assert_eq!(spot_check(byte, 26), None, "byte {byte} must be rejected");
    }
}

#[test]
fn test_spot_checks_n10() {
    assert_eq!(spot_check(3, 10), Some(3));
    assert_eq!(spot_check(10, 10), Some(0));
    assert_eq!(spot_check(17, 10), Some(7));
    assert_eq!(spot_check(248, 10), Some(8));
    assert_eq!(spot_check(249, 10), Some(9));
    for byte in 250..=255 {
        assert_eq!(spot_check(byte, 10), None);
    }
}

#[test]
fn test_n256_accepts_every_byte() {
    for byte in 0..=255u8 {
        assert_eq!(spot_check(byte, 256), Some(usize::from(byte)));
    }
}

#[test]
fn test_rejection_exhausts_source() {
    let mut src = FixedByteSource::new(&[255, 240]);
    assert_eq!(
        unbiased_small_int(&mut src, 26),
        Err(MbcryptError::Exhausted)
    );
}

#[test]
fn test_every_residue_equally_reachable() {
    // Over all accepted bytes each residue appears the same number of times
    for n in [3usize, 10, 26, 100, 255] {
        let mut counts = vec![0usize; n];
        for byte in 0..=255u8 {
            if let Some(v) = spot_check(byte, n) {
                counts[v] += 1;
            }
        }
        assert!(counts.iter().all(|&c| c == counts[0]), "n = {n}");
    }
}

#[test]
fn test_shuffle_is_a_permutation() {
    let mut src = HmacCounterByteSource::new(b"shuffle key", 1000);
    let items: Vec<u32> = (0..500).collect();
    let shuffled = secure_shuffle(items.clone(), &mut src).unwrap();

    assert_ne!(shuffled, items);
    let mut sorted = shuffled;
    sorted.sort_unstable();
    assert_eq!(sorted, items);
}

#[test]
fn test_shuffle_is_deterministic_per_source() {
    let a = secure_shuffle(
        vec!["w", "x", "y", "z"],
        &mut HmacCounterByteSource::new(b"k", 10),
    )
    .unwrap();
    let b = secure_shuffle(
        vec!["w", "x", "y", "z"],
        &mut HmacCounterByteSource::new(b"k", 10),
    )
    .unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_shuffle_length_limit() {
    let mut src = FixedByteSource::new(&[]);
    assert_eq!(
        secure_shuffle(vec![0u8; 0x8001], &mut src),
        Err(MbcryptError::SequenceTooLong(0x8001))
    );
}

#[test]
fn test_shuffle_propagates_exhaustion() {
    let mut src = FixedByteSource::new(&[1, 2, 3]);
    assert_eq!(
        secure_shuffle(vec!['a', 'b'], &mut src),
        Err(MbcryptError::Exhausted)
    );
}
