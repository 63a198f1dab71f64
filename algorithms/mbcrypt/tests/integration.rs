//! Integration Tests
//!
//! Verifies the public API of the mbcrypt library.
//! Ensures determinism, no pre-truncation of passwords, lane-order sensitivity and
//! the validation layers of bcrypt and the lane protocol.

#![allow(clippy::pedantic, clippy::nursery)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use mbcrypt::{ErrorKind, MbcryptError};

const SALT: [u8; 16] = [
    0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef,
];

// =============================================================================
// BCRYPT
// =============================================================================

#[test]
fn test_bcrypt_determinism() {
    let a = mbcrypt::bcrypt(b"a", &SALT, 5, None).unwrap();
    let b = mbcrypt::bcrypt(b"a", &SALT, 5, None).unwrap();
    assert_eq!(a, b, "bcrypt must be deterministic");
    assert_eq!(a.len(), mbcrypt::BCRYPT_STRING_LEN);
}

#[test]
fn test_cost_changes_only_hash_segment() {
    let c5 = mbcrypt::bcrypt(b"a", &SALT, 5, None).unwrap();
    let c6 = mbcrypt::bcrypt(b"a", &SALT, 6, None).unwrap();
    assert_eq!(&c5[7..29], &c6[7..29], "salt segment is shared");
    assert_ne!(&c5[29..], &c6[29..]);
}

#[test]
fn test_no_truncation() {
    // Differ only in the 66th character
    let long_a = "a".repeat(66);
    let mut long_b = "a".repeat(65);
    long_b.push('b');

    let ha = mbcrypt::bcrypt(long_a.as_bytes(), &SALT, 4, None).unwrap();
    let hb = mbcrypt::bcrypt(long_b.as_bytes(), &SALT, 4, None).unwrap();
    assert_ne!(ha, hb, "password bytes past 64 must count");

    assert_eq!(ha.len(), mbcrypt::BCRYPT_STRING_LEN);
}

#[test]
fn test_key_schedule_reads_72_bytes() {
    // password || NUL fills the 18-word P-array; byte index 71 still counts
    let base = vec![b'x'; 100];
    let mut at71 = base.clone();
    at71[71] = b'y';
    let mut at72 = base.clone();
    at72[72] = b'y';

    let reference = mbcrypt::raw_bcrypt(&base, &SALT, 4, None).unwrap();
    assert_ne!(mbcrypt::raw_bcrypt(&at71, &SALT, 4, None).unwrap(), reference);
    assert_eq!(mbcrypt::raw_bcrypt(&at72, &SALT, 4, None).unwrap(), reference);
}

#[test]
fn test_bcrypt_verify() {
    let canonical = mbcrypt::bcrypt_with_variant(b"pw", &SALT, 4, None, "2y").unwrap();
    assert!(canonical.starts_with("$2y$04$"));
    assert!(mbcrypt::bcrypt::verify(b"pw", &canonical).unwrap());
    assert!(!mbcrypt::bcrypt::verify(b"pW", &canonical).unwrap());

    let parsed = mbcrypt::parse_bcrypt(&canonical).unwrap();
    assert_eq!(parsed.variant, "2y");
    assert_eq!(parsed.cost, 4);
    assert_eq!(parsed.salt, SALT);
    assert_eq!(
        parsed.hash,
        mbcrypt::raw_bcrypt(b"pw", &SALT, 4, None).unwrap()
    );
}

#[test]
fn test_bcrypt_validation() {
    let cases = [
        (mbcrypt::bcrypt(b"", &SALT, 5, None), MbcryptError::EmptyPassword),
        (
            mbcrypt::bcrypt(b"a", &SALT[..8], 5, None),
            MbcryptError::InvalidSaltLength(8),
        ),
        (mbcrypt::bcrypt(b"a", &SALT, 3, None), MbcryptError::InvalidCost(3)),
        (mbcrypt::bcrypt(b"a", &SALT, 32, None), MbcryptError::InvalidCost(32)),
    ];
    for (result, expected) in cases {
        let err = result.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err, expected);
    }
}

// =============================================================================
// LANE PROTOCOL
// =============================================================================

#[test]
fn test_combine_is_order_sensitive() {
    let results: Vec<String> = (0..3)
        .map(|lane| mbcrypt::hash_lane(lane, b"pw", &SALT, 4).unwrap())
        .collect();
    assert!(results.iter().all(|r| r.len() == mbcrypt::LANE_RESULT_LEN));

    let in_order = mbcrypt::combine_lane_results(&results).unwrap();
    let swapped = mbcrypt::combine_lane_results(&[&results[1], &results[0], &results[2]]).unwrap();
    assert_ne!(in_order, swapped);

    assert_eq!(
        in_order,
        mbcrypt::hash_with_single_thread(3, b"pw", &SALT, 4).unwrap()
    );
}

#[test]
fn test_lane_count_is_part_of_the_key() {
    let two = mbcrypt::hash(2, b"pw", &SALT, 4).unwrap();
    let three = mbcrypt::hash(3, b"pw", &SALT, 4).unwrap();
    assert_ne!(two, three);
}

#[test]
fn test_lane_helpers_compose() {
    let hex_pw = mbcrypt::lane_password(1, b"pw").unwrap();
    let salt = mbcrypt::lane_salt(1, &SALT).unwrap();
    let direct = mbcrypt::bcrypt_lane(&hex_pw, &salt, 4, None).unwrap();
    assert_eq!(direct, mbcrypt::hash_lane(1, b"pw", &SALT, 4).unwrap());

    let job = mbcrypt::LaneJob::derive(1, b"pw", &SALT, 4, 7).unwrap();
    assert_eq!(job.run(None).unwrap(), direct);
}

#[test]
fn test_protocol_cost_bounds_differ_from_bcrypt() {
    // 32 passes the protocol check and is then refused by raw bcrypt
    assert_eq!(
        mbcrypt::hash_with_single_thread(1, b"pw", &SALT, 32),
        Err(MbcryptError::InvalidCost(32))
    );
    assert_eq!(
        mbcrypt::hash_with_single_thread(1, b"pw", &SALT, 33),
        Err(MbcryptError::InvalidCost(33))
    );
    assert_eq!(
        mbcrypt::hash_with_single_thread(1, b"", &SALT, 4),
        Err(MbcryptError::EmptyPassword)
    );
}

// =============================================================================
// VERIFICATION
// =============================================================================

#[test]
fn test_verify_digest() {
    let digest = mbcrypt::hash(2, b"Secure Data", &SALT, 4).unwrap();
    assert!(
        mbcrypt::verify_digest(2, b"Secure Data", &SALT, 4, &digest).unwrap(),
        "Verification should succeed for correct digest"
    );

    let mut bad = digest;
    bad[0] ^= 0xFF;
    assert!(
        !mbcrypt::verify_digest(2, b"Secure Data", &SALT, 4, &bad).unwrap(),
        "Verification should fail for incorrect digest"
    );
    assert!(!mbcrypt::verify_digest(1, b"Secure Data", &SALT, 4, &digest).unwrap());
}
