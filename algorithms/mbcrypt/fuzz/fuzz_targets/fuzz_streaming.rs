#![no_main]

use libfuzzer_sys::fuzz_target;
use mbcrypt::{hmac_sha256, sha256, HmacSha256, Sha256};

fuzz_target!(|data: &[u8]| {
    // =============================================================================
    // SHA-256: ONE-SHOT VS INCREMENTAL
    // =============================================================================

    let expected = sha256(data);

    // First byte picks a chunk size so every block boundary gets exercised
    let chunk = data.first().map_or(1, |&b| usize::from(b) + 1);
    let mut hasher = Sha256::new();
    for part in data.chunks(chunk) {
        hasher.update(part).unwrap();
    }
    assert_eq!(hasher.finish(), expected, "Chunked SHA-256 mismatch");

    // Finished hashers refuse more input until reset
    assert!(hasher.update(data).is_err());
    hasher.reset();
    hasher.update(data).unwrap();
    assert_eq!(hasher.finish(), expected, "SHA-256 reset mismatch");

    // =============================================================================
    // HMAC: CACHED KEY STATE
    // =============================================================================

    let (key, msg) = data.split_at(data.len() / 2);
    let mut mac = HmacSha256::new(key);
    mac.update(msg).unwrap();
    let first = mac.finish();
    assert_eq!(first, hmac_sha256(key, msg), "HMAC one-shot mismatch");

    mac.reset();
    mac.update(msg).unwrap();
    assert_eq!(mac.finish(), first, "HMAC reset mismatch");
});
