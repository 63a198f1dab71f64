#![no_main]

use libfuzzer_sys::fuzz_target;
use mbcrypt::bcrypt::{decode_bcrypt64, encode_bcrypt64, parse_bcrypt};

fuzz_target!(|data: &[u8]| {
    // =============================================================================
    // ENCODE / DECODE
    // =============================================================================

    match encode_bcrypt64(data) {
        Ok(encoded) => {
            let decoded = decode_bcrypt64(&encoded, data.len()).unwrap();
            assert_eq!(decoded, data, "bcrypt-base64 decode mismatch");
        }
        Err(_) => assert!(data.is_empty()),
    }

    // =============================================================================
    // HOSTILE TEXT
    // =============================================================================

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = parse_bcrypt(text);
        let _ = decode_bcrypt64(text, 23);
    }
});
