//! Generator for mbcrypt test vectors
//!
//! Prints the `mbcrypt` section of `tests/test_vectors.json`: the self-test
//! password and salt at cost 5 for 1..=8 lanes.
#![allow(clippy::unwrap_used)]
use serde_json::json;

fn main() {
    let salt_hex = hex::encode(mbcrypt::SELFTEST_SALT);
    let password = std::str::from_utf8(mbcrypt::SELFTEST_PASSWORD).unwrap();

    let vectors: Vec<_> = (1..=8)
        .map(|lanes| {
            let digest = mbcrypt::hash_with_single_thread(
                lanes,
                mbcrypt::SELFTEST_PASSWORD,
                &mbcrypt::SELFTEST_SALT,
                mbcrypt::SELFTEST_COST,
            )
            .unwrap();
            json!({
                "lanes": lanes,
                "password": password,
                "salt": salt_hex,
                "cost": mbcrypt::SELFTEST_COST,
                "digest": hex::encode(digest)
            })
        })
        .collect();

    println!(
        "{}",
        serde_json::to_string_pretty(&json!({ "mbcrypt": vectors })).unwrap()
    );
}
