use bolero::check;
use mbcrypt::{sha256, Sha256};

#[test]
fn fuzz_streaming_consistency() {
    check!().with_type::<Vec<u8>>().for_each(|data| {
        // =============================================================================
        // BASELINE (ONE-SHOT)
        // =============================================================================
        let expected = sha256(data);

        // =============================================================================
        // STREAMING VARIATIONS
        // =============================================================================

        // 1. Byte-by-Byte (Small Inputs Only)
        if data.len() < 256 {
            let mut hasher = Sha256::new();
            for b in data {
                hasher.update(&[*b]).unwrap();
            }
            assert_eq!(hasher.finish(), expected, "Byte-by-byte streaming mismatch");
        }

        // 2. Arbitrary Split Points
        if data.len() > 1 {
            for split_idx in [1, data.len() / 2, data.len() - 1] {
                let mut hasher = Sha256::new();
                let (first, second) = data.split_at(split_idx);
                hasher.update(first).unwrap();
                hasher.update(second).unwrap();
                assert_eq!(hasher.finish(), expected, "Split at {split_idx} mismatch");
            }
        }

        // 3. Reuse After Reset
        let mut hasher = Sha256::new();
        hasher.update(b"previous message").unwrap();
        let _ = hasher.finish();
        hasher.reset();
        hasher.update(data).unwrap();
        assert_eq!(hasher.finish(), expected, "Reset reuse mismatch");
    });
}
