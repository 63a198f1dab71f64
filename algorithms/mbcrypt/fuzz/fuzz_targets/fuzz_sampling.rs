#![no_main]

use libfuzzer_sys::fuzz_target;
use mbcrypt::{secure_shuffle, unbiased_small_int, FixedByteSource};

fuzz_target!(|data: &[u8]| {
    let Some((&n, bytes)) = data.split_first() else {
        return;
    };
    let n = usize::from(n) + 1;

    // =============================================================================
    // REJECTION SAMPLING
    // =============================================================================

    let mut src = FixedByteSource::new(bytes);
    if let Ok(v) = unbiased_small_int(&mut src, n) {
        assert!(v < n, "sample {v} out of range {n}");
    }

    // =============================================================================
    // SHUFFLE
    // =============================================================================

    let items: Vec<usize> = (0..n).collect();
    let mut src = FixedByteSource::new(bytes);
    if let Ok(mut shuffled) = secure_shuffle(items.clone(), &mut src) {
        shuffled.sort_unstable();
        assert_eq!(shuffled, items, "shuffle lost or duplicated elements");
    }
});
