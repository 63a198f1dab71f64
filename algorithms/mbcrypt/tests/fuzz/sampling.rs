use bolero::check;
use mbcrypt::{secure_shuffle, unbiased_small_int, FixedByteSource, MbcryptError};

#[test]
fn fuzz_unbiased_small_int_range() {
    check!()
        .with_type::<(Vec<u8>, u16)>()
        .for_each(|(bytes, n)| {
            let n = usize::from(*n % 300);
            let mut src = FixedByteSource::new(bytes);

            match unbiased_small_int(&mut src, n) {
                Ok(v) => assert!(v < n),
                Err(MbcryptError::InvalidRange(bad)) => {
                    assert_eq!(bad, n);
                    assert!(n == 0 || n > 256);
                }
                Err(e) => assert_eq!(e, MbcryptError::Exhausted),
            }
        });
}

#[test]
fn fuzz_shuffle_permutation() {
    check!()
        .with_type::<(Vec<u8>, Vec<u8>)>()
        .for_each(|(items, bytes)| {
            let mut src = FixedByteSource::new(bytes);
            if let Ok(mut shuffled) = secure_shuffle(items.clone(), &mut src) {
                let mut expected = items.clone();
                expected.sort_unstable();
                shuffled.sort_unstable();
                assert_eq!(shuffled, expected);
            }
        });
}
