use bolero::check;
use mbcrypt::bcrypt::{decode_bcrypt64, encode_bcrypt64, parse_bcrypt};

#[test]
fn fuzz_bcrypt64_inverse() {
    check!().with_type::<Vec<u8>>().for_each(|data| {
        if data.is_empty() {
            assert!(encode_bcrypt64(data).is_err());
            return;
        }

        let encoded = encode_bcrypt64(data).unwrap();
        assert_eq!(encoded.len(), (data.len() * 4).div_ceil(3));
        assert_eq!(&decode_bcrypt64(&encoded, data.len()).unwrap(), data);
    });
}

#[test]
fn fuzz_parse_never_panics() {
    check!().with_type::<String>().for_each(|text| {
        // Garbage must be rejected, never crash the parser
        let _ = parse_bcrypt(text);
        // Accepted text has exactly one encoding
        if let Ok(bytes) = decode_bcrypt64(text, 16) {
            assert_eq!(&encode_bcrypt64(&bytes).unwrap(), text);
        }
    });
}
