//! bcrypt
//!
//! Raw bcrypt over the Blowfish kernel plus the canonical `$2a$NN$...` string
//! form with bcrypt's own base64 alphabet.
//!
//! The password is not pre-truncated and the NUL terminator is always
//! appended. The key schedule reads `password || 0x00` cyclically into the
//! 18-word P-array, so only its first 72 bytes affect the hash.

use crate::kernels::blowfish::{key_words, BlowfishState};
use crate::types::{
    MbcryptError, Result, BCRYPT_STRING_LEN, MAX_BCRYPT_COST, MIN_COST, RAW_HASH_SIZE, SALT_SIZE,
};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// bcrypt's base64 dictionary (not RFC 4648 ordering).
pub const BCRYPT_ALPHABET: &[u8; 64] =
    b"./ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Variant id written by [`bcrypt`].
pub const DEFAULT_VARIANT: &str = "2a";

/// Main-loop rounds between two progress reports.
const PROGRESS_INTERVAL: u64 = 1024;

/// Share of the progress range kept back for the work after the main loop.
const PROGRESS_HEADROOM: f64 = 1.02;

// =============================================================================
// RAW BCRYPT
// =============================================================================

/// Check password, salt and cost against raw bcrypt's bounds.
fn validate(password: &[u8], salt: &[u8], cost: u32) -> Result<()> {
    if password.is_empty() {
        return Err(MbcryptError::EmptyPassword);
    }
    if salt.len() != SALT_SIZE {
        return Err(MbcryptError::InvalidSaltLength(salt.len()));
    }
    if !(MIN_COST..=MAX_BCRYPT_COST).contains(&cost) {
        return Err(MbcryptError::InvalidCost(cost));
    }
    Ok(())
}

/// Hash `password` with a 16-byte `salt` at `cost` (4..=31), returning the
/// 23 raw bytes.
///
/// `password || 0x00` is read cyclically into 18 key words; bytes past the
/// 72nd are ignored.
///
/// `progress` receives fractions in `[0, 0.98)` roughly every 1024 rounds and
/// exactly `1.0` once the hash is complete.
///
/// # Errors
/// Fails before doing any work if the password is empty, the salt is not
/// 16 bytes or the cost is out of range.
#[allow(clippy::cast_precision_loss)]
pub fn raw_bcrypt(
    password: &[u8],
    salt: &[u8],
    cost: u32,
    mut progress: Option<&mut dyn FnMut(f64)>,
) -> Result<[u8; RAW_HASH_SIZE]> {
    validate(password, salt, cost)?;

    let rounds: u64 = 1 << cost;

    let mut key = Zeroizing::new(Vec::with_capacity(password.len() + 1));
    key.extend_from_slice(password);
    key.push(0);

    let mut state = BlowfishState::new();
    state.expensive_key_schedule(salt, &key);

    let password_words = key_words(&key);
    let salt_words = key_words(salt);

    // The slow loop
    for i in 0..rounds {
        state.rekey(&password_words);
        state.rekey(&salt_words);

        if (i + 1) % PROGRESS_INTERVAL == 0 {
            if let Some(report) = progress.as_deref_mut() {
                report(i as f64 / (rounds as f64 * PROGRESS_HEADROOM));
            }
        }
    }

    let cipher = Zeroizing::new(state.encrypt_magic());
    let mut out = [0u8; RAW_HASH_SIZE];
    out.copy_from_slice(&cipher[..RAW_HASH_SIZE]);

    if let Some(report) = progress.as_deref_mut() {
        report(1.0);
    }

    Ok(out)
}

// =============================================================================
// CANONICAL STRING
// =============================================================================

/// Hash and encode as `$2a$NN$<salt><hash>`.
///
/// # Errors
/// Same as [`raw_bcrypt`].
pub fn bcrypt(
    password: &[u8],
    salt: &[u8],
    cost: u32,
    progress: Option<&mut dyn FnMut(f64)>,
) -> Result<String> {
    bcrypt_with_variant(password, salt, cost, progress, DEFAULT_VARIANT)
}

/// Like [`bcrypt`] with an explicit two-character variant id (`2a`, `2b`,
/// `2y`). The variant only changes the string prefix, never the hash.
///
/// # Errors
/// Fails on a variant that is not two characters, or as [`raw_bcrypt`].
pub fn bcrypt_with_variant(
    password: &[u8],
    salt: &[u8],
    cost: u32,
    progress: Option<&mut dyn FnMut(f64)>,
    variant: &str,
) -> Result<String> {
    if variant.chars().count() != 2 || variant.contains('$') {
        return Err(MbcryptError::InvalidVariant(variant.to_owned()));
    }

    let raw = raw_bcrypt(password, salt, cost, progress)?;

    let mut out = String::with_capacity(BCRYPT_STRING_LEN);
    out.push('$');
    out.push_str(variant);
    out.push('$');
    out.push_str(&format!("{cost:02}"));
    out.push('$');
    out.push_str(&encode_bcrypt64(salt)?);
    out.push_str(&encode_bcrypt64(&raw)?);
    Ok(out)
}

/// Fields of a canonical bcrypt string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedBcrypt {
    /// Two-character variant id.
    pub variant: String,
    /// Cost factor.
    pub cost: u32,
    /// Decoded salt.
    pub salt: [u8; SALT_SIZE],
    /// Decoded raw hash.
    pub hash: [u8; RAW_HASH_SIZE],
}

/// Split a canonical 60-character bcrypt string into its fields.
///
/// # Errors
/// Returns [`MbcryptError::MalformedEncoding`] on bad framing, a non-numeric
/// cost or characters outside the bcrypt alphabet.
pub fn parse_bcrypt(canonical: &str) -> Result<ParsedBcrypt> {
    if canonical.len() != BCRYPT_STRING_LEN || !canonical.is_ascii() {
        return Err(MbcryptError::MalformedEncoding("wrong length"));
    }

    let bytes = canonical.as_bytes();
    if bytes[0] != b'$' || bytes[3] != b'$' || bytes[6] != b'$' {
        return Err(MbcryptError::MalformedEncoding("bad framing"));
    }

    let variant = &canonical[1..3];
    let cost_digits = &canonical[4..6];
    if !cost_digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MbcryptError::MalformedEncoding("cost is not numeric"));
    }
    let cost = cost_digits
        .parse::<u32>()
        .map_err(|_| MbcryptError::MalformedEncoding("cost is not numeric"))?;

    let salt_vec = decode_bcrypt64(&canonical[7..29], SALT_SIZE)?;
    let hash_vec = decode_bcrypt64(&canonical[29..], RAW_HASH_SIZE)?;

    let mut salt = [0u8; SALT_SIZE];
    salt.copy_from_slice(&salt_vec);
    let mut hash = [0u8; RAW_HASH_SIZE];
    hash.copy_from_slice(&hash_vec);

    Ok(ParsedBcrypt {
        variant: variant.to_owned(),
        cost,
        salt,
        hash,
    })
}

/// Recompute `canonical` from `password` and compare in constant time.
///
/// # Errors
/// Fails if `canonical` does not parse or its cost is out of range.
pub fn verify(password: &[u8], canonical: &str) -> Result<bool> {
    let parsed = parse_bcrypt(canonical)?;
    let computed = raw_bcrypt(password, &parsed.salt, parsed.cost, None)?;
    Ok(computed.ct_eq(&parsed.hash).into())
}

// =============================================================================
// BCRYPT-BASE64
// =============================================================================

/// Encode bytes with bcrypt's alphabet, 6 bits per character, no padding.
///
/// # Errors
/// Returns [`MbcryptError::EmptyInput`] for empty input.
pub fn encode_bcrypt64(data: &[u8]) -> Result<String> {
    if data.is_empty() {
        return Err(MbcryptError::EmptyInput);
    }

    let symbol = |v: u8| char::from(BCRYPT_ALPHABET[usize::from(v & 0x3f)]);
    let mut out = String::with_capacity((data.len() * 4).div_ceil(3));

    for group in data.chunks(3) {
        let c0 = group[0];
        out.push(symbol(c0 >> 2));
        match (group.get(1).copied(), group.get(2).copied()) {
            (None, _) => out.push(symbol((c0 & 0x03) << 4)),
            (Some(c1), None) => {
                out.push(symbol((c0 & 0x03) << 4 | c1 >> 4));
                out.push(symbol((c1 & 0x0f) << 2));
            }
            (Some(c1), Some(c2)) => {
                out.push(symbol((c0 & 0x03) << 4 | c1 >> 4));
                out.push(symbol((c1 & 0x0f) << 2 | c2 >> 6));
                out.push(symbol(c2));
            }
        }
    }

    Ok(out)
}

/// Decode bcrypt-base64 text into exactly `expected_len` bytes.
///
/// # Errors
/// Returns [`MbcryptError::MalformedEncoding`] for characters outside the
/// alphabet, a length that does not encode `expected_len` bytes, or nonzero
/// spare bits in the last character.
#[allow(clippy::cast_possible_truncation)]
pub fn decode_bcrypt64(text: &str, expected_len: usize) -> Result<Vec<u8>> {
    if text.len() != (expected_len * 4).div_ceil(3) {
        return Err(MbcryptError::MalformedEncoding("wrong encoded length"));
    }

    let mut out = Zeroizing::new(Vec::with_capacity(expected_len));
    let mut acc: u32 = 0;
    let mut bits = 0u32;

    for ch in text.bytes() {
        let value = BCRYPT_ALPHABET
            .iter()
            .position(|&c| c == ch)
            .ok_or(MbcryptError::MalformedEncoding("character outside alphabet"))?;
        acc = (acc << 6) | value as u32;
        bits += 6;
        if bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
    }

    // Only one encoding per byte string
    if acc & ((1 << bits) - 1) != 0 {
        return Err(MbcryptError::MalformedEncoding("nonzero trailing bits"));
    }

    out.truncate(expected_len);
    Ok(out.to_vec())
}

// =============================================================================
// TESTS
// =============================================================================
