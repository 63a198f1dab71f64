//! Public API Layer
//!
//! One-call hashing and verification on top of the lane protocol.

use crate::engine::parallel;
use crate::types::{Digest, Result};
use subtle::ConstantTimeEq;

// =============================================================================
// HASHING
// =============================================================================

/// Compute the mbcrypt digest of `password` under a 16-byte `salt`.
///
/// `lanes` (1..=64) is part of the derivation: a different lane count gives
/// a different digest. Lanes run on the rayon pool when the `multithread`
/// feature is on.
///
/// # Example
/// ```rust
/// let salt = [7u8; 16];
/// let digest = mbcrypt::hash(2, b"correct horse", &salt, 4)?;
/// assert_eq!(digest, mbcrypt::hash_with_single_thread(2, b"correct horse", &salt, 4)?);
/// # Ok::<(), mbcrypt::MbcryptError>(())
/// ```
///
/// # Errors
/// Empty password, salt not 16 bytes, cost outside 4..=32 (raw bcrypt then
/// rejects 32) or lane count outside 1..=64.
#[inline]
pub fn hash(lanes: usize, password: &[u8], salt: &[u8], cost: u32) -> Result<Digest> {
    parallel::hash_parallel(lanes, password, salt, cost)
}

// =============================================================================
// VERIFICATION
// =============================================================================

/// Recompute and compare against `expected` in constant time.
///
/// # Example
/// ```rust
/// let salt = [7u8; 16];
/// let digest = mbcrypt::hash(1, b"pw", &salt, 4)?;
/// assert!(mbcrypt::verify_digest(1, b"pw", &salt, 4, &digest)?);
/// assert!(!mbcrypt::verify_digest(1, b"pW", &salt, 4, &digest)?);
/// # Ok::<(), mbcrypt::MbcryptError>(())
/// ```
///
/// # Errors
/// Same as [`hash`].
pub fn verify_digest(
    lanes: usize,
    password: &[u8],
    salt: &[u8],
    cost: u32,
    expected: &Digest,
) -> Result<bool> {
    let computed = hash(lanes, password, salt, cost)?;
    Ok(computed.ct_eq(expected).into())
}
