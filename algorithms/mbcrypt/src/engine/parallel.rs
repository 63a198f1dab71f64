//! Lane Protocol
//!
//! Splits one (password, salt) pair into independent bcrypt lanes and folds
//! the lane results back into a single digest:
//! 1. Lane inputs: SHA-256 of `(i + 1) as u8 || password` and `... || salt`
//! 2. Lane work: bcrypt over the hex lane password (the expensive part)
//! 3. Combine: SHA-256 over the 31-char lane results in lane order
//!
//! Lanes are evaluated serially here or on rayon (`multithread` feature);
//! the pool coordinator in [`dispatcher`](super::dispatcher) runs them on
//! long-lived units instead.

use crate::bcrypt::bcrypt;
use crate::sha256::Sha256;
use crate::types::{
    Digest, MbcryptError, Result, BCRYPT_PREFIX_LEN, BCRYPT_STRING_LEN, LANE_PASSWORD_LEN,
    LANE_RESULT_LEN, MAX_LANES, MAX_PROTOCOL_COST, MIN_COST, SALT_SIZE,
};
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

// =============================================================================
// VALIDATION
// =============================================================================

/// Protocol-level bounds: non-empty password, 16-byte salt, cost 4..=32.
pub(crate) fn check_params(password: &[u8], salt: &[u8], cost: u32) -> Result<()> {
    if password.is_empty() {
        return Err(MbcryptError::EmptyPassword);
    }
    if salt.len() != SALT_SIZE {
        return Err(MbcryptError::InvalidSaltLength(salt.len()));
    }
    if !(MIN_COST..=MAX_PROTOCOL_COST).contains(&cost) {
        return Err(MbcryptError::InvalidCost(cost));
    }
    Ok(())
}

fn check_lane_count(lanes: usize) -> Result<()> {
    if (1..=MAX_LANES).contains(&lanes) {
        Ok(())
    } else {
        Err(MbcryptError::InvalidLaneCount(lanes))
    }
}

// =============================================================================
// LANE DERIVATION
// =============================================================================

/// SHA-256 of `data` with the lane byte prepended.
///
/// The byte is `(lane + 1) mod 256`, so lane 255 maps to 0.
#[allow(clippy::cast_possible_truncation)]
fn prefixed_digest(lane: usize, data: &[u8]) -> Digest {
    let mut h = Sha256::new();
    let prefix = [(lane.wrapping_add(1) & 0xFF) as u8];
    h.absorb(&prefix);
    h.absorb(data);
    let out = h.finish();
    h.clean();
    out
}

/// Distinct 64-character lowercase hex password for `lane`.
///
/// # Errors
/// [`MbcryptError::EmptyPassword`] for an empty password.
pub fn lane_password(lane: usize, password: &[u8]) -> Result<Zeroizing<String>> {
    if password.is_empty() {
        return Err(MbcryptError::EmptyPassword);
    }
    let mut digest = prefixed_digest(lane, password);
    let hex = Zeroizing::new(hex::encode(digest));
    digest.zeroize();
    Ok(hex)
}

/// Distinct 16-byte salt for `lane`.
///
/// # Errors
/// [`MbcryptError::InvalidSaltLength`] unless `salt` is 16 bytes.
pub fn lane_salt(lane: usize, salt: &[u8]) -> Result<[u8; SALT_SIZE]> {
    if salt.len() != SALT_SIZE {
        return Err(MbcryptError::InvalidSaltLength(salt.len()));
    }
    let digest = prefixed_digest(lane, salt);
    let mut out = [0u8; SALT_SIZE];
    out.copy_from_slice(&digest[..SALT_SIZE]);
    Ok(out)
}

// =============================================================================
// LANE WORK
// =============================================================================

/// bcrypt one lane: hash the UTF-8 bytes of `lane_hex_password` and strip
/// the 29-character `$2a$NN$<salt>` prefix, leaving 31 characters.
///
/// This is all an execution unit needs; the plaintext password never
/// reaches it.
///
/// # Errors
/// Protocol bounds (cost 4..=32, 64-char password) are checked first, then
/// raw bcrypt's own bounds (cost 4..=31).
pub fn bcrypt_lane(
    lane_hex_password: &str,
    lane_salt: &[u8],
    cost: u32,
    progress: Option<&mut dyn FnMut(f64)>,
) -> Result<String> {
    check_params(&[1], lane_salt, cost)?;
    if lane_hex_password.len() != LANE_PASSWORD_LEN {
        return Err(MbcryptError::InvalidLanePassword);
    }

    let canonical = bcrypt(lane_hex_password.as_bytes(), lane_salt, cost, progress)?;
    if canonical.len() != BCRYPT_STRING_LEN {
        return Err(MbcryptError::Protocol(format!(
            "bcrypt returned {} characters",
            canonical.len()
        )));
    }
    Ok(canonical[BCRYPT_PREFIX_LEN..].to_owned())
}

/// Derive lane `lane`'s inputs and run it.
///
/// # Errors
/// Protocol validation errors, then those of [`bcrypt_lane`].
pub fn hash_lane(lane: usize, password: &[u8], salt: &[u8], cost: u32) -> Result<String> {
    check_params(password, salt, cost)?;
    let job = LaneJob::derive(lane, password, salt, cost, 0)?;
    job.run(None)
}

// =============================================================================
// COMBINE
// =============================================================================

/// SHA-256 over the lane results concatenated in the order given.
///
/// Callers must pass results sorted by lane index; reordering changes the
/// digest.
///
/// # Errors
/// [`MbcryptError::EmptyInput`] for no results,
/// [`MbcryptError::InvalidLaneResult`] for a result that is not 31 characters.
pub fn combine_lane_results<S: AsRef<str>>(results: &[S]) -> Result<Digest> {
    if results.is_empty() {
        return Err(MbcryptError::EmptyInput);
    }

    let mut h = Sha256::new();
    for result in results {
        let result = result.as_ref();
        if result.len() != LANE_RESULT_LEN {
            return Err(MbcryptError::InvalidLaneResult(result.len()));
        }
        h.update(result.as_bytes())?;
    }

    let digest = h.finish();
    h.clean();
    Ok(digest)
}

// =============================================================================
// REFERENCE EVALUATION
// =============================================================================

/// Full mbcrypt digest with every lane computed on the calling thread.
///
/// # Errors
/// Validation errors for the parameters or a lane count outside 1..=64.
pub fn hash_with_single_thread(
    lanes: usize,
    password: &[u8],
    salt: &[u8],
    cost: u32,
) -> Result<Digest> {
    check_params(password, salt, cost)?;
    check_lane_count(lanes)?;

    let results = (0..lanes)
        .map(|lane| hash_lane(lane, password, salt, cost))
        .collect::<Result<Vec<_>>>()?;
    combine_lane_results(&results)
}

/// Full mbcrypt digest with lanes spread over the rayon pool.
///
/// Bit-identical to [`hash_with_single_thread`]. Without the `multithread`
/// feature the lanes run serially.
///
/// # Errors
/// As [`hash_with_single_thread`].
pub fn hash_parallel(lanes: usize, password: &[u8], salt: &[u8], cost: u32) -> Result<Digest> {
    check_params(password, salt, cost)?;
    check_lane_count(lanes)?;

    let jobs = LaneJob::derive_all(lanes, password, salt, cost, 0)?;
    let results = jobs.as_slice().process_lanes(|job| job.run(None))?;
    combine_lane_results(&results)
}

/// Helper for feature-agnostic lane processing
trait LaneProcessor {
    fn process_lanes<F>(self, f: F) -> Result<Vec<String>>
    where
        F: Fn(&LaneJob) -> Result<String> + Sync + Send;
}

impl LaneProcessor for &[LaneJob] {
    fn process_lanes<F>(self, f: F) -> Result<Vec<String>>
    where
        F: Fn(&LaneJob) -> Result<String> + Sync + Send,
    {
        #[cfg(feature = "multithread")]
        {
            use rayon::prelude::*;
            self.par_iter().map(f).collect()
        }
        #[cfg(not(feature = "multithread"))]
        {
            self.iter().map(f).collect()
        }
    }
}

// =============================================================================
// LANE JOB
// =============================================================================

/// Everything one unit needs to compute one lane of one batch.
///
/// Built fresh for every request and consumed by exactly one unit.
#[derive(Clone)]
pub struct LaneJob {
    /// Position in the combine order.
    pub lane_index: usize,
    /// 64 lowercase hex characters; wiped on drop.
    pub lane_hex_password: Zeroizing<String>,
    /// Derived 16-byte lane salt.
    pub lane_salt: [u8; SALT_SIZE],
    /// bcrypt cost.
    pub cost: u32,
    /// Batch the job belongs to.
    pub generation: u64,
}

impl LaneJob {
    /// Derive the job for `lane`.
    ///
    /// # Errors
    /// Empty password or a salt that is not 16 bytes.
    pub fn derive(
        lane: usize,
        password: &[u8],
        salt: &[u8],
        cost: u32,
        generation: u64,
    ) -> Result<Self> {
        Ok(Self {
            lane_index: lane,
            lane_hex_password: lane_password(lane, password)?,
            lane_salt: lane_salt(lane, salt)?,
            cost,
            generation,
        })
    }

    /// Derive jobs for lanes `0..lanes`.
    ///
    /// # Errors
    /// As [`derive`](Self::derive).
    pub fn derive_all(
        lanes: usize,
        password: &[u8],
        salt: &[u8],
        cost: u32,
        generation: u64,
    ) -> Result<Vec<Self>> {
        (0..lanes)
            .map(|lane| Self::derive(lane, password, salt, cost, generation))
            .collect()
    }

    /// Run this lane.
    ///
    /// # Errors
    /// As [`bcrypt_lane`].
    pub fn run(&self, progress: Option<&mut dyn FnMut(f64)>) -> Result<String> {
        bcrypt_lane(&self.lane_hex_password, &self.lane_salt, self.cost, progress)
    }
}

impl fmt::Debug for LaneJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LaneJob")
            .field("lane_index", &self.lane_index)
            .field("lane_hex_password", &"<redacted>")
            .field("lane_salt", &hex::encode(self.lane_salt))
            .field("cost", &self.cost)
            .field("generation", &self.generation)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
