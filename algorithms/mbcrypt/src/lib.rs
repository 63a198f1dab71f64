//! # mbcrypt
//!
//! Multi-lane bcrypt: one password is split into N independent bcrypt lanes
//! whose results are folded into a 32-byte SHA-256 digest. An attacker pays
//! for N bcrypt runs per guess; with N cores the legitimate caller pays for
//! about one.

//! # Usage
//! ```rust
//! use mbcrypt::{PoolConfig, PoolCoordinator};
//!
//! let salt = [0x42u8; 16];
//!
//! // 1. Reference evaluation (rayon)
//! let digest = mbcrypt::hash(2, b"hunter2", &salt, 4)?;
//!
//! // 2. Long-lived unit pool
//! let mut pool = PoolCoordinator::spawn(&PoolConfig::new(2))?;
//! assert_eq!(pool.hash(b"hunter2", &salt, 4)?, digest);
//! pool.shutdown();
//!
//! // 3. Plain bcrypt
//! let canonical = mbcrypt::bcrypt(b"hunter2", &salt, 4, None)?;
//! assert!(mbcrypt::bcrypt::verify(b"hunter2", &canonical)?);
//! # Ok::<(), mbcrypt::MbcryptError>(())
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod bcrypt;
pub mod drbg;
mod engine;
// Re-export internal kernels for benchmarking/testing, but hide from docs
#[doc(hidden)]
pub mod kernels;
mod oneshot;
pub mod sampling;
pub mod sha256;
mod types;

// =============================================================================
// EXPORTS
// =============================================================================

pub use bcrypt::{bcrypt, bcrypt_with_variant, parse_bcrypt, raw_bcrypt, ParsedBcrypt};
#[cfg(feature = "digest-trait")]
pub use digest;
pub use drbg::{ByteSource, ByteSourceReader, FixedByteSource, HmacCounterByteSource};
pub use engine::dispatcher::{
    SELFTEST_COST, SELFTEST_DIGESTS, SELFTEST_PASSWORD, SELFTEST_SALT,
};
pub use engine::{
    bcrypt_lane, combine_lane_results, hash_lane, hash_parallel, hash_with_single_thread,
    lane_password, lane_salt, ExecutionUnit, LaneJob, PendingDigest, PoolConfig,
    PoolCoordinator, PoolState, StartCommand, ThreadUnit, UnitCommand, UnitReply,
};
pub use oneshot::{hash, verify_digest};
pub use sampling::{secure_shuffle, unbiased_small_int};
pub use sha256::{hmac_sha256, sha256, HmacSha256, Sha256};
pub use types::{
    Digest, ErrorKind, MbcryptError, Result, BCRYPT_PREFIX_LEN, BCRYPT_STRING_LEN, DIGEST_SIZE,
    LANE_PASSWORD_LEN, LANE_RESULT_LEN, MAX_BCRYPT_COST, MAX_LANES, MAX_POOL_UNITS,
    MAX_PROTOCOL_COST, MIN_COST, RAW_HASH_SIZE, SALT_SIZE,
};
