//! Shared types used across the mbcrypt library.

use thiserror::Error;

// =============================================================================
// SIZES & BOUNDS
// =============================================================================

/// bcrypt salt length in bytes.
pub const SALT_SIZE: usize = 16;

/// Raw bcrypt output length (the 24-byte ciphertext truncated by one byte).
pub const RAW_HASH_SIZE: usize = 23;

/// Length of the final mbcrypt digest.
pub const DIGEST_SIZE: usize = 32;

/// Length of a canonical `$2a$NN$...` string.
pub const BCRYPT_STRING_LEN: usize = 60;

/// Length of the `$2a$NN$<salt>` prefix stripped from every lane result.
pub const BCRYPT_PREFIX_LEN: usize = 29;

/// Length of a lane result (`BCRYPT_STRING_LEN - BCRYPT_PREFIX_LEN`).
pub const LANE_RESULT_LEN: usize = BCRYPT_STRING_LEN - BCRYPT_PREFIX_LEN;

/// Length of a lane password: lowercase hex of a SHA-256 digest.
pub const LANE_PASSWORD_LEN: usize = 2 * DIGEST_SIZE;

/// Smallest cost accepted anywhere.
pub const MIN_COST: u32 = 4;

/// Largest cost raw bcrypt accepts.
pub const MAX_BCRYPT_COST: u32 = 31;

/// Largest cost the lane protocol accepts. Raw bcrypt still rejects 32.
pub const MAX_PROTOCOL_COST: u32 = 32;

/// Largest lane count for serial / rayon evaluation.
pub const MAX_LANES: usize = 64;

/// Largest unit count for a [`PoolCoordinator`](crate::PoolCoordinator).
pub const MAX_POOL_UNITS: usize = 31;

/// Final mbcrypt digest.
pub type Digest = [u8; DIGEST_SIZE];

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, MbcryptError>;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Coarse classification of [`MbcryptError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, detected before any work starts.
    Validation,
    /// Malformed or stale reply; the coordinator is now unusable.
    Protocol,
    /// An execution unit reported an internal error.
    UnitFault,
    /// A byte source ran dry.
    Exhaustion,
    /// The object is in the wrong state for the call (busy, failed, shut down).
    State,
}

/// Every error the library reports.
///
/// Messages never include password material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MbcryptError {
    /// Password was empty.
    #[error("password must not be empty")]
    EmptyPassword,

    /// Salt had the wrong length (carries the received length).
    #[error("salt must be exactly 16 bytes, got {0}")]
    InvalidSaltLength(usize),

    /// Cost outside the accepted range (carries the received cost).
    #[error("cost {0} is out of range")]
    InvalidCost(u32),

    /// Lane count outside the accepted range (carries the received count).
    #[error("lane count {0} is out of range")]
    InvalidLaneCount(usize),

    /// Lane index outside `0..lanes`.
    #[error("lane index {0} is out of range")]
    InvalidLaneIndex(usize),

    /// Lane password was not 64 hex characters.
    #[error("lane password must be 64 hex characters")]
    InvalidLanePassword,

    /// bcrypt variant id was not two characters.
    #[error("bcrypt variant must be two characters, got {0:?}")]
    InvalidVariant(String),

    /// Text could not be parsed as bcrypt-base64 or as a canonical bcrypt string.
    #[error("malformed bcrypt encoding: {0}")]
    MalformedEncoding(&'static str),

    /// Nothing to encode or combine.
    #[error("input must not be empty")]
    EmptyInput,

    /// Sampling bound outside `1..=256`.
    #[error("n must be between 1 and 256, got {0}")]
    InvalidRange(usize),

    /// Too many elements for a 16-bit shuffle key space.
    #[error("cannot shuffle {0} elements (limit is 32768)")]
    SequenceTooLong(usize),

    /// SHA-256 `update` after `finish` without `reset`.
    #[error("hash already finished; reset before updating")]
    HashFinished,

    /// A lane result did not have the expected 31 characters.
    #[error("lane result has length {0}, expected 31")]
    InvalidLaneResult(usize),

    /// A reply did not belong to the batch in flight.
    #[error("stale reply: generation {received}, expected {expected}")]
    StaleGeneration {
        /// Generation carried by the reply.
        received: u64,
        /// Generation of the batch in flight.
        expected: u64,
    },

    /// A reply violated the unit protocol in some other way.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// An execution unit failed.
    #[error("execution unit {lane} failed: {message}")]
    UnitFault {
        /// Index of the failing unit.
        lane: usize,
        /// Description reported by the unit.
        message: String,
    },

    /// A byte source has no bytes left.
    #[error("byte source exhausted")]
    Exhausted,

    /// A batch is already in flight.
    #[error("coordinator is busy with generation {0}")]
    Busy(u64),

    /// A previous batch failed; the coordinator must be rebuilt.
    #[error("coordinator failed earlier and cannot be reused")]
    PoolFailed,

    /// `shutdown` was called.
    #[error("coordinator has been shut down")]
    PoolShutdown,

    /// A unit thread could not be started.
    #[error("failed to spawn execution unit: {0}")]
    Spawn(String),

    /// The pool self-test produced an unexpected digest.
    #[error("self-test digest mismatch for {0} lanes")]
    SelfTestMismatch(usize),
}

impl MbcryptError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPassword
            | Self::InvalidSaltLength(_)
            | Self::InvalidCost(_)
            | Self::InvalidLaneCount(_)
            | Self::InvalidLaneIndex(_)
            | Self::InvalidLanePassword
            | Self::InvalidVariant(_)
            | Self::MalformedEncoding(_)
            | Self::EmptyInput
            | Self::InvalidRange(_)
            | Self::SequenceTooLong(_) => ErrorKind::Validation,
            Self::InvalidLaneResult(_)
            | Self::StaleGeneration { .. }
            | Self::Protocol(_)
            | Self::SelfTestMismatch(_) => ErrorKind::Protocol,
            Self::UnitFault { .. } | Self::Spawn(_) => ErrorKind::UnitFault,
            Self::Exhausted => ErrorKind::Exhaustion,
            Self::HashFinished | Self::Busy(_) | Self::PoolFailed | Self::PoolShutdown => {
                ErrorKind::State
            }
        }
    }
}
