//! Pool Coordinator Integration Tests
//!
//! Real thread units: self-test digests, reuse across batches, progress,
//! and failure handling through custom units.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crossbeam_channel::Sender;
use mbcrypt::{
    ExecutionUnit, MbcryptError, PoolConfig, PoolCoordinator, PoolState, Result, UnitCommand,
    UnitReply, SELFTEST_SALT,
};
use std::sync::{Arc, Mutex};

#[test]
fn test_selftest_for_small_pools() {
    for lanes in 1..=4 {
        let mut pool = PoolCoordinator::spawn(&PoolConfig::new(lanes)).unwrap();
        pool.selftest().unwrap();
        assert_eq!(pool.state(), PoolState::Idle);
    }
}

#[test]
fn test_selftest_unknown_lane_count_passes() {
    let mut pool = PoolCoordinator::spawn(&PoolConfig::new(9)).unwrap();
    pool.selftest().unwrap();
}

#[test]
fn test_pool_matches_serial_reference_and_is_reusable() {
    let mut pool =
        PoolCoordinator::spawn(&PoolConfig::new(3).with_thread_name("pool-test")).unwrap();

    for password in [&b"first"[..], b"second", b"third"] {
        let pooled = pool.hash(password, &SELFTEST_SALT, 4).unwrap();
        let serial = mbcrypt::hash_with_single_thread(3, password, &SELFTEST_SALT, 4).unwrap();
        assert_eq!(pooled, serial);
    }
    assert_eq!(pool.generation(), 3);
}

#[test]
fn test_progress_is_monotonic_and_ends_at_one() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut pool = PoolCoordinator::spawn(&PoolConfig::new(2)).unwrap();
    pool.set_progress_callback(move |p| sink.lock().unwrap().push(p));
    pool.hash(b"progress", &SELFTEST_SALT, 11).unwrap();

    let seen = seen.lock().unwrap();
    assert!(!seen.is_empty());
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(seen.last(), Some(&1.0));
    assert!(seen[..seen.len() - 1].iter().all(|&p| p < 1.0));
}

#[test]
fn test_cost_32_is_a_unit_fault() {
    // The protocol accepts 32; raw bcrypt inside the unit does not
    let mut pool = PoolCoordinator::spawn(&PoolConfig::new(2)).unwrap();
    let err = pool.hash(b"pw", &SELFTEST_SALT, 32).unwrap_err();
    assert!(matches!(err, MbcryptError::UnitFault { .. }));
    assert_eq!(pool.state(), PoolState::Failed);
}

#[test]
fn test_spawn_rejects_bad_pool_sizes() {
    assert_eq!(
        PoolCoordinator::spawn(&PoolConfig::new(0)).err(),
        Some(MbcryptError::InvalidLaneCount(0))
    );
    assert_eq!(
        PoolCoordinator::spawn(&PoolConfig::new(32)).err(),
        Some(MbcryptError::InvalidLaneCount(32))
    );
}

#[test]
fn test_shutdown_is_terminal() {
    let mut pool = PoolCoordinator::spawn(&PoolConfig::new(2)).unwrap();
    pool.shutdown();
    pool.shutdown();
    assert_eq!(
        pool.hash(b"pw", &SELFTEST_SALT, 4).err(),
        Some(MbcryptError::PoolShutdown)
    );
}

// =============================================================================
// CUSTOM UNITS
// =============================================================================

/// Answers every start command with a reply from an earlier generation.
struct StaleUnit {
    replies: Sender<UnitReply>,
}

impl ExecutionUnit for StaleUnit {
    fn post(&self, command: UnitCommand) -> Result<()> {
        if let UnitCommand::Start(start) = command {
            let _ = self.replies.send(UnitReply::Done {
                lane: start.lane_index,
                hash: "x".repeat(31),
                generation: start.generation - 1,
            });
        }
        Ok(())
    }
}

#[test]
fn test_stale_reply_fails_wait() {
    let (tx, rx) = crossbeam_channel::unbounded();
    let units = vec![StaleUnit { replies: tx.clone() }, StaleUnit { replies: tx }];
    let mut pool = PoolCoordinator::with_units(units, rx).unwrap();

    let err = pool.hash(b"pw", &SELFTEST_SALT, 5).unwrap_err();
    assert_eq!(
        err,
        MbcryptError::StaleGeneration {
            received: 0,
            expected: 1
        }
    );
    assert_eq!(pool.state(), PoolState::Failed);
}

/// Drops every command without ever replying.
struct SilentUnit;

impl ExecutionUnit for SilentUnit {
    fn post(&self, _command: UnitCommand) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_disconnected_units_fail_wait() {
    let (tx, rx) = crossbeam_channel::unbounded::<UnitReply>();
    drop(tx);
    let mut pool = PoolCoordinator::with_units(vec![SilentUnit], rx).unwrap();

    let err = pool.hash(b"pw", &SELFTEST_SALT, 5).unwrap_err();
    assert!(matches!(err, MbcryptError::Protocol(_)));
    assert_eq!(pool.state(), PoolState::Failed);
}
