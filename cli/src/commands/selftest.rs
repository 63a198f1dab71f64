//! Selftest Command
//!
//! Spawn a unit pool and hash the fixed self-test input.

use anyhow::{Context, Result};
use mbcrypt::{PoolConfig, PoolCoordinator, SELFTEST_DIGESTS};

/// Run the pool self-test for `lanes` units.
pub fn selftest_mode(lanes: usize) -> Result<()> {
    let mut pool = PoolCoordinator::spawn(&PoolConfig::new(lanes))
        .with_context(|| format!("Failed to start a pool of {lanes} units"))?;
    pool.selftest()
        .with_context(|| format!("Self-test failed for {lanes} lanes"))?;
    pool.shutdown();

    if lanes <= SELFTEST_DIGESTS.len() {
        println!("{lanes} lanes: OK");
    } else {
        println!("{lanes} lanes: unknown (no reference digest)");
    }
    Ok(())
}
