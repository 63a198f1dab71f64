//! mbcrypt Basic Example
//!
//! Minimal usage: `let digest = mbcrypt::hash(lanes, password, &salt, cost)?;`

#![allow(clippy::pedantic, clippy::nursery)]

use mbcrypt::{PoolConfig, PoolCoordinator};

fn main() -> mbcrypt::Result<()> {
    let password = b"Hello, World!";
    let salt = *b"0123456789abcdef";

    // Zero boilerplate (rayon):
    let digest = mbcrypt::hash(4, password, &salt, 8)?;
    println!("Digest (rayon): {}", hex::encode(digest));

    // Long-lived pool with progress:
    let mut pool = PoolCoordinator::spawn(&PoolConfig::new(4))?;
    pool.set_progress_callback(|p| println!("  {:5.1}%", p * 100.0));
    let pooled = pool.hash(password, &salt, 8)?;
    println!("Digest (pool):  {}", hex::encode(pooled));
    pool.shutdown();

    assert_eq!(digest, pooled);
    Ok(())
}
