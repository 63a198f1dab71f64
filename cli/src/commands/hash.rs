//! Hash Command
//!
//! mbcrypt digest through rayon, a single thread, or a unit pool with progress.

use super::{parse_salt, read_password};
use anyhow::{Context, Result};
use clap::Args;
use mbcrypt::{PoolConfig, PoolCoordinator};
use std::io::Write;

/// Arguments of `mbcrypt hash`.
#[derive(Args)]
pub struct HashArgs {
    /// 16-byte salt as 32 hex characters
    #[arg(long)]
    salt: String,

    /// Log2 of the key-expansion rounds per lane
    #[arg(long, default_value_t = 11)]
    cost: u32,

    /// Number of independent bcrypt lanes
    #[arg(long, default_value_t = 4)]
    lanes: usize,

    /// Evaluate lanes one after another on this thread
    #[arg(long, conflicts_with = "progress")]
    serial: bool,

    /// Run on a unit pool and report progress on stderr
    #[arg(long)]
    progress: bool,
}

/// Hash the password on stdin and print the lowercase hex digest.
pub fn hash_mode(args: &HashArgs) -> Result<()> {
    let salt = parse_salt(&args.salt)?;
    let password = read_password()?;

    let digest = if args.serial {
        mbcrypt::hash_with_single_thread(args.lanes, &password, &salt, args.cost)?
    } else if args.progress {
        let mut pool = PoolCoordinator::spawn(&PoolConfig::new(args.lanes))
            .context("Failed to start unit pool")?;
        pool.set_progress_callback(|p| {
            eprint!("\rprogress: {:5.1}%", p * 100.0);
            let _ = std::io::stderr().flush();
        });
        let digest = pool.hash(&password, &salt, args.cost);
        eprintln!();
        pool.shutdown();
        digest?
    } else {
        mbcrypt::hash(args.lanes, &password, &salt, args.cost)?
    };

    println!("{}", hex::encode(digest));
    Ok(())
}
