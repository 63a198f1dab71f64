//! mbcrypt CLI
//!
//! Multi-lane bcrypt from the command line. Passwords are read from stdin.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{bcrypt_mode, hash_mode, selftest_mode, verify_mode, HashArgs};
use tracing_subscriber::EnvFilter;

// =============================================================================
// CLI DEFINITION
// =============================================================================

#[derive(Parser)]
#[command(name = "mbcrypt")]
#[command(about = "Multi-lane bcrypt password hashing", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive an mbcrypt digest (hex) from the password on stdin
    Hash(HashArgs),

    /// Produce a canonical bcrypt string for the password on stdin
    Bcrypt {
        /// 16-byte salt as 32 hex characters
        #[arg(long)]
        salt: String,

        /// Log2 of the key-expansion rounds
        #[arg(long, default_value_t = 10)]
        cost: u32,

        /// Two-character variant id
        #[arg(long, default_value = "2a")]
        variant: String,
    },

    /// Check the password on stdin against a canonical bcrypt string
    Verify {
        #[arg(value_name = "CANONICAL")]
        canonical: String,
    },

    /// Run the pool self-test against the known digests
    Selftest {
        /// Number of pool units
        #[arg(long, default_value_t = 4)]
        lanes: usize,
    },
}

// =============================================================================
// ENTRY POINT
// =============================================================================

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Commands::Hash(args) => hash_mode(args)?,
        Commands::Bcrypt {
            salt,
            cost,
            variant,
        } => bcrypt_mode(salt, *cost, variant)?,
        Commands::Verify { canonical } => {
            if !verify_mode(canonical)? {
                std::process::exit(1);
            }
        }
        Commands::Selftest { lanes } => selftest_mode(*lanes)?,
    }

    Ok(())
}
