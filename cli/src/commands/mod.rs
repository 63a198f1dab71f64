//! CLI Commands
//!
//! All mbcrypt CLI commands organized as separate modules, plus the stdin and
//! salt helpers they share.

mod bcrypt;
mod hash;
mod selftest;
mod verify;

pub use bcrypt::bcrypt_mode;
pub use hash::{hash_mode, HashArgs};
pub use selftest::selftest_mode;
pub use verify::verify_mode;

use anyhow::{bail, Context, Result};
use std::io::BufRead;
use zeroize::Zeroizing;

/// Read one line from stdin, without its line terminator.
fn read_password() -> Result<Zeroizing<Vec<u8>>> {
    let mut line = Zeroizing::new(Vec::new());
    std::io::stdin()
        .lock()
        .read_until(b'\n', &mut line)
        .context("Failed to read password from stdin")?;

    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    Ok(line)
}

/// Decode a 32-character hex salt.
fn parse_salt(salt_hex: &str) -> Result<[u8; mbcrypt::SALT_SIZE]> {
    let bytes = hex::decode(salt_hex).with_context(|| format!("Salt is not hex: {salt_hex}"))?;
    let Ok(salt) = <[u8; mbcrypt::SALT_SIZE]>::try_from(bytes.as_slice()) else {
        bail!(
            "Salt must be {} bytes, got {}",
            mbcrypt::SALT_SIZE,
            bytes.len()
        );
    };
    Ok(salt)
}
