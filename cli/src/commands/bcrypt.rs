//! Bcrypt Command
//!
//! Single canonical bcrypt string.

use super::{parse_salt, read_password};
use anyhow::Result;

/// Hash the password on stdin and print the 60-character canonical string.
pub fn bcrypt_mode(salt_hex: &str, cost: u32, variant: &str) -> Result<()> {
    let salt = parse_salt(salt_hex)?;
    let password = read_password()?;

    let canonical = mbcrypt::bcrypt_with_variant(&password, &salt, cost, None, variant)?;
    println!("{canonical}");
    Ok(())
}
