//! Verify Command
//!
//! Check a password against a canonical bcrypt string (like `sha256sum -c`).

use super::read_password;
use anyhow::{Context, Result};

/// Print `OK` or `FAILED`; returns whether the password matched.
pub fn verify_mode(canonical: &str) -> Result<bool> {
    let password = read_password()?;
    let matched =
        mbcrypt::bcrypt::verify(&password, canonical).context("Invalid canonical string")?;

    if matched {
        println!("OK");
    } else {
        println!("FAILED");
    }
    Ok(matched)
}
