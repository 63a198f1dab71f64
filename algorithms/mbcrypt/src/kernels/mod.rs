//! Kernels
//!
//! Fixed-width building blocks: the SHA-256 compression function, the
//! Blowfish state with bcrypt's key schedules, and their constants.

pub mod blowfish;
pub mod constants;
pub mod sha256;
