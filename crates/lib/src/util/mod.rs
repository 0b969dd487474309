//! Shared utilities.
//!
//! Content hashing for collision checks and the filesystem helpers used by
//! plugins, staging and clean.

pub mod fs;
pub mod hash;
