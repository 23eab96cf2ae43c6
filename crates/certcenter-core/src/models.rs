//! Domain models for certcenter.
//!
//! These are the core types shared across all crates.

pub mod certificate;
pub mod principal;
pub mod role;
