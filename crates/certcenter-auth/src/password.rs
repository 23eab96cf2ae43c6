//! Password verification.
//!
//! Accepts Argon2id PHC strings and, for accounts created by the older
//! user store, bare SHA-256 hex digests.

use argon2::password_hash::{self, PasswordHash};
use argon2::{Argon2, PasswordVerifier};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// Verify a plaintext password against a stored hash.
///
/// If `pepper` is provided it is prepended to the password before Argon2id
/// verification. Legacy SHA-256 digests were produced without a pepper.
///
/// Returns `Ok(true)` on match, `Ok(false)` on mismatch, or
/// `Err(AuthError::Crypto)` if the stored hash is malformed.
pub fn verify_password(
    password: &str,
    hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    if is_legacy_digest(hash) {
        Ok(legacy_digest(password).eq_ignore_ascii_case(hash))
    } else {
        let input = match pepper {
            Some(p) => format!("{p}{password}"),
            None => password.to_owned(),
        };
        verify_phc(input.as_bytes(), hash)
    }
}

fn verify_phc(input: &[u8], phc: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(phc)
        .map_err(|e| AuthError::Crypto(format!("invalid hash format: {e}")))?;
    match Argon2::default().verify_password(input, &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("verify error: {e}"))),
    }
}

fn is_legacy_digest(hash: &str) -> bool {
    hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit())
}

/// SHA-256 of the trimmed password, hex-encoded.
pub fn legacy_digest(password: &str) -> String {
    hex::encode(Sha256::digest(password.trim().as_bytes()))
}
