//! Authentication error types.

use certcenter_core::error::CertCenterError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    /// Signature check or payload decoding failed. The detail is for logs only.
    #[error("authorization error")]
    TokenInvalid(String),

    #[error("token expired")]
    TokenExpired,

    #[error("no permission")]
    PermissionDenied,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for CertCenterError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::TokenInvalid(_) | AuthError::TokenExpired => {
                CertCenterError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::PermissionDenied => CertCenterError::AuthorizationDenied {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => CertCenterError::Internal(msg),
        }
    }
}
