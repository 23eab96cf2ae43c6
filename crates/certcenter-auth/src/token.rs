//! RS256 bearer token issuance and verification.
//!
//! The payload carries the serialized principal (a JSON string) under the
//! `user` claim, so a verified token reconstructs the same [`Principal`]
//! the interactive session would hold.

use certcenter_core::authz::{AuthorizationContext, PermissionLevel};
use certcenter_core::models::principal::Principal;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// Claims embedded in every bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// JSON-serialized [`Principal`].
    pub user: String,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Expiration (Unix timestamp).
    pub exp: i64,
    /// Unique token ID (UUID string).
    pub jti: String,
}

/// Issue a signed RS256 token for `principal`, valid from now.
pub fn issue_token(principal: &Principal, config: &AuthConfig) -> Result<String, AuthError> {
    issue_token_at(principal, Utc::now().timestamp(), config)
}

/// Issue a token as if it had been minted at `issued_at`.
pub fn issue_token_at(
    principal: &Principal,
    issued_at: i64,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    let user = serde_json::to_string(principal)
        .map_err(|e| AuthError::Crypto(format!("principal encode: {e}")))?;
    let claims = TokenClaims {
        user,
        iat: issued_at,
        exp: issued_at + config.token_lifetime_secs as i64,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_rsa_pem(config.jwt_private_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad private key: {e}")))?;

    jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Verify the signature, then the expiry, and return the claims.
///
/// A bad signature is reported as [`AuthError::TokenInvalid`] even when the
/// token has also expired; a correctly signed but expired token is
/// [`AuthError::TokenExpired`].
pub fn decode_token(token: &str, config: &AuthConfig) -> Result<TokenClaims, AuthError> {
    let key = DecodingKey::from_rsa_pem(config.jwt_public_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad public key: {e}")))?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    jsonwebtoken::decode::<TokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => {
                tracing::debug!(error = %e, "Bearer token rejected");
                AuthError::TokenInvalid(e.to_string())
            }
        })
}

/// Verify a token and rebuild the caller's authorization context from it.
pub fn verify_token(token: &str, config: &AuthConfig) -> Result<AuthorizationContext, AuthError> {
    let claims = decode_token(token, config)?;
    let principal: Principal = serde_json::from_str(&claims.user)
        .map_err(|e| AuthError::TokenInvalid(format!("embedded principal: {e}")))?;
    Ok(AuthorizationContext::from_token(principal))
}

/// Token-path counterpart of the session permission check.
pub fn token_has_permission(
    token: &str,
    level: PermissionLevel,
    config: &AuthConfig,
) -> Result<bool, AuthError> {
    verify_token(token, config).map(|ctx| ctx.has_permission(level))
}
