//! Authentication service: credential checks and token issuance.

use certcenter_core::authz::{AuthorizationContext, PermissionLevel};
use certcenter_core::error::CertCenterResult;
use certcenter_core::models::principal::Principal;
use certcenter_core::repository::PrincipalRepository;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token;

/// Successful token login.
#[derive(Debug)]
pub struct LoginOutput {
    /// Signed RS256 bearer token.
    pub token: String,
    /// Token lifetime in seconds.
    pub expires_in: u64,
}

/// Authentication service.
///
/// Generic over the principal store so that this crate has no
/// dependency on how operator accounts are persisted.
pub struct AuthService<P: PrincipalRepository> {
    principals: P,
    config: AuthConfig,
}

impl<P: PrincipalRepository> AuthService<P> {
    pub fn new(principals: P, config: AuthConfig) -> Self {
        Self { principals, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Check a login/password pair and return the principal. This is what
    /// the interactive path stores in its session.
    pub async fn authenticate(&self, login: &str, password: &str) -> CertCenterResult<Principal> {
        if login.trim().is_empty() || password.trim().is_empty() {
            return Err(AuthError::InvalidCredentials.into());
        }

        let principal = self
            .principals
            .get_by_login(login.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let valid = password::verify_password(
            password,
            &principal.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            tracing::info!(login = %principal.login, "Rejected login attempt");
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(principal)
    }

    /// Authenticate and mint a bearer token embedding the principal.
    pub async fn login(&self, login: &str, password: &str) -> CertCenterResult<LoginOutput> {
        let principal = self.authenticate(login, password).await?;
        let token = token::issue_token(&principal, &self.config)?;
        tracing::info!(login = %principal.login, "Bearer token issued");
        Ok(LoginOutput {
            token,
            expires_in: self.config.token_lifetime_secs,
        })
    }

    /// Verify a bearer token and rebuild the caller's context.
    pub fn authorize_token(&self, token: &str) -> CertCenterResult<AuthorizationContext> {
        Ok(token::verify_token(token, &self.config)?)
    }

    /// Verify a bearer token and require `level`. Signature and expiry
    /// failures surface as authentication errors, a weak role as
    /// `AuthorizationDenied`.
    pub fn require_token(
        &self,
        token: &str,
        level: PermissionLevel,
    ) -> CertCenterResult<AuthorizationContext> {
        let ctx = self.authorize_token(token)?;
        if !ctx.has_permission(level) {
            return Err(AuthError::PermissionDenied.into());
        }
        Ok(ctx)
    }
}
