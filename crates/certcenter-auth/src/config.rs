//! Authentication configuration.

/// Configuration for the authentication service.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// PEM-encoded RSA private key for token signing.
    pub jwt_private_key_pem: String,
    /// PEM-encoded RSA public key for token verification.
    pub jwt_public_key_pem: String,
    /// Bearer token lifetime in seconds (default: 300 = 5 minutes).
    pub token_lifetime_secs: u64,
    /// Optional pepper prepended to passwords before Argon2id verification.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            token_lifetime_secs: 300,
            pepper: None,
        }
    }
}
