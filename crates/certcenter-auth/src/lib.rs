//! Certcenter Auth: password verification, RS256 bearer token
//! issuance/validation, and the token path of the authorization model.

pub mod config;
pub mod error;
pub mod password;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use service::{AuthService, LoginOutput};
pub use token::TokenClaims;
