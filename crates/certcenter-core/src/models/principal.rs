//! Principal domain model.

use serde::{Deserialize, Serialize};

use super::role::Role;

/// An operator account as held by the external user store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub login: String,
    /// Argon2id PHC string or legacy SHA-256 hex digest.
    /// Never serialized, so it does not travel inside bearer tokens.
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
}
