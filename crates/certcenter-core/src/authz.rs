//! Role hierarchy and the per-request authorization context.
//!
//! Both credential carriers (an interactive session and a verified bearer
//! token) are reduced to an [`AuthorizationContext`] and then evaluated by
//! the same predicate, so identical roles always get identical answers.

use serde::{Deserialize, Serialize};

use crate::error::{CertCenterError, CertCenterResult};
use crate::models::principal::Principal;
use crate::models::role::Role;

/// Permission level an operation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    User,
    Creator,
    Admin,
}

/// `admin` requires role 2, `creator` roles 1 or 2, `user` any role.
pub fn role_permits(role: Role, level: PermissionLevel) -> bool {
    match level {
        PermissionLevel::Admin => role == Role::Admin,
        PermissionLevel::Creator => matches!(role, Role::Creator | Role::Admin),
        PermissionLevel::User => matches!(role, Role::User | Role::Creator | Role::Admin),
    }
}

/// Where the principal of a context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Session,
    Token,
    Anonymous,
}

/// Identity of the caller for one request. Built per request, never stored.
#[derive(Debug, Clone)]
pub struct AuthorizationContext {
    principal: Option<Principal>,
    source: CredentialSource,
}

impl AuthorizationContext {
    /// Context for the interactive path. `None` means no one is logged in.
    pub fn from_session(principal: Option<Principal>) -> Self {
        match principal {
            Some(p) => Self {
                principal: Some(p),
                source: CredentialSource::Session,
            },
            None => Self::anonymous(),
        }
    }

    /// Context for a principal recovered from a verified bearer token.
    pub fn from_token(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
            source: CredentialSource::Token,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            principal: None,
            source: CredentialSource::Anonymous,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn has_permission(&self, level: PermissionLevel) -> bool {
        self.principal
            .as_ref()
            .is_some_and(|p| role_permits(p.role, level))
    }

    /// Like [`has_permission`](Self::has_permission) but as a `Result`.
    pub fn require(&self, level: PermissionLevel) -> CertCenterResult<&Principal> {
        match &self.principal {
            Some(p) if role_permits(p.role, level) => Ok(p),
            _ => Err(CertCenterError::AuthorizationDenied {
                reason: "no permission".into(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            login: "op".into(),
            password_hash: String::new(),
            email: None,
            role,
        }
    }

    #[test]
    fn role_hierarchy() {
        use PermissionLevel::*;
        let table = [
            (Role::User, [true, false, false]),
            (Role::Creator, [true, true, false]),
            (Role::Admin, [true, true, true]),
        ];
        for (role, expected) in table {
            assert_eq!(role_permits(role, User), expected[0], "{role:?} user");
            assert_eq!(role_permits(role, Creator), expected[1], "{role:?} creator");
            assert_eq!(role_permits(role, Admin), expected[2], "{role:?} admin");
        }
    }

    #[test]
    fn missing_principal_has_no_permission() {
        let ctx = AuthorizationContext::from_session(None);
        assert_eq!(ctx.source(), CredentialSource::Anonymous);
        assert!(!ctx.has_permission(PermissionLevel::User));
        assert!(matches!(
            ctx.require(PermissionLevel::User),
            Err(CertCenterError::AuthorizationDenied { .. })
        ));
    }

    #[test]
    fn session_and_token_contexts_agree() {
        for role in [Role::User, Role::Creator, Role::Admin] {
            let session = AuthorizationContext::from_session(Some(principal(role)));
            let token = AuthorizationContext::from_token(principal(role));
            for level in [
                PermissionLevel::User,
                PermissionLevel::Creator,
                PermissionLevel::Admin,
            ] {
                assert_eq!(session.has_permission(level), token.has_permission(level));
            }
        }
    }
}
