//! Repository trait definitions for data access abstraction.
//!
//! Principals live in an external store; this crate only needs to look
//! them up by login. Operations are async.

use crate::error::CertCenterResult;
use crate::models::principal::Principal;

pub trait PrincipalRepository: Send + Sync {
    /// Look up a principal by login. `Ok(None)` when no such login exists.
    fn get_by_login(
        &self,
        login: &str,
    ) -> impl Future<Output = CertCenterResult<Option<Principal>>> + Send;
}
