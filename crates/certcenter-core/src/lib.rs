//! Certcenter Core: domain models, error taxonomy, and the role
//! hierarchy shared by the authorization and certificate crates.

pub mod api;
pub mod authz;
pub mod error;
pub mod models;
pub mod repository;

pub use authz::{AuthorizationContext, PermissionLevel};
pub use error::{CertCenterError, CertCenterResult, Failure};
