//! Certcenter PKI: CA ledger reader, toolchain invocation, and the
//! certificate lifecycle manager (create, revoke, inspect, export) that
//! serializes every CA operation behind one lock.

pub mod bundle;
pub mod command;
pub mod config;
pub mod error;
pub mod layout;
pub mod ledger;
pub mod lifecycle;
pub mod lock;
pub mod provisioning;
pub mod registry;
pub mod runner;

pub use config::CaConfig;
pub use error::PkiError;
pub use lifecycle::{CertManager, CertificateDetail, ExportBundle, RootInfo};
pub use lock::CaLock;
pub use provisioning::{ProvisioningConfig, ProvisioningStatus};
pub use registry::Registry;
pub use runner::{CommandLine, CommandOutput, CommandRunner, ProcessRunner};
