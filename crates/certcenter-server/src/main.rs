//! certcenter: application entry point.
//!
//! Loads configuration, wires the authentication service and the
//! certificate lifecycle manager, and reports whether the CA toolchain is
//! ready. Request routing lives in the embedding front end.

mod config;
mod principals;

use std::process::ExitCode;

use certcenter_auth::service::AuthService;
use certcenter_auth::token;
use certcenter_core::authz::AuthorizationContext;
use certcenter_core::models::principal::Principal;
use certcenter_core::models::role::Role;
use certcenter_pki::lifecycle::CertManager;
use certcenter_pki::provisioning::ProvisioningStatus;
use certcenter_pki::runner::ProcessRunner;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;
use crate::principals::FilePrincipals;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).json().init();

    tracing::info!("Starting certcenter...");

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let auth_config = match config.auth_config() {
        Ok(auth) => auth,
        Err(e) => {
            tracing::error!(error = %e, "Cannot load token signing keys");
            return ExitCode::FAILURE;
        }
    };

    // Sign and verify a throwaway token so a mismatched key pair fails now
    // rather than on the first login.
    let probe = Principal {
        login: "startup-probe".into(),
        password_hash: String::new(),
        email: None,
        role: Role::User,
    };
    if let Err(e) = token::issue_token(&probe, &auth_config)
        .and_then(|t| token::verify_token(&t, &auth_config))
    {
        tracing::error!(error = %e, "Token key pair check failed");
        return ExitCode::FAILURE;
    }

    let principals = match FilePrincipals::load(&config.principals_path) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "Cannot load principals");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(count = principals.len(), "Principals loaded");
    let _auth = AuthService::new(principals, auth_config);

    let manager = CertManager::new(config.ca.clone(), ProcessRunner);
    match manager.provisioning_status() {
        ProvisioningStatus::Provisioned => {
            tracing::info!(utils = %config.ca.utils_dir.display(), "CA toolchain provisioned");
            let ctx = AuthorizationContext::from_session(Some(probe));
            match manager.list_server_certificates(&ctx).await {
                Ok(records) => tracing::info!(count = records.len(), "Server certificates on record"),
                Err(e) => tracing::warn!(error = %e, "CA registry check failed"),
            }
        }
        ProvisioningStatus::NotProvisioned => {
            tracing::warn!(
                utils = %config.ca.utils_dir.display(),
                "CA toolchain present but not provisioned; certificate operations will fail"
            );
        }
        ProvisioningStatus::MissingUtilities(missing) => {
            tracing::error!(
                utils = %config.ca.utils_dir.display(),
                missing = ?missing,
                "CA toolchain scripts missing"
            );
            return ExitCode::FAILURE;
        }
    }

    tracing::info!("certcenter ready.");
    ExitCode::SUCCESS
}
