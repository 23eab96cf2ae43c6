//! Certificate lifecycle: list, create, revoke, inspect and export.
//!
//! Every public call follows the same shape: permission check, argument
//! validation, CA lock, fresh ledger read, optional toolchain run, fresh
//! re-read. The lock guard lives until the call returns, so it is released
//! on every exit path. Subprocesses get their own working directory; the
//! process-wide current directory is never touched.

use std::path::Path;
use std::sync::Arc;

use certcenter_core::authz::{AuthorizationContext, PermissionLevel};
use certcenter_core::error::CertCenterResult;
use certcenter_core::models::certificate::{CertificateClass, CertificateRecord, ClassFilter};
use serde::Serialize;

use crate::bundle::{self, FileNaming};
use crate::command::{self, IssuedArtifact, Toolchain};
use crate::config::CaConfig;
use crate::error::PkiError;
use crate::layout::{CaLayout, CertificateArtifacts};
use crate::lock::CaLock;
use crate::provisioning::{self, ProvisioningConfig, ProvisioningStatus};
use crate::registry::Registry;
use crate::runner::{CommandLine, CommandOutput, CommandRunner};

/// Inspection and verification output for one certificate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CertificateDetail {
    pub record: CertificateRecord,
    /// Display name, `/<O>/<CN>/`.
    pub name: String,
    /// Raw `openssl x509 -text` output.
    pub inspection: String,
    /// Raw `openssl verify` output, passed through whatever the verdict.
    pub verification: String,
    /// Operator instructions naming the files on the CA host.
    pub guidance: String,
}

/// A zip archive holding a certificate's deliverable files and a readme.
#[derive(Debug, Clone)]
pub struct ExportBundle {
    pub record: CertificateRecord,
    pub file_name: String,
    pub archive: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RootInfo {
    /// `/CN=<organization>/`, taken from the provisioning config.
    pub name: String,
    pub inspection: String,
    pub verification: String,
}

/// Provisioning config and registry resolved for one call.
struct CaState {
    provisioning: ProvisioningConfig,
    registry: Registry,
}

impl CaState {
    fn layout(&self) -> &CaLayout {
        self.registry.layout()
    }
}

pub struct CertManager<R> {
    config: CaConfig,
    toolchain: Toolchain,
    runner: R,
    lock: Arc<CaLock>,
}

impl<R: CommandRunner> CertManager<R> {
    pub fn new(config: CaConfig, runner: R) -> Self {
        let lock = Arc::new(CaLock::new(config.lock_path.clone()));
        Self::with_lock(config, runner, lock)
    }

    /// Share one lock between several managers.
    pub fn with_lock(config: CaConfig, runner: R, lock: Arc<CaLock>) -> Self {
        Self {
            toolchain: Toolchain::new(&config),
            config,
            runner,
            lock,
        }
    }

    pub fn config(&self) -> &CaConfig {
        &self.config
    }

    pub fn provisioning_status(&self) -> ProvisioningStatus {
        provisioning::provisioning_status(&self.config)
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub async fn list_server_certificates(
        &self,
        ctx: &AuthorizationContext,
    ) -> CertCenterResult<Vec<CertificateRecord>> {
        ctx.require(PermissionLevel::User)?;
        let _guard = self.lock.acquire().await?;
        let state = self.open().await?;
        Ok(state.registry.list(ClassFilter::Server).await?)
    }

    /// Client records issued under `server_domain`; all clients when empty.
    pub async fn list_client_certificates(
        &self,
        ctx: &AuthorizationContext,
        server_domain: &str,
    ) -> CertCenterResult<Vec<CertificateRecord>> {
        ctx.require(PermissionLevel::User)?;
        let server_domain = server_domain.trim();
        let _guard = self.lock.acquire().await?;
        let state = self.open().await?;

        let records = state.registry.list(ClassFilter::Client).await?;
        if server_domain.is_empty() {
            return Ok(records);
        }
        Ok(records
            .into_iter()
            .filter(|record| record.common_name() == server_domain)
            .collect())
    }

    /// Distinct common names of server records, in id order.
    pub async fn server_names(&self, ctx: &AuthorizationContext) -> CertCenterResult<Vec<String>> {
        let mut names: Vec<String> = Vec::new();
        for record in self.list_server_certificates(ctx).await? {
            let cn = record.common_name();
            if !cn.is_empty() && !names.iter().any(|n| n == cn) {
                names.push(cn.to_string());
            }
        }
        Ok(names)
    }

    pub async fn certificate(
        &self,
        ctx: &AuthorizationContext,
        id: &str,
    ) -> CertCenterResult<CertificateRecord> {
        ctx.require(PermissionLevel::User)?;
        let id = required("certificate id", id)?;
        let _guard = self.lock.acquire().await?;
        let state = self.open().await?;
        Ok(state.registry.find(id).await?)
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Issue a server certificate for `subjects`; the first subject becomes
    /// the common name.
    pub async fn create_server_certificate(
        &self,
        ctx: &AuthorizationContext,
        days: u32,
        subjects: &[String],
    ) -> CertCenterResult<CertificateRecord> {
        ctx.require(PermissionLevel::Creator)?;
        validate_days(days)?;
        let subjects = command::normalize_subjects(subjects);
        let Some(primary) = subjects.first().cloned() else {
            return Err(PkiError::Validation("at least one subject is required".into()).into());
        };
        for subject in &subjects {
            tool_argument("subject", subject)?;
        }

        let _guard = self.lock.acquire().await?;
        let state = self.open().await?;

        let output = self
            .run(self.toolchain.create_server_cert(days, &subjects))
            .await?;
        let artifact = issued_artifact(&output, "cannot create server certificate")?;

        let organization = state.provisioning.organization.clone().unwrap_or_default();
        let expected_org = qualified(&organization, &artifact.sequence);
        let record = state
            .registry
            .list(ClassFilter::Server)
            .await?
            .into_iter()
            .find(|r| r.subject.organization() == expected_org && r.common_name() == primary)
            .ok_or_else(|| missing_after_issue(&artifact, output))?;

        tracing::info!(
            id = %record.id,
            cn = %primary,
            sequence = %artifact.sequence,
            days,
            "Server certificate issued"
        );
        Ok(record)
    }

    /// Issue a client certificate named `client_id` under `server_domain`.
    pub async fn create_client_certificate(
        &self,
        ctx: &AuthorizationContext,
        server_domain: &str,
        client_id: &str,
        days: u32,
    ) -> CertCenterResult<CertificateRecord> {
        ctx.require(PermissionLevel::Creator)?;
        let server_domain = tool_argument("server domain", server_domain)?;
        let client_id = tool_argument("client id", client_id)?;
        validate_days(days)?;

        let _guard = self.lock.acquire().await?;
        let state = self.open().await?;

        let output = self
            .run(
                self.toolchain
                    .create_client_cert(server_domain, client_id, days),
            )
            .await?;
        let artifact = issued_artifact(&output, "cannot create client certificate")?;

        let expected_org = qualified(&artifact.name, &artifact.sequence);
        let record = state
            .registry
            .list(ClassFilter::Client)
            .await?
            .into_iter()
            .find(|r| r.subject.organization() == expected_org && r.common_name() == server_domain)
            .ok_or_else(|| missing_after_issue(&artifact, output))?;

        tracing::info!(
            id = %record.id,
            server = %server_domain,
            client = %artifact.name,
            sequence = %artifact.sequence,
            days,
            "Client certificate issued"
        );
        Ok(record)
    }

    pub async fn revoke(
        &self,
        ctx: &AuthorizationContext,
        id: &str,
    ) -> CertCenterResult<CertificateRecord> {
        ctx.require(PermissionLevel::Creator)?;
        let id = required("certificate id", id)?;

        let _guard = self.lock.acquire().await?;
        let state = self.open().await?;

        let record = state.registry.find(id).await?;
        if record.is_revoked() {
            return Err(PkiError::Validation(format!("certificate {id} is already revoked")).into());
        }

        let identity = &record.identity;
        let command = match record.class {
            CertificateClass::Server => self
                .toolchain
                .revoke_server_cert(&identity.common_name, identity.sequence.as_deref()),
            CertificateClass::Client => self.toolchain.revoke_client_cert(
                &identity.common_name,
                &identity.name,
                identity.sequence.as_deref(),
            ),
        };
        let output = self.run(command).await?;
        if !output.success() {
            tracing::warn!(id = %id, exit_status = output.exit_status, "Revocation failed");
            return Err(PkiError::ToolInvocation {
                message: "cannot revoke certificate".into(),
                output: output.output,
            }
            .into());
        }

        let mut revoked = state.registry.find(id).await?;
        revoked.class = record.class;
        tracing::info!(id = %id, name = %revoked.display_name(), "Certificate revoked");
        Ok(revoked)
    }

    // ---------------------------------------------------------------------
    // Inspection and export
    // ---------------------------------------------------------------------

    pub async fn fetch_detail(
        &self,
        ctx: &AuthorizationContext,
        id: &str,
    ) -> CertCenterResult<CertificateDetail> {
        ctx.require(PermissionLevel::User)?;
        let id = required("certificate id", id)?;

        let _guard = self.lock.acquire().await?;
        let state = self.open().await?;

        let record = state.registry.find(id).await?;
        let artifacts = state.layout().artifacts(&record.identity, record.class);
        require_files(&artifacts)?;

        let inspection = self.inspect(&artifacts.certificate).await?;
        let verification = self
            .run(
                self.toolchain
                    .verify(&artifacts.certificate, &artifacts.chain, &artifacts.crl),
            )
            .await?
            .output;

        Ok(CertificateDetail {
            name: record.display_name(),
            guidance: bundle::guidance(&artifacts, FileNaming::FullPath),
            record,
            inspection,
            verification,
        })
    }

    /// Package the certificate, key, chain (and CRL for servers) with a
    /// readme. Nothing is packaged unless every file is present.
    pub async fn export_bundle(
        &self,
        ctx: &AuthorizationContext,
        id: &str,
    ) -> CertCenterResult<ExportBundle> {
        ctx.require(PermissionLevel::Creator)?;
        let id = required("certificate id", id)?;

        let _guard = self.lock.acquire().await?;
        let state = self.open().await?;

        let record = state.registry.find(id).await?;
        let artifacts = state.layout().artifacts(&record.identity, record.class);
        require_files(&artifacts)?;

        let mut entries = Vec::new();
        for path in artifacts.bundle_files() {
            let contents = tokio::fs::read(path).await.map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => PkiError::FileMissing(path.to_path_buf()),
                _ => PkiError::Io(e),
            })?;
            entries.push((bundle::file_name(path), contents));
        }
        let archive = bundle::package(
            &entries,
            &bundle::guidance(&artifacts, FileNaming::BaseName),
        )?;

        let stem = match record.class {
            CertificateClass::Server => record.common_name().to_string(),
            CertificateClass::Client => record.identity.name.clone(),
        };
        let file_name = match record.sequence() {
            Some(seq) => format!("{stem}.{seq}.zip"),
            None => format!("{stem}.zip"),
        };

        tracing::info!(id = %id, file = %file_name, bytes = archive.len(), "Certificate exported");
        Ok(ExportBundle {
            record,
            file_name,
            archive,
        })
    }

    /// Inspect and self-verify the root CA certificate against its CRL.
    pub async fn fetch_root_info(&self, ctx: &AuthorizationContext) -> CertCenterResult<RootInfo> {
        ctx.require(PermissionLevel::User)?;

        let _guard = self.lock.acquire().await?;
        let state = self.open().await?;

        let layout = state.layout();
        let certificate = layout.root_certificate_path();
        let crl = layout.root_crl_path();
        for path in [&certificate, &crl] {
            if !path.exists() {
                return Err(PkiError::FileMissing(path.clone()).into());
            }
        }

        let inspection = self.inspect(&certificate).await?;
        let verification = self
            .run(self.toolchain.verify(&certificate, &certificate, &crl))
            .await?
            .output;

        let organization = state.provisioning.organization.as_deref().unwrap_or_default();
        Ok(RootInfo {
            name: format!("/CN={organization}/"),
            inspection,
            verification,
        })
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    async fn open(&self) -> Result<CaState, PkiError> {
        let provisioning = ProvisioningConfig::load(&self.config.provisioning_path())
            .await?
            .ok_or(PkiError::NotProvisioned)?;
        let root = provisioning
            .root_dir
            .clone()
            .ok_or_else(|| PkiError::RegistryUnavailable("ROOT_DIR is not configured".into()))?;
        if !root.is_dir() {
            return Err(PkiError::RegistryUnavailable(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        Ok(CaState {
            provisioning,
            registry: Registry::new(CaLayout::new(root)),
        })
    }

    async fn run(&self, command: CommandLine) -> Result<CommandOutput, PkiError> {
        tracing::debug!(command = %command, "Running toolchain command");
        self.runner
            .run(&command)
            .await
            .map_err(|e| PkiError::ToolInvocation {
                message: format!("cannot run {}", command.program),
                output: e.to_string(),
            })
    }

    async fn inspect(&self, certificate: &Path) -> Result<String, PkiError> {
        let output = self.run(self.toolchain.inspect(certificate)).await?;
        if !output.success() {
            tracing::warn!(
                path = %certificate.display(),
                exit_status = output.exit_status,
                "Certificate inspection failed"
            );
            return Err(PkiError::ToolInvocation {
                message: "cannot get certificate info".into(),
                output: output.output,
            });
        }
        Ok(output.output)
    }
}

fn qualified(name: &str, sequence: &str) -> String {
    if sequence.is_empty() {
        name.to_string()
    } else {
        format!("{name}:{sequence}")
    }
}

fn issued_artifact(output: &CommandOutput, message: &str) -> Result<IssuedArtifact, PkiError> {
    let artifact = if output.success() {
        command::find_issued_artifact(&output.output)
    } else {
        None
    };
    artifact.ok_or_else(|| {
        tracing::warn!(exit_status = output.exit_status, "{message}");
        PkiError::ToolInvocation {
            message: message.to_string(),
            output: output.output.clone(),
        }
    })
}

/// The toolchain reported success but the ledger has no matching line.
fn missing_after_issue(artifact: &IssuedArtifact, output: CommandOutput) -> PkiError {
    tracing::warn!(
        name = %artifact.name,
        sequence = %artifact.sequence,
        "Issued certificate has no ledger entry"
    );
    PkiError::ToolInvocation {
        message: format!(
            "issued {}.cert.pem.{} has no ledger entry",
            artifact.name, artifact.sequence
        ),
        output: output.output,
    }
}

fn require_files(artifacts: &CertificateArtifacts) -> Result<(), PkiError> {
    match artifacts.first_missing() {
        Some(path) => Err(PkiError::FileMissing(path.to_path_buf())),
        None => Ok(()),
    }
}

fn validate_days(days: u32) -> Result<(), PkiError> {
    if days == 0 {
        return Err(PkiError::Validation(
            "validity period must be at least one day".into(),
        ));
    }
    Ok(())
}

fn required<'a>(label: &str, value: &'a str) -> Result<&'a str, PkiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PkiError::Validation(format!("{label} is required")));
    }
    Ok(value)
}

/// A value passed to a toolchain script as a positional argument: it must
/// not read as a flag and must not escape its directory.
fn tool_argument<'a>(label: &str, value: &'a str) -> Result<&'a str, PkiError> {
    let value = required(label, value)?;
    if value.starts_with('-') || value.contains('/') || value.chars().any(char::is_whitespace) {
        return Err(PkiError::Validation(format!("invalid {label}: {value}")));
    }
    Ok(value)
}
