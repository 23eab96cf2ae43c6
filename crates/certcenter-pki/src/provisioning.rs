//! Provisioning config (`custom_config.sh`) and toolchain readiness.
//!
//! The installer writes `KEY="value"` lines; the presence of the file is
//! what marks the toolchain as provisioned.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::CaConfig;
use crate::error::PkiError;

pub const PROVISIONING_FILE: &str = "custom_config.sh";

/// Scripts that must be present before the toolchain can be provisioned.
pub const REQUIRED_UTILITIES: &[&str] = &[
    "config.sh",
    "make_client_cert.sh",
    "make_client_revoke.sh",
    "make_server_cert.sh",
    "make_server_revoke.sh",
    "prepare.sh",
];

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*([A-Za-z_][A-Za-z0-9_]*)="([^"]*)"\s*$"#).expect("assignment regex")
});

#[derive(Clone, Default, PartialEq, Eq)]
pub struct ProvisioningConfig {
    pub root_dir: Option<PathBuf>,
    pub country: Option<String>,
    pub organization: Option<String>,
    pub common_name: Option<String>,
    pub validity_days: Option<u32>,
    secret: Option<String>,
}

impl ProvisioningConfig {
    /// Parse `KEY="value"` lines. Unknown keys and other lines are ignored;
    /// empty values count as absent.
    pub fn parse(text: &str) -> Self {
        let mut config = Self::default();
        for caps in text.lines().filter_map(|line| ASSIGNMENT.captures(line)) {
            let value = caps[2].to_string();
            if value.is_empty() {
                continue;
            }
            match &caps[1] {
                "ROOT_DIR" => config.root_dir = Some(PathBuf::from(value)),
                "COUNTRY_NAME" => config.country = Some(value),
                "ORG_NAME" => config.organization = Some(value),
                "COMM_NAME" => config.common_name = Some(value),
                "VAL_DAYS" => config.validity_days = value.parse().ok(),
                "SERT_PASS" => config.secret = Some(value),
                _ => {}
            }
        }
        config
    }

    /// Read the config file. `Ok(None)` when the toolchain is not provisioned.
    pub async fn load(path: &Path) -> Result<Option<Self>, PkiError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(Self::parse(&String::from_utf8_lossy(&bytes)))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }
}

impl fmt::Debug for ProvisioningConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningConfig")
            .field("root_dir", &self.root_dir)
            .field("country", &self.country)
            .field("organization", &self.organization)
            .field("common_name", &self.common_name)
            .field("validity_days", &self.validity_days)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningStatus {
    Provisioned,
    /// Ready to be provisioned: every required script is present.
    NotProvisioned,
    /// Scripts missing from the utilities directory.
    MissingUtilities(Vec<String>),
}

pub fn provisioning_status(config: &CaConfig) -> ProvisioningStatus {
    if config.provisioning_path().exists() {
        return ProvisioningStatus::Provisioned;
    }
    let missing: Vec<String> = REQUIRED_UTILITIES
        .iter()
        .filter(|util| !config.utils_dir.join(util).exists())
        .map(|util| util.to_string())
        .collect();
    if missing.is_empty() {
        ProvisioningStatus::NotProvisioned
    } else {
        ProvisioningStatus::MissingUtilities(missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"ROOT_DIR="/srv/pki"
COUNTRY_NAME="NL"
ORG_NAME="Acme"
COMM_NAME="Acme Root"
SERT_PASS="s3cret"
VAL_DAYS="3650"
# comment line
"#;

    #[test]
    fn parses_installer_output() {
        let config = ProvisioningConfig::parse(SAMPLE);
        assert_eq!(config.root_dir, Some(PathBuf::from("/srv/pki")));
        assert_eq!(config.organization.as_deref(), Some("Acme"));
        assert_eq!(config.country.as_deref(), Some("NL"));
        assert_eq!(config.common_name.as_deref(), Some("Acme Root"));
        assert_eq!(config.validity_days, Some(3650));
        assert_eq!(config.secret(), Some("s3cret"));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let rendered = format!("{:?}", ProvisioningConfig::parse(SAMPLE));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn empty_values_are_absent() {
        let config = ProvisioningConfig::parse("ROOT_DIR=\"\"\nORG_NAME=\"Acme\"\n");
        assert_eq!(config.root_dir, None);
        assert_eq!(config.organization.as_deref(), Some("Acme"));
    }

    #[test]
    fn status_reports_missing_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let config = CaConfig {
            utils_dir: dir.path().to_path_buf(),
            ..CaConfig::default()
        };
        std::fs::write(dir.path().join("config.sh"), "").unwrap();

        match provisioning_status(&config) {
            ProvisioningStatus::MissingUtilities(missing) => {
                assert_eq!(missing.len(), REQUIRED_UTILITIES.len() - 1);
                assert!(!missing.contains(&"config.sh".to_string()));
            }
            other => panic!("unexpected status {other:?}"),
        }

        for util in REQUIRED_UTILITIES {
            std::fs::write(dir.path().join(util), "").unwrap();
        }
        assert_eq!(provisioning_status(&config), ProvisioningStatus::NotProvisioned);

        std::fs::write(dir.path().join(PROVISIONING_FILE), SAMPLE).unwrap();
        assert_eq!(provisioning_status(&config), ProvisioningStatus::Provisioned);
    }

    #[tokio::test]
    async fn load_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = ProvisioningConfig::load(&dir.path().join(PROVISIONING_FILE))
            .await
            .unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn load_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PROVISIONING_FILE);
        std::fs::write(&path, SAMPLE).unwrap();
        let loaded = ProvisioningConfig::load(&path).await.unwrap().unwrap();
        assert_eq!(loaded.organization.as_deref(), Some("Acme"));
    }
}
