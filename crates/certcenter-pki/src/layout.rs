//! On-disk layout of the CA tree and identity → path derivation.
//!
//! ```text
//! <root>/ca/intermediate/index.txt                       ledger
//! <root>/ca/intermediate/certs/<cn>.cert.pem[.<seq>]     server certificates
//! <root>/ca/intermediate/private/<cn>.key.pem            server keys
//! <root>/ca/intermediate/certs/ca-chain.cert.pem         chain
//! <root>/ca/intermediate/crl/ca-full.crl.pem             CRL
//! <root>/ca/client_certs/<cn>/<name>.cert.pem[.<seq>]    client certificates
//! <root>/ca/client_certs/<cn>/private/<name>_private.key.pem
//! <root>/ca/root/certs/ca.cert.pem, <root>/ca/root/crl/ca.crl.pem
//! ```

use std::path::{Path, PathBuf};

use certcenter_core::models::certificate::{CertificateClass, CertificateIdentity};

#[derive(Debug, Clone)]
pub struct CaLayout {
    root: PathBuf,
}

/// Files that make up an issued certificate's deliverable set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateArtifacts {
    pub class: CertificateClass,
    pub certificate: PathBuf,
    pub private_key: PathBuf,
    pub chain: PathBuf,
    pub crl: PathBuf,
}

impl CertificateArtifacts {
    /// Files handed to the operator. Client bundles do not carry the CRL.
    pub fn bundle_files(&self) -> Vec<&Path> {
        let mut files = vec![
            self.certificate.as_path(),
            self.private_key.as_path(),
            self.chain.as_path(),
        ];
        if self.class == CertificateClass::Server {
            files.push(self.crl.as_path());
        }
        files
    }

    /// First bundle file that does not exist, if any.
    pub fn first_missing(&self) -> Option<&Path> {
        self.bundle_files().into_iter().find(|p| !p.exists())
    }
}

fn with_sequence(base: String, sequence: Option<&str>) -> String {
    match sequence {
        Some(seq) => format!("{base}.{seq}"),
        None => base,
    }
}

impl CaLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ca(&self) -> PathBuf {
        self.root.join("ca")
    }

    fn intermediate(&self) -> PathBuf {
        self.ca().join("intermediate")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.intermediate().join("index.txt")
    }

    pub fn chain_path(&self) -> PathBuf {
        self.intermediate().join("certs").join("ca-chain.cert.pem")
    }

    pub fn crl_path(&self) -> PathBuf {
        self.intermediate().join("crl").join("ca-full.crl.pem")
    }

    pub fn root_certificate_path(&self) -> PathBuf {
        self.ca().join("root").join("certs").join("ca.cert.pem")
    }

    pub fn root_crl_path(&self) -> PathBuf {
        self.ca().join("root").join("crl").join("ca.crl.pem")
    }

    fn client_dir(&self, common_name: &str) -> PathBuf {
        self.ca().join("client_certs").join(common_name)
    }

    pub fn server_certificate_path(&self, identity: &CertificateIdentity) -> PathBuf {
        let file = with_sequence(
            format!("{}.cert.pem", identity.common_name),
            identity.sequence.as_deref(),
        );
        self.intermediate().join("certs").join(file)
    }

    pub fn server_key_path(&self, identity: &CertificateIdentity) -> PathBuf {
        self.intermediate()
            .join("private")
            .join(format!("{}.key.pem", identity.common_name))
    }

    pub fn client_certificate_path(&self, identity: &CertificateIdentity) -> PathBuf {
        let file = with_sequence(
            format!("{}.cert.pem", identity.name),
            identity.sequence.as_deref(),
        );
        self.client_dir(&identity.common_name).join(file)
    }

    pub fn client_key_path(&self, identity: &CertificateIdentity) -> PathBuf {
        self.client_dir(&identity.common_name)
            .join("private")
            .join(format!("{}_private.key.pem", identity.name))
    }

    /// The one place that decides server vs client: a record is a client
    /// certificate exactly when its client certificate file exists.
    pub fn classify(&self, identity: &CertificateIdentity) -> CertificateClass {
        if self.client_certificate_path(identity).is_file() {
            CertificateClass::Client
        } else {
            CertificateClass::Server
        }
    }

    pub fn artifacts(
        &self,
        identity: &CertificateIdentity,
        class: CertificateClass,
    ) -> CertificateArtifacts {
        let (certificate, private_key) = match class {
            CertificateClass::Server => (
                self.server_certificate_path(identity),
                self.server_key_path(identity),
            ),
            CertificateClass::Client => (
                self.client_certificate_path(identity),
                self.client_key_path(identity),
            ),
        };
        CertificateArtifacts {
            class,
            certificate,
            private_key,
            chain: self.chain_path(),
            crl: self.crl_path(),
        }
    }
}
