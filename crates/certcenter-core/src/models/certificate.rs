//! Certificate domain models.
//!
//! Records are never authoritative on their own: they are re-derived
//! from the CA ledger on every query, and their class (server or client)
//! is inferred from the files present under the CA root.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status column of a ledger line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CertificateStatus {
    Valid,
    Revoked,
    Expired,
    /// Any flag the toolchain writes that is not `V`, `R` or `E`.
    Unknown,
}

impl CertificateStatus {
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim() {
            "V" => CertificateStatus::Valid,
            "R" => CertificateStatus::Revoked,
            "E" => CertificateStatus::Expired,
            _ => CertificateStatus::Unknown,
        }
    }
}

/// Whether a certificate authenticates a server or a client of a server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CertificateClass {
    Server,
    Client,
}

/// Which records a registry listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassFilter {
    Server,
    Client,
    All,
}

impl ClassFilter {
    pub fn accepts(self, class: CertificateClass) -> bool {
        match self {
            ClassFilter::All => true,
            ClassFilter::Server => class == CertificateClass::Server,
            ClassFilter::Client => class == CertificateClass::Client,
        }
    }
}

/// Ordered RDN components of a subject, e.g. `/O=Acme/CN=host1`.
///
/// Keys are stored upper-cased. A part without `=` maps to an empty value,
/// so a missing O or CN and a bare `O` both read as `""`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DistinguishedName(Vec<(String, String)>);

impl DistinguishedName {
    pub fn parse(raw: &str) -> Self {
        let parts = raw
            .split('/')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                let (key, value) = part.split_once('=').unwrap_or((part, ""));
                (key.to_uppercase(), value.to_string())
            })
            .collect();
        Self(parts)
    }

    /// Value for `key` (case-insensitive). When a key repeats, as in
    /// `/CN=a/CN=b`, the last occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        let key = key.to_uppercase();
        self.0
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn organization(&self) -> &str {
        self.get("O").unwrap_or_default()
    }

    pub fn common_name(&self) -> &str {
        self.get("CN").unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.0 {
            write!(f, "/{key}={value}")?;
        }
        Ok(())
    }
}

/// Durable identity of an issued certificate: `(organization, CN, sequence)`.
///
/// The organization field of a subject may encode `name:sequence`; the
/// sequence disambiguates repeated issuance under one name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CertificateIdentity {
    pub name: String,
    pub common_name: String,
    pub sequence: Option<String>,
}

impl CertificateIdentity {
    pub fn from_subject(subject: &DistinguishedName) -> Self {
        let (name, sequence) = match subject.organization().split_once(':') {
            Some((name, seq)) if !seq.is_empty() => (name.to_string(), Some(seq.to_string())),
            Some((name, _)) => (name.to_string(), None),
            None => (subject.organization().to_string(), None),
        };
        Self {
            name,
            common_name: subject.common_name().to_string(),
            sequence,
        }
    }
}

/// A certificate as reconstructed from one read of the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateRecord {
    /// Ledger serial. Unique within one read only.
    pub id: String,
    pub status: CertificateStatus,
    /// Not-after moment; `None` when the ledger column is absent or malformed.
    pub not_after: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    /// Fifth ledger column (file name or `unknown`).
    pub flags: String,
    pub subject: DistinguishedName,
    pub identity: CertificateIdentity,
    pub class: CertificateClass,
    pub expired: bool,
}

impl CertificateRecord {
    pub fn common_name(&self) -> &str {
        &self.identity.common_name
    }

    pub fn sequence(&self) -> Option<&str> {
        self.identity.sequence.as_deref()
    }

    pub fn is_revoked(&self) -> bool {
        self.status == CertificateStatus::Revoked
    }

    /// Short display name, `/<O>/<CN>/`.
    pub fn display_name(&self) -> String {
        format!(
            "/{}/{}/",
            self.subject.organization(),
            self.subject.common_name()
        )
    }
}
