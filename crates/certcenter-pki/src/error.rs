//! PKI-layer error types and conversions.

use std::path::PathBuf;

use certcenter_core::error::CertCenterError;

#[derive(Debug, thiserror::Error)]
pub enum PkiError {
    #[error("{0}")]
    Validation(String),

    #[error("certificate toolchain is not provisioned")]
    NotProvisioned,

    #[error("root CA not detected: {0}")]
    RegistryUnavailable(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("{message}")]
    ToolInvocation { message: String, output: String },

    #[error("required file is missing: {}", .0.display())]
    FileMissing(PathBuf),

    #[error("CA lock error: {0}")]
    Lock(String),

    #[error("archive error: {0}")]
    Archive(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<zip::result::ZipError> for PkiError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Archive(e.to_string())
    }
}

impl From<PkiError> for CertCenterError {
    fn from(err: PkiError) -> Self {
        match err {
            PkiError::Validation(message) => CertCenterError::Validation { message },
            PkiError::NotProvisioned => CertCenterError::NotProvisioned,
            PkiError::RegistryUnavailable(reason) => CertCenterError::RegistryUnavailable { reason },
            PkiError::RecordNotFound(id) => CertCenterError::RecordNotFound { id },
            PkiError::ToolInvocation { message, output } => {
                CertCenterError::ToolInvocation { message, output }
            }
            PkiError::FileMissing(path) => CertCenterError::FileMissing {
                path: path.display().to_string(),
            },
            other @ (PkiError::Lock(_) | PkiError::Archive(_) | PkiError::Io(_)) => {
                CertCenterError::Internal(other.to_string())
            }
        }
    }
}
