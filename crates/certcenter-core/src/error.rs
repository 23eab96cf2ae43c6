//! Error types for the certcenter system.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CertCenterError {
    #[error("{message}")]
    Validation { message: String },

    #[error("root CA not detected: {reason}")]
    RegistryUnavailable { reason: String },

    #[error("record not found: {id}")]
    RecordNotFound { id: String },

    /// A toolchain subprocess exited non-zero or produced no result.
    /// `output` holds the raw combined output of the tool.
    #[error("{message}")]
    ToolInvocation { message: String, output: String },

    #[error("{reason}")]
    AuthenticationFailed { reason: String },

    #[error("{reason}")]
    AuthorizationDenied { reason: String },

    #[error("required file is missing: {path}")]
    FileMissing { path: String },

    #[error("certificate toolchain is not provisioned")]
    NotProvisioned,

    #[error("internal error: {0}")]
    Internal(String),
}

pub type CertCenterResult<T> = Result<T, CertCenterError>;

/// The user-facing shape of a failure: a short message plus, for tool
/// invocation failures only, the raw diagnostic log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub message: String,
    pub log: Option<String>,
}

impl CertCenterError {
    /// Raw tool output attached to the error, if any.
    pub fn diagnostic_log(&self) -> Option<&str> {
        match self {
            CertCenterError::ToolInvocation { output, .. } => Some(output),
            _ => None,
        }
    }

    pub fn to_failure(&self) -> Failure {
        Failure {
            message: self.to_string(),
            log: self.diagnostic_log().map(str::to_owned),
        }
    }
}

impl From<CertCenterError> for Failure {
    fn from(err: CertCenterError) -> Self {
        err.to_failure()
    }
}
