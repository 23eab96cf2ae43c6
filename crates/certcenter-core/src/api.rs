//! JSON envelope returned by the API surface: `{ "error": ..., "content": ... }`.

use serde::Serialize;
use serde_json::Value;

use crate::error::CertCenterError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiEnvelope {
    pub error: Option<String>,
    pub content: Value,
}

impl ApiEnvelope {
    pub fn success<T: Serialize>(content: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            error: None,
            content: serde_json::to_value(content)?,
        })
    }

    /// Failure envelope. The diagnostic log, when present, is carried in
    /// `content` so the caller can show the raw tool output.
    pub fn failure(err: &CertCenterError) -> Self {
        let failure = err.to_failure();
        Self {
            error: Some(failure.message),
            content: failure.log.map(Value::String).unwrap_or(Value::Null),
        }
    }
}

/// HTTP status the boundary layer should use for an error.
pub fn status_code(err: &CertCenterError) -> u16 {
    match err {
        CertCenterError::Validation { .. } => 400,
        CertCenterError::AuthenticationFailed { .. } => 401,
        CertCenterError::AuthorizationDenied { .. } => 403,
        CertCenterError::RecordNotFound { .. } => 404,
        CertCenterError::NotProvisioned | CertCenterError::RegistryUnavailable { .. } => 503,
        CertCenterError::ToolInvocation { .. }
        | CertCenterError::FileMissing { .. }
        | CertCenterError::Internal(_) => 500,
    }
}
