// src/error/types.rs
use crate::domain::DomainError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },

    #[error("{service} did not answer within {after_ms}ms")]
    Timeout { service: &'static str, after_ms: u64 },

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl AppError {
    /// Short, stable label for the kind of failure. Shown to callers in
    /// explanation entries, so it must not leak request details.
    pub fn failure_class(&self) -> &'static str {
        match self {
            AppError::Http(e) if e.is_timeout() => "timeout",
            AppError::Http(e) if e.is_decode() => "decode",
            AppError::Http(_) => "transport",
            AppError::Status { .. } => "http_status",
            AppError::Timeout { .. } => "timeout",
            AppError::Catalog(_) => "catalog",
            AppError::Inference(_) => "inference",
            AppError::NotConfigured(_) => "not_configured",
            AppError::InvalidArtifact(_) => "invalid_artifact",
            AppError::Config(_) => "config",
            AppError::Domain(_) => "domain",
            AppError::Serialization(_) => "decode",
            AppError::Io(_) => "io",
            AppError::Other(_) => "other",
        }
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::InvalidArtifact(format!("base64 payload could not be decoded: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_class_labels() {
        let timeout = AppError::Timeout {
            service: "catalog",
            after_ms: 100,
        };
        assert_eq!(timeout.failure_class(), "timeout");

        let status = AppError::Status {
            service: "catalog",
            status: 503,
        };
        assert_eq!(status.failure_class(), "http_status");
        assert_eq!(status.to_string(), "catalog returned status 503");

        assert_eq!(
            AppError::NotConfigured("inference".to_string()).failure_class(),
            "not_configured"
        );
    }

    #[test]
    fn test_serializes_as_display_string() {
        let error = AppError::Catalog("down".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, "\"Catalog error: down\"");
    }
}
