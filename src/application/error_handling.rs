// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors → user-friendly responses
// - Provides consistent error format for UI
// - Never exposes internal implementation details
// - Logs errors for debugging

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Standard error response for UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories for UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Invalid input/validation error (400)
    Validation,

    /// Domain invariant violation (422)
    DomainError,

    /// Missing or invalid configuration (500)
    Configuration,

    /// External service error (502)
    ExternalService,

    /// File system error (500)
    FileSystem,

    /// Other/unknown error (500)
    Internal,
}

impl ErrorResponse {
    /// Create error response from AppError
    pub fn from_app_error(error: AppError) -> Self {
        match error {
            AppError::InvalidArtifact(message) => Self::validation(message),

            AppError::Domain(domain_error) => Self {
                success: false,
                error_type: ErrorType::DomainError,
                message: "Domain validation failed".to_string(),
                details: Some(domain_error.to_string()),
            },

            AppError::Config(message) | AppError::NotConfigured(message) => {
                error!("Configuration error: {}", message);

                Self {
                    success: false,
                    error_type: ErrorType::Configuration,
                    message: "Resolver is not configured correctly".to_string(),
                    details: Some(message),
                }
            }

            error @ (AppError::Http(_)
            | AppError::Status { .. }
            | AppError::Timeout { .. }
            | AppError::Catalog(_)
            | AppError::Inference(_)) => {
                error!("External service error: {}", error);

                Self {
                    success: false,
                    error_type: ErrorType::ExternalService,
                    message: "External service error".to_string(),
                    details: Some(error.failure_class().to_string()),
                }
            }

            AppError::Serialization(serde_error) => {
                error!("Serialization error: {:?}", serde_error);

                Self {
                    success: false,
                    error_type: ErrorType::Internal,
                    message: "Data serialization failed".to_string(),
                    details: None,
                }
            }

            AppError::Io(io_error) => {
                error!("IO error: {:?}", io_error);

                Self {
                    success: false,
                    error_type: ErrorType::FileSystem,
                    message: "File system operation failed".to_string(),
                    details: Some(io_error.to_string()),
                }
            }

            AppError::Other(message) => {
                error!("Other error: {}", message);

                Self {
                    success: false,
                    error_type: ErrorType::Internal,
                    message,
                    details: None,
                }
            }
        }
    }

    /// Create validation error
    pub fn validation(message: String) -> Self {
        Self {
            success: false,
            error_type: ErrorType::Validation,
            message,
            details: None,
        }
    }
}

/// Helper trait to convert Results to ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self) -> Result<T, String>;
}

impl<T> ToErrorResponse<T> for Result<T, AppError> {
    fn to_error_response(self) -> Result<T, String> {
        self.map_err(|e| {
            let error_response = ErrorResponse::from_app_error(e);
            serde_json::to_string(&error_response)
                .unwrap_or_else(|_| "Internal error".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_invalid_artifact_is_validation_error() {
        let error = ErrorResponse::from_app_error(AppError::InvalidArtifact(
            "unsupported kind".to_string(),
        ));
        assert_eq!(error.error_type, ErrorType::Validation);
        assert_eq!(error.message, "unsupported kind");
    }

    #[test]
    fn test_domain_error_keeps_details() {
        let error = ErrorResponse::from_app_error(AppError::Domain(
            DomainError::InvariantViolation("Description cannot be empty".to_string()),
        ));
        assert_eq!(error.error_type, ErrorType::DomainError);
        assert!(error.details.unwrap().contains("Description cannot be empty"));
    }

    #[test]
    fn test_external_error_hides_request_details() {
        let error = ErrorResponse::from_app_error(AppError::Status {
            service: "catalog",
            status: 503,
        });
        assert_eq!(error.error_type, ErrorType::ExternalService);
        assert_eq!(error.details.as_deref(), Some("http_status"));
    }

    #[test]
    fn test_to_error_response_serializes() {
        let result: Result<(), AppError> = Err(AppError::InvalidArtifact("bad".to_string()));
        let json = result.to_error_response().unwrap_err();
        assert!(json.contains("validation"));
        assert!(json.contains("bad"));
    }
}
