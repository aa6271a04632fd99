// src/application/error_handling.rs
//
// UI-facing error reports
//
// ARCHITECTURE:
// - Maps internal errors to a (kind, message, details) triple
// - List models keep the last one in their error slot
// - Infrastructure details go to the log, not to the user

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories for UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    NotFound,

    /// Rejected input (blank title, bad email, ...)
    Validation,

    /// A business rule refused the operation (full event, locked post)
    DomainError,

    Database,

    /// Network media source
    ExternalService,

    FileSystem,

    Internal,
}

impl ErrorResponse {
    pub fn from_app_error(error: &AppError) -> Self {
        match error {
            AppError::NotFound => Self::not_found("Record"),

            AppError::Domain(DomainError::InvariantViolation(msg)) => Self::validation(msg.clone()),

            AppError::Domain(DomainError::NotFound(what)) => Self::not_found(what),

            AppError::Domain(domain_error) => Self {
                error_type: ErrorType::DomainError,
                message: domain_error.to_string(),
                details: None,
            },

            AppError::Database(db_error) => {
                log::error!("Database error: {:?}", db_error);
                Self {
                    error_type: ErrorType::Database,
                    message: "Database operation failed".to_string(),
                    details: Some("Check logs for details".to_string()),
                }
            }

            AppError::Pool(pool_error) => {
                log::error!("Connection pool error: {}", pool_error);
                Self {
                    error_type: ErrorType::Database,
                    message: "Database connection failed".to_string(),
                    details: None,
                }
            }

            AppError::Http(http_error) => {
                log::warn!("Media source error: {}", http_error);
                Self {
                    error_type: ErrorType::ExternalService,
                    message: "Download failed".to_string(),
                    details: Some(http_error.to_string()),
                }
            }

            AppError::Io(io_error) => {
                log::warn!("IO error: {:?}", io_error);
                Self {
                    error_type: ErrorType::FileSystem,
                    message: "File system operation failed".to_string(),
                    details: Some(io_error.to_string()),
                }
            }

            AppError::Serialization(serde_error) => {
                log::error!("Serialization error: {:?}", serde_error);
                Self {
                    error_type: ErrorType::Internal,
                    message: "Data serialization failed".to_string(),
                    details: None,
                }
            }

            AppError::Config(message) | AppError::Other(message) => {
                log::error!("{}", message);
                Self {
                    error_type: ErrorType::Internal,
                    message: message.clone(),
                    details: None,
                }
            }
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            error_type: ErrorType::Validation,
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(resource: &str) -> Self {
        Self {
            error_type: ErrorType::NotFound,
            message: format!("{} not found", resource),
            details: None,
        }
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self::from_app_error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = ErrorResponse::from_app_error(&AppError::NotFound);
        assert_eq!(error.error_type, ErrorType::NotFound);
        assert_eq!(error.message, "Record not found");
    }

    #[test]
    fn test_invariant_violation_is_validation() {
        let error = ErrorResponse::from_app_error(&AppError::Domain(
            DomainError::InvariantViolation("Artwork title cannot be empty".to_string()),
        ));
        assert_eq!(error.error_type, ErrorType::Validation);
        assert_eq!(error.message, "Artwork title cannot be empty");
    }

    #[test]
    fn test_full_event_is_domain_error() {
        let error = ErrorResponse::from_app_error(&AppError::Domain(DomainError::EventFull {
            event_id: 4,
            max_attendees: 10,
        }));
        assert_eq!(error.error_type, ErrorType::DomainError);
        assert!(error.message.contains("full"));
    }

    #[test]
    fn test_serialization() {
        let error = ErrorResponse::not_found("Artwork");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("not_found"));
        assert!(json.contains("Artwork not found"));
    }
}
