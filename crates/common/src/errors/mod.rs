//! Error types for SAMIT services
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling
//!
//! Authorization failures on page routes are rendered as HTTP redirects
//! rather than bare 403 bodies. Store and storage failures carry a generic
//! outward message, the underlying detail is logged only.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    MissingField,
    InvalidFormat,
    PayloadTooLarge,
    UnsupportedFileType,

    // Authentication errors (2xxx)
    Unauthorized,
    InvalidToken,
    ExpiredToken,

    // Authorization errors (3xxx)
    Forbidden,
    RoleMismatch,
    NotOwner,
    VerificationRequired,

    // Resource errors (4xxx)
    NotFound,
    JobNotFound,
    OrganizationNotFound,
    ApplicationNotFound,
    ResumeNotFound,
    ClassNotFound,
    EnrollmentNotFound,
    ProfileNotFound,

    // Conflict errors (5xxx)
    Conflict,
    AlreadyApplied,
    AlreadyEnrolled,
    ClassFull,
    InvalidTransition,
    VerificationClosed,

    // Rate limiting (6xxx)
    RateLimited,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,
    TransactionError,

    // External service errors (8xxx)
    StorageError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,

    // Service unavailable
    ServiceUnavailable,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::MissingField => 1002,
            ErrorCode::InvalidFormat => 1003,
            ErrorCode::PayloadTooLarge => 1004,
            ErrorCode::UnsupportedFileType => 1005,

            // Auth (2xxx)
            ErrorCode::Unauthorized => 2001,
            ErrorCode::InvalidToken => 2002,
            ErrorCode::ExpiredToken => 2003,

            // Authz (3xxx)
            ErrorCode::Forbidden => 3001,
            ErrorCode::RoleMismatch => 3002,
            ErrorCode::NotOwner => 3003,
            ErrorCode::VerificationRequired => 3004,

            // Resources (4xxx)
            ErrorCode::NotFound => 4001,
            ErrorCode::JobNotFound => 4002,
            ErrorCode::OrganizationNotFound => 4003,
            ErrorCode::ApplicationNotFound => 4004,
            ErrorCode::ResumeNotFound => 4005,
            ErrorCode::ClassNotFound => 4006,
            ErrorCode::EnrollmentNotFound => 4007,
            ErrorCode::ProfileNotFound => 4008,

            // Conflicts (5xxx)
            ErrorCode::Conflict => 5001,
            ErrorCode::AlreadyApplied => 5002,
            ErrorCode::AlreadyEnrolled => 5003,
            ErrorCode::ClassFull => 5004,
            ErrorCode::InvalidTransition => 5005,
            ErrorCode::VerificationClosed => 5006,

            // Rate limits (6xxx)
            ErrorCode::RateLimited => 6001,

            // Database (7xxx)
            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,
            ErrorCode::TransactionError => 7003,

            // External (8xxx)
            ErrorCode::StorageError => 8001,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,

            ErrorCode::ServiceUnavailable => 9999,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Required field missing: {field}")]
    MissingField { field: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    #[error("Payload too large: {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Unsupported file type: {content_type}")]
    UnsupportedFileType { content_type: String },

    // Authentication errors
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Invalid session token")]
    InvalidToken,

    #[error("Session token expired")]
    ExpiredToken,

    // Authorization errors
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Role mismatch: operation requires {required}")]
    RoleMismatch { required: String },

    #[error("Resource is owned by another account")]
    NotOwner,

    #[error("Organization verification is required before publishing jobs")]
    VerificationRequired,

    /// Authorization outcome on a page route: redirect, never a 403 page.
    #[error("Redirecting to {location}")]
    AuthRedirect { location: String },

    // Resource errors
    #[error("Resource not found: {resource} with id {id}")]
    NotFound { resource: String, id: String },

    #[error("Job not found: {slug}")]
    JobNotFound { slug: String },

    #[error("Organization not found: {id}")]
    OrganizationNotFound { id: String },

    #[error("Application not found: {id}")]
    ApplicationNotFound { id: String },

    #[error("Resume not found: {id}")]
    ResumeNotFound { id: String },

    #[error("Class not found: {slug}")]
    ClassNotFound { slug: String },

    #[error("Enrollment not found: {id}")]
    EnrollmentNotFound { id: String },

    #[error("Profile not found: {id}")]
    ProfileNotFound { id: String },

    // Conflict errors
    #[error("Duplicate resource: {message}")]
    Duplicate { message: String },

    #[error("An application for this job already exists")]
    AlreadyApplied,

    #[error("An enrollment for this class already exists")]
    AlreadyEnrolled,

    #[error("Class is full")]
    ClassFull,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Verification already settled: organization is {status}")]
    VerificationClosed { status: String },

    // Rate limiting
    #[error("Rate limit exceeded: {limit} requests per second")]
    RateLimited { limit: u32 },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Transaction error: {message}")]
    Transaction { message: String },

    // External service errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service unavailable: {message}")]
    ServiceUnavailable { message: String },

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::MissingField { .. } => ErrorCode::MissingField,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
            AppError::UnsupportedFileType { .. } => ErrorCode::UnsupportedFileType,
            AppError::Unauthorized { .. } => ErrorCode::Unauthorized,
            AppError::InvalidToken => ErrorCode::InvalidToken,
            AppError::ExpiredToken => ErrorCode::ExpiredToken,
            AppError::Forbidden { .. } => ErrorCode::Forbidden,
            AppError::RoleMismatch { .. } => ErrorCode::RoleMismatch,
            AppError::NotOwner => ErrorCode::NotOwner,
            AppError::VerificationRequired => ErrorCode::VerificationRequired,
            AppError::AuthRedirect { .. } => ErrorCode::Forbidden,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::JobNotFound { .. } => ErrorCode::JobNotFound,
            AppError::OrganizationNotFound { .. } => ErrorCode::OrganizationNotFound,
            AppError::ApplicationNotFound { .. } => ErrorCode::ApplicationNotFound,
            AppError::ResumeNotFound { .. } => ErrorCode::ResumeNotFound,
            AppError::ClassNotFound { .. } => ErrorCode::ClassNotFound,
            AppError::EnrollmentNotFound { .. } => ErrorCode::EnrollmentNotFound,
            AppError::ProfileNotFound { .. } => ErrorCode::ProfileNotFound,
            AppError::Duplicate { .. } => ErrorCode::Conflict,
            AppError::AlreadyApplied => ErrorCode::AlreadyApplied,
            AppError::AlreadyEnrolled => ErrorCode::AlreadyEnrolled,
            AppError::ClassFull => ErrorCode::ClassFull,
            AppError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            AppError::VerificationClosed { .. } => ErrorCode::VerificationClosed,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Transaction { .. } => ErrorCode::TransactionError,
            AppError::Storage { .. } => ErrorCode::StorageError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. }
            | AppError::MissingField { .. }
            | AppError::InvalidFormat { .. } => StatusCode::BAD_REQUEST,

            // 401 Unauthorized
            AppError::Unauthorized { .. }
            | AppError::InvalidToken
            | AppError::ExpiredToken => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            AppError::Forbidden { .. }
            | AppError::RoleMismatch { .. }
            | AppError::NotOwner
            | AppError::VerificationRequired => StatusCode::FORBIDDEN,

            // 303 See Other
            AppError::AuthRedirect { .. } => StatusCode::SEE_OTHER,

            // 404 Not Found
            AppError::NotFound { .. }
            | AppError::JobNotFound { .. }
            | AppError::OrganizationNotFound { .. }
            | AppError::ApplicationNotFound { .. }
            | AppError::ResumeNotFound { .. }
            | AppError::ClassNotFound { .. }
            | AppError::EnrollmentNotFound { .. }
            | AppError::ProfileNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::Duplicate { .. }
            | AppError::AlreadyApplied
            | AppError::AlreadyEnrolled
            | AppError::ClassFull
            | AppError::InvalidTransition { .. }
            | AppError::VerificationClosed { .. } => StatusCode::CONFLICT,

            // 413 Payload Too Large
            AppError::PayloadTooLarge { .. }
            | AppError::UnsupportedFileType { .. } => StatusCode::PAYLOAD_TOO_LARGE,

            // 429 Too Many Requests
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,

            // 500 Internal Server Error
            AppError::Database(_)
            | AppError::DatabaseConnection { .. }
            | AppError::Transaction { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 502 Bad Gateway
            AppError::Storage { .. } => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            AppError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Outward-facing message. Dependency failures stay generic, the
    /// underlying detail is only logged.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Database(_)
            | AppError::DatabaseConnection { .. }
            | AppError::Transaction { .. }
            | AppError::Internal { .. }
            | AppError::Configuration { .. }
            | AppError::Serialization(_)
            | AppError::Other(_) => "An internal error occurred".to_string(),
            AppError::Storage { .. } => "Document storage is unavailable".to_string(),
            other => other.to_string(),
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Authorization outcomes on page routes redirect instead of
        // rendering an error body.
        if let AppError::AuthRedirect { location } = &self {
            tracing::debug!(location = %location, "authorization redirect");
            return Redirect::to(location).into_response();
        }

        let status = self.status_code();
        let code = self.code();
        let message = self.public_message();

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %self,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::JobNotFound { slug: "test".into() };
        assert_eq!(err.code(), ErrorCode::JobNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_validation_error() {
        let err = AppError::Validation {
            message: "Invalid title".into(),
            field: Some("title".into()),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.is_server_error());
        assert!(err.is_client_error());
    }

    #[test]
    fn test_conflict_errors() {
        assert_eq!(AppError::AlreadyApplied.status_code(), StatusCode::CONFLICT);
        assert_eq!(AppError::AlreadyApplied.code(), ErrorCode::AlreadyApplied);
        assert_eq!(AppError::ClassFull.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_auth_redirect_status() {
        let err = AppError::AuthRedirect {
            location: "/auth/login?redirectTo=/dashboard".into(),
        };
        assert_eq!(err.status_code(), StatusCode::SEE_OTHER);
    }

    #[test]
    fn test_dependency_error_is_generic_outward() {
        let err = AppError::Storage {
            message: "bucket samit-legal: connection reset by peer".into(),
        };
        assert_eq!(err.public_message(), "Document storage is unavailable");
        let err = AppError::DatabaseConnection {
            message: "password authentication failed".into(),
        };
        assert_eq!(err.public_message(), "An internal error occurred");
    }

    #[test]
    fn test_server_error() {
        let err = AppError::Internal {
            message: "Something went wrong".into(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());
    }
}
