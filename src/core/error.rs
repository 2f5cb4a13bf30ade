//! Error type system for the student portal
//!
//! This module provides:
//! - A single application error enum shared by every layer
//! - HTTP status code mapping
//! - Uniform JSON error bodies with trace IDs

use crate::api::middleware::TraceId;
use crate::auth::jwt::TokenError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Main error type for the student portal
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // System-level errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("Connection pool error: {0}")]
    PoolError(#[from] r2d2::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task error: {0}")]
    TaskError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    // Request errors
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Authentication errors
    #[error("Identity already exists: {0}")]
    DuplicateIdentity(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Missing or malformed Authorization header")]
    MissingCredentials,

    #[error("Token rejected: {0}")]
    Unauthorized(#[from] TokenError),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,

            AppError::InvalidCredentials
            | AppError::MissingCredentials
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,

            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            AppError::DuplicateIdentity(_) | AppError::Conflict(_) => StatusCode::CONFLICT,

            AppError::ConfigError(_)
            | AppError::DatabaseError(_)
            | AppError::PoolError(_)
            | AppError::IoError(_)
            | AppError::TaskError(_)
            | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::ConfigError(_) => "ConfigError",
            AppError::DatabaseError(_) => "DatabaseError",
            AppError::PoolError(_) => "PoolError",
            AppError::IoError(_) => "IoError",
            AppError::TaskError(_) => "TaskError",
            AppError::InternalError(_) => "InternalError",
            AppError::ValidationError(_) => "ValidationError",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict(_) => "Conflict",
            AppError::DuplicateIdentity(_) => "DuplicateIdentity",
            AppError::InvalidCredentials => "InvalidCredentials",
            AppError::MissingCredentials | AppError::Unauthorized(_) => "unauthorized",
        }
    }

    /// Whether the failure came from the auth gate
    pub fn is_gate_rejection(&self) -> bool {
        matches!(self, AppError::MissingCredentials | AppError::Unauthorized(_))
    }

    /// Message safe to show to clients; server faults never leak their cause
    fn public_message(&self) -> String {
        match self {
            _ if self.status_code().is_server_error() => "Internal server error".to_string(),
            AppError::ValidationError(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message)
            | AppError::DuplicateIdentity(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response tagged with the current request's trace ID
    ///
    /// Outside a traced request a fresh ID is generated instead.
    pub fn new(error: String, message: String) -> Self {
        let trace_id = TraceId::current()
            .map(|id| id.0)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Self {
            error,
            message,
            trace_id,
        }
    }

    /// Create an error response from an AppError
    pub fn from_error(error: &AppError) -> Self {
        Self::new(error.error_type().to_string(), error.public_message())
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} (trace_id: {})", self.error, self.message, self.trace_id)
    }
}

/// Body of every auth gate rejection
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnauthorizedResponse {
    pub error: String,
}

impl Default for UnauthorizedResponse {
    fn default() -> Self {
        Self {
            error: "unauthorized".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if self.is_gate_rejection() {
            tracing::debug!(reason = %self, "Rejected unauthenticated request");
            return (status_code, Json(UnauthorizedResponse::default())).into_response();
        }

        let error_response = ErrorResponse::from_error(&self);

        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with AppError
pub type Result<T> = std::result::Result<T, AppError>;
