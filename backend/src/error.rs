//! Standardized error handling for the Fleetdesk API
//!
//! This module provides a consistent error response format across all endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Standard API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code (e.g., "VALIDATION_ERROR", "NOT_FOUND", "UPLOAD_FAILED")
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional field-level errors for validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Vec<String>>>,
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// Request path that caused the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            path: None,
        }
    }

    pub fn with_details(mut self, details: HashMap<String, Vec<String>>) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Application error type that can be converted to HTTP responses
#[derive(Debug)]
pub enum AppError {
    // Resource errors
    NotFound(String),
    Conflict(String),

    // Validation errors
    ValidationError { details: HashMap<String, Vec<String>> },
    BadRequest(String),

    // Save-sequence errors
    UploadFailed(String),
    /// Permanent deletion failed, usually because dependent rows still
    /// reference the client. Kept distinct from Conflict so the
    /// confirmation dialog can render it inline.
    PurgeFailed(String),

    // Server errors
    InternalError(String),
    DatabaseError(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) | Self::PurgeFailed(_) => StatusCode::CONFLICT,
            Self::ValidationError { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            Self::InternalError(_) | Self::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::ValidationError { .. } => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::UploadFailed(_) => "UPLOAD_FAILED",
            Self::PurgeFailed(_) => "PERMANENT_DELETE_FAILED",
            Self::InternalError(_) => "INTERNAL_ERROR",
            Self::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::NotFound(resource) => format!("{} not found", resource),
            Self::Conflict(msg) => msg.clone(),
            Self::ValidationError { .. } => "Validation failed".to_string(),
            Self::BadRequest(msg) => msg.clone(),
            Self::UploadFailed(msg) => format!("File upload failed: {}", msg),
            Self::PurgeFailed(msg) => msg.clone(),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                "A database error occurred".to_string()
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut error = ApiError::new(self.error_code(), self.message());

        if let Self::ValidationError { details } = &self {
            error.details = Some(details.clone());
        }

        (status, Json(error)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound("Resource".to_string()),
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

/// Result type alias for handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper to create validation errors
pub fn validation_error(field: &str, message: &str) -> AppError {
    let mut details = HashMap::new();
    details.insert(field.to_string(), vec![message.to_string()]);
    AppError::ValidationError { details }
}

/// Helper to accumulate multiple validation errors
pub struct ValidationBuilder {
    details: HashMap<String, Vec<String>>,
}

impl ValidationBuilder {
    pub fn new() -> Self {
        Self {
            details: HashMap::new(),
        }
    }

    pub fn error(mut self, field: &str, message: &str) -> Self {
        self.details
            .entry(field.to_string())
            .or_insert_with(Vec::new)
            .push(message.to_string());
        self
    }

    pub fn build(self) -> Option<AppError> {
        if self.details.is_empty() {
            None
        } else {
            Some(AppError::ValidationError {
                details: self.details,
            })
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.details.is_empty()
    }

    pub fn into_details(self) -> HashMap<String, Vec<String>> {
        self.details
    }
}

impl Default for ValidationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
