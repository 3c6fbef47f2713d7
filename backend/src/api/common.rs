//! Error handling utilities for API responses.
//!
//! Provides structured error responses and conversion between service-layer
//! errors and HTTP responses. Includes:
//! - Standard response envelope
//! - ServiceError to HTTP status code mapping
//! - Validation error formatting helpers
//!
//! # Error Handling Flow
//! 1. The request payload is validated with `validate_payload`
//! 2. The service layer returns a domain-specific `ServiceError`
//! 3. `service_error_to_http` converts it to an HTTP response

use crate::errors::ServiceError;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Standard API response wrapper for all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Indicates if the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Human-readable message
    pub message: String,
    /// Request timestamp
    pub timestamp: String,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ApiResponse<()> {
    /// Create a successful response that carries no data
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: message.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Validates a request payload, aggregating field-level errors into one
/// message.
pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), ServiceError> {
    if let Err(validation_errors) = payload.validate() {
        let error_messages: Vec<String> = validation_errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    format!(
                        "{}: {}",
                        field,
                        error.message.as_ref().unwrap_or(&"Invalid value".into())
                    )
                })
            })
            .collect();
        return Err(ServiceError::validation(error_messages.join(", ")));
    }
    Ok(())
}

/// Maps a service error onto an HTTP status and message.
pub fn service_error_to_http(error: ServiceError) -> (StatusCode, String) {
    match error {
        ServiceError::Validation { message } => (StatusCode::BAD_REQUEST, message),
        ServiceError::NotFound { entity, identifier } => (
            StatusCode::NOT_FOUND,
            format!("{} '{}' not found", entity, identifier),
        ),
        ServiceError::AlreadyExists { entity, identifier } => (
            StatusCode::CONFLICT,
            format!("{} '{}' already exists", entity, identifier),
        ),
        ServiceError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message),
        ServiceError::Forbidden { message } => (StatusCode::FORBIDDEN, message),
        ServiceError::InvalidOperation { message } => (StatusCode::BAD_REQUEST, message),
        ServiceError::Database { source } => {
            tracing::error!("Database error: {}", source);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
        ServiceError::InternalError { message } => {
            tracing::error!("Internal error: {}", message);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}
