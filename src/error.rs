//! Application error type shared by every layer.
//!
//! Each variant carries a human-readable message plus a JSON `details` payload
//! that is returned verbatim to API clients.

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Serialized error payload.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Errors produced while building links, resolving visits, or serving HTTP.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed configuration. Raised when a [`crate::application::services::LinkBuilder`]
    /// is instantiated with settings it cannot use.
    #[error("{message}")]
    Configuration { message: String, details: Value },

    /// Bad or missing build input. Always raised before anything is written.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// The key allocator ran out of attempts to find a free key.
    #[error("{message}")]
    KeyExhaustion { message: String, details: Value },

    /// The link exists but is outside its activation window.
    #[error("{message}")]
    LinkUnavailable { message: String, details: Value },

    #[error("{message}")]
    Unauthorized { message: String, details: Value },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn configuration(message: impl Into<String>, details: Value) -> Self {
        Self::Configuration {
            message: message.into(),
            details,
        }
    }
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn key_exhaustion(message: impl Into<String>, details: Value) -> Self {
        Self::KeyExhaustion {
            message: message.into(),
            details,
        }
    }
    pub fn link_unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::LinkUnavailable {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Configuration { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
            AppError::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::KeyExhaustion { .. } => (StatusCode::SERVICE_UNAVAILABLE, "key_exhaustion"),
            // Inactive and expired links look exactly like unknown keys to visitors.
            AppError::LinkUnavailable { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
            AppError::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            AppError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }

    /// Converts the error into its serializable payload.
    pub fn to_error_info(&self) -> ErrorInfo {
        let (_, code) = self.status_and_code();
        let (message, details) = match self {
            AppError::Configuration { message, details }
            | AppError::Validation { message, details }
            | AppError::KeyExhaustion { message, details }
            | AppError::LinkUnavailable { message, details }
            | AppError::Unauthorized { message, details }
            | AppError::NotFound { message, details }
            | AppError::Conflict { message, details }
            | AppError::Internal { message, details } => (message.clone(), details.clone()),
        };

        ErrorInfo {
            code,
            message,
            details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, _) = self.status_and_code();
        let unauthorized = matches!(self, AppError::Unauthorized { .. });

        let body = ErrorBody {
            error: self.to_error_info(),
        };

        let mut response = (status, Json(body)).into_response();
        if unauthorized {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }
        response
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": db.constraint() }),
            );
        }

        tracing::error!("Database error: {}", e);
        AppError::internal("Database error", json!({}))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Request validation failed", details)
    }
}
