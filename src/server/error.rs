//! HTTP API Error Types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::dto::FieldErrorDto;
use crate::error::{BindingError, ConfigError};

/// API error body
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldErrorDto>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            fields: Vec::new(),
        }
    }
}

/// Error returned from handlers
#[derive(Debug)]
pub struct RestError {
    pub status: StatusCode,
    pub error: ApiError,
}

impl RestError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: ApiError::new("NOT_FOUND", message),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new("BAD_REQUEST", message),
        }
    }

    /// One or more arguments failed validation
    pub fn validation(fields: Vec<FieldErrorDto>) -> Self {
        let mut error = ApiError::new(
            "VALIDATION_FAILED",
            format!("{} argument(s) failed validation", fields.len()),
        );
        error.fields = fields;
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            error,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            error: ApiError::new("DATABASE_UNAVAILABLE", message),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({
            "success": false,
            "error": self.error
        }));
        (self.status, body).into_response()
    }
}

// Conversions from domain errors
impl From<BindingError> for RestError {
    fn from(err: BindingError) -> Self {
        RestError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new("BINDING_ERROR", err.to_string()),
        }
    }
}

impl From<ConfigError> for RestError {
    fn from(err: ConfigError) -> Self {
        RestError::unavailable(err.to_string())
    }
}
