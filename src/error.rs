//! API error type and its JSON rendering.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::error;
use validator::ValidationErrors;

use crate::application::services::LinkError;
use crate::domain::repositories::StoreError;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Error payload: `{ "error": { "code", "message", "details" } }`.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    NotFound { message: String, details: Value },
    Internal { message: String, details: Value },
    Unavailable { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
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
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn to_error_info(self) -> ErrorInfo {
        let (code, message, details) = match self {
            AppError::Validation { message, details } => ("validation_error", message, details),
            AppError::NotFound { message, details } => ("not_found", message, details),
            AppError::Internal { message, details } => ("internal_error", message, details),
            AppError::Unavailable { message, details } => ("unavailable", message, details),
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
        let status = self.status();
        let body = ErrorBody {
            error: self.to_error_info(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        let details = serde_json::to_value(&errors).unwrap_or_else(|_| json!({}));
        AppError::bad_request("Request validation failed", details)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => AppError::not_found("Record not found", json!({})),
            // Short code races are retried by the link service; one reaching
            // this point is a store inconsistency.
            StoreError::UniqueViolation { constraint } => {
                error!(?constraint, "Unexpected unique constraint violation");
                AppError::internal("Database error", json!({}))
            }
            StoreError::Unavailable(reason) => {
                error!(%reason, "Store unavailable");
                AppError::unavailable("Storage unavailable", json!({}))
            }
            StoreError::Database(e) => {
                error!(error = %e, "Database error");
                AppError::internal("Database error", json!({}))
            }
        }
    }
}

impl From<LinkError> for AppError {
    fn from(e: LinkError) -> Self {
        match e {
            LinkError::InvalidUrl(reason) => AppError::bad_request(
                "Invalid URL",
                json!({ "long_url": reason.to_string() }),
            ),
            LinkError::NotFound => AppError::not_found("Short link not found", json!({})),
            LinkError::ExhaustedRetries { attempts } => {
                error!(attempts, "Short code space exhausted for this request");
                AppError::internal(
                    "Could not generate a unique short code",
                    json!({ "attempts": attempts }),
                )
            }
            LinkError::RandomSource(e) => {
                error!(error = %e, "Random source failure");
                AppError::internal("Could not generate a short code", json!({}))
            }
            LinkError::Store(e) => AppError::from(e),
        }
    }
}
