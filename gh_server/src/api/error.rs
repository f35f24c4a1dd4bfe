//! Uniform error-to-HTTP mapping for all handlers.
//!
//! Handlers return `Result<_, ApiError>`; this module is the only place
//! that decides status codes and response bodies, so endpoints cannot
//! drift apart in how they report failures.
//!
//! Body shapes:
//! - field-level failures: `{"message": ..., "errors": {"field": ["reason"]}}`
//! - everything else: `{"message": ...}`
//! - internal failures are logged and reduced to a generic 500 body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gatehouse::cache::CacheError;
use gatehouse::crypto::CryptoError;
use gatehouse::hasher::SubmitError;
use gatehouse::store::StoreError;
use gatehouse::token::TokenError;
use serde_json::json;
use std::collections::HashMap;

/// User-facing HTTP error. Construct one to control exactly what the
/// client sees; anything converted from an unexpected internal error
/// becomes a generic 500.
#[derive(Debug)]
pub enum ApiError {
    /// Field-level failures rendered as `errors: {field: [reasons...]}`
    Fields {
        status: StatusCode,
        message: String,
        errors: HashMap<String, Vec<String>>,
    },

    /// An explicit status with a single message
    Client { status: StatusCode, message: String },

    /// Anything else; the cause is logged, never exposed
    Internal(anyhow::Error),
}

impl ApiError {
    /// Explicit client error with the given status and message.
    pub fn client(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError::Client {
            status,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::client(StatusCode::UNAUTHORIZED, message)
    }

    /// Single-field error, used for validation-shaped failures outside the
    /// extractor (duplicate email, breached password).
    pub fn field(
        status: StatusCode,
        message: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ApiError::Fields {
            status,
            message: message.into(),
            errors: HashMap::from([(field.into(), vec![reason.into()])]),
        }
    }

    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Fields {
                status,
                message,
                errors,
            } => (status, Json(json!({ "message": message, "errors": errors }))).into_response(),
            ApiError::Client { status, message } => {
                (status, Json(json!({ "message": message }))).into_response()
            }
            ApiError::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for (field, failures) in errors.field_errors() {
            let reasons = failures
                .iter()
                .map(|failure| {
                    failure
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("is not a valid {}", failure.code))
                })
                .collect();
            fields.insert(field.to_string(), reasons);
        }
        ApiError::Fields {
            status: StatusCode::BAD_REQUEST,
            message: "validation failed".to_string(),
            errors: fields,
        }
    }
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::QueueFull => {
                crate::metrics::hasher_queue_rejections_total();
                Self::client(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "service busy, try again later",
                )
            }
            SubmitError::Closed => Self::internal(err),
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        // Sub-cases (malformed, expired, wrong kind, revoked) are never
        // distinguished to the client.
        tracing::debug!(error = %err, "token rejected");
        Self::unauthorized("invalid or expired token")
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EmailTaken => Self::field(
                StatusCode::CONFLICT,
                "email already exists",
                "email",
                "email already exists",
            ),
            StoreError::NotFound => Self::client(StatusCode::NOT_FOUND, "not found"),
            StoreError::Database(_) => Self::internal(err),
        }
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        Self::internal(err)
    }
}

impl From<CacheError> for ApiError {
    fn from(err: CacheError) -> Self {
        Self::internal(err)
    }
}
