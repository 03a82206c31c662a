use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use fortune_core::ValidationError;

/// Request failures that reach the client. Generation failures never do:
/// they are absorbed by the local fallback.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad input; the received body is echoed back.
    #[error("{source}")]
    Validation {
        source: ValidationError,
        body: Value,
    },

    #[error("invalid proxy signature")]
    Auth,

    #[error("method not allowed")]
    Method,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn validation(source: ValidationError, body: Value) -> Self {
        Self::Validation { source, body }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Auth => StatusCode::UNAUTHORIZED,
            Self::Method => StatusCode::METHOD_NOT_ALLOWED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Auth failures say nothing about why the signature was rejected.
        let body = match self {
            Self::Validation { source, body } => json!({
                "error": source.to_string(),
                "receivedBody": body,
            }),
            Self::Auth => json!({ "error": "Invalid Shopify proxy signature" }),
            Self::Method => json!({ "error": "Method Not Allowed" }),
            Self::Internal(message) => json!({
                "error": "Server error",
                "message": message,
            }),
        };
        (status, Json(body)).into_response()
    }
}
