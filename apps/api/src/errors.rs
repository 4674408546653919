use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by the Course API.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The service cannot do the work at all, e.g. no text-generation keys.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR"),
            AppError::Store(StoreError::Api { .. } | StoreError::Http(_)) => {
                (StatusCode::BAD_GATEWAY, "STORE_UNAVAILABLE")
            }
            AppError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Client errors echo their message; server-side details stay in the log.
        let message = match &self {
            AppError::NotFound(msg) | AppError::Validation(msg) | AppError::Configuration(msg) => {
                msg.clone()
            }
            AppError::Store(_) => "The course store is unavailable".to_string(),
        };
        if status.is_server_error() {
            tracing::error!(code, "{self}");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
