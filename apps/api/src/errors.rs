use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::curation::session::CurationError;
use crate::parser_client::ParserError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Parser error: {0}")]
    Parser(#[from] ParserError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<CurationError> for AppError {
    fn from(err: CurationError) -> Self {
        match err {
            CurationError::UnknownSession(_) | CurationError::UnknownSuggestion(_) => {
                AppError::NotFound(err.to_string())
            }
            CurationError::NoModeSelected | CurationError::EmptyMessage => {
                AppError::Validation(err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Parser(e) => {
                tracing::warn!("Parser error: {e}");
                let status = match e {
                    ParserError::Rejected { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    ParserError::Http(_) => StatusCode::BAD_GATEWAY,
                };
                (status, "PARSER_ERROR", e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
