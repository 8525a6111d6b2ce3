use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use sea_orm::DbErr;
use thiserror::Error;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;

/// Errors a request handler can end with.
///
/// Validation problems are not errors: they are reported inline on the
/// re-rendered form context instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{entity} with ID {id} not found")]
    NotFound { entity: &'static str, id: i32 },

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl AppError {
    pub fn not_found(entity: &'static str, id: i32) -> Self {
        Self::NotFound { entity, id }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, code) = match &self {
            AppError::NotFound { .. } => {
                warn!("{}", self);
                (StatusCode::NOT_FOUND, self.to_string(), "NOT_FOUND")
            }
            AppError::Database(db_error) => {
                error!("Database error while handling request: {}", db_error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "DATABASE_ERROR",
                )
            }
            AppError::PasswordHash(reason) => {
                error!("Password hashing failed: {}", reason);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "PASSWORD_HASH_ERROR",
                )
            }
        };

        let body = ErrorResponse {
            error,
            code: code.to_string(),
            success: false,
        };

        (status, Json(body)).into_response()
    }
}
