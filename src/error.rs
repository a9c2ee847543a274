use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Reward is not active")]
    Inactive,

    #[error("Insufficient EcoPoints: {required} required, {available} available")]
    InsufficientBalance { required: i64, available: i64 },

    #[error("Reward is out of stock")]
    OutOfStock,

    #[error("Reward has already been used")]
    AlreadyUsed,

    #[error("Reward has expired")]
    Expired,

    #[error("{0}")]
    Validation(String),

    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Could not allocate a unique redemption code")]
    CodeExhausted,
}

impl AppError {
    /// Stable machine-readable kind sent alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) | AppError::Migration(_) | AppError::CodeExhausted => "internal",
            AppError::NotFound(_) => "not_found",
            AppError::Inactive => "inactive",
            AppError::InsufficientBalance { .. } => "insufficient_balance",
            AppError::OutOfStock => "out_of_stock",
            AppError::AlreadyUsed => "already_used",
            AppError::Expired => "expired",
            AppError::Validation(_) => "validation_error",
            AppError::Conflict(_) => "conflict",
            AppError::Unauthorized | AppError::InvalidSignature => "unauthorized",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Database(_) | AppError::Migration(_) | AppError::CodeExhausted => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Inactive
            | AppError::InsufficientBalance { .. }
            | AppError::Expired
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::OutOfStock | AppError::AlreadyUsed | AppError::Conflict(_) => {
                StatusCode::CONFLICT
            }
            AppError::Unauthorized | AppError::InvalidSignature => StatusCode::UNAUTHORIZED,
        }
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::Migration(ref e) => {
                tracing::error!("Migration error: {:?}", e);
                "Internal server error".to_string()
            }
            AppError::CodeExhausted => {
                tracing::error!("Redemption code allocation failed");
                "Internal server error".to_string()
            }
            ref other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.kind(),
            "message": message,
        }));

        (self.status(), body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
