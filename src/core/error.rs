use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use rust_decimal::Decimal;

use crate::core::money;

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Malformed input rejected before reaching the billing rules
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested transition or edit is not legal from the current status
    #[error("State error: {0}")]
    State(String),

    /// Payment amount rejected against the invoice balance.
    /// Carries the exact balance so the caller can resubmit.
    #[error("Balance error: {message}")]
    Balance { message: String, balance: Decimal },

    /// Quote already linked to an invoice
    #[error("Link error: {0}")]
    Link(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Missing or invalid caller context
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        // Infrastructure details stay in the logs
        let message = match self {
            AppError::Database(_) | AppError::Internal(_) | AppError::Configuration(_) => {
                tracing::error!(error = %self, "Request failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        let mut body = serde_json::json!({
            "error": {
                "message": message,
                "code": status_code.as_u16(),
                "kind": self.kind(),
            }
        });

        if let AppError::Balance { balance, .. } = self {
            body["error"]["balance"] =
                serde_json::Value::String(money::format_amount(*balance));
        }

        HttpResponse::build(status_code).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::State(_) => StatusCode::CONFLICT,
            AppError::Balance { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Link(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn state(msg: impl Into<String>) -> Self {
        AppError::State(msg.into())
    }

    pub fn balance(msg: impl Into<String>, balance: Decimal) -> Self {
        AppError::Balance {
            message: msg.into(),
            balance,
        }
    }

    pub fn link(msg: impl Into<String>) -> Self {
        AppError::Link(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Stable machine-readable error category
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) | AppError::Json(_) => "validation",
            AppError::State(_) => "state",
            AppError::Balance { .. } => "balance",
            AppError::Link(_) => "link",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Database(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                "internal"
            }
        }
    }
}
