use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::payment::PaymentError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Payment error: {0}")]
    Payment(String),
    #[error("Payment provider error: {0}")]
    PaymentProvider(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Payment(msg) => (StatusCode::PAYMENT_REQUIRED, msg),
            AppError::PaymentProvider(msg) => (StatusCode::BAD_GATEWAY, msg),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<PaymentError> for AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            e @ (PaymentError::InvalidAmount(_)
            | PaymentError::AmountTooLarge(_)
            | PaymentError::InvalidIntentId) => AppError::BadRequest(e.to_string()),
            PaymentError::Provider { message } => AppError::Payment(message),
            PaymentError::Http(e) => AppError::PaymentProvider(e.to_string()),
            e @ PaymentError::InvalidUrl(_) => AppError::Internal(e.to_string()),
        }
    }
}
