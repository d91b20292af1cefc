//! Error types for shop-services

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Service-level errors
#[derive(Debug, Error)]
pub enum ShopError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by the payment and checkout endpoints
#[derive(Debug, Error)]
pub enum ApiError {
    /// The payment breaker is open
    #[error("Payment service is unavailable")]
    PaymentUnavailable,

    /// Every payment attempt failed
    #[error("Payment service timed out")]
    PaymentTimedOut,

    /// The simulated provider declined the authorization
    #[error("Payment authorization failed for {0}")]
    AuthorizationFailed(String),

    /// Any other failure
    #[error("Checkout failed: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::PaymentUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, "PAYMENT_UNAVAILABLE")
            }
            ApiError::PaymentTimedOut => (StatusCode::GATEWAY_TIMEOUT, "PAYMENT_TIMEOUT"),
            ApiError::AuthorizationFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "AUTHORIZATION_FAILED")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for shop service operations
pub type ShopResult<T> = Result<T, ShopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_error_status_codes() {
        assert_eq!(
            ApiError::PaymentUnavailable.into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::PaymentTimedOut.into_response().status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::Internal("bad body".into())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
