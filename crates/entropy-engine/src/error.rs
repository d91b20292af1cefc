//! Error types for entropy-engine

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use entropy_types::DefinitionError;
use serde::Serialize;
use thiserror::Error;

/// Engine-level errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// No registered service with this identifier
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// The service has no control endpoint for this entropy kind
    #[error("Unknown entropy kind '{kind}' for service {service_id}")]
    UnknownEntropyKind { service_id: String, kind: String },

    /// Container action name not recognized
    #[error("Unknown container action: {0}")]
    UnknownContainerAction(String),

    /// The container collaborator has no container for this service
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// Outbound entropy push failed in transport or with a non-2xx status
    #[error("Failed to push entropy to {service_id} at {url}: {reason}")]
    RemotePushFailed {
        service_id: String,
        url: String,
        reason: String,
    },

    /// Scenario step that cannot be executed as declared
    #[error("Invalid step for {service_id}: {reason}")]
    InvalidStep { service_id: String, reason: String },

    /// No loaded scenario with this name
    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    /// Definition files could not be loaded
    #[error("Definition error: {0}")]
    Definitions(#[from] DefinitionError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server startup error
    #[error("Server error: {0}")]
    Server(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// API-specific errors
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Remote entropy push failed
    #[error("Remote push failed: {0}")]
    RemotePush(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::ServiceNotFound(_)
            | EngineError::ScenarioNotFound(_)
            | EngineError::ContainerNotFound(_) => ApiError::NotFound(err.to_string()),
            EngineError::UnknownEntropyKind { .. }
            | EngineError::UnknownContainerAction(_)
            | EngineError::InvalidStep { .. } => ApiError::BadRequest(err.to_string()),
            EngineError::RemotePushFailed { .. } => ApiError::RemotePush(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
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
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::RemotePush(_) => (StatusCode::INTERNAL_SERVER_ERROR, "REMOTE_PUSH_FAILED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::BadRequest("test".to_string()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::RemotePush("test".to_string()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_engine_error_mapping() {
        let err: ApiError = EngineError::ServiceNotFound("payment".into()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = EngineError::UnknownEntropyKind {
            service_id: "payment".into(),
            kind: "jitter".into(),
        }
        .into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = EngineError::UnknownContainerAction("pause".into()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = EngineError::RemotePushFailed {
            service_id: "payment".into(),
            url: "http://payment/entropy/latency".into(),
            reason: "connection refused".into(),
        }
        .into();
        assert!(matches!(err, ApiError::RemotePush(_)));
    }
}
