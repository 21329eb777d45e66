//! Error types for the service API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use corral_container::ContainerError;
use corral_error::CommonError;
use thiserror::Error;

/// Result type alias for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors surfaced in a service response envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No container with the given id.
    #[error("no such container: {0}")]
    NotFound(String),

    /// A container with the given id already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The configuration cannot resolve an interior.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A request parameter is outside the accepted domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal server error.
    #[error("server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidConfig(_) | Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ContainerError> for ApiError {
    fn from(err: ContainerError) -> Self {
        match err {
            ContainerError::Common(CommonError::NotFound(msg)) => Self::NotFound(msg),
            ContainerError::Common(CommonError::AlreadyExists(msg)) => Self::Conflict(msg),
            ContainerError::Common(CommonError::Config(msg)) => Self::InvalidConfig(msg),
            ContainerError::Common(CommonError::InvalidArgument(msg)) => {
                Self::InvalidArgument(msg)
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "message": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::InvalidConfig("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidArgument("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_container_error_mapping() {
        let err: ApiError = ContainerError::not_found("web1").into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = ContainerError::conflict("web1").into();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err: ApiError = ContainerError::invalid_config("unknown interior").into();
        assert!(matches!(err, ApiError::InvalidConfig(_)));
    }
}
