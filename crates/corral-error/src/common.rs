//! Common error types shared across Corral crates.

use thiserror::Error;

/// Common errors that occur across multiple Corral crates.
///
/// This enum provides a unified set of error variants for common scenarios
/// like I/O errors, configuration issues, and resource lookup failures.
/// Crate-specific errors should wrap this type using the `#[from]` attribute.
#[derive(Debug, Error)]
pub enum CommonError {
    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    ///
    /// Indicates a missing or malformed configuration, or a configuration
    /// that names an unknown interior backend.
    #[error("configuration error: {0}")]
    Config(String),

    /// Resource not found.
    ///
    /// Used when a requested resource (typically a container id) does not
    /// exist in the system.
    #[error("not found: {0}")]
    NotFound(String),

    /// Resource already exists.
    ///
    /// Used when attempting to create a resource that already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Invalid argument.
    ///
    /// Used when a caller supplies a value outside the accepted domain,
    /// such as a target state that is not a stable state.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid state transition.
    ///
    /// Indicates that an operation was attempted on a resource that is not
    /// in a valid state for that operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Internal error.
    ///
    /// A catch-all for unexpected internal errors. Should include enough
    /// context for debugging.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CommonError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Creates a new already exists error.
    #[must_use]
    pub fn already_exists(resource: impl Into<String>) -> Self {
        Self::AlreadyExists(resource.into())
    }

    /// Creates a new invalid argument error.
    #[must_use]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Creates a new invalid state error.
    #[must_use]
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Creates a new internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Returns true if this is an already exists error.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Returns true if this is an invalid argument error.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let common_err: CommonError = io_err.into();
        assert!(common_err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_not_found_error() {
        let err = CommonError::not_found("container web1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found: container web1");
    }

    #[test]
    fn test_already_exists_error() {
        let err = CommonError::already_exists("container web1");
        assert!(err.is_already_exists());
        assert_eq!(err.to_string(), "already exists: container web1");
    }

    #[test]
    fn test_config_error() {
        let err = CommonError::config("unknown interior: lxd");
        assert!(err.is_config());
        assert_eq!(err.to_string(), "configuration error: unknown interior: lxd");
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CommonError::invalid_argument("target must be a stable state");
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.to_string(),
            "invalid argument: target must be a stable state"
        );
    }

    #[test]
    fn test_internal_error() {
        let err = CommonError::internal("lock poisoned");
        assert_eq!(err.to_string(), "internal error: lock poisoned");
    }
}
