//! Error types for container lifecycle management.

use crate::interior::InteriorError;
use crate::state::{ContainerState, StableState};
use corral_error::CommonError;
use thiserror::Error;

/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

/// Errors that can occur in container lifecycle management.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Common error shared across Corral crates.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// The interior diverged from the accepted transition path.
    ///
    /// Carries the expectation the engine was driving toward, the stable
    /// state the interior actually reported, and the set of states the
    /// active plan accepted.
    #[error("transition failed: expected {expectation}, interior reported {actual}")]
    TransitionFailed {
        /// The stable state the engine was driving toward.
        expectation: StableState,
        /// The stable state the interior actually reported.
        actual: StableState,
        /// The states the active plan accepted.
        accepts: Vec<ContainerState>,
    },

    /// Backend-originated error, passed through unchanged.
    #[error("interior error: {0}")]
    Interior(#[from] InteriorError),
}

impl ContainerError {
    /// Creates a not found error for a container id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::Common(CommonError::not_found(format!("container {}", id.into())))
    }

    /// Creates a conflict error for a container id.
    #[must_use]
    pub fn conflict(id: impl Into<String>) -> Self {
        Self::Common(CommonError::already_exists(format!(
            "container {}",
            id.into()
        )))
    }

    /// Creates an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::Common(CommonError::config(msg))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Common(CommonError::internal(msg))
    }
}
