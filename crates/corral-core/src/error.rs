//! Error types for the Corral runtime.

use corral_container::ContainerError;
use corral_error::CommonError;
use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in the Corral runtime.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Common error shared across Corral crates.
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Container lifecycle error.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Configuration loading error.
    #[error("configuration error: {0}")]
    ConfigLoad(#[from] figment::Error),
}
