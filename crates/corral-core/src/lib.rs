//! Corral core runtime.
//!
//! Wires the container registry to its configuration and the built-in
//! interior factories. The only interior shipped in-tree is the
//! [`supervisor`] process supervisor; other backends plug in through
//! `corral_container::InteriorFactory`.

pub mod config;
pub mod error;
pub mod runtime;
pub mod supervisor;

pub use config::{ApiConfig, Config, LoggingConfig};
pub use error::{CoreError, Result};
pub use runtime::Runtime;
pub use supervisor::ProcessFactory;
