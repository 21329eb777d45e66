//! Corral service API.
//!
//! A request/response dispatcher plus a pub/sub event stream, served over
//! a Unix socket. Each named event (`container.create`, `container.start`,
//! ...) is a route; `/events` streams `container.state`,
//! `container.status`, and `container.error` broadcasts as JSON lines.

pub mod api;
pub mod error;
pub mod handlers;
pub mod server;

pub use api::{create_router, AppState};
pub use error::{ApiError, Result};
pub use server::{ApiServer, ServerConfig};
