//! Service API router.
//!
//! Every named request event maps to a POST route of the same name with a
//! JSON payload; typed serde extraction is the payload schema validation.
//! `GET /events` streams the pub/sub broadcasts as JSON lines.

use crate::handlers;
use axum::{
    routing::{get, post},
    Router,
};
use corral_core::Runtime;
use std::sync::Arc;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Corral runtime.
    pub runtime: Arc<Runtime>,
}

/// Creates the service API router with all endpoints.
#[must_use]
pub fn create_router(runtime: Arc<Runtime>) -> Router {
    let state = AppState { runtime };

    Router::new()
        .route("/_ping", get(handlers::ping))
        // Request/response events
        .route("/container.create", post(handlers::create))
        .route("/container.start", post(handlers::start))
        .route("/container.stop", post(handlers::stop))
        .route("/container.destroy", post(handlers::destroy))
        .route("/container.query", post(handlers::query))
        .route("/container.list", post(handlers::list))
        // Pub/sub broadcasts
        .route("/events", get(handlers::events))
        .with_state(state)
}
