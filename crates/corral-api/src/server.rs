//! Service API server.

use crate::api::create_router;
use crate::error::{ApiError, Result};
use axum::Router;
use corral_core::Runtime;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use hyper_util::service::TowerToHyperService;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::{UnixListener, UnixStream};
use tower_http::trace::TraceLayer;

/// Service API server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Unix socket path.
    pub socket_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            socket_path: corral_core::config::default_socket_path(),
        }
    }
}

/// Service API server over a Unix socket.
pub struct ApiServer {
    config: ServerConfig,
    runtime: Arc<Runtime>,
}

impl ApiServer {
    /// Creates a new API server.
    #[must_use]
    pub const fn new(config: ServerConfig, runtime: Arc<Runtime>) -> Self {
        Self { config, runtime }
    }

    /// Returns the socket path.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Runs the server until the accept loop fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound or accepting fails.
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind()?;
        tracing::info!(
            "service API listening on {}",
            self.config.socket_path.display()
        );

        let app = create_router(Arc::clone(&self.runtime)).layer(TraceLayer::new_for_http());

        loop {
            let (stream, _) = listener
                .accept()
                .await
                .map_err(|e| ApiError::Internal(format!("accept failed: {e}")))?;
            tokio::spawn(serve_connection(stream, app.clone()));
        }
    }

    /// Prepares the socket: creates the parent directory and clears a
    /// stale socket left by a previous run.
    fn bind(&self) -> Result<UnixListener> {
        let path = &self.config.socket_path;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ApiError::Internal(format!("failed to create socket dir: {e}")))?;
        }

        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!("removed stale socket {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ApiError::Internal(format!(
                    "failed to remove stale socket {}: {e}",
                    path.display()
                )));
            }
        }

        UnixListener::bind(path)
            .map_err(|e| ApiError::Internal(format!("failed to bind {}: {e}", path.display())))
    }
}

/// Serves one client connection to completion.
async fn serve_connection(stream: UnixStream, router: Router) {
    let served = http1::Builder::new()
        .serve_connection(TokioIo::new(stream), TowerToHyperService::new(router))
        .await;

    match served {
        Ok(()) => {}
        Err(err) if err.is_incomplete_message() || is_disconnect(&err) => {
            // Routine client hangup on a local socket.
            tracing::debug!("client went away: {err}");
        }
        Err(err) => tracing::error!("error serving connection: {err}"),
    }
}

/// Walks the error source chain looking for an I/O disconnect.
fn is_disconnect(err: &hyper::Error) -> bool {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return matches!(
                io.kind(),
                ErrorKind::ConnectionReset | ErrorKind::BrokenPipe | ErrorKind::NotConnected
            );
        }
        source = cause.source();
    }
    false
}
