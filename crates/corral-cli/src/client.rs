//! Daemon client for CLI communication.
//!
//! Provides an HTTP client for connecting to the Corral daemon via its
//! Unix socket.

use anyhow::{Context, Result};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;

/// Daemon client for the Corral service API.
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Creates a new daemon client with the default socket path.
    #[must_use]
    pub fn new() -> Self {
        Self {
            socket_path: default_socket_path(),
        }
    }

    /// Creates a new daemon client with a custom socket path.
    pub fn with_socket(path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the socket path.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Checks if the daemon is running.
    pub async fn is_running(&self) -> bool {
        self.ping().await.is_ok()
    }

    /// Pings the daemon.
    pub async fn ping(&self) -> Result<()> {
        self.request(Method::GET, "/_ping", None::<()>).await?;
        Ok(())
    }

    /// Performs a POST request with a JSON body, parsing the response.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: Option<B>,
    ) -> Result<T> {
        let body = self.request(Method::POST, path, body).await?;
        serde_json::from_slice(&body).context("failed to parse response")
    }

    /// Performs a POST request, discarding the response body.
    pub async fn post_empty<B: Serialize>(&self, path: &str, body: Option<B>) -> Result<()> {
        self.request(Method::POST, path, body).await?;
        Ok(())
    }

    /// Streams a line-delimited response, calling the callback per line.
    ///
    /// Runs until the server closes the stream.
    pub async fn stream_lines<F>(&self, path: &str, mut callback: F) -> Result<()>
    where
        F: FnMut(&str),
    {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .with_context(|| {
                format!(
                    "failed to connect to daemon at {}",
                    self.socket_path.display()
                )
            })?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .context("HTTP handshake failed")?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("stream connection closed: {}", e);
            }
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri(format!("http://localhost{path}"))
            .header("Host", "localhost")
            .body(Full::new(Bytes::new()))
            .context("failed to build request")?;

        let response = sender
            .send_request(request)
            .await
            .context("failed to send request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("daemon returned error {}", status);
        }

        let mut body = response.into_body();
        let mut buffer = Vec::with_capacity(4096);

        while let Some(frame) = body.frame().await {
            let frame = match frame {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!("error reading stream frame: {}", e);
                    break;
                }
            };
            if let Some(data) = frame.data_ref() {
                buffer.extend_from_slice(data);
                while let Some(pos) = buffer.iter().position(|b| *b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line[..line.len() - 1]).into_owned();
                    if !line.is_empty() {
                        callback(&line);
                    }
                }
            }
        }

        // Trailing data without a newline still counts as a line.
        if !buffer.is_empty() {
            callback(&String::from_utf8_lossy(&buffer));
        }

        Ok(())
    }

    /// Performs an HTTP request to the daemon.
    async fn request<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<B>,
    ) -> Result<Bytes> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .with_context(|| {
                format!(
                    "failed to connect to daemon at {}",
                    self.socket_path.display()
                )
            })?;

        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .context("HTTP handshake failed")?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("connection error: {}", e);
            }
        });

        let request = if let Some(body) = body {
            let body_bytes = serde_json::to_vec(&body).context("failed to serialize body")?;
            Request::builder()
                .method(method)
                .uri(format!("http://localhost{path}"))
                .header("Host", "localhost")
                .header("Content-Type", "application/json")
                .header("Content-Length", body_bytes.len())
                .body(Full::new(Bytes::from(body_bytes)))
                .context("failed to build request")?
        } else {
            Request::builder()
                .method(method)
                .uri(format!("http://localhost{path}"))
                .header("Host", "localhost")
                .body(Full::new(Bytes::new()))
                .context("failed to build request")?
        };

        let response = sender
            .send_request(request)
            .await
            .context("failed to send request")?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .context("failed to read response")?
            .to_bytes();

        if !status.is_success() {
            anyhow::bail!("{}", error_message(status, &body));
        }

        Ok(body)
    }
}

impl Default for DaemonClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves the daemon socket path: explicit flag, then the
/// CORRAL_SOCKET environment variable, then the default location.
#[must_use]
pub fn resolve_socket_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Ok(path) = std::env::var("CORRAL_SOCKET") {
        return PathBuf::from(path);
    }
    default_socket_path()
}

fn default_socket_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join(".corral")
        .join("corral.sock")
}

/// Extracts the error envelope message, falling back to the raw body.
fn error_message(status: hyper::StatusCode, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned());
    if detail.is_empty() {
        format!("daemon returned error {status}")
    } else {
        detail
    }
}

/// Gets a daemon client, checking the daemon is reachable first.
pub async fn connect(socket: Option<PathBuf>) -> Result<DaemonClient> {
    let client = DaemonClient::with_socket(resolve_socket_path(socket));

    if !client.is_running().await {
        anyhow::bail!(
            "cannot connect to corral daemon at {}\n\
             Is the daemon running? Start it with: corral-daemon",
            client.socket_path().display()
        );
    }

    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_envelope() {
        let body = br#"{"message": "no such container: web1"}"#;
        assert_eq!(
            error_message(hyper::StatusCode::NOT_FOUND, body),
            "no such container: web1"
        );
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(
            error_message(hyper::StatusCode::INTERNAL_SERVER_ERROR, b"boom"),
            "boom"
        );
        assert_eq!(
            error_message(hyper::StatusCode::INTERNAL_SERVER_ERROR, b""),
            "daemon returned error 500 Internal Server Error"
        );
    }

    #[test]
    fn test_resolve_socket_path_prefers_flag() {
        let path = resolve_socket_path(Some(PathBuf::from("/tmp/custom.sock")));
        assert_eq!(path, PathBuf::from("/tmp/custom.sock"));
    }
}
