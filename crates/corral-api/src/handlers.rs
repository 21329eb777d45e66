//! Request handlers for the service API.

use crate::api::AppState;
use crate::error::Result;
use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::Response;
use axum::Json;
use bytes::Bytes;
use corral_container::{ContainerConfig, ContainerId, Snapshot};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

/// Liveness probe.
pub async fn ping() -> &'static str {
    "OK"
}

/// `container.create` request payload.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    /// Container id, unique within the registry.
    pub id: String,
    /// Container configuration.
    pub conf: ContainerConfig,
}

/// Create a container and begin loading it.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateRequest>,
) -> Result<Json<Value>> {
    state.runtime.registry().create(req.id, &req.conf)?;
    Ok(Json(json!({})))
}

/// Request payload carrying just a container id.
#[derive(Debug, Deserialize)]
pub struct IdRequest {
    /// Container id.
    pub id: String,
}

/// `container.stop` request payload.
#[derive(Debug, Deserialize)]
pub struct StopRequest {
    /// Container id.
    pub id: String,
    /// Forceful stop; forwarded to the interior.
    #[serde(default)]
    pub force: bool,
}

/// Start a container.
pub async fn start(
    State(state): State<AppState>,
    Json(req): Json<IdRequest>,
) -> Result<Json<Value>> {
    let id = ContainerId::from_string(req.id);
    state.runtime.registry().start(&id)?;
    Ok(Json(json!({})))
}

/// Stop a container.
pub async fn stop(
    State(state): State<AppState>,
    Json(req): Json<StopRequest>,
) -> Result<Json<Value>> {
    let id = ContainerId::from_string(req.id);
    state.runtime.registry().stop(&id, req.force)?;
    Ok(Json(json!({})))
}

/// Destroy a container. The entry disappears from listings once the
/// engine settles at offline.
pub async fn destroy(
    State(state): State<AppState>,
    Json(req): Json<IdRequest>,
) -> Result<Json<Value>> {
    let id = ContainerId::from_string(req.id);
    state.runtime.registry().destroy(&id)?;
    Ok(Json(json!({})))
}

/// Query a container's snapshot.
pub async fn query(
    State(state): State<AppState>,
    Json(req): Json<IdRequest>,
) -> Result<Json<Snapshot>> {
    let id = ContainerId::from_string(req.id);
    Ok(Json(state.runtime.registry().query(&id)?))
}

/// `container.list` response payload.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    /// The current set of container ids.
    pub ids: Vec<String>,
}

/// List container ids. Not a consistent snapshot across entries.
pub async fn list(State(state): State<AppState>) -> Result<Json<ListResponse>> {
    let ids = state
        .runtime
        .registry()
        .list()
        .iter()
        .map(ToString::to_string)
        .collect();
    Ok(Json(ListResponse { ids }))
}

/// Stream pub/sub broadcasts as JSON lines.
///
/// Fire-and-forget semantics: a consumer that lags far enough behind the
/// broadcast capacity loses the overwritten events and the stream says so
/// in the log.
pub async fn events(State(state): State<AppState>) -> Response {
    let rx = state.runtime.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|event| async move {
        match event {
            Ok(event) => {
                let mut line = serde_json::to_vec(&event).ok()?;
                line.push(b'\n');
                Some(Ok::<_, std::convert::Infallible>(Bytes::from(line)))
            }
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                tracing::warn!(missed, "event stream consumer lagged");
                None
            }
        }
    });

    Response::builder()
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}
