//! Integration tests for the service API handlers.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use corral_api::create_router;
use corral_core::{Config, Runtime};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

/// Creates a test runtime with a temporary data directory.
async fn create_test_runtime() -> (Arc<Runtime>, TempDir) {
    let tmp_dir = TempDir::new().expect("failed to create temp dir");
    let config = Config {
        data_dir: tmp_dir.path().to_path_buf(),
        ..Default::default()
    };
    let runtime = Arc::new(Runtime::new(config).expect("failed to create runtime"));
    runtime.init().await.expect("failed to init runtime");
    (runtime, tmp_dir)
}

fn post_json(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn sleeper_conf() -> Value {
    json!({
        "interior": "process",
        "command": ["/bin/sh", "-c", "sleep 30"],
    })
}

/// Polls `container.query` until the container reports the wanted state.
async fn wait_for_state(runtime: &Arc<Runtime>, id: &str, state: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let app = create_router(Arc::clone(runtime));
        let response = app
            .oneshot(post_json("/container.query", json!({"id": id})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let snapshot = body_json(response).await;
        if snapshot["state"] == state {
            return;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "container {id} never reached {state}, last snapshot: {snapshot}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn test_ping() {
    let (runtime, _tmp) = create_test_runtime().await;
    let app = create_router(runtime);

    let response = app
        .oneshot(Request::builder().uri("/_ping").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_query_list() {
    let (runtime, _tmp) = create_test_runtime().await;

    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json(
            "/container.create",
            json!({"id": "web1", "conf": sleeper_conf()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The engine auto-advances through loading to stopped.
    wait_for_state(&runtime, "web1", "stopped").await;

    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json("/container.query", json!({"id": "web1"})))
        .await
        .unwrap();
    let snapshot = body_json(response).await;
    assert_eq!(snapshot["id"], "web1");
    assert_eq!(snapshot["interiorState"], "stopped");

    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json("/container.list", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let list = body_json(response).await;
    assert_eq!(list["ids"], json!(["web1"]));
}

#[tokio::test]
async fn test_create_conflict() {
    let (runtime, _tmp) = create_test_runtime().await;

    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json(
            "/container.create",
            json!({"id": "dup", "conf": sleeper_conf()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json(
            "/container.create",
            json!({"id": "dup", "conf": sleeper_conf()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = body_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("dup"));
}

#[tokio::test]
async fn test_create_with_unknown_interior_is_invalid_config() {
    let (runtime, _tmp) = create_test_runtime().await;

    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json(
            "/container.create",
            json!({"id": "weird", "conf": {"interior": "teleporter"}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // The engine was never instantiated.
    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json("/container.list", json!({})))
        .await
        .unwrap();
    let list = body_json(response).await;
    assert_eq!(list["ids"], json!([]));
}

#[tokio::test]
async fn test_operations_on_unknown_id_return_not_found() {
    let (runtime, _tmp) = create_test_runtime().await;

    for path in ["/container.start", "/container.destroy", "/container.query"] {
        let app = create_router(Arc::clone(&runtime));
        let response = app
            .oneshot(post_json(path, json!({"id": "ghost"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{path}");
        let body = body_json(response).await;
        assert!(body["message"].as_str().unwrap().contains("ghost"));
    }

    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json(
            "/container.stop",
            json!({"id": "ghost", "force": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_start_stop_destroy_lifecycle() {
    let (runtime, _tmp) = create_test_runtime().await;

    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json(
            "/container.create",
            json!({"id": "web1", "conf": sleeper_conf()}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    wait_for_state(&runtime, "web1", "stopped").await;

    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json("/container.start", json!({"id": "web1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    wait_for_state(&runtime, "web1", "running").await;

    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json(
            "/container.stop",
            json!({"id": "web1", "force": true}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    wait_for_state(&runtime, "web1", "stopped").await;

    let app = create_router(Arc::clone(&runtime));
    let response = app
        .oneshot(post_json("/container.destroy", json!({"id": "web1"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Eviction follows the terminal offline transition.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let app = create_router(Arc::clone(&runtime));
        let response = app
            .oneshot(post_json("/container.list", json!({})))
            .await
            .unwrap();
        let list = body_json(response).await;
        if list["ids"] == json!([]) {
            break;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "container was not evicted: {list}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
