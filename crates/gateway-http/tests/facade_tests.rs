//! Facade tests driving the router directly with `tower::ServiceExt`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use gateway_http::{router, AppState};
use gateway_registry::Registry;
use gateway_worker::{ManagerSettings, WorkerManager};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_app(dir: &TempDir) -> Router {
    let registry = Registry::load(dir.path().join("servers.yaml")).unwrap();
    let settings = ManagerSettings {
        call_timeout: Duration::from_secs(5),
        stop_grace: Duration::from_secs(2),
        handshake: false,
    };
    let state: AppState = Arc::new(WorkerManager::new(registry, settings));
    router(state)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn register_then_status_and_list() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let response = app
        .clone()
        .oneshot(post_json(
            "/servers/register",
            json!({
                "name": "nocodb",
                "command": "python server.py",
                "description": "NocoDB worker",
                "env_vars": {"API_KEY": "token"}
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/servers/nocodb/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["name"], "nocodb");
    assert_eq!(body["status"], "registered");
    assert_eq!(body["enabled"], true);

    let response = app.oneshot(get("/servers")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["servers"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn status_of_unknown_server_is_404() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let response = app.clone().oneshot(get("/servers/ghost/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(post_json(
            "/call",
            json!({"server": "ghost", "method": "tools/list"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn health_reports_counts() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    app.clone()
        .oneshot(post_json(
            "/servers/register",
            json!({"name": "a", "command": "true"}),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["total_servers"], 1);
    assert_eq!(body["running_servers"], 0);
    assert_eq!(body["servers"]["a"], "registered");
}

#[cfg(unix)]
#[tokio::test]
async fn call_round_trips_through_a_real_worker() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let script = dir.path().join("echo.sh");
    std::fs::write(
        &script,
        "while read line; do printf '%s\\n' '{\"jsonrpc\":\"2.0\",\"id\":\"1\",\"result\":{\"echo\":true}}'; done\n",
    )
    .unwrap();

    app.clone()
        .oneshot(post_json(
            "/servers/register",
            json!({"name": "echo", "command": format!("sh {}", script.display())}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            "/call",
            json!({"server": "echo", "method": "echo", "params": {}}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["server"], "echo");
    assert_eq!(body["result"], json!({"echo": true}));
    assert!(body["duration"].as_f64().unwrap() >= 0.0);

    let response = app
        .oneshot(post_json("/servers/echo/stop", json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[cfg(unix)]
#[tokio::test]
async fn tool_shortcut_accepts_empty_body() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    let script = dir.path().join("echo.sh");
    std::fs::write(
        &script,
        "while read line; do printf '%s\\n' '{\"jsonrpc\":\"2.0\",\"id\":\"1\",\"result\":{\"echo\":true}}'; done\n",
    )
    .unwrap();

    app.clone()
        .oneshot(post_json(
            "/servers/register",
            json!({"name": "echo", "command": format!("sh {}", script.display())}),
        ))
        .await
        .unwrap();

    // No body and no content-type: arguments default to an empty map.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/tools/echo/list_bases")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["result"], json!({"echo": true}));

    app.oneshot(post_json("/servers/echo/stop", json!({})))
        .await
        .unwrap();
}

#[tokio::test]
async fn unregister_removes_server() {
    let dir = TempDir::new().unwrap();
    let app = test_app(&dir);

    app.clone()
        .oneshot(post_json(
            "/servers/register",
            json!({"name": "a", "command": "true"}),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/servers/a")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/servers/a/status")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
