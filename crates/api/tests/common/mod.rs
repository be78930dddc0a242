#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use wizflow_api::config::{Environment, ServerConfig};
use wizflow_api::router::build_app_router;
use wizflow_api::state::AppState;
use wizflow_core::store::InMemoryWorkflowStore;
use wizflow_core::upload::UploadConfig;

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "wizflow-test-boundary";

/// A router over a fresh in-memory store. The upload directory lives as
/// long as this value.
pub struct TestApp {
    pub router: Router,
    pub upload_dir: TempDir,
}

/// Build a test `ServerConfig` with safe defaults, writing uploads into
/// `upload_dir`.
pub fn test_config(upload_dir: &TempDir) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:8080".to_string()],
        request_timeout_secs: 30,
        database_url: None,
        upload_dir: upload_dir.path().to_path_buf(),
        uploads_url_prefix: "/uploads".to_string(),
        upload: UploadConfig::default(),
        environment: Environment::Production,
    }
}

/// Build the full application router (same middleware stack as
/// `main.rs`) over an empty in-memory store.
pub fn build_test_app() -> TestApp {
    build_test_app_with(|_| {})
}

/// Like [`build_test_app`] but lets the caller tweak the config first.
pub fn build_test_app_with(tweak: impl FnOnce(&mut ServerConfig)) -> TestApp {
    let upload_dir = tempfile::tempdir().expect("tempdir");
    let mut config = test_config(&upload_dir);
    tweak(&mut config);

    let state = AppState {
        store: Arc::new(InMemoryWorkflowStore::new()),
        config: Arc::new(config.clone()),
    };

    TestApp {
        router: build_app_router(state, &config),
        upload_dir,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: &Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::POST, uri, body).await
}

pub async fn put_json(app: &Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    json_request(app, Method::PUT, uri, body).await
}

async fn json_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

/// POST a multipart body built from `(file name, content type, bytes)` parts,
/// all under the `files` field.
pub async fn post_files(app: &Router, uri: &str, files: &[(&str, &str, Vec<u8>)]) -> Response<Body> {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(files)))
        .unwrap();
    send(app, request).await
}

pub fn multipart_body(files: &[(&str, &str, Vec<u8>)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content_type, bytes) in files {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = body_bytes(response).await;
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

/// A minimal valid create body.
pub fn workflow_body(name: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "source": { "type": "file", "config": {} },
    })
}

/// Create a workflow through the API and return its id.
pub async fn create_workflow(app: &Router, name: &str) -> i64 {
    let response = post_json(app, "/api/workflows", workflow_body(name)).await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
