use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use collab_doc::{build_app, config::Config, db::dbdoc::DbDoc, services::doc_store::DocStore, AppState};
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;

async fn test_app() -> Router {
    let store = DocStore::open("sqlite::memory:", 1, Duration::from_secs(5)).await.unwrap();
    build_app(AppState::new(Config::default(), store))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn test_empty_store_returns_default_shape() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/document", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "id": "main-doc-1", "content": null, "versions": [], "comments": [] })
    );
}

#[tokio::test]
async fn test_put_then_get_round_trip() {
    let app = test_app().await;
    let content = json!({"type": "doc", "content": [{"type": "paragraph"}]});

    let (status, body) = send(&app, "PUT", "/api/document", Some(json!({ "content": content }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));

    let (_, doc) = send(&app, "GET", "/api/document", None).await;
    assert_eq!(doc["content"], content);
    assert_eq!(doc["versions"], json!([]));
    assert!(doc["updatedAt"].is_string());
}

#[tokio::test]
async fn test_versions_endpoint_lists_saves_oldest_first() {
    let app = test_app().await;
    for n in 1..=3 {
        let body = json!({ "content": { "n": n }, "createVersion": true });
        send(&app, "PUT", "/api/document", Some(body)).await;
    }
    send(&app, "PUT", "/api/document", Some(json!({ "content": { "n": 4 } }))).await;

    let (status, versions) = send(&app, "GET", "/api/document/versions", None).await;
    assert_eq!(status, StatusCode::OK);
    let versions = versions.as_array().unwrap();
    assert_eq!(versions.len(), 3);
    for (i, v) in versions.iter().enumerate() {
        assert_eq!(v["content"], json!({ "n": i + 1 }));
        assert!(v["versionId"].is_string());
        assert!(v["createdAt"].is_string());
    }
}

#[tokio::test]
async fn test_scoped_documents_are_independent() {
    let app = test_app().await;
    send(&app, "PUT", "/api/documents/notes", Some(json!({ "content": "notes", "createVersion": true }))).await;

    let (_, notes) = send(&app, "GET", "/api/documents/notes", None).await;
    assert_eq!(notes["id"], json!("notes"));
    assert_eq!(notes["content"], json!("notes"));

    let (_, default_doc) = send(&app, "GET", "/api/document", None).await;
    assert!(default_doc["content"].is_null());

    let (_, versions) = send(&app, "GET", "/api/documents/notes/versions", None).await;
    assert_eq!(versions.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_put_body_is_rejected() {
    let app = test_app().await;
    let request = Request::builder()
        .method("PUT")
        .uri("/api/document")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());

    let (_, doc) = send(&app, "GET", "/api/document", None).await;
    assert!(doc["content"].is_null());
}

#[tokio::test]
async fn test_health_ready_and_diagnostics() {
    let app = test_app().await;
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));

    let (status, _) = send(&app, "GET", "/api/ready", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "GET", "/api/v1/diagnostics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["n_conn"], json!(0));
    assert_eq!(body["n_rooms"], json!(0));
}

/// Store whose schema was never created, so every document query fails
async fn app_without_schema() -> Router {
    let db = DbDoc::connect("sqlite::memory:", 1).await.unwrap();
    build_app(AppState::new(Config::default(), DocStore::new(db, Duration::from_secs(5))))
}

fn assert_store_failure(status: StatusCode, body: &Value, doc_id: &str) {
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], json!(500));
    assert_eq!(body["status"], json!(StatusCode::INTERNAL_SERVER_ERROR.to_string()));
    let error = body["error"].as_str().unwrap();
    assert!(error.contains(doc_id), "unexpected error: {}", error);
}

#[tokio::test]
async fn test_store_failures_reach_the_caller() {
    let app = app_without_schema().await;

    let (status, body) = send(&app, "GET", "/api/document", None).await;
    assert_store_failure(status, &body, "main-doc-1");

    let (status, body) = send(&app, "PUT", "/api/document", Some(json!({ "content": "x", "createVersion": true }))).await;
    assert_store_failure(status, &body, "main-doc-1");

    let (status, body) = send(&app, "GET", "/api/document/versions", None).await;
    assert_store_failure(status, &body, "main-doc-1");

    let (status, body) = send(&app, "GET", "/api/documents/notes", None).await;
    assert_store_failure(status, &body, "notes");

    let (status, body) = send(&app, "PUT", "/api/documents/notes", Some(json!({ "content": "x" }))).await;
    assert_store_failure(status, &body, "notes");

    let (status, body) = send(&app, "GET", "/api/documents/notes/versions", None).await;
    assert_store_failure(status, &body, "notes");
}

#[tokio::test]
async fn test_ready_fails_when_store_is_closed() {
    let store = DocStore::open("sqlite::memory:", 1, Duration::from_secs(5)).await.unwrap();
    let state = AppState::new(Config::default(), store);
    let app = build_app(state.clone());
    state.store.close().await;

    let (status, body) = send(&app, "GET", "/api/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], json!("unavailable"));

    let (status, body) = send(&app, "GET", "/api/document", None).await;
    assert_store_failure(status, &body, "main-doc-1");
}
