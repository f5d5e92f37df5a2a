use crate::{
    handlers::{
        diagnostics, doc_get, doc_get_by_id, doc_put, doc_put_by_id, doc_versions,
        doc_versions_by_id, health_check, ready_check,
    },
    state::AppState,
    websocket::handler::{websocket_document_handler, websocket_handler},
};
use axum::{routing::get, Router};
use std::sync::Arc;

/// Create API routes
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    Router::<Arc<AppState>>::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/v1/diagnostics", get(diagnostics))
        .route("/document", get(doc_get).put(doc_put))
        .route("/document/versions", get(doc_versions))
        .route("/documents/:doc_id", get(doc_get_by_id).put(doc_put_by_id))
        .route("/documents/:doc_id/versions", get(doc_versions_by_id))
        .route("/ws", get(websocket_handler))
        .route("/ws/:doc_id", get(websocket_document_handler))
        .with_state(state)
}
