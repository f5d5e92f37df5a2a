use crate::{
    models::{Document, ErrorResponse, OkResponse, PutDocumentRequest, Version},
    services::doc_store::StoreError,
    state::AppState,
};
use axum::{extract::{Path, State}, http::StatusCode, Json};
use std::sync::Arc;
use tracing::error;

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn store_failure(doc_id: &str, e: StoreError) -> HandlerError {
    error!("Document store failure for '{}': {}", doc_id, e);
    let status = match e {
        StoreError::Timeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
        StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    ErrorResponse::new(status, format!("Document store failure for '{}': {}", doc_id, e))
}

async fn get_doc(state: &AppState, doc_id: &str) -> Result<Json<Document>, HandlerError> {
    state.store.get_document(doc_id).await
        .map(Json)
        .map_err(|e| store_failure(doc_id, e))
}

async fn put_doc(state: &AppState, doc_id: &str, request: PutDocumentRequest) -> Result<Json<OkResponse>, HandlerError> {
    state.store.put_document(doc_id, request.content, request.create_version).await
        .map_err(|e| store_failure(doc_id, e))?;
    Ok(Json(OkResponse { ok: true }))
}

async fn list_versions(state: &AppState, doc_id: &str) -> Result<Json<Vec<Version>>, HandlerError> {
    state.store.list_versions(doc_id).await
        .map(Json)
        .map_err(|e| store_failure(doc_id, e))
}

/// Get the default document, or its empty shape if it was never written
pub async fn doc_get(State(state): State<Arc<AppState>>) -> Result<Json<Document>, HandlerError> {
    get_doc(&state, &state.config.default_doc_id).await
}

/// Overwrite the default document, optionally recording a version
pub async fn doc_put(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PutDocumentRequest>,
) -> Result<Json<OkResponse>, HandlerError> {
    put_doc(&state, &state.config.default_doc_id, request).await
}

/// Version log of the default document
pub async fn doc_versions(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Version>>, HandlerError> {
    list_versions(&state, &state.config.default_doc_id).await
}

pub async fn doc_get_by_id(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
) -> Result<Json<Document>, HandlerError> {
    get_doc(&state, &doc_id).await
}

pub async fn doc_put_by_id(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
    Json(request): Json<PutDocumentRequest>,
) -> Result<Json<OkResponse>, HandlerError> {
    put_doc(&state, &doc_id, request).await
}

pub async fn doc_versions_by_id(
    State(state): State<Arc<AppState>>,
    Path(doc_id): Path<String>,
) -> Result<Json<Vec<Version>>, HandlerError> {
    list_versions(&state, &doc_id).await
}
