use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Document store reachable", body = HealthResponse),
        (status = 503, description = "Document store unavailable", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Fetch the shared document
#[utoipa::path(
    get,
    path = "/api/document",
    responses(
        (status = 200, description = "The document, or its empty shape if never written", body = Document),
        (status = 500, description = "Document store failure", body = ErrorResponse),
        (status = 503, description = "Document store timed out", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_get_doc() {}

/// Overwrite the shared document
#[utoipa::path(
    put,
    path = "/api/document",
    request_body = PutDocumentRequest,
    responses(
        (status = 200, description = "Document stored", body = OkResponse),
        (status = 500, description = "Document store failure", body = ErrorResponse),
        (status = 503, description = "Document store timed out", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_put_doc() {}

/// List the version log of the shared document
#[utoipa::path(
    get,
    path = "/api/document/versions",
    responses(
        (status = 200, description = "Versions, oldest first", body = [Version]),
        (status = 500, description = "Document store failure", body = ErrorResponse),
        (status = 503, description = "Document store timed out", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_versions_doc() {}

/// Fetch a document by id
#[utoipa::path(
    get,
    path = "/api/documents/{doc_id}",
    params(("doc_id" = String, Path, description = "Document identifier")),
    responses(
        (status = 200, description = "The document, or its empty shape if never written", body = Document),
        (status = 500, description = "Document store failure", body = ErrorResponse),
        (status = 503, description = "Document store timed out", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_get_by_id_doc() {}

/// Overwrite a document by id
#[utoipa::path(
    put,
    path = "/api/documents/{doc_id}",
    params(("doc_id" = String, Path, description = "Document identifier")),
    request_body = PutDocumentRequest,
    responses(
        (status = 200, description = "Document stored", body = OkResponse),
        (status = 500, description = "Document store failure", body = ErrorResponse),
        (status = 503, description = "Document store timed out", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_put_by_id_doc() {}

/// List the version log of a document by id
#[utoipa::path(
    get,
    path = "/api/documents/{doc_id}/versions",
    params(("doc_id" = String, Path, description = "Document identifier")),
    responses(
        (status = 200, description = "Versions, oldest first", body = [Version]),
        (status = 500, description = "Document store failure", body = ErrorResponse),
        (status = 503, description = "Document store timed out", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn doc_versions_by_id_doc() {}

/// Relay diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Relay and process statistics", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        doc_get_doc,
        doc_put_doc,
        doc_versions_doc,
        doc_get_by_id_doc,
        doc_put_by_id_doc,
        doc_versions_by_id_doc,
        diagnostics_doc,
    ),
    components(
        schemas(
            HealthResponse,
            Document,
            Version,
            PutDocumentRequest,
            OkResponse,
            ErrorResponse,
            DiagnosticsResponse,
        )
    ),
    tags(
        (name = "api", description = "API endpoints")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/health",
            "/api/ready",
            "/api/document",
            "/api/document/versions",
            "/api/documents/{doc_id}",
            "/api/documents/{doc_id}/versions",
            "/api/v1/diagnostics",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
