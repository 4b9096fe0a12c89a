use crate::infra::cancel::CancelSignal;
use crate::transport::http::handlers::common::{error_response, not_found};
use crate::transport::http::types::{ApiResponse, AppState};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/blobs",
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Stored; data is the BlobReference", body = ApiResponse),
        (status = 400, description = "Empty body", body = ApiResponse),
        (status = 503, description = "Every publisher failed; data.failures lists them", body = ApiResponse)
    )
)]
pub async fn upload_blob_handler(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let coordinator = &state.coordinator;
    match coordinator
        .uploader()
        .upload(
            &body,
            coordinator.endpoints(),
            coordinator.epochs(),
            &CancelSignal::never(),
        )
        .await
    {
        Ok(blob) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!(blob))),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/blobs/{blob_id}",
    params(
        ("blob_id" = String, Path, description = "Storage blob id")
    ),
    responses(
        (status = 200, description = "Raw blob bytes", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 404, description = "No aggregator has the blob", body = ApiResponse),
        (status = 503, description = "Every aggregator failed", body = ApiResponse)
    )
)]
pub async fn read_blob_handler(
    State(state): State<AppState>,
    Path(blob_id): Path<String>,
) -> impl IntoResponse {
    match state.reader.fetch(&blob_id).await {
        Ok(Some(bytes)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            bytes,
        )
            .into_response(),
        Ok(None) => not_found(format!("Blob '{}' not found", blob_id)),
        Err(e) => error_response(e),
    }
}
