use crate::domain::model::{BlobKind, BlobReference, Claim, Registration};
use crate::transport::http::handlers::{blobs, claims, health, registration};
use crate::transport::http::types::{ApiResponse, RegisterRequest, VerifyRequest, VerifyResponse};
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Largest accepted request body (raw or base64-encoded image).
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        registration::register_handler,
        registration::verify_handler,
        blobs::upload_blob_handler,
        blobs::read_blob_handler,
        claims::get_claim_handler,
        claims::owner_claims_handler
    ),
    components(schemas(
        ApiResponse,
        RegisterRequest,
        VerifyRequest,
        VerifyResponse,
        Registration,
        Claim,
        BlobReference,
        BlobKind
    ))
)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route("/api/register", post(registration::register_handler))
        .route("/api/verify", post(registration::verify_handler))
        .route("/api/blobs", post(blobs::upload_blob_handler))
        .route("/api/blobs/:blob_id", get(blobs::read_blob_handler))
        .route("/api/claims/:claim_id", get(claims::get_claim_handler))
        .route("/api/owners/:address/claims", get(claims::owner_claims_handler))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(app_state)
}
