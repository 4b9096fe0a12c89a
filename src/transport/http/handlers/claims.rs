use crate::transport::http::handlers::common::{error_response, not_found};
use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    get,
    path = "/api/claims/{claim_id}",
    params(
        ("claim_id" = String, Path, description = "Claim object id (0x...)")
    ),
    responses(
        (status = 200, description = "Live claim object", body = ApiResponse),
        (status = 404, description = "No such object", body = ApiResponse),
        (status = 502, description = "Ledger unavailable or object is not a claim", body = ApiResponse)
    )
)]
pub async fn get_claim_handler(
    State(state): State<AppState>,
    Path(claim_id): Path<String>,
) -> impl IntoResponse {
    match state.coordinator.index().fetch_claim(&claim_id).await {
        Ok(Some(claim)) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!(claim))),
        )
            .into_response(),
        Ok(None) => not_found(format!("Claim '{}' not found", claim_id)),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/owners/{address}/claims",
    params(
        ("address" = String, Path, description = "Owner address (0x...)")
    ),
    responses(
        (status = 200, description = "Claims currently owned by the address", body = ApiResponse),
        (status = 502, description = "Ledger unavailable", body = ApiResponse)
    )
)]
pub async fn owner_claims_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    match state.coordinator.index().claims_owned_by(&address).await {
        Ok(claims) => (
            StatusCode::OK,
            Json(ApiResponse::ok(serde_json::json!({
                "owner": address,
                "count": claims.len(),
                "claims": claims,
            }))),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
