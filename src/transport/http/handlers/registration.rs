use crate::infra::cancel::CancelSignal;
use crate::transport::http::handlers::common::{bad_request, error_response};
use crate::transport::http::types::{
    decode_image, json_422, ApiResponse, AppState, RegisterRequest, VerifyRequest, VerifyResponse,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Claim registered; data is the Registration", body = ApiResponse),
        (status = 400, description = "Bad request (empty image, requester mismatch)", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 503, description = "No signer configured, or every publisher failed", body = ApiResponse),
        (status = 504, description = "Settlement not observed before the deadline", body = ApiResponse)
    )
)]
pub async fn register_handler(
    State(state): State<AppState>,
    request: Result<Json<RegisterRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"image_base64\": \"...\", \"requester\": \"0x...\"}").into_response()
        }
    };

    let Some(signer) = state.signer.clone() else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::err(
                "Registration is disabled: no SUI_PRIVATE_KEY or SUI_KEYSTORE configured",
            )),
        )
            .into_response();
    };

    let image = match decode_image(&request.image_base64) {
        Ok(bytes) => bytes,
        Err(e) => return bad_request(e),
    };
    let requester = request.requester.unwrap_or_else(|| signer.address());

    match state
        .coordinator
        .register(&image, &requester, signer.as_ref(), &CancelSignal::never())
        .await
    {
        Ok(registration) => match serde_json::to_value(&registration) {
            Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
            Err(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(format!("Failed to encode registration: {}", e))),
            )
                .into_response(),
        },
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/verify",
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Lookup completed; data is a VerifyResponse", body = ApiResponse),
        (status = 400, description = "Bad request (empty or undecodable image)", body = ApiResponse),
        (status = 422, description = "Unprocessable entity (invalid JSON body)", body = ApiResponse),
        (status = 502, description = "Ledger unavailable", body = ApiResponse)
    )
)]
pub async fn verify_handler(
    State(state): State<AppState>,
    request: Result<Json<VerifyRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"image_base64\": \"...\"}").into_response(),
    };
    let image = match decode_image(&request.image_base64) {
        Ok(bytes) => bytes,
        Err(e) => return bad_request(e),
    };

    match state.coordinator.verify(&image).await {
        Ok(lookup) => {
            let body = VerifyResponse::from(lookup);
            match serde_json::to_value(&body) {
                Ok(data) => (StatusCode::OK, Json(ApiResponse::ok(data))).into_response(),
                Err(e) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::err(format!("Failed to encode lookup: {}", e))),
                )
                    .into_response(),
            }
        }
        Err(e) => error_response(e),
    }
}
