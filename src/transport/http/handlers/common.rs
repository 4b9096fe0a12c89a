use crate::error::RegistryError;
use crate::transport::http::types::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// HTTP status for a flow error.
pub fn status_for(err: &RegistryError) -> StatusCode {
    match err {
        RegistryError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
        RegistryError::AllEndpointsFailed { .. } => StatusCode::SERVICE_UNAVAILABLE,
        RegistryError::SettlementTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        RegistryError::TransactionRejected { .. } => StatusCode::CONFLICT,
        RegistryError::ClaimNotFoundInResult { .. }
        | RegistryError::MalformedClaim { .. }
        | RegistryError::Ledger { .. } => StatusCode::BAD_GATEWAY,
        RegistryError::Signer(_) | RegistryError::Cancelled { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Error body: the user-facing message plus the phase and any structured detail.
pub fn error_response(err: RegistryError) -> Response {
    let mut data = serde_json::json!({ "phase": err.phase() });
    match &err {
        RegistryError::AllEndpointsFailed { failures, .. } => {
            data["failures"] = serde_json::json!(failures);
        }
        RegistryError::TransactionRejected { digest, .. }
        | RegistryError::SettlementTimeout { digest, .. } => {
            if let Some(d) = digest {
                data["digest"] = serde_json::json!(d);
            }
        }
        RegistryError::ClaimNotFoundInResult { digest, .. } => {
            data["digest"] = serde_json::json!(digest);
        }
        _ => {}
    }

    (
        status_for(&err),
        Json(ApiResponse {
            success: false,
            data: Some(data),
            error: Some(err.user_message()),
        }),
    )
        .into_response()
}

pub fn bad_request(message: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::err(message))).into_response()
}

pub fn not_found(message: impl Into<String>) -> Response {
    (StatusCode::NOT_FOUND, Json(ApiResponse::err(message))).into_response()
}
