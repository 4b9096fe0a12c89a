use crate::domain::model::{Claim, Lookup};
use crate::domain::registration::RegistrationCoordinator;
use crate::infra::sui::{LedgerClient, TransactionSigner};
use crate::infra::walrus::BlobReader;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<RegistrationCoordinator>,
    pub reader: Arc<BlobReader>,
    pub ledger: Arc<dyn LedgerClient>,
    /// Server-held signing identity. Without it `/api/register` is unavailable.
    pub signer: Option<Arc<dyn TransactionSigner>>,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: JsonValue) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    /// Image bytes, standard base64.
    pub image_base64: String,
    /// Address the claim is minted to. Defaults to the server signer's address.
    #[serde(default)]
    pub requester: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct VerifyRequest {
    /// Image bytes, standard base64.
    pub image_base64: String,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct VerifyResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim: Option<Claim>,
    /// Set on a miss: how many recent registration events were inspected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_scanned: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_limit: Option<usize>,
}

impl From<Lookup> for VerifyResponse {
    fn from(lookup: Lookup) -> Self {
        match lookup {
            Lookup::Found(claim) => Self {
                found: true,
                claim: Some(claim),
                events_scanned: None,
                page_limit: None,
            },
            Lookup::NotFound(window) => Self {
                found: false,
                claim: None,
                events_scanned: Some(window.events_scanned),
                page_limit: Some(window.page_limit),
            },
        }
    }
}

pub fn decode_image(image_base64: &str) -> Result<Vec<u8>, String> {
    BASE64
        .decode(image_base64.trim())
        .map_err(|e| format!("image_base64 is not valid base64: {}", e))
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse::err(format!(
            "Invalid JSON body: {} (expected: {})",
            err, expected
        ))),
    )
}
