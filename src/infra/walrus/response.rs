use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobObject {
    pub blob_id: String,
}

/// The two success shapes a publisher answers a store request with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreResponse {
    #[serde(rename_all = "camelCase")]
    NewlyCreated { blob_object: BlobObject },
    #[serde(rename_all = "camelCase")]
    AlreadyCertified { blob_id: String },
}

impl StoreResponse {
    /// Parses a publisher body; `None` unless it is one of the known shapes with a
    /// non-empty blob id.
    pub fn parse(body: &str) -> Option<Self> {
        let parsed: StoreResponse = serde_json::from_str(body).ok()?;
        if parsed.blob_id().trim().is_empty() {
            return None;
        }
        Some(parsed)
    }

    pub fn blob_id(&self) -> &str {
        match self {
            StoreResponse::NewlyCreated { blob_object } => &blob_object.blob_id,
            StoreResponse::AlreadyCertified { blob_id } => blob_id,
        }
    }

    pub fn already_existed(&self) -> bool {
        matches!(self, StoreResponse::AlreadyCertified { .. })
    }
}
