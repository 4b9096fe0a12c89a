use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Fingerprint;

/// Whether a blob reference points at real, content-addressed storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BlobKind {
    /// Id assigned by a storage endpoint for the uploaded payload.
    ContentAddressed,
    /// Locally synthesized stand-in; nothing durable backs it.
    Provisional,
}

/// Where a payload ended up after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BlobReference {
    pub blob_id: String,
    pub endpoint: String,
    pub already_existed: bool,
    pub kind: BlobKind,
}

/// Prefix that marks provisional ids on the ledger as well as in memory.
pub const PROVISIONAL_PREFIX: &str = "provisional_";

impl BlobReference {
    pub fn stored(blob_id: String, endpoint: String, already_existed: bool) -> Self {
        Self {
            blob_id,
            endpoint,
            already_existed,
            kind: BlobKind::ContentAddressed,
        }
    }

    /// Placeholder used when every storage endpoint failed and policy allows degrading.
    pub fn provisional(fingerprint: &Fingerprint, now_millis: i64) -> Self {
        Self {
            blob_id: format!("{}{}_{}", PROVISIONAL_PREFIX, fingerprint.short(), now_millis),
            endpoint: String::new(),
            already_existed: false,
            kind: BlobKind::Provisional,
        }
    }

    pub fn is_provisional(&self) -> bool {
        self.kind == BlobKind::Provisional
    }
}

/// True if a blob id read back from the ledger was synthesized rather than stored.
pub fn is_provisional_blob_id(blob_id: &str) -> bool {
    blob_id.starts_with(PROVISIONAL_PREFIX)
}
