use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BlobReference, Fingerprint};

/// Input to a claim submission. Discarded once a claim exists or submission fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRequest {
    pub fingerprint: Fingerprint,
    pub blob_id: String,
    pub requested_at_epoch_millis: i64,
    pub requester_address: String,
}

/// The durable registration record, as read from (or just written to) the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Claim {
    pub claim_id: String,
    #[schema(value_type = String)]
    pub fingerprint: Fingerprint,
    pub blob_id: String,
    pub owner: String,
    pub registered_at_epoch_millis: i64,
}

/// Advisory index entry emitted alongside claim creation. May lag, may repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEvent {
    pub fingerprint: Fingerprint,
    pub claim_id: String,
    pub emitted_at_sequence: u64,
    pub tx_digest: String,
}

/// What a successful `register` hands back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Registration {
    pub claim: Claim,
    pub blob: BlobReference,
}

/// How much of the event log a lookup looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ScanWindow {
    /// Events actually returned by the log and inspected.
    pub events_scanned: usize,
    /// Page size requested; events older than this window were not considered.
    pub page_limit: usize,
}

/// Result of a fingerprint lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Claim),
    NotFound(ScanWindow),
}

impl Lookup {
    pub fn claim(&self) -> Option<&Claim> {
        match self {
            Lookup::Found(c) => Some(c),
            Lookup::NotFound(_) => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}
