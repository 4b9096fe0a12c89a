//! Lookup of claims by fingerprint.
//!
//! The registration event log is only a pointer: it is scanned (bounded by a page
//! size, newest first) for an exact fingerprint match, and the referenced claim
//! object is then read fresh from the ledger. The live object is the answer.

use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::model::{Claim, Fingerprint, Lookup, RegistrationEvent, ScanWindow};
use crate::error::{Phase, RegistryError};
use crate::infra::config::{ContractConfig, LedgerConfig};
use crate::infra::sui::{normalize_address, normalize_struct_type, LedgerClient, LedgerEvent, LedgerObject};

/// Reads a Move `String` (JSON string) or `vector<u8>` (JSON array of bytes) as text.
fn text_field(fields: &Value, name: &str) -> Option<String> {
    match fields.get(name)? {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect();
            String::from_utf8(bytes?).ok()
        }
        _ => None,
    }
}

fn u64_field(fields: &Value, name: &str) -> Option<u64> {
    match fields.get(name)? {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Decodes a registration event; `None` if it does not carry the expected fields.
pub fn decode_event(event: &LedgerEvent) -> Option<RegistrationEvent> {
    let fingerprint = Fingerprint::from_hex(&text_field(&event.parsed_json, "face_hash")?).ok()?;
    let claim_id = text_field(&event.parsed_json, "nft_id")?;
    Some(RegistrationEvent {
        fingerprint,
        claim_id,
        emitted_at_sequence: event.event_seq,
        tx_digest: event.tx_digest.clone(),
    })
}

/// Decodes a live claim object of `expected_type`.
pub fn decode_claim(object: &LedgerObject, expected_type: &str) -> Result<Claim, RegistryError> {
    let malformed = |reason: String| RegistryError::MalformedClaim {
        object_id: object.object_id.clone(),
        reason,
    };

    if normalize_struct_type(&object.object_type) != normalize_struct_type(expected_type) {
        return Err(malformed(format!(
            "type {} is not {}",
            object.object_type, expected_type
        )));
    }

    let fields = &object.fields;
    let face_hash = text_field(fields, "face_hash").ok_or_else(|| malformed("missing face_hash".into()))?;
    let fingerprint = Fingerprint::from_hex(&face_hash)
        .map_err(|e| malformed(format!("face_hash is not a fingerprint: {}", e)))?;
    let blob_id =
        text_field(fields, "walrus_blob_id").ok_or_else(|| malformed("missing walrus_blob_id".into()))?;
    let registered_at = u64_field(fields, "registration_date")
        .ok_or_else(|| malformed("missing registration_date".into()))?;
    // Live ownership first. A claim held inside another object (a kiosk, a wrapper)
    // reports that object's id.
    let owner = object
        .owner
        .address()
        .or_else(|| object.owner.parent_object())
        .map(str::to_string)
        .or_else(|| text_field(fields, "owner"))
        .unwrap_or_else(|| object.owner.label().to_string());

    Ok(Claim {
        claim_id: object.object_id.clone(),
        fingerprint,
        blob_id,
        owner,
        registered_at_epoch_millis: registered_at as i64,
    })
}

pub struct ClaimIndex {
    ledger: Arc<dyn LedgerClient>,
    contract: ContractConfig,
    page_limit: usize,
    owned_limit: usize,
}

impl ClaimIndex {
    pub fn new(ledger: Arc<dyn LedgerClient>, contract: ContractConfig, config: &LedgerConfig) -> Self {
        Self {
            ledger,
            contract,
            page_limit: config.event_scan_limit.max(1),
            owned_limit: config.owned_scan_limit.max(1),
        }
    }

    /// Number of most recent registration events a lookup considers.
    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// Looks for a live claim on `fingerprint` among the latest registration events.
    ///
    /// A `NotFound` only covers the reported scan window; older claims are not seen.
    pub async fn lookup(&self, fingerprint: &Fingerprint) -> Result<Lookup, RegistryError> {
        let events = self
            .ledger
            .query_events(&self.contract.event_type(), self.page_limit)
            .await
            .map_err(|e| RegistryError::ledger(Phase::Lookup, e))?;

        let window: Vec<&LedgerEvent> = events.iter().take(self.page_limit).collect();
        info!(
            "Scanning {} registration events (limit {}) for {}",
            window.len(),
            self.page_limit,
            fingerprint.short()
        );

        let mut checked = HashSet::new();
        for event in &window {
            let Some(registration) = decode_event(event) else {
                warn!(
                    "Skipping undecodable registration event {}#{}",
                    event.tx_digest, event.event_seq
                );
                continue;
            };
            if registration.fingerprint != *fingerprint {
                continue;
            }
            // At-least-once delivery: the same claim may be announced more than once.
            if !checked.insert(normalize_address(&registration.claim_id)) {
                debug!("Duplicate event for claim {}", registration.claim_id);
                continue;
            }

            let object = self
                .ledger
                .fetch_object(&registration.claim_id)
                .await
                .map_err(|e| RegistryError::ledger(Phase::Lookup, e))?;
            let Some(object) = object else {
                info!("Claim {} from event no longer exists", registration.claim_id);
                continue;
            };
            let claim = match decode_claim(&object, &self.contract.claim_type()) {
                Ok(claim) => claim,
                Err(e) => {
                    warn!("Skipping claim {} from event: {}", registration.claim_id, e);
                    continue;
                }
            };

            if claim.fingerprint == *fingerprint {
                info!(
                    "Fingerprint {} is claimed by {} (claim {})",
                    fingerprint.short(),
                    claim.owner,
                    claim.claim_id
                );
                return Ok(Lookup::Found(claim));
            }
            warn!(
                "Event for {} points at claim {} whose live fingerprint is {}",
                fingerprint.short(),
                claim.claim_id,
                claim.fingerprint.short()
            );
        }

        info!("No claim found for {} in the last {} events", fingerprint.short(), window.len());
        Ok(Lookup::NotFound(ScanWindow {
            events_scanned: window.len(),
            page_limit: self.page_limit,
        }))
    }

    /// Reads one claim object by id. `Ok(None)` if it does not exist.
    pub async fn fetch_claim(&self, claim_id: &str) -> Result<Option<Claim>, RegistryError> {
        let object = self
            .ledger
            .fetch_object(claim_id)
            .await
            .map_err(|e| RegistryError::ledger(Phase::Lookup, e))?;
        object
            .map(|o| decode_claim(&o, &self.contract.claim_type()))
            .transpose()
    }

    /// Claims currently held by `owner`, bounded by the owned-object page size.
    pub async fn claims_owned_by(&self, owner: &str) -> Result<Vec<Claim>, RegistryError> {
        let claim_type = self.contract.claim_type();
        let objects = self
            .ledger
            .list_owned_objects(owner, &claim_type, self.owned_limit)
            .await
            .map_err(|e| RegistryError::ledger(Phase::Lookup, e))?;
        objects.iter().map(|o| decode_claim(o, &claim_type)).collect()
    }
}
