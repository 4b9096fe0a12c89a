//! Shapes exchanged with the ledger. Responses decode into tagged enums; anything
//! that does not match a known shape is rejected instead of read optimistically.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::LedgerError;

/// A single Move entry-point invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveCall {
    pub package: String,
    pub module: String,
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
    pub gas_budget: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ExecutionStatus {
    Success,
    Failure {
        #[serde(default)]
        error: String,
    },
}

/// Who owns an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectOwner {
    AddressOwner(String),
    ObjectOwner(String),
    Shared {
        initial_shared_version: Value,
    },
    Immutable,
    ConsensusAddressOwner {
        owner: String,
    },
}

impl ObjectOwner {
    /// The owning account, if the object is held by an address.
    pub fn address(&self) -> Option<&str> {
        match self {
            ObjectOwner::AddressOwner(a) => Some(a),
            ObjectOwner::ConsensusAddressOwner { owner } => Some(owner),
            _ => None,
        }
    }

    /// The owning object's id, if the object is wrapped in or held by another object.
    pub fn parent_object(&self) -> Option<&str> {
        match self {
            ObjectOwner::ObjectOwner(id) => Some(id),
            _ => None,
        }
    }

    /// Short label for owners that are neither an address nor an object.
    pub fn label(&self) -> &'static str {
        match self {
            ObjectOwner::AddressOwner(_) | ObjectOwner::ConsensusAddressOwner { .. } => "address",
            ObjectOwner::ObjectOwner(_) => "object",
            ObjectOwner::Shared { .. } => "shared",
            ObjectOwner::Immutable => "immutable",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ObjectChange {
    #[serde(rename_all = "camelCase")]
    Created {
        object_id: String,
        object_type: String,
        #[serde(default)]
        owner: Option<ObjectOwner>,
    },
    #[serde(rename_all = "camelCase")]
    Mutated { object_id: String, object_type: String },
    #[serde(rename_all = "camelCase")]
    Transferred { object_id: String, object_type: String },
    #[serde(rename_all = "camelCase")]
    Deleted { object_id: String, object_type: String },
    #[serde(rename_all = "camelCase")]
    Wrapped { object_id: String, object_type: String },
    #[serde(rename_all = "camelCase")]
    Published {
        package_id: String,
        #[serde(default)]
        modules: Vec<String>,
    },
}

/// Immediate response to a submission. Effects may or may not be present.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitAck {
    pub digest: String,
    pub status: Option<ExecutionStatus>,
    pub object_changes: Option<Vec<ObjectChange>>,
}

/// What to include when fetching a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub include_effects: bool,
    pub include_object_changes: bool,
}

impl FetchOptions {
    pub fn full() -> Self {
        Self {
            include_effects: true,
            include_object_changes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDetails {
    pub digest: String,
    pub status: Option<ExecutionStatus>,
    pub object_changes: Vec<ObjectChange>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerObject {
    pub object_id: String,
    pub object_type: String,
    pub owner: ObjectOwner,
    pub fields: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEvent {
    pub tx_digest: String,
    pub event_seq: u64,
    pub event_type: String,
    pub parsed_json: Value,
    pub timestamp_ms: Option<u64>,
}

// --- Wire decoding ---

/// u64 values arrive as decimal strings in JSON-RPC responses; accept numbers too.
pub fn de_u64_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => s.parse::<u64>().map_err(serde::de::Error::custom),
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom("expected unsigned integer")),
        other => Err(serde::de::Error::custom(format!("expected u64, got {}", other))),
    }
}

fn de_opt_u64_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => s.parse::<u64>().map(Some).map_err(serde::de::Error::custom),
        Some(Value::Number(n)) => Ok(n.as_u64()),
        Some(other) => Err(serde::de::Error::custom(format!("expected u64, got {}", other))),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawEffects {
    pub status: ExecutionStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTransactionResponse {
    pub digest: String,
    #[serde(default)]
    pub effects: Option<RawEffects>,
    #[serde(default)]
    pub object_changes: Option<Vec<ObjectChange>>,
}

impl RawTransactionResponse {
    pub fn into_ack(self) -> SubmitAck {
        SubmitAck {
            digest: self.digest,
            status: self.effects.map(|e| e.status),
            object_changes: self.object_changes,
        }
    }

    pub fn into_details(self) -> TransactionDetails {
        TransactionDetails {
            digest: self.digest,
            status: self.effects.map(|e| e.status),
            object_changes: self.object_changes.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "dataType", rename_all = "camelCase")]
pub(crate) enum RawContent {
    MoveObject {
        #[serde(rename = "type")]
        object_type: String,
        fields: Value,
    },
    Package {},
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawObjectData {
    pub object_id: String,
    #[serde(rename = "type", default)]
    pub object_type: Option<String>,
    pub owner: ObjectOwner,
    pub content: Option<RawContent>,
}

impl RawObjectData {
    pub fn into_object(self) -> Result<LedgerObject, LedgerError> {
        match self.content {
            Some(RawContent::MoveObject { object_type, fields }) => Ok(LedgerObject {
                object_id: self.object_id,
                object_type,
                owner: self.owner,
                fields,
            }),
            Some(RawContent::Package {}) => Ok(LedgerObject {
                object_id: self.object_id,
                object_type: "package".to_string(),
                owner: self.owner,
                fields: Value::Null,
            }),
            None => Err(LedgerError::Malformed(format!(
                "object {} returned without content (type {:?})",
                self.object_id, self.object_type
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawObjectError {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawObjectResponse {
    #[serde(default)]
    pub data: Option<RawObjectData>,
    #[serde(default)]
    pub error: Option<RawObjectError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawEventId {
    pub tx_digest: String,
    #[serde(deserialize_with = "de_u64_lenient")]
    pub event_seq: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawEvent {
    pub id: RawEventId,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub parsed_json: Value,
    #[serde(default, deserialize_with = "de_opt_u64_lenient")]
    pub timestamp_ms: Option<u64>,
}

impl From<RawEvent> for LedgerEvent {
    fn from(raw: RawEvent) -> Self {
        LedgerEvent {
            tx_digest: raw.id.tx_digest,
            event_seq: raw.id.event_seq,
            event_type: raw.event_type,
            parsed_json: raw.parsed_json,
            timestamp_ms: raw.timestamp_ms,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Page<T> {
    pub data: Vec<T>,
}

// --- Address helpers ---

/// Lowercase, `0x`-prefixed, left-padded to 32 bytes.
pub fn normalize_address(address: &str) -> String {
    let trimmed = address.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed)
        .to_ascii_lowercase();
    format!("0x{:0>64}", body)
}

/// Normalizes the address part of `addr::module::Struct<...>`.
pub fn normalize_struct_type(type_tag: &str) -> String {
    match type_tag.split_once("::") {
        Some((addr, rest)) => format!("{}::{}", normalize_address(addr), rest),
        None => type_tag.to_string(),
    }
}
