// Responsible for all communication with the Sui full node (JSON-RPC 2.0 over HTTP).

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::types::{
    normalize_struct_type, FetchOptions, LedgerEvent, LedgerObject, MoveCall, Page, RawEvent,
    RawObjectData, RawObjectResponse, RawTransactionResponse, SubmitAck, TransactionDetails,
};
use super::LedgerClient;
use crate::error::LedgerError;

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionBlockBytes {
    tx_bytes: String,
}

#[derive(Debug, Deserialize)]
struct OwnedObjectEntry {
    #[serde(default)]
    data: Option<RawObjectData>,
}

/// Sui full-node client. Built once at startup and shared by reference.
pub struct SuiRpcClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl SuiRpcClient {
    pub fn new(url: impl Into<String>, request_timeout: Duration) -> Result<Self, LedgerError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!("sui rpc -> {} (id {})", method, id);

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(format!("{}: {}", method, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LedgerError::Transport(format!(
                "{}: HTTP {} {}",
                method, status, text
            )));
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| LedgerError::Malformed(format!("{}: {}", method, e)))?;

        if let Some(err) = envelope.error {
            return Err(classify_rpc_error(err.code, err.message));
        }
        let result = envelope
            .result
            .ok_or_else(|| LedgerError::Malformed(format!("{}: response has no result", method)))?;
        serde_json::from_value(result).map_err(|e| LedgerError::Malformed(format!("{}: {}", method, e)))
    }
}

/// Nodes report unindexed digests and missing objects as generic RPC errors.
fn classify_rpc_error(code: i64, message: String) -> LedgerError {
    let lower = message.to_lowercase();
    if lower.contains("could not find the referenced transaction") || lower.contains("not found") {
        LedgerError::NotFound(message)
    } else {
        LedgerError::Rpc { code, message }
    }
}

#[async_trait]
impl LedgerClient for SuiRpcClient {
    async fn build_move_call(&self, sender: &str, call: &MoveCall) -> Result<Vec<u8>, LedgerError> {
        let built: TransactionBlockBytes = self
            .call(
                "unsafe_moveCall",
                json!([
                    sender,
                    call.package,
                    call.module,
                    call.function,
                    call.type_arguments,
                    call.arguments,
                    Value::Null,
                    call.gas_budget.to_string(),
                ]),
            )
            .await?;
        BASE64
            .decode(built.tx_bytes)
            .map_err(|e| LedgerError::Malformed(format!("txBytes is not base64: {}", e)))
    }

    async fn submit_transaction(
        &self,
        tx_bytes: &[u8],
        signature: &str,
    ) -> Result<SubmitAck, LedgerError> {
        let raw: RawTransactionResponse = self
            .call(
                "sui_executeTransactionBlock",
                json!([
                    BASE64.encode(tx_bytes),
                    [signature],
                    { "showEffects": true, "showObjectChanges": true },
                ]),
            )
            .await?;
        Ok(raw.into_ack())
    }

    async fn fetch_transaction(
        &self,
        digest: &str,
        options: FetchOptions,
    ) -> Result<TransactionDetails, LedgerError> {
        let raw: RawTransactionResponse = self
            .call(
                "sui_getTransactionBlock",
                json!([
                    digest,
                    {
                        "showEffects": options.include_effects,
                        "showObjectChanges": options.include_object_changes,
                    },
                ]),
            )
            .await?;
        Ok(raw.into_details())
    }

    async fn fetch_object(&self, object_id: &str) -> Result<Option<LedgerObject>, LedgerError> {
        let raw: RawObjectResponse = self
            .call(
                "sui_getObject",
                json!([
                    object_id,
                    { "showContent": true, "showOwner": true, "showType": true },
                ]),
            )
            .await?;

        match (raw.data, raw.error) {
            (Some(data), _) => data.into_object().map(Some),
            (None, Some(err)) if err.code == "notExists" || err.code == "deleted" => Ok(None),
            (None, Some(err)) => Err(LedgerError::Malformed(format!(
                "object {} lookup failed with code {}",
                object_id, err.code
            ))),
            (None, None) => Err(LedgerError::Malformed(format!(
                "object {} response carried neither data nor error",
                object_id
            ))),
        }
    }

    async fn query_events(
        &self,
        event_type: &str,
        limit: usize,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        let page: Page<RawEvent> = self
            .call(
                "suix_queryEvents",
                json!([{ "MoveEventType": event_type }, Value::Null, limit, true]),
            )
            .await?;
        Ok(page.data.into_iter().map(LedgerEvent::from).collect())
    }

    async fn list_owned_objects(
        &self,
        owner: &str,
        struct_type: &str,
        limit: usize,
    ) -> Result<Vec<LedgerObject>, LedgerError> {
        let page: Page<OwnedObjectEntry> = self
            .call(
                "suix_getOwnedObjects",
                json!([
                    owner,
                    {
                        "filter": { "StructType": normalize_struct_type(struct_type) },
                        "options": { "showContent": true, "showOwner": true, "showType": true },
                    },
                    Value::Null,
                    limit,
                ]),
            )
            .await?;
        page.data
            .into_iter()
            .filter_map(|entry| entry.data)
            .map(RawObjectData::into_object)
            .collect()
    }

    async fn chain_identifier(&self) -> Result<String, LedgerError> {
        self.call("sui_getChainIdentifier", json!([])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unindexed_digest_maps_to_not_found() {
        let err = classify_rpc_error(
            -32602,
            "Could not find the referenced transaction [TransactionDigest(abc)].".to_string(),
        );
        assert!(matches!(err, LedgerError::NotFound(_)));

        let err = classify_rpc_error(-32002, "Transaction validator signing failed".to_string());
        assert!(matches!(err, LedgerError::Rpc { code: -32002, .. }));
    }
}
