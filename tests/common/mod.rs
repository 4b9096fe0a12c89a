//! Shared fixtures: an in-memory ledger and in-process storage publishers.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::Router;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use faceguard::error::{LedgerError, SignerError};
use faceguard::infra::config::{ContractConfig, LedgerConfig, StorageConfig};
use faceguard::infra::sui::{
    normalize_address, ExecutionStatus, FetchOptions, LedgerClient, LedgerEvent, LedgerObject,
    MoveCall, ObjectChange, ObjectOwner, SubmitAck, TransactionDetails, TransactionSigner,
};

pub const PACKAGE: &str = "0xfeed";

pub fn contract() -> ContractConfig {
    ContractConfig::new(PACKAGE)
}

/// Short timings so settlement polling finishes quickly.
pub fn fast_ledger_config() -> LedgerConfig {
    LedgerConfig {
        rpc_url: "http://unused".to_string(),
        settlement_delay: Duration::from_millis(20),
        settlement_poll: Duration::from_millis(10),
        submit_deadline: Duration::from_secs(3),
        event_scan_limit: 50,
        ..LedgerConfig::default()
    }
}

pub fn storage_config(publishers: Vec<String>, attempt_timeout: Duration) -> StorageConfig {
    StorageConfig {
        aggregators: publishers.clone(),
        publishers,
        epochs: 5,
        attempt_timeout,
        ..StorageConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

pub struct FixedSigner {
    pub address: String,
}

impl FixedSigner {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
        }
    }
}

impl TransactionSigner for FixedSigner {
    fn address(&self) -> String {
        self.address.clone()
    }

    fn sign_transaction(&self, tx_bytes: &[u8]) -> Result<String, SignerError> {
        Ok(format!("signed:{}", tx_bytes.len()))
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// How the fake ledger answers a submission.
#[derive(Debug, Clone)]
pub enum SubmitBehavior {
    /// Mint a claim object, emit an event, and settle after `hidden_fetches` misses.
    Mint { hidden_fetches: u32 },
    /// Succeed but create no claim object (only a gas coin mutation).
    SucceedWithoutClaim,
    /// Mint two claim objects in one transaction.
    MintTwice,
    /// The acknowledgement carries an execution failure.
    FailOnAck(String),
    /// Acknowledged as pending; the refetch reports the failure.
    FailOnSettle(String),
    /// Acknowledged, then never becomes visible on the read path.
    NeverIndexed,
    /// The node refuses the transaction outright.
    RpcReject { code: i64, message: String },
    /// The node cannot be reached.
    Unreachable,
}

struct PendingTx {
    details: TransactionDetails,
    hidden_fetches: u32,
}

struct LedgerState {
    calls: Vec<String>,
    behavior: SubmitBehavior,
    claim_ids: Vec<String>,
    next_tx: u32,
    last_build: Option<(String, MoveCall)>,
    transactions: HashMap<String, PendingTx>,
    objects: HashMap<String, LedgerObject>,
    /// Oldest first; queries return newest first.
    events: Vec<LedgerEvent>,
    events_unavailable: bool,
}

pub struct FakeLedger {
    contract: ContractConfig,
    state: Mutex<LedgerState>,
}

fn bytes_to_string(v: &Value) -> String {
    v.as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|b| b.as_u64().map(|n| n as u8 as char))
                .collect()
        })
        .unwrap_or_default()
}

impl FakeLedger {
    pub fn new(behavior: SubmitBehavior) -> Arc<Self> {
        Arc::new(Self {
            contract: contract(),
            state: Mutex::new(LedgerState {
                calls: Vec::new(),
                behavior,
                claim_ids: vec!["0xc1".into(), "0xc2".into(), "0xc3".into(), "0xc4".into()],
                next_tx: 0,
                last_build: None,
                transactions: HashMap::new(),
                objects: HashMap::new(),
                events: Vec::new(),
                events_unavailable: false,
            }),
        })
    }

    pub fn set_behavior(&self, behavior: SubmitBehavior) {
        self.state.lock().unwrap().behavior = behavior;
    }

    pub fn set_events_unavailable(&self, unavailable: bool) {
        self.state.lock().unwrap().events_unavailable = unavailable;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, method: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == method).count()
    }

    pub fn last_call(&self) -> Option<MoveCall> {
        self.state.lock().unwrap().last_build.as_ref().map(|(_, c)| c.clone())
    }

    pub fn put_object(&self, object: LedgerObject) {
        self.state
            .lock()
            .unwrap()
            .objects
            .insert(normalize_address(&object.object_id), object);
    }

    pub fn remove_object(&self, object_id: &str) {
        self.state
            .lock()
            .unwrap()
            .objects
            .remove(&normalize_address(object_id));
    }

    /// Appends a registration event (newest).
    pub fn push_event(&self, parsed_json: Value) {
        let mut state = self.state.lock().unwrap();
        let seq = state.events.len() as u64;
        state.events.push(LedgerEvent {
            tx_digest: format!("EVT{}", seq),
            event_seq: 0,
            event_type: self.contract.event_type(),
            parsed_json,
            timestamp_ms: Some(1_700_000_000_000 + seq),
        });
    }

    pub fn claim_object(&self, id: &str, fingerprint: &str, blob_id: &str, owner: &str) -> LedgerObject {
        LedgerObject {
            object_id: id.to_string(),
            object_type: self.contract.claim_type(),
            owner: ObjectOwner::AddressOwner(owner.to_string()),
            fields: json!({
                "face_hash": fingerprint,
                "walrus_blob_id": blob_id,
                "registration_date": "1700000000000",
            }),
        }
    }

    fn created(&self, id: &str, owner: &str) -> ObjectChange {
        ObjectChange::Created {
            object_id: id.to_string(),
            object_type: self.contract.claim_type(),
            owner: Some(ObjectOwner::AddressOwner(owner.to_string())),
        }
    }

    fn mint(&self, state: &mut LedgerState, sender: &str, call: &MoveCall) -> String {
        let claim_id = if state.claim_ids.is_empty() {
            format!("0xc{}", 100 + state.objects.len())
        } else {
            state.claim_ids.remove(0)
        };
        let fingerprint = bytes_to_string(&call.arguments[0]);
        let blob_id = bytes_to_string(&call.arguments[1]);
        let requested_at = call.arguments[2].as_str().unwrap_or("0").to_string();

        state.objects.insert(
            normalize_address(&claim_id),
            LedgerObject {
                object_id: claim_id.clone(),
                object_type: self.contract.claim_type(),
                owner: ObjectOwner::AddressOwner(sender.to_string()),
                fields: json!({
                    "face_hash": fingerprint,
                    "walrus_blob_id": blob_id,
                    "registration_date": requested_at,
                }),
            },
        );
        let seq = state.events.len() as u64;
        state.events.push(LedgerEvent {
            tx_digest: format!("TX{}", state.next_tx),
            event_seq: 0,
            event_type: self.contract.event_type(),
            parsed_json: json!({ "face_hash": fingerprint, "nft_id": claim_id }),
            timestamp_ms: Some(1_700_000_000_000 + seq),
        });
        claim_id
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    async fn build_move_call(&self, sender: &str, call: &MoveCall) -> Result<Vec<u8>, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("build_move_call".into());
        if matches!(state.behavior, SubmitBehavior::Unreachable) {
            return Err(LedgerError::Transport("connection refused".into()));
        }
        state.last_build = Some((sender.to_string(), call.clone()));
        Ok(format!("{}::{}::{}", call.package, call.module, call.function).into_bytes())
    }

    async fn submit_transaction(
        &self,
        _tx_bytes: &[u8],
        _signature: &str,
    ) -> Result<SubmitAck, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("submit_transaction".into());
        let (sender, call) = state
            .last_build
            .clone()
            .ok_or_else(|| LedgerError::Malformed("submit before build".into()))?;

        state.next_tx += 1;
        let digest = format!("TX{}", state.next_tx);
        let gas = ObjectChange::Mutated {
            object_id: "0x9a5".into(),
            object_type: "0x2::coin::Coin<0x2::sui::SUI>".into(),
        };

        let (details, hidden_fetches) = match state.behavior.clone() {
            SubmitBehavior::RpcReject { code, message } => {
                return Err(LedgerError::Rpc { code, message })
            }
            SubmitBehavior::Unreachable => return Err(LedgerError::Transport("connection refused".into())),
            SubmitBehavior::FailOnAck(error) => {
                return Ok(SubmitAck {
                    digest,
                    status: Some(ExecutionStatus::Failure { error }),
                    object_changes: None,
                })
            }
            SubmitBehavior::Mint { hidden_fetches } => {
                let id = self.mint(&mut state, &sender, &call);
                let changes = vec![gas, self.created(&id, &sender)];
                (
                    TransactionDetails {
                        digest: digest.clone(),
                        status: Some(ExecutionStatus::Success),
                        object_changes: changes,
                    },
                    hidden_fetches,
                )
            }
            SubmitBehavior::MintTwice => {
                let a = self.mint(&mut state, &sender, &call);
                let b = self.mint(&mut state, &sender, &call);
                let changes = vec![gas, self.created(&a, &sender), self.created(&b, &sender)];
                (
                    TransactionDetails {
                        digest: digest.clone(),
                        status: Some(ExecutionStatus::Success),
                        object_changes: changes,
                    },
                    0,
                )
            }
            SubmitBehavior::SucceedWithoutClaim => (
                TransactionDetails {
                    digest: digest.clone(),
                    status: Some(ExecutionStatus::Success),
                    object_changes: vec![gas],
                },
                0,
            ),
            SubmitBehavior::FailOnSettle(error) => (
                TransactionDetails {
                    digest: digest.clone(),
                    status: Some(ExecutionStatus::Failure { error }),
                    object_changes: vec![gas],
                },
                1,
            ),
            SubmitBehavior::NeverIndexed => (
                TransactionDetails {
                    digest: digest.clone(),
                    status: Some(ExecutionStatus::Success),
                    object_changes: Vec::new(),
                },
                u32::MAX,
            ),
        };

        state.transactions.insert(
            digest.clone(),
            PendingTx {
                details,
                hidden_fetches,
            },
        );
        // Acknowledgement only: effects are not part of it.
        Ok(SubmitAck {
            digest,
            status: None,
            object_changes: None,
        })
    }

    async fn fetch_transaction(
        &self,
        digest: &str,
        _options: FetchOptions,
    ) -> Result<TransactionDetails, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("fetch_transaction".into());
        let tx = state
            .transactions
            .get_mut(digest)
            .ok_or_else(|| LedgerError::NotFound(digest.to_string()))?;
        if tx.hidden_fetches > 0 {
            tx.hidden_fetches = tx.hidden_fetches.saturating_sub(1);
            return Err(LedgerError::NotFound(format!(
                "Could not find the referenced transaction {}",
                digest
            )));
        }
        Ok(tx.details.clone())
    }

    async fn fetch_object(&self, object_id: &str) -> Result<Option<LedgerObject>, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("fetch_object".into());
        Ok(state.objects.get(&normalize_address(object_id)).cloned())
    }

    async fn query_events(&self, event_type: &str, limit: usize) -> Result<Vec<LedgerEvent>, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("query_events".into());
        if state.events_unavailable {
            return Err(LedgerError::Transport("event index offline".into()));
        }
        Ok(state
            .events
            .iter()
            .rev()
            .filter(|e| e.event_type == event_type)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn list_owned_objects(
        &self,
        owner: &str,
        struct_type: &str,
        limit: usize,
    ) -> Result<Vec<LedgerObject>, LedgerError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("list_owned_objects".into());
        let owner = normalize_address(owner);
        let mut owned: Vec<LedgerObject> = state
            .objects
            .values()
            .filter(|o| o.object_type == struct_type)
            .filter(|o| o.owner.address().map(normalize_address) == Some(owner.clone()))
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.object_id.cmp(&b.object_id));
        owned.truncate(limit);
        Ok(owned)
    }

    async fn chain_identifier(&self) -> Result<String, LedgerError> {
        self.state.lock().unwrap().calls.push("chain_identifier".into());
        Ok("fake0001".to_string())
    }
}

// ---------------------------------------------------------------------------
// Storage publishers / aggregators
// ---------------------------------------------------------------------------

/// How a fake publisher answers `PUT /v1/store`.
#[derive(Debug, Clone)]
pub enum PublisherBehavior {
    Fail(u16),
    Store(String),
    AlreadyCertified(String),
    Garbage,
    Hang,
}

#[derive(Clone)]
struct PublisherState {
    behavior: PublisherBehavior,
    hits: Arc<AtomicUsize>,
    epochs: Arc<Mutex<Vec<String>>>,
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

pub struct FakePublisher {
    pub url: String,
    pub hits: Arc<AtomicUsize>,
    pub epochs: Arc<Mutex<Vec<String>>>,
    pub blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl FakePublisher {
    pub fn hit_count(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn store_handler(
    State(state): State<PublisherState>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(e) = query.get("epochs") {
        state.epochs.lock().unwrap().push(e.clone());
    }
    match state.behavior {
        PublisherBehavior::Fail(code) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            "publisher unavailable".to_string(),
        ),
        PublisherBehavior::Store(id) => {
            state.blobs.lock().unwrap().insert(id.clone(), body.to_vec());
            (
                StatusCode::OK,
                json!({
                    "newlyCreated": {
                        "blobObject": { "blobId": id, "size": body.len() },
                        "cost": 1000
                    }
                })
                .to_string(),
            )
        }
        PublisherBehavior::AlreadyCertified(id) => {
            state.blobs.lock().unwrap().insert(id.clone(), body.to_vec());
            (
                StatusCode::OK,
                json!({ "alreadyCertified": { "blobId": id, "endEpoch": 99 } }).to_string(),
            )
        }
        PublisherBehavior::Garbage => (StatusCode::OK, "<html>maintenance</html>".to_string()),
        PublisherBehavior::Hang => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            (StatusCode::OK, String::new())
        }
    }
}

async fn read_handler(
    State(state): State<PublisherState>,
    Path(blob_id): Path<String>,
) -> impl IntoResponse {
    match state.blobs.lock().unwrap().get(&blob_id) {
        Some(bytes) => (StatusCode::OK, bytes.clone()),
        None => (StatusCode::NOT_FOUND, b"blob not found".to_vec()),
    }
}

/// Starts a publisher (which also serves reads) on an ephemeral local port.
pub async fn spawn_publisher(behavior: PublisherBehavior) -> FakePublisher {
    let state = PublisherState {
        behavior,
        hits: Arc::new(AtomicUsize::new(0)),
        epochs: Arc::new(Mutex::new(Vec::new())),
        blobs: Arc::new(Mutex::new(HashMap::new())),
    };
    let publisher = FakePublisher {
        url: String::new(),
        hits: state.hits.clone(),
        epochs: state.epochs.clone(),
        blobs: state.blobs.clone(),
    };
    let router = Router::new()
        .route("/v1/store", put(store_handler))
        .route("/v1/blobs/:blob_id", get(read_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    FakePublisher {
        url: format!("http://{}", addr),
        ..publisher
    }
}

/// A base URL nothing listens on.
pub async fn dead_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
