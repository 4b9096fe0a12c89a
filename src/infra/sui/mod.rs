//! The ledger seam: what the registry consumes from a Sui full node, and the
//! signing capability a caller lends to a submission.

pub mod rpc;
pub mod types;

use async_trait::async_trait;

use crate::error::{LedgerError, SignerError};
pub use rpc::SuiRpcClient;
pub use types::{
    normalize_address, normalize_struct_type, ExecutionStatus, FetchOptions, LedgerEvent,
    LedgerObject, MoveCall, ObjectChange, ObjectOwner, SubmitAck, TransactionDetails,
};

/// Operations the registry needs from the ledger. Implementations own their own
/// connection state; the registry holds them behind `Arc<dyn LedgerClient>`.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Builds unsigned transaction bytes for a single Move call sent by `sender`.
    async fn build_move_call(&self, sender: &str, call: &MoveCall) -> Result<Vec<u8>, LedgerError>;

    /// Sends signed transaction bytes. Returns as soon as the node acknowledges.
    async fn submit_transaction(
        &self,
        tx_bytes: &[u8],
        signature: &str,
    ) -> Result<SubmitAck, LedgerError>;

    /// `LedgerError::NotFound` while the read path has not indexed the digest yet.
    async fn fetch_transaction(
        &self,
        digest: &str,
        options: FetchOptions,
    ) -> Result<TransactionDetails, LedgerError>;

    /// `Ok(None)` if the object does not exist or was deleted.
    async fn fetch_object(&self, object_id: &str) -> Result<Option<LedgerObject>, LedgerError>;

    /// Most recent events of `event_type` first, at most `limit` of them.
    async fn query_events(&self, event_type: &str, limit: usize)
        -> Result<Vec<LedgerEvent>, LedgerError>;

    /// Objects of `struct_type` held by `owner`, at most `limit` of them.
    async fn list_owned_objects(
        &self,
        owner: &str,
        struct_type: &str,
        limit: usize,
    ) -> Result<Vec<LedgerObject>, LedgerError>;

    /// Cheap liveness probe.
    async fn chain_identifier(&self) -> Result<String, LedgerError>;
}

/// Signing capability. The registry never sees key material, only signatures.
pub trait TransactionSigner: Send + Sync {
    /// Address that will be the transaction sender (and thus claim owner).
    fn address(&self) -> String;

    /// Serialized signature over `tx_bytes`, base64, ready for submission.
    fn sign_transaction(&self, tx_bytes: &[u8]) -> Result<String, SignerError>;
}
