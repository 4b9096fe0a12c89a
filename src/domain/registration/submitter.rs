//! Claim submission: one state-changing transaction, then explicit reconciliation of
//! its eventually-consistent result into a claim id.
//!
//! Submission APIs only acknowledge; the created claim object becomes visible on the
//! read path some time later. So after submitting we wait a fixed settlement delay,
//! refetch the transaction with full effects, and poll until it is indexed or the
//! outer deadline runs out.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::domain::model::ClaimRequest;
use crate::error::{LedgerError, Phase, RegistryError};
use crate::infra::config::{ContractConfig, LedgerConfig};
use crate::infra::sui::{
    normalize_address, normalize_struct_type, ExecutionStatus, FetchOptions, LedgerClient,
    MoveCall, ObjectChange, TransactionDetails, TransactionSigner,
};

/// How a submitted transaction resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Rejected { reason: String },
    Settled(TransactionDetails),
    AmbiguousTimeout,
}

pub struct ClaimSubmitter {
    ledger: Arc<dyn LedgerClient>,
    contract: ContractConfig,
    settlement_delay: Duration,
    settlement_poll: Duration,
    deadline: Duration,
    gas_budget: u64,
}

fn bytes_arg(bytes: &[u8]) -> Value {
    Value::Array(bytes.iter().map(|b| json!(b)).collect())
}

impl ClaimSubmitter {
    pub fn new(ledger: Arc<dyn LedgerClient>, contract: ContractConfig, config: &LedgerConfig) -> Self {
        Self {
            ledger,
            contract,
            settlement_delay: config.settlement_delay,
            settlement_poll: config.settlement_poll,
            deadline: config.submit_deadline,
            gas_budget: config.gas_budget,
        }
    }

    /// The registration call: `mint_ownership(fingerprint, blob_id, requested_at)`.
    /// Fingerprint and blob id are passed as their UTF-8 text bytes.
    pub fn build_call(&self, req: &ClaimRequest) -> MoveCall {
        MoveCall {
            package: self.contract.package_id.clone(),
            module: self.contract.module.clone(),
            function: self.contract.mint_function.clone(),
            type_arguments: Vec::new(),
            arguments: vec![
                bytes_arg(req.fingerprint.to_hex().as_bytes()),
                bytes_arg(req.blob_id.as_bytes()),
                json!(req.requested_at_epoch_millis.to_string()),
            ],
            gas_budget: self.gas_budget,
        }
    }

    /// Submits the claim and resolves it to the created claim object's id.
    ///
    /// The whole of build, sign, submit, settle and refetch is bounded by the
    /// configured deadline.
    pub async fn submit(
        &self,
        req: &ClaimRequest,
        signer: &dyn TransactionSigner,
    ) -> Result<String, RegistryError> {
        let sender = signer.address();
        if normalize_address(&sender) != normalize_address(&req.requester_address) {
            return Err(RegistryError::invalid(
                Phase::Submit,
                format!(
                    "requester {} does not match signer {}; claims are minted to the sender",
                    req.requester_address, sender
                ),
            ));
        }

        let started = Instant::now();
        let deadline = started + self.deadline;
        let mut digest: Option<String> = None;

        let outcome = tokio::time::timeout_at(
            deadline,
            self.submit_and_reconcile(req, signer, &sender, deadline, &mut digest),
        )
        .await;

        match outcome {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Claim submission for {} exceeded its {:?} deadline (tx: {:?})",
                    req.fingerprint.short(),
                    self.deadline,
                    digest
                );
                Err(RegistryError::SettlementTimeout {
                    digest,
                    waited_ms: started.elapsed().as_millis() as u64,
                })
            }
        }
    }

    async fn submit_and_reconcile(
        &self,
        req: &ClaimRequest,
        signer: &dyn TransactionSigner,
        sender: &str,
        deadline: Instant,
        digest_out: &mut Option<String>,
    ) -> Result<String, RegistryError> {
        let started = Instant::now();
        let call = self.build_call(req);

        let tx_bytes = self
            .ledger
            .build_move_call(sender, &call)
            .await
            .map_err(submit_error)?;
        let signature = signer.sign_transaction(&tx_bytes)?;
        let ack = self
            .ledger
            .submit_transaction(&tx_bytes, &signature)
            .await
            .map_err(submit_error)?;

        *digest_out = Some(ack.digest.clone());
        info!(
            "Submitted claim for {} (blob {}), tx {}",
            req.fingerprint.short(),
            req.blob_id,
            ack.digest
        );

        if let Some(ExecutionStatus::Failure { error }) = &ack.status {
            return Err(RegistryError::TransactionRejected {
                digest: Some(ack.digest.clone()),
                reason: error.clone(),
            });
        }
        if let Some(changes) = &ack.object_changes {
            debug!(
                "Submission acknowledged with {} optimistic object changes; refetching anyway",
                changes.len()
            );
        }

        match self.reconcile(&ack.digest, deadline).await? {
            Settlement::Settled(details) => self.extract_claim_id(&details),
            Settlement::Rejected { reason } => Err(RegistryError::TransactionRejected {
                digest: Some(ack.digest),
                reason,
            }),
            Settlement::AmbiguousTimeout => Err(RegistryError::SettlementTimeout {
                digest: Some(ack.digest),
                waited_ms: started.elapsed().as_millis() as u64,
            }),
        }
    }

    /// Waits for the settlement delay, then refetches `digest` until it is visible
    /// with effects or `deadline` passes.
    pub async fn reconcile(&self, digest: &str, deadline: Instant) -> Result<Settlement, RegistryError> {
        let first_wait = self
            .settlement_delay
            .min(deadline.saturating_duration_since(Instant::now()));
        sleep(first_wait).await;

        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.ledger.fetch_transaction(digest, FetchOptions::full()).await {
                Ok(details) => {
                    return match details.status.clone() {
                        Some(ExecutionStatus::Success) => {
                            info!(
                                "Transaction {} settled after {} fetch(es) with {} object changes",
                                digest,
                                attempts,
                                details.object_changes.len()
                            );
                            Ok(Settlement::Settled(details))
                        }
                        Some(ExecutionStatus::Failure { error }) => {
                            warn!("Transaction {} failed on chain: {}", digest, error);
                            Ok(Settlement::Rejected { reason: error })
                        }
                        None => Err(RegistryError::ledger(
                            Phase::Reconcile,
                            LedgerError::Malformed(format!(
                                "transaction {} returned without effects",
                                digest
                            )),
                        )),
                    };
                }
                Err(LedgerError::NotFound(_)) => {
                    debug!("Transaction {} not indexed yet (attempt {})", digest, attempts);
                }
                Err(LedgerError::Transport(e)) => {
                    warn!("Transient error refetching {}: {}", digest, e);
                }
                Err(e) => return Err(RegistryError::ledger(Phase::Reconcile, e)),
            }

            if Instant::now() + self.settlement_poll >= deadline {
                return Ok(Settlement::AmbiguousTimeout);
            }
            sleep(self.settlement_poll).await;
        }
    }

    /// Exactly one created object of the claim type must appear in the effects.
    pub fn extract_claim_id(&self, details: &TransactionDetails) -> Result<String, RegistryError> {
        let expected = normalize_struct_type(&self.contract.claim_type());
        let created: Vec<(&String, &String)> = details
            .object_changes
            .iter()
            .filter_map(|c| match c {
                ObjectChange::Created {
                    object_id,
                    object_type,
                    ..
                } => Some((object_id, object_type)),
                _ => None,
            })
            .collect();
        let matching: Vec<&String> = created
            .iter()
            .filter(|(_, t)| normalize_struct_type(t) == expected)
            .map(|(id, _)| *id)
            .collect();

        match matching.as_slice() {
            [only] => {
                info!("Claim {} created by {}", only, details.digest);
                Ok((*only).clone())
            }
            [] => Err(RegistryError::ClaimNotFoundInResult {
                digest: details.digest.clone(),
                expected_type: self.contract.claim_type(),
                detail: format!(
                    "{} object changes, {} created, none of the claim type",
                    details.object_changes.len(),
                    created.len()
                ),
            }),
            many => Err(RegistryError::ClaimNotFoundInResult {
                digest: details.digest.clone(),
                expected_type: self.contract.claim_type(),
                detail: format!("{} created objects match; expected exactly one", many.len()),
            }),
        }
    }
}

/// Explicit node rejections are final for this attempt; anything else is the
/// ledger being unreachable.
fn submit_error(e: LedgerError) -> RegistryError {
    match e {
        LedgerError::Rpc { code, message } => RegistryError::TransactionRejected {
            digest: None,
            reason: format!("{} (code {})", message, code),
        },
        other => RegistryError::ledger(Phase::Submit, other),
    }
}
