//! The two user-facing flows.
//!
//! `register`: derive -> upload -> submit -> assembled claim.
//! `verify`:   derive -> index lookup.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::submitter::ClaimSubmitter;
use crate::crypto::FingerprintDeriver;
use crate::domain::model::{BlobReference, Claim, ClaimRequest, Lookup, Registration};
use crate::domain::verify::ClaimIndex;
use crate::error::{Phase, RegistryError};
use crate::infra::cancel::CancelSignal;
use crate::infra::config::AppConfig;
use crate::infra::sui::{LedgerClient, TransactionSigner};
use crate::infra::walrus::BlobUploader;

/// Behaviour when no storage endpoint accepts the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFailurePolicy {
    /// Fail the registration with `AllEndpointsFailed`.
    Abort,
    /// Register against a provisional blob reference.
    Provisional,
}

pub struct RegistrationCoordinator {
    deriver: FingerprintDeriver,
    uploader: BlobUploader,
    submitter: ClaimSubmitter,
    index: ClaimIndex,
    endpoints: Vec<String>,
    epochs: u32,
    upload_failure_policy: UploadFailurePolicy,
}

impl RegistrationCoordinator {
    pub fn new(
        deriver: FingerprintDeriver,
        uploader: BlobUploader,
        submitter: ClaimSubmitter,
        index: ClaimIndex,
        endpoints: Vec<String>,
        epochs: u32,
        upload_failure_policy: UploadFailurePolicy,
    ) -> Self {
        Self {
            deriver,
            uploader,
            submitter,
            index,
            endpoints,
            epochs,
            upload_failure_policy,
        }
    }

    /// Wires every component from configuration around one shared ledger client.
    pub fn from_config(config: &AppConfig, ledger: Arc<dyn LedgerClient>) -> Self {
        let policy = if config.allow_provisional_blob {
            UploadFailurePolicy::Provisional
        } else {
            UploadFailurePolicy::Abort
        };
        Self::new(
            FingerprintDeriver::new(),
            BlobUploader::new(&config.storage),
            ClaimSubmitter::new(ledger.clone(), config.contract.clone(), &config.ledger),
            ClaimIndex::new(ledger, config.contract.clone(), &config.ledger),
            config.storage.publishers.clone(),
            config.storage.epochs,
            policy,
        )
    }

    pub fn index(&self) -> &ClaimIndex {
        &self.index
    }

    pub fn uploader(&self) -> &BlobUploader {
        &self.uploader
    }

    pub fn endpoints(&self) -> &[String] {
        &self.endpoints
    }

    pub fn epochs(&self) -> u32 {
        self.epochs
    }

    /// Registers `image` for `requester`. Same-fingerprint registrations are not
    /// deduplicated here; uniqueness, if required, is the contract's job.
    pub async fn register(
        &self,
        image: &[u8],
        requester: &str,
        signer: &dyn TransactionSigner,
        cancel: &CancelSignal,
    ) -> Result<Registration, RegistryError> {
        let fingerprint = self.deriver.derive(image)?;
        info!("Registering fingerprint {} for {}", fingerprint.short(), requester);

        let blob = match self
            .uploader
            .upload(image, &self.endpoints, self.epochs, cancel)
            .await
        {
            Ok(blob) => blob,
            Err(RegistryError::AllEndpointsFailed { failures, .. })
                if self.upload_failure_policy == UploadFailurePolicy::Provisional =>
            {
                let blob = BlobReference::provisional(&fingerprint, Utc::now().timestamp_millis());
                warn!(
                    "All {} publishers failed; registering with provisional blob {}",
                    failures.len(),
                    blob.blob_id
                );
                blob
            }
            Err(e) => return Err(e),
        };

        if cancel.is_cancelled() {
            return Err(RegistryError::Cancelled { phase: Phase::Submit });
        }

        let request = ClaimRequest {
            fingerprint,
            blob_id: blob.blob_id.clone(),
            requested_at_epoch_millis: Utc::now().timestamp_millis(),
            requester_address: requester.to_string(),
        };

        let claim_id = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(RegistryError::Cancelled { phase: Phase::Submit });
            }
            result = self.submitter.submit(&request, signer) => result?,
        };

        let claim = Claim {
            claim_id,
            fingerprint: request.fingerprint,
            blob_id: request.blob_id,
            owner: request.requester_address,
            registered_at_epoch_millis: request.requested_at_epoch_millis,
        };
        info!(
            "Registered {} as claim {} (blob {}{})",
            claim.fingerprint.short(),
            claim.claim_id,
            claim.blob_id,
            if blob.is_provisional() { ", provisional" } else { "" }
        );
        Ok(Registration { claim, blob })
    }

    /// Answers whether `image` is already claimed. Never degrades on failure.
    pub async fn verify(&self, image: &[u8]) -> Result<Lookup, RegistryError> {
        let fingerprint = self.deriver.derive(image)?;
        info!("Verifying fingerprint {}", fingerprint.short());
        self.index.lookup(&fingerprint).await
    }
}
