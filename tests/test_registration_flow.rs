//! End-to-end register / verify through the coordinator with fake collaborators.

mod common;

use common::{
    contract, dead_endpoint, fast_ledger_config, spawn_publisher, storage_config, FakeLedger,
    FixedSigner, PublisherBehavior, SubmitBehavior,
};
use faceguard::crypto::FingerprintDeriver;
use faceguard::domain::model::{is_provisional_blob_id, BlobKind, Lookup};
use faceguard::domain::registration::{ClaimSubmitter, RegistrationCoordinator, UploadFailurePolicy};
use faceguard::domain::verify::ClaimIndex;
use faceguard::error::{Phase, RegistryError};
use faceguard::infra::cancel::{cancel_pair, CancelSignal};
use faceguard::infra::sui::LedgerClient;
use faceguard::infra::walrus::BlobUploader;
use std::sync::Arc;
use std::time::Duration;

const OWNER: &str = "0xaaa";
const IMG1: &[u8] = b"\x89PNG first face image";
const IMG2: &[u8] = b"\x89PNG second face image";

fn coordinator(
    ledger: &Arc<FakeLedger>,
    publishers: Vec<String>,
    policy: UploadFailurePolicy,
) -> RegistrationCoordinator {
    let dyn_ledger: Arc<dyn LedgerClient> = ledger.clone();
    let ledger_config = fast_ledger_config();
    RegistrationCoordinator::new(
        FingerprintDeriver::new(),
        BlobUploader::new(&storage_config(publishers.clone(), Duration::from_millis(500))),
        ClaimSubmitter::new(dyn_ledger.clone(), contract(), &ledger_config),
        ClaimIndex::new(dyn_ledger, contract(), &ledger_config),
        publishers,
        5,
        policy,
    )
}

#[tokio::test]
async fn register_then_verify_finds_the_claim() {
    let p1 = spawn_publisher(PublisherBehavior::Fail(502)).await;
    let p2 = spawn_publisher(PublisherBehavior::Store("b123".into())).await;
    let ledger = FakeLedger::new(SubmitBehavior::Mint { hidden_fetches: 2 });
    let coordinator = coordinator(
        &ledger,
        vec![p1.url.clone(), p2.url.clone()],
        UploadFailurePolicy::Abort,
    );

    let registration = coordinator
        .register(IMG1, OWNER, &FixedSigner::new(OWNER), &CancelSignal::never())
        .await
        .unwrap();

    let expected = FingerprintDeriver::new().derive(IMG1).unwrap();
    assert_eq!(registration.claim.claim_id, "0xc1");
    assert_eq!(registration.claim.fingerprint, expected);
    assert_eq!(registration.claim.blob_id, "b123");
    assert_eq!(registration.claim.owner, OWNER);
    assert_eq!(registration.blob.endpoint, p2.url);
    assert_eq!(registration.blob.kind, BlobKind::ContentAddressed);
    assert_eq!(p2.blobs.lock().unwrap().get("b123").map(Vec::as_slice), Some(IMG1));

    let found = coordinator.verify(IMG1).await.unwrap();
    let claim = found.claim().expect("registered image must be found");
    assert_eq!(claim.claim_id, "0xc1");
    assert_eq!(claim.owner, OWNER);
    assert_eq!(claim.blob_id, "b123");
    assert_eq!(claim.fingerprint, expected);
    assert_eq!(claim.registered_at_epoch_millis, registration.claim.registered_at_epoch_millis);

    assert!(matches!(coordinator.verify(IMG2).await.unwrap(), Lookup::NotFound(_)));
}

#[tokio::test]
async fn provisional_blob_is_used_when_policy_allows() {
    let dead = dead_endpoint().await;
    let p2 = spawn_publisher(PublisherBehavior::Fail(500)).await;
    let ledger = FakeLedger::new(SubmitBehavior::Mint { hidden_fetches: 0 });
    let coordinator = coordinator(&ledger, vec![dead, p2.url.clone()], UploadFailurePolicy::Provisional);

    let registration = coordinator
        .register(IMG1, OWNER, &FixedSigner::new(OWNER), &CancelSignal::never())
        .await
        .unwrap();

    assert!(registration.blob.is_provisional());
    assert!(is_provisional_blob_id(&registration.claim.blob_id));
    let fp = FingerprintDeriver::new().derive(IMG1).unwrap();
    assert!(registration.claim.blob_id.contains(&fp.short()));

    // The ledger record carries the same marker, so readers can tell it apart.
    let claim = coordinator.verify(IMG1).await.unwrap();
    assert!(is_provisional_blob_id(&claim.claim().unwrap().blob_id));
}

#[tokio::test]
async fn upload_failure_aborts_before_touching_the_ledger() {
    let p1 = spawn_publisher(PublisherBehavior::Fail(500)).await;
    let ledger = FakeLedger::new(SubmitBehavior::Mint { hidden_fetches: 0 });
    let coordinator = coordinator(&ledger, vec![p1.url.clone()], UploadFailurePolicy::Abort);

    let err = coordinator
        .register(IMG1, OWNER, &FixedSigner::new(OWNER), &CancelSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::AllEndpointsFailed { ref failures, .. } if failures.len() == 1));
    assert!(err.user_message().starts_with("upload failed"));
    assert!(ledger.calls().is_empty());
}

#[tokio::test]
async fn empty_image_is_rejected_up_front() {
    let p1 = spawn_publisher(PublisherBehavior::Store("b".into())).await;
    let ledger = FakeLedger::new(SubmitBehavior::Mint { hidden_fetches: 0 });
    let coordinator = coordinator(&ledger, vec![p1.url.clone()], UploadFailurePolicy::Provisional);

    let err = coordinator
        .register(b"", OWNER, &FixedSigner::new(OWNER), &CancelSignal::never())
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::InvalidInput { .. }));
    assert_eq!(err.phase(), Phase::Derive);
    assert_eq!(p1.hit_count(), 0);
    assert!(matches!(coordinator.verify(b"").await, Err(RegistryError::InvalidInput { .. })));
}

#[tokio::test]
async fn cancelled_registration_stops_before_submitting() {
    let p1 = spawn_publisher(PublisherBehavior::Store("b".into())).await;
    let ledger = FakeLedger::new(SubmitBehavior::Mint { hidden_fetches: 0 });
    let coordinator = coordinator(&ledger, vec![p1.url.clone()], UploadFailurePolicy::Abort);

    let (handle, signal) = cancel_pair();
    handle.cancel();
    let err = coordinator
        .register(IMG1, OWNER, &FixedSigner::new(OWNER), &signal)
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Cancelled { .. }));
    assert_eq!(ledger.count_calls("submit_transaction"), 0);
}

#[tokio::test]
async fn registering_the_same_image_twice_mints_two_claims() {
    let p1 = spawn_publisher(PublisherBehavior::AlreadyCertified("b-same".into())).await;
    let ledger = FakeLedger::new(SubmitBehavior::Mint { hidden_fetches: 0 });
    let coordinator = coordinator(&ledger, vec![p1.url.clone()], UploadFailurePolicy::Abort);
    let signer = FixedSigner::new(OWNER);

    let first = coordinator
        .register(IMG1, OWNER, &signer, &CancelSignal::never())
        .await
        .unwrap();
    let second = coordinator
        .register(IMG1, OWNER, &signer, &CancelSignal::never())
        .await
        .unwrap();
    assert_ne!(first.claim.claim_id, second.claim.claim_id);
    assert!(second.blob.already_existed);

    // Newest event first: verify reports the most recent live claim.
    let found = coordinator.verify(IMG1).await.unwrap();
    assert_eq!(found.claim().unwrap().claim_id, second.claim.claim_id);
}
