pub mod crypto;
pub mod domain;
pub mod error;
pub mod infra;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use crypto::{Ed25519Signer, FingerprintDeriver};
pub use domain::model::{BlobReference, Claim, ClaimRequest, Fingerprint, Lookup, Registration};
pub use domain::registration::{ClaimSubmitter, RegistrationCoordinator};
pub use domain::verify::ClaimIndex;
pub use error::{Phase, RegistryError};
pub use infra::cancel::{cancel_pair, CancelHandle, CancelSignal};
pub use infra::config::AppConfig;
pub use infra::walrus::{BlobReader, BlobUploader};
