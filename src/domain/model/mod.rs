//! Value objects and records shared by the registration and verification flows.

pub mod blob;
pub mod claim;
pub mod fingerprint;

pub use blob::{is_provisional_blob_id, BlobKind, BlobReference, PROVISIONAL_PREFIX};
pub use claim::{Claim, ClaimRequest, Lookup, Registration, RegistrationEvent, ScanWindow};
pub use fingerprint::Fingerprint;
