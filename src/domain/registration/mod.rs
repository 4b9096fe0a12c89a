pub mod coordinator;
pub mod submitter;

pub use coordinator::{RegistrationCoordinator, UploadFailurePolicy};
pub use submitter::{ClaimSubmitter, Settlement};
