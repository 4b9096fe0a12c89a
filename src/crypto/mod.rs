pub mod hashing;
pub mod keys;

pub use hashing::{canonical_landmark_bytes, BoundingBox, FaceLandmarks, FingerprintDeriver, Keypoint};
pub use keys::{load_signer, Ed25519Signer};
