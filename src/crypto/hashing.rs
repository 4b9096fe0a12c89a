// Fingerprint derivation: raw image bytes, or quantized face landmarks, into a 256-bit digest.

use primitive_types::H256;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::model::Fingerprint;
use crate::error::{Phase, RegistryError};

/// A single detected landmark, in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: f64,
    pub height: f64,
}

/// Output of an external face-landmark detector, consumed as opaque features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceLandmarks {
    pub keypoints: Vec<Keypoint>,
    pub bounding_box: BoundingBox,
}

/// Rounds half towards positive infinity (`Math.round` semantics used by detector tooling).
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

fn quantize_2dp(v: f64) -> f64 {
    round_half_up(v * 100.0) / 100.0
}

/// Renders a number the way a JavaScript `JSON.stringify` would: integral values
/// carry no fractional part.
fn js_number(v: f64) -> Value {
    if v.fract() == 0.0 && v.abs() < 9_007_199_254_740_992.0 {
        Value::from(v as i64)
    } else {
        Value::from(v)
    }
}

// Field order is part of the hashed bytes.
#[derive(Serialize)]
struct CanonicalKeypoint {
    x: Value,
    y: Value,
}

#[derive(Serialize)]
struct CanonicalBox {
    w: i64,
    h: i64,
}

#[derive(Serialize)]
struct CanonicalLandmarks {
    keypoints: Vec<CanonicalKeypoint>,
    bbox: CanonicalBox,
}

/// Canonical bytes for a landmark set.
///
/// Detector output is not bit-stable between runs, so coordinates are rounded to two
/// decimals and the box to whole pixels before hashing. This loses precision on purpose.
/// The layout is `{"keypoints":[{"x":..,"y":..}],"bbox":{"w":..,"h":..}}` in that key
/// order, with integral numbers written without a fraction, so browser-side detector
/// tooling hashing the same record produces the same fingerprint.
pub fn canonical_landmark_bytes(landmarks: &FaceLandmarks) -> Result<Vec<u8>, RegistryError> {
    if landmarks.keypoints.is_empty() {
        return Err(RegistryError::invalid(Phase::Derive, "landmark set has no keypoints"));
    }
    let all_finite = landmarks
        .keypoints
        .iter()
        .all(|kp| kp.x.is_finite() && kp.y.is_finite())
        && landmarks.bounding_box.width.is_finite()
        && landmarks.bounding_box.height.is_finite();
    if !all_finite {
        return Err(RegistryError::invalid(
            Phase::Derive,
            "landmark coordinates must be finite",
        ));
    }

    let record = CanonicalLandmarks {
        keypoints: landmarks
            .keypoints
            .iter()
            .map(|kp| CanonicalKeypoint {
                x: js_number(quantize_2dp(kp.x)),
                y: js_number(quantize_2dp(kp.y)),
            })
            .collect(),
        bbox: CanonicalBox {
            w: round_half_up(landmarks.bounding_box.width) as i64,
            h: round_half_up(landmarks.bounding_box.height) as i64,
        },
    };

    serde_json::to_vec(&record).map_err(|e| {
        RegistryError::invalid(Phase::Derive, format!("landmarks not serializable: {}", e))
    })
}

/// Turns payload bytes into a [`Fingerprint`]. Pure and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FingerprintDeriver;

impl FingerprintDeriver {
    pub fn new() -> Self {
        Self
    }

    /// SHA-256 over the payload. This is the canonical derivation for images.
    pub fn derive(&self, payload: &[u8]) -> Result<Fingerprint, RegistryError> {
        if payload.is_empty() {
            return Err(RegistryError::invalid(
                Phase::Derive,
                "cannot fingerprint an empty payload",
            ));
        }
        let mut hasher = Sha256::new();
        hasher.update(payload);
        Ok(Fingerprint::from_h256(H256::from_slice(&hasher.finalize())))
    }

    /// Fingerprint of a normalized landmark record.
    ///
    /// Never comparable with [`FingerprintDeriver::derive`] over image bytes.
    pub fn derive_landmarks(&self, landmarks: &FaceLandmarks) -> Result<Fingerprint, RegistryError> {
        let bytes = canonical_landmark_bytes(landmarks)?;
        self.derive(&bytes)
    }
}
