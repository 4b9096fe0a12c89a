//! Ed25519 keys in the ledger's wire conventions: address derivation and
//! intent-prefixed transaction signatures.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signer, SigningKey};

use crate::error::SignerError;
use crate::infra::sui::TransactionSigner;

/// Signature scheme flag for Ed25519.
const ED25519_FLAG: u8 = 0x00;
/// Intent prefix for transaction data: scope=TransactionData, version=V0, app=Sui.
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

type Blake2b256 = Blake2b<U32>;

fn blake2b256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for p in parts {
        hasher.update(p);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// Holds a signing key and answers with the address it controls.
#[derive(Debug)]
pub struct Ed25519Signer {
    key: SigningKey,
    address: String,
}

impl Ed25519Signer {
    pub fn from_seed(seed: [u8; 32]) -> Self {
        let key = SigningKey::from_bytes(&seed);
        let public = key.verifying_key().to_bytes();
        let address = format!("0x{}", hex::encode(blake2b256(&[&[ED25519_FLAG], &public])));
        Self { key, address }
    }

    pub fn generate() -> Self {
        let key = SigningKey::generate(&mut rand::rngs::OsRng);
        Self::from_seed(key.to_bytes())
    }

    /// Accepts keystore base64 (`flag || seed`) or a 32-byte hex seed.
    pub fn from_encoded(encoded: &str) -> Result<Self, SignerError> {
        let encoded = encoded.trim();
        if encoded.starts_with("suiprivkey") {
            return Err(SignerError::InvalidKey(
                "bech32 keys are not supported; export the key in base64 keystore form".to_string(),
            ));
        }

        let hex_part = encoded.strip_prefix("0x").unwrap_or(encoded);
        if hex_part.len() == 64 {
            if let Ok(bytes) = hex::decode(hex_part) {
                return Ok(Self::from_seed(to_seed(&bytes)?));
            }
        }

        let raw = BASE64
            .decode(encoded)
            .map_err(|e| SignerError::InvalidKey(format!("not hex or base64: {}", e)))?;
        match raw.split_first() {
            Some((&ED25519_FLAG, seed)) if seed.len() == 32 => Ok(Self::from_seed(to_seed(seed)?)),
            Some((flag, _)) if raw.len() == 33 => Err(SignerError::InvalidKey(format!(
                "unsupported signature scheme flag {:#04x}",
                flag
            ))),
            _ => Err(SignerError::InvalidKey(format!(
                "expected 33 bytes (flag + seed), got {}",
                raw.len()
            ))),
        }
    }

    /// Loads the key at `index` from a keystore file (a JSON array of base64 keys).
    pub fn from_keystore(path: &str, index: usize) -> Result<Self, SignerError> {
        let expanded = shellexpand::tilde(path).to_string();
        let keystore_err = |reason: String| SignerError::Keystore {
            path: expanded.clone(),
            reason,
        };
        let content = std::fs::read_to_string(&expanded).map_err(|e| keystore_err(e.to_string()))?;
        let keys: Vec<String> =
            serde_json::from_str(&content).map_err(|e| keystore_err(e.to_string()))?;
        let entry = keys
            .get(index)
            .ok_or_else(|| keystore_err(format!("no key at index {} ({} keys)", index, keys.len())))?;
        Self::from_encoded(entry)
    }

    /// Keystore form of this key, for export.
    pub fn to_keystore_entry(&self) -> String {
        let mut raw = Vec::with_capacity(33);
        raw.push(ED25519_FLAG);
        raw.extend_from_slice(&self.key.to_bytes());
        BASE64.encode(raw)
    }

    pub fn public_key(&self) -> [u8; 32] {
        self.key.verifying_key().to_bytes()
    }
}

/// Resolves the configured signing identity: an explicit key wins over the first
/// keystore entry. `Ok(None)` if neither is configured.
pub fn load_signer(
    private_key: Option<&str>,
    keystore_path: Option<&str>,
) -> Result<Option<Ed25519Signer>, SignerError> {
    if let Some(key) = private_key {
        return Ed25519Signer::from_encoded(key).map(Some);
    }
    keystore_path
        .map(|path| Ed25519Signer::from_keystore(path, 0))
        .transpose()
}

fn to_seed(bytes: &[u8]) -> Result<[u8; 32], SignerError> {
    bytes
        .try_into()
        .map_err(|_| SignerError::InvalidKey(format!("seed must be 32 bytes, got {}", bytes.len())))
}

impl TransactionSigner for Ed25519Signer {
    fn address(&self) -> String {
        self.address.clone()
    }

    fn sign_transaction(&self, tx_bytes: &[u8]) -> Result<String, SignerError> {
        let digest = blake2b256(&[&TRANSACTION_INTENT, tx_bytes]);
        let signature = self.key.sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(&self.public_key());
        Ok(BASE64.encode(serialized))
    }
}
