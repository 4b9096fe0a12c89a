use primitive_types::H256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{Phase, RegistryError};

/// A 256-bit content fingerprint, the natural key of a claim.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(H256);

impl Fingerprint {
    pub fn from_h256(h: H256) -> Self {
        Self(h)
    }

    /// Parses 64 hex characters, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, RegistryError> {
        let s = s.trim();
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|_| RegistryError::invalid(Phase::Derive, format!("fingerprint is not hex: {}", s)))?;
        if bytes.len() != 32 {
            return Err(RegistryError::invalid(
                Phase::Derive,
                format!("fingerprint must be 32 bytes, got {}", bytes.len()),
            ));
        }
        Ok(Self(H256::from_slice(&bytes)))
    }

    pub fn as_h256(&self) -> &H256 {
        &self.0
    }

    /// Lowercase hex without prefix. This is the form recorded on the ledger.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.as_bytes())
    }

    /// First 16 hex characters, used in log lines and provisional blob ids.
    pub fn short(&self) -> String {
        self.to_hex()[..16].to_string()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Fingerprint::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn hex_round_trip_accepts_prefix_and_uppercase() {
        let a = Fingerprint::from_hex(ABC).unwrap();
        let b = Fingerprint::from_hex(&format!("0x{}", ABC.to_uppercase())).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_hex(), ABC);
        assert_eq!(a.short(), "ba7816bf8f01cfea");
    }

    #[test]
    fn rejects_wrong_length_and_non_hex() {
        assert!(matches!(
            Fingerprint::from_hex("abcd"),
            Err(RegistryError::InvalidInput { .. })
        ));
        assert!(matches!(
            Fingerprint::from_hex(&"zz".repeat(32)),
            Err(RegistryError::InvalidInput { .. })
        ));
    }

    #[test]
    fn serializes_as_plain_hex_string() {
        let fp = Fingerprint::from_hex(ABC).unwrap();
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", ABC));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }
}
