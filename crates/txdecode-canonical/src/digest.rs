use std::fmt;
use std::sync::OnceLock;

use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as Sha2Digest, Sha256};

use crate::validation::ValidationError;

/// Supported digest algorithms for content identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DigestAlg {
    /// SHA-256, the only algorithm transaction hashes use.
    #[serde(rename = "sha-256")]
    Sha256,
}

/// Algorithm + bytes digest, encoded as base64url without padding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest {
    /// Digest algorithm (currently always `sha-256`).
    pub alg: DigestAlg,
    /// Base64URL (no padding) digest bytes.
    #[serde(rename = "b64")]
    pub b64: String,
}

impl Digest {
    /// Constructs a validated digest.
    pub fn new(alg: DigestAlg, b64: impl Into<String>) -> Result<Self, ValidationError> {
        static PATTERN: OnceLock<Regex> = OnceLock::new();
        let b64 = b64.into();
        let re = PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{43,44}$").expect("invalid regex"));
        if !re.is_match(&b64) {
            return Err(ValidationError::Malformed {
                kind: "digest",
                value: b64,
            });
        }
        Ok(Digest { alg, b64 })
    }
}

/// SHA-256 content hash of a canonical transaction envelope.
///
/// Displays and serializes as uppercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TxHash([u8; TxHash::LEN]);

impl TxHash {
    /// Digest length in bytes.
    pub const LEN: usize = 32;

    /// Hashes `bytes`.
    pub fn compute(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Wraps an existing digest.
    pub fn from_bytes(bytes: [u8; TxHash::LEN]) -> Self {
        Self(bytes)
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; TxHash::LEN] {
        &self.0
    }

    /// Parses a hex string (either case).
    pub fn from_hex(value: &str) -> Result<Self, ValidationError> {
        let bytes = hex::decode(value).map_err(|_| ValidationError::Malformed {
            kind: "tx_hash",
            value: value.to_string(),
        })?;
        let arr: [u8; TxHash::LEN] =
            bytes
                .try_into()
                .map_err(|b: Vec<u8>| ValidationError::WrongLength {
                    kind: "tx_hash",
                    expected: TxHash::LEN,
                    actual: b.len(),
                })?;
        Ok(Self(arr))
    }

    /// Uppercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Base64URL rendering without padding.
    pub fn to_b64(&self) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(self.0)
    }

    /// The `{alg, b64}` form of this hash.
    pub fn to_digest(&self) -> Digest {
        Digest {
            alg: DigestAlg::Sha256,
            b64: self.to_b64(),
        }
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", self.to_hex())
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        TxHash::from_hex(&value).map_err(serde::de::Error::custom)
    }
}
