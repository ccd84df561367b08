//! Address text encodings.

use std::fmt;

use bech32::{Bech32, Hrp};

use crate::errors::SignerError;

/// Converts between address text and raw address bytes.
pub trait AddressCodec: fmt::Debug + Send + Sync {
    /// Decodes address text into raw bytes.
    fn string_to_bytes(&self, text: &str) -> Result<Vec<u8>, SignerError>;
    /// Encodes raw bytes as address text.
    fn bytes_to_string(&self, bytes: &[u8]) -> Result<String, SignerError>;
}

/// Bech32 addresses under a fixed human-readable prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct Bech32Codec {
    hrp: Hrp,
}

impl Bech32Codec {
    /// Creates a codec for `prefix` (e.g. `cosmos`).
    pub fn new(prefix: &str) -> Result<Self, SignerError> {
        let hrp = Hrp::parse(prefix).map_err(|e| SignerError::InvalidAddress {
            address: prefix.to_string(),
            reason: format!("invalid prefix: {}", e),
        })?;
        Ok(Self { hrp })
    }

    /// The human-readable prefix.
    pub fn prefix(&self) -> String {
        self.hrp.to_string()
    }
}

impl AddressCodec for Bech32Codec {
    fn string_to_bytes(&self, text: &str) -> Result<Vec<u8>, SignerError> {
        let invalid = |reason: String| SignerError::InvalidAddress {
            address: text.to_string(),
            reason,
        };
        if text.is_empty() {
            return Err(invalid("empty address".into()));
        }
        let (hrp, data) = bech32::decode(text).map_err(|e| invalid(e.to_string()))?;
        if hrp != self.hrp {
            return Err(invalid(format!("expected prefix {}, got {}", self.hrp, hrp)));
        }
        if data.is_empty() {
            return Err(invalid("empty address payload".into()));
        }
        Ok(data)
    }

    fn bytes_to_string(&self, bytes: &[u8]) -> Result<String, SignerError> {
        bech32::encode::<Bech32>(self.hrp, bytes).map_err(|e| SignerError::InvalidAddress {
            address: hex::encode(bytes),
            reason: e.to_string(),
        })
    }
}
