use std::path::Path;

use serde::{Deserialize, Serialize};
use txdecode_schema::{WalkLimits, DEFAULT_MAX_DEPTH, DEFAULT_MAX_FIELDS};

use crate::errors::ConfigError;

/// Default upper bound on raw transaction size.
pub const DEFAULT_MAX_TX_BYTES: usize = 1 << 20;

/// Resource limits applied to every decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoderConfig {
    /// Inputs longer than this are rejected before parsing.
    pub max_tx_bytes: usize,
    /// Maximum message nesting depth per walk.
    pub max_depth: usize,
    /// Maximum field records per walk.
    pub max_fields: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_tx_bytes: DEFAULT_MAX_TX_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl DecoderConfig {
    /// Parses and validates a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks every limit is non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("max_tx_bytes", self.max_tx_bytes),
            ("max_depth", self.max_depth),
            ("max_fields", self.max_fields),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "must be greater than zero".into(),
                });
            }
        }
        Ok(())
    }

    /// Walk limits for the scanner and generic decoder.
    pub fn walk_limits(&self) -> WalkLimits {
        WalkLimits {
            max_depth: self.max_depth,
            max_fields: self.max_fields,
        }
    }
}
