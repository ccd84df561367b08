//! Schema documents: the message descriptors and address prefix a decoder
//! is built from.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;
use txdecode_core::{
    Bech32Codec, Decoder, DecoderConfig, DecoderOptions, ProstCodec, SchemaTypeResolver,
    SigningRegistry,
};
use txdecode_schema::{FileDescriptor, FileRegistry};

const DEFAULT_BECH32_PREFIX: &str = "cosmos";

/// JSON schema document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaDocument {
    /// Human-readable part of account addresses.
    #[serde(default = "default_prefix")]
    pub bech32_prefix: String,
    /// Application files, registered on top of the envelope files.
    pub files: Vec<FileDescriptor>,
}

fn default_prefix() -> String {
    DEFAULT_BECH32_PREFIX.to_string()
}

impl SchemaDocument {
    /// Reads and parses a schema file.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read schema {}: {}", path, e))?;
        let document: Self =
            serde_json::from_str(&text).map_err(|e| format!("Invalid schema {}: {}", path, e))?;
        Ok(document)
    }

    /// Builds a decoder that resolves every message through its descriptor.
    pub fn into_decoder(
        self,
        config: DecoderConfig,
    ) -> Result<(Decoder, Bech32Codec), Box<dyn std::error::Error>> {
        let codec = Bech32Codec::new(&self.bech32_prefix)?;

        let mut registry = FileRegistry::with_envelope()?;
        registry.register_all(self.files)?;
        debug!(
            messages = registry.message_count(),
            prefix = %self.bech32_prefix,
            "loaded schema"
        );
        let registry = Arc::new(registry);

        let signing = SigningRegistry::builder()
            .address_codec(codec.clone())
            .rules_from_descriptors(&registry)
            .build()?;
        let resolver = SchemaTypeResolver::new(Arc::clone(&registry), config.walk_limits());

        let decoder = Decoder::new(
            DecoderOptions::new()
                .descriptors(registry)
                .signing(Arc::new(signing))
                .resolver(Arc::new(resolver))
                .codec(Arc::new(ProstCodec))
                .config(config),
        )?;
        Ok((decoder, codec))
    }
}
