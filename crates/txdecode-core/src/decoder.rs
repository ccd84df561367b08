//! The decode-and-validate pipeline.
//!
//! Stages run in a fixed order and each one aborts the whole decode on
//! failure:
//!
//! 1. size limit and canonical-encoding check of the raw envelope;
//! 2. strict unknown-field scan and unmarshal of `TxRaw`;
//! 3. lenient scan and unmarshal of the body;
//! 4. strict scan and unmarshal of the auth info;
//! 5. per body message: descriptor lookup, strict generic decode, signer
//!    extraction, concrete resolution and decode, signer deduplication.
//!
//! The scans in stages 2 to 4 follow every `Any` into its packed payload and
//! check it strictly, so a bad body message is already reported by stage 3.

use std::fmt;
use std::sync::Arc;

use prost::Message;
use tracing::{debug, trace};
use txdecode_canonical::{CanonicalField, CanonicalLayout, Canonicalizer, FullName, TypeUrl};
use txdecode_schema::envelope::{AUTH_INFO, TX_BODY, TX_RAW};
use txdecode_schema::{
    reject_unknown_fields_strict, scan, DescriptorResolver, DynamicMessage, FileRegistry,
    MessageDescriptor, SchemaError, Tolerance, WalkLimits,
};

use crate::config::DecoderConfig;
use crate::decoded::DecodedTx;
use crate::errors::{ConfigError, DecodeError, MalformedCause, Stage};
use crate::resolver::{ConcreteMessage, MessageCodec, TypeResolver};
use crate::signing::SigningRegistry;
use crate::tx::{Any, AuthInfo, Tx, TxBody, TxRaw};

const TX_RAW_FIELDS: &[CanonicalField] = &[
    CanonicalField::bytes(1),
    CanonicalField::bytes(2),
    CanonicalField::repeated_bytes(3),
];

/// Canonical layout of the outer envelope.
pub const TX_RAW_LAYOUT: CanonicalLayout = CanonicalLayout {
    name: TX_RAW,
    fields: TX_RAW_FIELDS,
};

/// Capabilities and limits a [`Decoder`] is built from.
///
/// Every capability is required; [`Decoder::new`] reports the first one missing.
#[derive(Clone, Default)]
pub struct DecoderOptions {
    /// Schema registry body messages are looked up in.
    pub descriptors: Option<Arc<FileRegistry>>,
    /// Signer rules per message type.
    pub signing: Option<Arc<SigningRegistry>>,
    /// Type identifier → native prototype.
    pub resolver: Option<Arc<dyn TypeResolver>>,
    /// Populates prototypes from bytes.
    pub codec: Option<Arc<dyn MessageCodec>>,
    /// Resource limits.
    pub config: DecoderConfig,
}

impl DecoderOptions {
    /// Options with nothing set and default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the descriptor registry.
    pub fn descriptors(mut self, registry: Arc<FileRegistry>) -> Self {
        self.descriptors = Some(registry);
        self
    }

    /// Sets the signing-rule registry.
    pub fn signing(mut self, signing: Arc<SigningRegistry>) -> Self {
        self.signing = Some(signing);
        self
    }

    /// Sets the concrete-type resolver.
    pub fn resolver(mut self, resolver: Arc<dyn TypeResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the message codec.
    pub fn codec(mut self, codec: Arc<dyn MessageCodec>) -> Self {
        self.codec = Some(codec);
        self
    }

    /// Sets the limits.
    pub fn config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }
}

/// A configured decoder. Holds no per-call state; share it freely.
pub struct Decoder {
    descriptors: Arc<FileRegistry>,
    signing: Arc<SigningRegistry>,
    resolver: Arc<dyn TypeResolver>,
    codec: Arc<dyn MessageCodec>,
    config: DecoderConfig,
    envelope: FileRegistry,
    tx_raw: Arc<MessageDescriptor>,
    tx_body: Arc<MessageDescriptor>,
    auth_info: Arc<MessageDescriptor>,
}

/// Envelope types first, then the injected schema. Packed `Any` payloads
/// anywhere in the transaction resolve through this.
struct Lookup<'a> {
    envelope: &'a FileRegistry,
    schema: &'a FileRegistry,
}

impl DescriptorResolver for Lookup<'_> {
    fn find_message(&self, name: &FullName) -> Result<Arc<MessageDescriptor>, SchemaError> {
        self.envelope
            .find_message(name)
            .or_else(|_| self.schema.find_message(name))
    }
}

struct ResolvedMessage {
    dynamic: DynamicMessage,
    concrete: Box<dyn ConcreteMessage>,
    signers: Vec<Vec<u8>>,
}

impl Decoder {
    /// Builds a decoder, failing if a capability is missing or a limit is invalid.
    pub fn new(options: DecoderOptions) -> Result<Self, ConfigError> {
        let descriptors = options.descriptors.ok_or(ConfigError::MissingDescriptors)?;
        let signing = options.signing.ok_or(ConfigError::MissingSigning)?;
        let resolver = options.resolver.ok_or(ConfigError::MissingResolver)?;
        let codec = options.codec.ok_or(ConfigError::MissingCodec)?;
        options.config.validate()?;

        let envelope = FileRegistry::with_envelope()?;
        let envelope_message = |name: &str| -> Result<Arc<MessageDescriptor>, ConfigError> {
            let name = FullName::parse(name).map_err(SchemaError::from)?;
            Ok(envelope.find_message(&name)?)
        };
        let tx_raw = envelope_message(TX_RAW)?;
        let tx_body = envelope_message(TX_BODY)?;
        let auth_info = envelope_message(AUTH_INFO)?;

        Ok(Self {
            descriptors,
            signing,
            resolver,
            codec,
            config: options.config,
            envelope,
            tx_raw,
            tx_body,
            auth_info,
        })
    }

    fn lookup(&self) -> Lookup<'_> {
        Lookup {
            envelope: &self.envelope,
            schema: self.descriptors.as_ref(),
        }
    }

    /// The limits in force.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decodes and validates one transaction.
    pub fn decode(&self, bytes: &[u8]) -> Result<DecodedTx, DecodeError> {
        debug!(tx_len = bytes.len(), "decoding transaction");
        let limits = self.config.walk_limits();

        if bytes.len() > self.config.max_tx_bytes {
            return Err(DecodeError::malformed(
                Stage::Canonical,
                MalformedCause::TooLarge {
                    len: bytes.len(),
                    max: self.config.max_tx_bytes,
                },
            ));
        }
        Canonicalizer::new(TX_RAW_LAYOUT)
            .validate(bytes)
            .map_err(|e| DecodeError::malformed(Stage::Canonical, e))?;

        let lookup = self.lookup();
        reject_unknown_fields_strict(bytes, &self.tx_raw, &lookup, limits)
            .map_err(|e| DecodeError::from_schema(Stage::Root, e))?;
        let tx_raw = TxRaw::decode(bytes).map_err(|e| DecodeError::malformed(Stage::Root, e))?;

        let body_report = scan(
            &tx_raw.body_bytes,
            &self.tx_body,
            &lookup,
            Tolerance::Lenient,
            limits,
        )
        .map_err(|e| DecodeError::from_schema(Stage::Body, e))?;
        let body = TxBody::decode(tx_raw.body_bytes.as_slice())
            .map_err(|e| DecodeError::malformed(Stage::Body, e))?;

        reject_unknown_fields_strict(&tx_raw.auth_info_bytes, &self.auth_info, &lookup, limits)
            .map_err(|e| DecodeError::from_schema(Stage::AuthInfo, e))?;
        let auth_info = AuthInfo::decode(tx_raw.auth_info_bytes.as_slice())
            .map_err(|e| DecodeError::malformed(Stage::AuthInfo, e))?;

        let mut messages = Vec::with_capacity(body.messages.len());
        let mut dynamic_messages = Vec::with_capacity(body.messages.len());
        let mut signers: Vec<Vec<u8>> = Vec::new();
        for (index, any) in body.messages.iter().enumerate() {
            let resolved = self.resolve_message(Stage::Message { index }, any, &lookup, limits)?;
            for signer in resolved.signers {
                if !signers.contains(&signer) {
                    signers.push(signer);
                }
            }
            messages.push(resolved.concrete);
            dynamic_messages.push(resolved.dynamic);
        }

        debug!(
            messages = messages.len(),
            signers = signers.len(),
            has_unknown_non_criticals = body_report.has_unknown_non_criticals,
            "decoded transaction"
        );

        let tx = Tx {
            body: Some(body),
            auth_info: Some(auth_info),
            signatures: tx_raw.signatures.clone(),
        };
        Ok(DecodedTx::new(
            tx,
            tx_raw,
            messages,
            dynamic_messages,
            signers,
            body_report.has_unknown_non_criticals,
        ))
    }

    fn resolve_message(
        &self,
        stage: Stage,
        any: &Any,
        lookup: &Lookup<'_>,
        limits: WalkLimits,
    ) -> Result<ResolvedMessage, DecodeError> {
        let not_found = || DecodeError::DescriptorNotFound {
            stage,
            type_url: any.type_url.clone(),
        };
        let type_url = TypeUrl::parse(any.type_url.as_str()).map_err(|_| not_found())?;
        let name = type_url.message_name().map_err(|_| not_found())?;
        trace!(%stage, type_url = %type_url, payload_len = any.value.len(), "resolving message");

        let descriptor = self
            .descriptors
            .find_message(&name)
            .map_err(|e| DecodeError::from_schema(stage, e))?;
        let dynamic = DynamicMessage::decode(&any.value, descriptor, lookup, limits)
            .map_err(|e| DecodeError::from_schema(stage, e))?;

        let signers = self
            .signing
            .get_signers(&dynamic)
            .map_err(|source| DecodeError::SignerExtraction { stage, source })?;

        let mut concrete = self
            .resolver
            .resolve(&type_url)
            .map_err(|source| DecodeError::ConcreteResolution { stage, source })?;
        self.codec
            .unmarshal(&any.value, concrete.as_mut())
            .map_err(|source| DecodeError::ConcreteResolution { stage, source })?;

        Ok(ResolvedMessage {
            dynamic,
            concrete,
            signers,
        })
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("messages", &self.descriptors.message_count())
            .field("signing", &self.signing)
            .field("config", &self.config)
            .finish()
    }
}
