use std::fmt;

use thiserror::Error;
use txdecode_canonical::CanonicalizationError;
use txdecode_schema::SchemaError;

/// Pipeline stage at which a decode failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Size limit and canonical-encoding check of the raw envelope.
    Canonical,
    /// Scanning and unmarshaling the outer `TxRaw`.
    Root,
    /// Scanning and unmarshaling the body.
    Body,
    /// Scanning and unmarshaling the auth info.
    AuthInfo,
    /// Resolving the body message at `index`.
    Message {
        /// Position in the body's message list.
        index: usize,
    },
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Canonical => f.write_str("canonical"),
            Stage::Root => f.write_str("root"),
            Stage::Body => f.write_str("body"),
            Stage::AuthInfo => f.write_str("auth_info"),
            Stage::Message { index } => write!(f, "message {}", index),
        }
    }
}

/// Why an envelope was judged malformed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MalformedCause {
    /// Input longer than the configured limit.
    #[error("{len} bytes exceeds the {max}-byte limit")]
    TooLarge {
        /// Input length.
        len: usize,
        /// Configured limit.
        max: usize,
    },
    /// Not the canonical encoding of its content.
    #[error(transparent)]
    NonCanonical(#[from] CanonicalizationError),
    /// Structurally invalid records, or a walk limit was hit.
    #[error(transparent)]
    Schema(SchemaError),
    /// The protobuf decoder rejected the bytes.
    #[error(transparent)]
    Protobuf(#[from] prost::DecodeError),
}

/// Errors raised by [`crate::Decoder::decode`].
///
/// Decoding is all-or-nothing: every variant means no `DecodedTx` was built.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Non-canonical, oversized or structurally invalid bytes.
    #[error("malformed envelope at {stage}: {cause}")]
    MalformedEnvelope {
        /// Failing stage.
        stage: Stage,
        /// Underlying cause.
        #[source]
        cause: MalformedCause,
    },
    /// A field number outside the descriptor and any tolerated range.
    #[error("unknown field rejected at {stage}: {source}")]
    UnknownFieldRejected {
        /// Failing stage.
        stage: Stage,
        /// Scanner error naming the message and field.
        source: SchemaError,
    },
    /// A body message names a type the registry does not know.
    #[error("descriptor not found at {stage}: {type_url}")]
    DescriptorNotFound {
        /// Failing stage.
        stage: Stage,
        /// The type identifier as found, or the name it normalized to.
        type_url: String,
    },
    /// Schema-conformant field numbers whose values do not parse.
    #[error("payload decode failed at {stage}: {source}")]
    PayloadDecode {
        /// Failing stage.
        stage: Stage,
        /// Decoder error.
        source: SchemaError,
    },
    /// No signing rule for the type, or the rule failed.
    #[error("signer extraction failed at {stage}: {source}")]
    SignerExtraction {
        /// Failing stage.
        stage: Stage,
        /// Rule error.
        source: SignerError,
    },
    /// The type has no native prototype, or native decoding failed.
    #[error("concrete resolution failed at {stage}: {source}")]
    ConcreteResolution {
        /// Failing stage.
        stage: Stage,
        /// Resolver or codec error.
        source: ResolveError,
    },
}

impl DecodeError {
    /// Stage at which decoding stopped.
    pub fn stage(&self) -> Stage {
        match self {
            DecodeError::MalformedEnvelope { stage, .. }
            | DecodeError::UnknownFieldRejected { stage, .. }
            | DecodeError::DescriptorNotFound { stage, .. }
            | DecodeError::PayloadDecode { stage, .. }
            | DecodeError::SignerExtraction { stage, .. }
            | DecodeError::ConcreteResolution { stage, .. } => *stage,
        }
    }

    /// Classifies a schema-layer failure raised during `stage`.
    pub(crate) fn from_schema(stage: Stage, err: SchemaError) -> Self {
        match err {
            SchemaError::UnknownField { .. } => DecodeError::UnknownFieldRejected { stage, source: err },
            SchemaError::DescriptorNotFound(name) => DecodeError::DescriptorNotFound {
                stage,
                type_url: name,
            },
            err if err.is_malformed_input() => DecodeError::MalformedEnvelope {
                stage,
                cause: MalformedCause::Schema(err),
            },
            err => DecodeError::PayloadDecode { stage, source: err },
        }
    }

    pub(crate) fn malformed(stage: Stage, cause: impl Into<MalformedCause>) -> Self {
        DecodeError::MalformedEnvelope {
            stage,
            cause: cause.into(),
        }
    }
}

/// Errors raised while extracting signers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SignerError {
    /// No rule is registered for the message type.
    #[error("no signing rule registered for {0}")]
    NoRule(String),
    /// The registry was built without an address codec.
    #[error("signing registry has no address codec")]
    MissingAddressCodec,
    /// A singular signer field is unset.
    #[error("signer field {field} of {message} is empty")]
    EmptySigner {
        /// Message type.
        message: String,
        /// Field name.
        field: String,
    },
    /// A signer field cannot carry an address.
    #[error("field {field} of {message} cannot carry a signer")]
    UnsupportedField {
        /// Message type.
        message: String,
        /// Field name.
        field: String,
    },
    /// An address string did not decode.
    #[error("invalid address {address}: {reason}")]
    InvalidAddress {
        /// The offending text.
        address: String,
        /// Codec error.
        reason: String,
    },
    /// A custom rule failed.
    #[error("signing rule failed: {0}")]
    Rule(String),
}

/// Errors raised by concrete-type resolution and native decoding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// The type identifier does not name a message.
    #[error("invalid type URL {0}")]
    InvalidTypeUrl(String),
    /// No native prototype is registered for the type.
    #[error("no concrete type registered for {0}")]
    UnknownType(String),
    /// Native decoding failed.
    #[error("decoding {type_url} failed: {reason}")]
    Decode {
        /// Type being decoded.
        type_url: String,
        /// Decoder error.
        reason: String,
    },
}

/// Errors raised while configuring a decoder.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No descriptor registry was supplied.
    #[error("decoder requires a descriptor registry")]
    MissingDescriptors,
    /// No signing-rule registry was supplied.
    #[error("decoder requires a signing-rule registry")]
    MissingSigning,
    /// No concrete-type resolver was supplied.
    #[error("decoder requires a concrete-type resolver")]
    MissingResolver,
    /// No message codec was supplied.
    #[error("decoder requires a message codec")]
    MissingCodec,
    /// A limit is out of range.
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Config key.
        field: &'static str,
        /// What is wrong.
        reason: String,
    },
    /// The compiled-in envelope schema failed to register.
    #[error("envelope schema: {0}")]
    Schema(#[from] SchemaError),
    /// I/O error reading a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid JSON for this structure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by [`crate::DecodedTx`] accessors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The body carries no messages.
    #[error("transaction has no messages")]
    NoMessages,
    /// No signer was extracted.
    #[error("transaction has no signers")]
    NoSigners,
    /// Auth info is absent.
    #[error("transaction has no auth info")]
    MissingAuthInfo,
    /// Auth info carries no fee.
    #[error("transaction has no fee")]
    MissingFee,
    /// Signers and signatures do not pair up.
    #[error("{signers} signers but {signatures} signatures")]
    SignatureCountMismatch {
        /// Number of signers.
        signers: usize,
        /// Number of signatures.
        signatures: usize,
    },
}
