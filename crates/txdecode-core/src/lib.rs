//! Transaction decode-and-validate pipeline.
//!
//! This crate provides:
//! - Envelope types (`TxRaw`, `TxBody`, `AuthInfo`, ...) as `prost` messages
//! - A [`Decoder`] that turns untrusted bytes into a verified [`DecodedTx`]
//! - Signer extraction through a per-type [`SigningRegistry`]
//! - Concrete-type resolution through injected [`TypeResolver`] and [`MessageCodec`]
//!
//! Core invariants:
//! - Decode is a pure function of the input bytes and the decoder's configuration
//! - Only canonical envelopes are accepted, so one transaction has one hash
//! - `DecodedTx::hash()` is always the digest of `DecodedTx::bytes()`
//! - Signers are deduplicated by raw bytes, keeping first-occurrence order
//!
#![deny(missing_docs)]

/// Address text encodings.
pub mod address;
/// Decoder limits.
pub mod config;
/// The verified transaction record.
pub mod decoded;
/// The decode pipeline.
pub mod decoder;
/// Error types for decoding, configuration and accessors.
pub mod errors;
/// Concrete-type resolvers and codecs.
pub mod resolver;
/// Signing-rule registry.
pub mod signing;
/// Envelope message types.
pub mod tx;

pub use address::{AddressCodec, Bech32Codec};
pub use config::{DecoderConfig, DEFAULT_MAX_TX_BYTES};
pub use decoded::DecodedTx;
pub use decoder::{Decoder, DecoderOptions, TX_RAW_LAYOUT};
pub use errors::{
    AccessError, ConfigError, DecodeError, MalformedCause, ResolveError, SignerError, Stage,
};
pub use resolver::{
    ConcreteMessage, MessageCodec, ProstCodec, ProstConcrete, ProstTypeRegistry, SchemaMessage,
    SchemaTypeResolver, TypeResolver,
};
pub use signing::{FieldSignerRule, SignerRule, SigningRegistry, SigningRegistryBuilder};
pub use tx::{AuthInfo, Fee, Tx, TxBody, TxRaw};
