//! Wire-level primitives shared by the transaction decoding pipeline.
//!
//! This crate knows nothing about schemas. It reads raw protobuf records,
//! decides whether a byte string is the unique canonical encoding of its
//! content, and computes the content hash that identifies a transaction.
//! Every byte that participates in hashing passes through here.
//!
#![deny(missing_docs)]

/// Canonical-encoding validation for length-delimited envelopes.
pub mod canonicalizer;
/// Digest/identifier primitives.
pub mod digest;
/// Validated message-name and type-URL newtypes.
pub mod identifiers;
/// Validation helpers used by canonical types.
pub mod validation;
/// Raw protobuf record reader.
pub mod wire;

pub use canonicalizer::{
    CanonicalField, CanonicalLayout, CanonicalReport, CanonicalizationError, Canonicalizer,
};
pub use digest::{Digest, DigestAlg, TxHash};
pub use identifiers::{FullName, TypeUrl};
pub use validation::ValidationError;
pub use wire::{FieldRecord, FieldValue, Tag, WireError, WireReader, WireType};
