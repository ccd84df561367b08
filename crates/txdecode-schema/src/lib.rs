//! Runtime schema support for the transaction decoder.
//!
//! Descriptors are plain data registered in an import-aware
//! [`FileRegistry`]. On top of them this crate provides the unknown-field
//! [`scanner`] and a schema-driven [`DynamicMessage`] for message types that
//! have no compiled-in Rust type.
//!
#![deny(missing_docs)]

mod any;
/// Message, field and file descriptors.
pub mod descriptor;
/// Generic message values decoded from a descriptor.
pub mod dynamic;
/// Compiled-in envelope schema.
pub mod envelope;
/// Error types.
pub mod errors;
/// Bounds for recursive walks.
pub mod limits;
/// Import-aware descriptor registry.
pub mod registry;
/// Unknown-field rejection.
pub mod scanner;

pub use descriptor::{FieldDescriptor, FieldKind, FileDescriptor, MessageDescriptor};
pub use dynamic::{DynamicMessage, Value};
pub use errors::SchemaError;
pub use limits::{WalkLimits, DEFAULT_MAX_DEPTH, DEFAULT_MAX_FIELDS};
pub use registry::{DescriptorResolver, FileRegistry};
pub use scanner::{reject_unknown_fields_strict, scan, ScanReport, Tolerance};
