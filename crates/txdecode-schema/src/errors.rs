use thiserror::Error;
use txdecode_canonical::{ValidationError, WireError, WireType};

/// Errors raised by descriptor registration, scanning and generic decoding.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    /// No descriptor is registered under the name.
    #[error("descriptor not found: {0}")]
    DescriptorNotFound(String),
    /// A file with the same name is already registered.
    #[error("file {0} is already registered")]
    DuplicateFile(String),
    /// A file imports something the registry has not seen.
    #[error("file {file} imports {import}, which is not registered")]
    MissingImport {
        /// Importing file.
        file: String,
        /// Missing import.
        import: String,
    },
    /// A message name is declared twice.
    #[error("message {0} is already registered")]
    DuplicateMessage(String),
    /// A message-typed field names a type outside the file and its imports.
    #[error("field {field} of {message} refers to {target}, which is not visible from {file}")]
    UnresolvedReference {
        /// File declaring the message.
        file: String,
        /// Declaring message.
        message: String,
        /// Field name.
        field: String,
        /// Referenced type.
        target: String,
    },
    /// A descriptor is internally inconsistent.
    #[error("invalid descriptor {message}: {reason}")]
    InvalidDescriptor {
        /// Message name.
        message: String,
        /// What is wrong.
        reason: String,
    },
    /// A field number the descriptor does not declare, outside any tolerated range.
    #[error("unknown field {number} (wire type {wire_bits}) in {message}")]
    UnknownField {
        /// Message being scanned.
        message: String,
        /// Undeclared field number.
        number: u32,
        /// Raw wire-type bits of the record.
        wire_bits: u8,
    },
    /// A declared field arrived with the wrong wire type.
    #[error("field {field} ({number}) of {message} expects wire type {expected:?}, found {actual:?}")]
    WireTypeMismatch {
        /// Message being scanned.
        message: String,
        /// Field name.
        field: String,
        /// Field number.
        number: u32,
        /// Wire type implied by the field kind.
        expected: WireType,
        /// Wire type found.
        actual: WireType,
    },
    /// A value has the right wire type but is not a valid value of its kind.
    #[error("field {field} of {message}: {reason}")]
    InvalidValue {
        /// Message being decoded.
        message: String,
        /// Field name.
        field: String,
        /// What is wrong.
        reason: String,
    },
    /// Bytes are not well-formed protobuf records.
    #[error("malformed data in {message}: {source}")]
    Wire {
        /// Message being scanned.
        message: String,
        /// Underlying wire error.
        source: WireError,
    },
    /// Nesting went deeper than the walk limits allow.
    #[error("message nesting exceeds depth {max}")]
    DepthExceeded {
        /// Configured maximum depth.
        max: usize,
    },
    /// More field records than the walk limits allow.
    #[error("field count exceeds {max}")]
    FieldCountExceeded {
        /// Configured maximum record count.
        max: usize,
    },
    /// A name failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl SchemaError {
    /// Returns `true` for errors that describe malformed or oversized input
    /// rather than a schema mismatch.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            SchemaError::Wire { .. }
                | SchemaError::DepthExceeded { .. }
                | SchemaError::FieldCountExceeded { .. }
        )
    }
}
