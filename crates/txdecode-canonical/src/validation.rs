use thiserror::Error;

/// Rejection of a textual identifier or digest.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Text that is not a well-formed value of its kind.
    #[error("malformed {kind}: {value:?}")]
    Malformed {
        /// What was being parsed.
        kind: &'static str,
        /// Offending text.
        value: String,
    },
    /// Decoded content of the wrong size.
    #[error("{kind} must be {expected} bytes, got {actual}")]
    WrongLength {
        /// What was being parsed.
        kind: &'static str,
        /// Required length.
        expected: usize,
        /// Length found.
        actual: usize,
    },
}
