//! Subcommand implementations.

use txdecode_canonical::{CanonicalReport, Canonicalizer, FullName};
use txdecode_core::TX_RAW_LAYOUT;
use txdecode_schema::envelope::TX_RAW;
use txdecode_schema::{reject_unknown_fields_strict, FileRegistry, WalkLimits};

pub mod check;
pub mod decode;
pub mod hash;

/// Envelope checks shared by `hash` and `check`: the bytes must be the
/// canonical encoding of a `TxRaw` that carries no undeclared field.
fn validate_envelope(bytes: &[u8]) -> Result<CanonicalReport, Box<dyn std::error::Error>> {
    let report = Canonicalizer::new(TX_RAW_LAYOUT)
        .validate(bytes)
        .map_err(|e| format!("Envelope is not canonical: {}", e))?;

    let envelope = FileRegistry::with_envelope()?;
    let tx_raw = envelope.find_message(&FullName::parse(TX_RAW)?)?;
    reject_unknown_fields_strict(bytes, &tx_raw, &envelope, WalkLimits::default())
        .map_err(|e| format!("Envelope is rejected: {}", e))?;
    Ok(report)
}
