//! Check command implementation.

use tracing::debug;

use crate::input::{self, InputFormat};

pub fn run(input: Option<String>, format: InputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = input::read_tx(input.as_deref(), format)?;
    let report = super::validate_envelope(&bytes)?;
    debug!(records = report.records, "envelope check passed");

    println!("OK ({} bytes, {} records)", bytes.len(), report.records);
    Ok(())
}
