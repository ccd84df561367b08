//! Hash command implementation.

use txdecode_canonical::TxHash;

use crate::input::{self, InputFormat};

pub fn run(input: Option<String>, format: InputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = input::read_tx(input.as_deref(), format)?;

    // Only an envelope `decode` would accept has a stable hash.
    super::validate_envelope(&bytes)?;

    println!("{}", TxHash::compute(&bytes));
    Ok(())
}
