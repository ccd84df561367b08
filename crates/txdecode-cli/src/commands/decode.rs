//! Decode command implementation.

use tracing::info;
use txdecode_core::DecoderConfig;

use crate::input::{self, InputFormat};
use crate::output;
use crate::schema::SchemaDocument;

pub fn run(
    input: Option<String>,
    schema: String,
    config: Option<String>,
    format: InputFormat,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => DecoderConfig::from_path(&path)
            .map_err(|e| format!("Invalid config {}: {}", path, e))?,
        None => DecoderConfig::default(),
    };
    let (decoder, codec) = SchemaDocument::load(&schema)?.into_decoder(config)?;

    let bytes = input::read_tx(input.as_deref(), format)?;
    let tx = decoder
        .decode(&bytes)
        .map_err(|e| format!("Decode failed: {}", e))?;
    info!(tx_hash = %tx.hash(), "transaction verified");

    if json_output {
        let summary = output::tx_json(&tx, &codec)?;
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output::print_tx(&tx, &codec)?;
    }
    Ok(())
}
