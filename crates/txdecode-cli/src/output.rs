//! Output formatting utilities.

use base64::Engine;
use serde_json::{json, Map, Value as Json};
use txdecode_core::{AddressCodec, DecodedTx, SignerError};
use txdecode_schema::{DynamicMessage, Value};

/// Renders a generic message as a JSON object keyed by field name.
///
/// 64-bit integers are rendered as strings and bytes as standard base64.
pub fn message_json(message: &DynamicMessage) -> Json {
    let mut fields = Map::new();
    for (field, value) in message.fields() {
        fields.insert(field.name.clone(), value_json(value));
    }
    Json::Object(fields)
}

fn value_json(value: &Value) -> Json {
    match value {
        Value::I32(v) | Value::Enum(v) => json!(v),
        Value::U32(v) => json!(v),
        Value::I64(v) => json!(v.to_string()),
        Value::U64(v) => json!(v.to_string()),
        Value::Bool(v) => json!(v),
        Value::F32(v) => json!(v),
        Value::F64(v) => json!(v),
        Value::Str(v) => json!(v),
        Value::Bytes(v) => json!(base64::engine::general_purpose::STANDARD.encode(v)),
        Value::Message(m) => message_json(m),
        Value::List(items) => Json::Array(items.iter().map(value_json).collect()),
    }
}

/// Summary of a decoded transaction as JSON.
pub fn tx_json(tx: &DecodedTx, codec: &dyn AddressCodec) -> Result<Json, SignerError> {
    let messages: Vec<Json> = tx
        .dynamic_messages()
        .iter()
        .map(|m| {
            json!({
                "type_url": m.full_name().to_type_url().to_string(),
                "fields": message_json(m),
            })
        })
        .collect();

    Ok(json!({
        "hash": tx.hash().to_hex(),
        "digest": tx.hash().to_digest(),
        "gas_limit": tx.gas_limit().ok().map(|g| g.to_string()),
        "signers": signer_addresses(tx, codec)?,
        "messages": messages,
        "has_unknown_non_criticals": tx.has_unknown_non_criticals(),
    }))
}

/// Prints a decoded transaction as aligned text.
pub fn print_tx(tx: &DecodedTx, codec: &dyn AddressCodec) -> Result<(), SignerError> {
    println!("{:<14} {}", "HASH", tx.hash());
    match tx.gas_limit() {
        Ok(gas) => println!("{:<14} {}", "GAS_LIMIT", gas),
        Err(_) => println!("{:<14} -", "GAS_LIMIT"),
    }
    for address in signer_addresses(tx, codec)? {
        println!("{:<14} {}", "SIGNER", address);
    }
    println!(
        "{:<14} {}",
        "NON_CRITICAL",
        tx.has_unknown_non_criticals()
    );
    println!("{}", "-".repeat(70));
    for (index, message) in tx.dynamic_messages().iter().enumerate() {
        println!("[{}] {}", index, message.full_name().to_type_url());
        println!("    {}", message_json(message));
    }
    Ok(())
}

fn signer_addresses(tx: &DecodedTx, codec: &dyn AddressCodec) -> Result<Vec<String>, SignerError> {
    tx.senders()
        .unwrap_or(&[])
        .iter()
        .map(|signer| codec.bytes_to_string(signer))
        .collect()
}
