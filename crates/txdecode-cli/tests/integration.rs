//! Integration tests for CLI commands.

use prost::Message;
use serde_json::json;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;
use txdecode_canonical::TxHash;
use txdecode_core::tx::{Any, AuthInfo, Coin, Fee, TxBody, TxRaw};
use txdecode_core::{AddressCodec, Bech32Codec};

#[derive(Clone, PartialEq, ::prost::Message)]
struct MsgSend {
    #[prost(string, tag = "1")]
    from_address: String,
    #[prost(string, tag = "2")]
    to_address: String,
    #[prost(message, repeated, tag = "3")]
    amount: Vec<Coin>,
}

fn schema_json() -> serde_json::Value {
    json!({
        "bech32_prefix": "cosmos",
        "files": [{
            "name": "bank/v1/tx.proto",
            "package": "bank.v1",
            "imports": ["cosmos/base/v1beta1/coin.proto"],
            "messages": [{
                "full_name": "bank.v1.MsgSend",
                "fields": [
                    {"number": 1, "name": "from_address", "kind": "string"},
                    {"number": 2, "name": "to_address", "kind": "string"},
                    {"number": 3, "name": "amount", "kind": {"message": "cosmos.base.v1beta1.Coin"}, "repeated": true}
                ],
                "signer_fields": ["from_address"]
            }]
        }]
    })
}

fn address(byte: u8) -> String {
    Bech32Codec::new("cosmos")
        .unwrap()
        .bytes_to_string(&[byte; 20])
        .unwrap()
}

fn transfer_tx() -> Vec<u8> {
    let send = MsgSend {
        from_address: address(0xa1),
        to_address: address(0xb2),
        amount: vec![Coin {
            denom: "uatom".into(),
            amount: "1000".into(),
        }],
    };
    let body = TxBody {
        messages: vec![Any {
            type_url: "/bank.v1.MsgSend".into(),
            value: send.encode_to_vec(),
        }],
        memo: "cli".into(),
        ..Default::default()
    };
    let auth_info = AuthInfo {
        fee: Some(Fee {
            gas_limit: 200_000,
            ..Default::default()
        }),
        ..Default::default()
    };
    TxRaw {
        body_bytes: body.encode_to_vec(),
        auth_info_bytes: auth_info.encode_to_vec(),
        signatures: vec![vec![0x5a; 64]],
    }
    .encode_to_vec()
}

struct Fixture {
    _dir: TempDir,
    schema: String,
    tx_hex: String,
    tx_raw: String,
}

fn write(dir: &Path, name: &str, contents: &[u8]) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

fn fixture_for(tx: &[u8]) -> Fixture {
    let dir = TempDir::new().unwrap();
    let schema = write(dir.path(), "schema.json", schema_json().to_string().as_bytes());
    let tx_hex = write(dir.path(), "tx.hex", format!("{}\n", hex::encode(tx)).as_bytes());
    let tx_raw = write(dir.path(), "tx.bin", tx);
    Fixture {
        _dir: dir,
        schema,
        tx_hex,
        tx_raw,
    }
}

fn run_cli(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_txdecode"))
        .args(args)
        .output()
        .expect("Failed to execute CLI");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    let success = output.status.success();

    (success, stdout, stderr)
}

#[test]
fn test_decode_command() {
    let fx = fixture_for(&transfer_tx());

    let (success, stdout, stderr) = run_cli(&["decode", &fx.tx_hex, "--schema", &fx.schema]);
    assert!(success, "stderr: {}", stderr);
    assert!(stdout.contains("GAS_LIMIT      200000"));
    assert!(stdout.contains(&address(0xa1)));
    assert!(stdout.contains("/bank.v1.MsgSend"));
    assert!(stdout.contains("NON_CRITICAL   false"));
}

#[test]
fn test_decode_json_output() {
    let tx = transfer_tx();
    let fx = fixture_for(&tx);

    let (success, stdout, _) = run_cli(&[
        "decode",
        &fx.tx_raw,
        "--schema",
        &fx.schema,
        "--format",
        "raw",
        "--json",
    ]);
    assert!(success);
    let summary: serde_json::Value = serde_json::from_str(&stdout).expect("Invalid JSON");
    assert_eq!(summary["hash"], json!(TxHash::compute(&tx).to_hex()));
    assert_eq!(
        summary["digest"],
        json!({"alg": "sha-256", "b64": TxHash::compute(&tx).to_b64()})
    );
    assert_eq!(summary["gas_limit"], json!("200000"));
    assert_eq!(summary["signers"], json!([address(0xa1)]));
    assert_eq!(summary["has_unknown_non_criticals"], json!(false));
    assert_eq!(summary["messages"][0]["type_url"], json!("/bank.v1.MsgSend"));
    assert_eq!(
        summary["messages"][0]["fields"]["amount"][0],
        json!({"denom": "uatom", "amount": "1000"})
    );
}

#[test]
fn test_decode_rejects_unknown_message_type() {
    let fx = fixture_for(&transfer_tx());
    let dir = TempDir::new().unwrap();
    let empty_schema = write(dir.path(), "empty.json", br#"{"files": []}"#);

    let (success, _, stderr) = run_cli(&["decode", &fx.tx_hex, "--schema", &empty_schema]);
    assert!(!success);
    assert!(stderr.contains("Error: Decode failed"));
    assert!(stderr.contains("bank.v1.MsgSend"));
}

#[test]
fn test_decode_applies_config_limits() {
    let fx = fixture_for(&transfer_tx());
    let dir = TempDir::new().unwrap();
    let config = write(dir.path(), "limits.json", br#"{"max_tx_bytes": 8}"#);

    let (success, _, stderr) = run_cli(&[
        "decode",
        &fx.tx_hex,
        "--schema",
        &fx.schema,
        "--config",
        &config,
    ]);
    assert!(!success);
    assert!(stderr.starts_with("Error:"));
}

#[test]
fn test_hash_command() {
    let tx = transfer_tx();
    let fx = fixture_for(&tx);

    let (success, stdout, _) = run_cli(&["hash", &fx.tx_hex]);
    assert!(success);
    assert_eq!(stdout.trim(), TxHash::compute(&tx).to_hex());
}

#[test]
fn test_check_rejects_non_canonical_envelope() {
    let tx = TxRaw::decode(transfer_tx().as_slice()).unwrap();
    // auth_info_bytes before body_bytes
    let mut swapped = Vec::new();
    for (number, data) in [(2u64, &tx.auth_info_bytes), (1u64, &tx.body_bytes)] {
        prost::encoding::encode_varint((number << 3) | 2, &mut swapped);
        prost::encoding::encode_varint(data.len() as u64, &mut swapped);
        swapped.extend_from_slice(data);
    }
    let fx = fixture_for(&swapped);

    let (success, _, stderr) = run_cli(&["check", &fx.tx_hex]);
    assert!(!success);
    assert!(stderr.contains("not canonical"));

    let (success, _, _) = run_cli(&["hash", &fx.tx_hex]);
    assert!(!success);
}

#[test]
fn test_hash_and_check_reject_undeclared_envelope_field() {
    let mut tx = transfer_tx();
    prost::encoding::encode_varint(4 << 3, &mut tx);
    prost::encoding::encode_varint(1, &mut tx);
    let fx = fixture_for(&tx);

    let (success, stdout, stderr) = run_cli(&["hash", &fx.tx_hex]);
    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("unknown field 4"));

    let (success, _, stderr) = run_cli(&["check", &fx.tx_hex]);
    assert!(!success);
    assert!(stderr.starts_with("Error: Envelope is rejected"));
}

#[test]
fn test_check_command() {
    let fx = fixture_for(&transfer_tx());

    let (success, stdout, _) = run_cli(&["check", &fx.tx_raw, "--format", "raw"]);
    assert!(success);
    assert!(stdout.starts_with("OK"));
    assert!(stdout.contains("3 records"));
}

#[test]
fn test_invalid_hex_input() {
    let dir = TempDir::new().unwrap();
    let bad = write(dir.path(), "bad.hex", b"zz");

    let (success, _, stderr) = run_cli(&["check", &bad]);
    assert!(!success);
    assert!(stderr.contains("invalid hex input"));
}
