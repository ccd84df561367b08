//! Shared fixtures: a small bank schema, matching prost types, and an
//! envelope builder.

#![allow(dead_code)]

use std::sync::Arc;

use prost::Message;
use prost_types::Any;
use txdecode_canonical::FullName;
use txdecode_core::tx::{AuthInfo, Coin, Fee, ModeInfo, SignerInfo, TxBody, TxRaw};
use txdecode_core::{
    AddressCodec, Bech32Codec, Decoder, DecoderConfig, DecoderOptions, ProstCodec,
    ProstTypeRegistry, SigningRegistry,
};
use txdecode_schema::{FieldKind, FileDescriptor, FileRegistry, MessageDescriptor};

pub const MSG_SEND: &str = "bank.v1.MsgSend";
pub const MSG_JOINT: &str = "bank.v1.MsgJoint";
pub const MSG_NOTE: &str = "bank.v1.MsgNote";
pub const MSG_ORPHAN: &str = "bank.v1.MsgOrphan";
pub const PUB_KEY: &str = "crypto.v1.PubKey";

pub const ALICE: [u8; 20] = [0xa1; 20];
pub const BOB: [u8; 20] = [0xb2; 20];
pub const CAROL: [u8; 20] = [0xc3; 20];

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgSend {
    #[prost(string, tag = "1")]
    pub from_address: String,
    #[prost(string, tag = "2")]
    pub to_address: String,
    #[prost(message, repeated, tag = "3")]
    pub amount: Vec<Coin>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgJoint {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub signers: Vec<Vec<u8>>,
    #[prost(string, tag = "2")]
    pub note: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MsgNote {
    #[prost(string, tag = "1")]
    pub text: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct PubKey {
    #[prost(bytes = "vec", tag = "1")]
    pub key: Vec<u8>,
}

fn name(s: &str) -> FullName {
    FullName::parse(s).unwrap()
}

pub fn bank_file() -> FileDescriptor {
    FileDescriptor::new("bank/v1/tx.proto", "bank.v1")
        .import("cosmos/base/v1beta1/coin.proto")
        .message(
            MessageDescriptor::new(MSG_SEND)
                .unwrap()
                .field(1, "from_address", FieldKind::String)
                .field(2, "to_address", FieldKind::String)
                .repeated(3, "amount", FieldKind::Message(name("cosmos.base.v1beta1.Coin")))
                .signers(&["from_address"]),
        )
        .message(
            MessageDescriptor::new(MSG_JOINT)
                .unwrap()
                .repeated(1, "signers", FieldKind::Bytes)
                .field(2, "note", FieldKind::String)
                .signers(&["signers"]),
        )
        .message(
            MessageDescriptor::new(MSG_NOTE)
                .unwrap()
                .field(1, "text", FieldKind::String),
        )
        .message(
            MessageDescriptor::new(MSG_ORPHAN)
                .unwrap()
                .field(1, "owner", FieldKind::Bytes)
                .signers(&["owner"]),
        )
}

pub fn keys_file() -> FileDescriptor {
    FileDescriptor::new("crypto/v1/keys.proto", "crypto.v1").message(
        MessageDescriptor::new(PUB_KEY)
            .unwrap()
            .field(1, "key", FieldKind::Bytes),
    )
}

pub fn files() -> Arc<FileRegistry> {
    let mut registry = FileRegistry::with_envelope().unwrap();
    registry.register(bank_file()).unwrap();
    registry.register(keys_file()).unwrap();
    Arc::new(registry)
}

pub fn codec() -> Bech32Codec {
    Bech32Codec::new("cosmos").unwrap()
}

pub fn address(bytes: &[u8]) -> String {
    codec().bytes_to_string(bytes).unwrap()
}

pub fn decoder_with(config: DecoderConfig) -> Decoder {
    let files = files();
    let signing = SigningRegistry::builder()
        .address_codec(codec())
        .rules_from_descriptors(&files)
        .build()
        .unwrap();
    let mut types = ProstTypeRegistry::new();
    types
        .register::<MsgSend>(name(MSG_SEND))
        .register::<MsgJoint>(name(MSG_JOINT))
        .register::<MsgNote>(name(MSG_NOTE));

    Decoder::new(
        DecoderOptions::new()
            .descriptors(files)
            .signing(Arc::new(signing))
            .resolver(Arc::new(types))
            .codec(Arc::new(ProstCodec))
            .config(config),
    )
    .unwrap()
}

pub fn decoder() -> Decoder {
    decoder_with(DecoderConfig::default())
}

pub fn pack<M: Message>(type_name: &str, msg: &M) -> Any {
    Any {
        type_url: format!("/{}", type_name),
        value: msg.encode_to_vec(),
    }
}

pub fn send(from: &[u8], to: &[u8], amount: &str) -> Any {
    pack(
        MSG_SEND,
        &MsgSend {
            from_address: address(from),
            to_address: address(to),
            amount: vec![Coin {
                denom: "uatom".into(),
                amount: amount.into(),
            }],
        },
    )
}

pub fn joint(signers: &[&[u8]]) -> Any {
    pack(
        MSG_JOINT,
        &MsgJoint {
            signers: signers.iter().map(|s| s.to_vec()).collect(),
            note: String::new(),
        },
    )
}

pub fn pub_key(key: &[u8]) -> Any {
    pack(PUB_KEY, &PubKey { key: key.to_vec() })
}

pub fn body(messages: Vec<Any>) -> TxBody {
    TxBody {
        messages,
        memo: "fixture".into(),
        ..Default::default()
    }
}

pub fn auth_info(gas_limit: u64, signers: usize) -> AuthInfo {
    AuthInfo {
        signer_infos: (0..signers)
            .map(|i| SignerInfo {
                public_key: None,
                mode_info: Some(ModeInfo {
                    sum: Some(txdecode_core::tx::mode_info::Sum::Single(
                        txdecode_core::tx::mode_info::Single { mode: 1 },
                    )),
                }),
                sequence: i as u64,
            })
            .collect(),
        fee: Some(Fee {
            amount: vec![Coin {
                denom: "uatom".into(),
                amount: "500".into(),
            }],
            gas_limit,
            ..Default::default()
        }),
        tip: None,
    }
}

pub fn raw(body_bytes: Vec<u8>, auth_info_bytes: Vec<u8>, signatures: usize) -> TxRaw {
    TxRaw {
        body_bytes,
        auth_info_bytes,
        signatures: (0..signatures).map(|i| vec![0x5a; 64 + i]).collect(),
    }
}

pub fn encode_tx(messages: Vec<Any>, gas_limit: u64, signatures: usize) -> Vec<u8> {
    raw(
        body(messages).encode_to_vec(),
        auth_info(gas_limit, signatures).encode_to_vec(),
        signatures,
    )
    .encode_to_vec()
}

/// A varint with one redundant continuation byte.
pub fn padded_varint(value: u64) -> Vec<u8> {
    let mut buf = Vec::new();
    prost::encoding::encode_varint(value, &mut buf);
    if let Some(last) = buf.last_mut() {
        *last |= 0x80;
    }
    buf.push(0);
    buf
}

pub fn append_varint_field(bytes: &mut Vec<u8>, number: u32, value: u64) {
    prost::encoding::encode_varint(u64::from(number) << 3, bytes);
    prost::encoding::encode_varint(value, bytes);
}

pub fn append_bytes_field(bytes: &mut Vec<u8>, number: u32, data: &[u8]) {
    prost::encoding::encode_varint((u64::from(number) << 3) | 2, bytes);
    prost::encoding::encode_varint(data.len() as u64, bytes);
    bytes.extend_from_slice(data);
}
