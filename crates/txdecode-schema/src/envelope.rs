//! Compiled-in descriptors for the transaction envelope.
//!
//! These mirror the `cosmos.tx.v1beta1` envelope messages and the handful of
//! shared types they reference. The decoder scans the root, body and auth
//! info against them; message payloads carried inside the body are looked up
//! in a caller-supplied registry instead.

use txdecode_canonical::FullName;

use crate::descriptor::{FieldKind, FileDescriptor, MessageDescriptor};
use crate::errors::SchemaError;

/// `google.protobuf.Any`
pub const ANY: &str = "google.protobuf.Any";
/// `cosmos.base.v1beta1.Coin`
pub const COIN: &str = "cosmos.base.v1beta1.Coin";
/// `cosmos.crypto.multisig.v1beta1.CompactBitArray`
pub const COMPACT_BIT_ARRAY: &str = "cosmos.crypto.multisig.v1beta1.CompactBitArray";
/// `cosmos.tx.v1beta1.TxRaw`
pub const TX_RAW: &str = "cosmos.tx.v1beta1.TxRaw";
/// `cosmos.tx.v1beta1.TxBody`
pub const TX_BODY: &str = "cosmos.tx.v1beta1.TxBody";
/// `cosmos.tx.v1beta1.AuthInfo`
pub const AUTH_INFO: &str = "cosmos.tx.v1beta1.AuthInfo";
/// `cosmos.tx.v1beta1.SignerInfo`
pub const SIGNER_INFO: &str = "cosmos.tx.v1beta1.SignerInfo";
/// `cosmos.tx.v1beta1.ModeInfo`
pub const MODE_INFO: &str = "cosmos.tx.v1beta1.ModeInfo";
/// `cosmos.tx.v1beta1.ModeInfo.Single`
pub const MODE_INFO_SINGLE: &str = "cosmos.tx.v1beta1.ModeInfo.Single";
/// `cosmos.tx.v1beta1.ModeInfo.Multi`
pub const MODE_INFO_MULTI: &str = "cosmos.tx.v1beta1.ModeInfo.Multi";
/// `cosmos.tx.v1beta1.Fee`
pub const FEE: &str = "cosmos.tx.v1beta1.Fee";
/// `cosmos.tx.v1beta1.Tip`
pub const TIP: &str = "cosmos.tx.v1beta1.Tip";

/// `TxBody` field numbers with this bit set are non-critical: 1024..=2047,
/// 3072..=4095 and every later block of 1024 that has it.
pub const TX_BODY_NON_CRITICAL_BIT: u32 = 1 << 10;

fn msg(name: &str) -> Result<FieldKind, SchemaError> {
    Ok(FieldKind::Message(FullName::parse(name)?))
}

/// The envelope schema files, in registration order.
pub fn files() -> Result<Vec<FileDescriptor>, SchemaError> {
    let any = FileDescriptor::new("google/protobuf/any.proto", "google.protobuf").message(
        MessageDescriptor::new(ANY)?
            .field(1, "type_url", FieldKind::String)
            .field(2, "value", FieldKind::Bytes),
    );

    let coin = FileDescriptor::new("cosmos/base/v1beta1/coin.proto", "cosmos.base.v1beta1")
        .message(
            MessageDescriptor::new(COIN)?
                .field(1, "denom", FieldKind::String)
                .field(2, "amount", FieldKind::String),
        );

    let multisig = FileDescriptor::new(
        "cosmos/crypto/multisig/v1beta1/multisig.proto",
        "cosmos.crypto.multisig.v1beta1",
    )
    .message(
        MessageDescriptor::new(COMPACT_BIT_ARRAY)?
            .field(1, "extra_bits_stored", FieldKind::Uint32)
            .field(2, "elems", FieldKind::Bytes),
    );

    let tx = FileDescriptor::new("cosmos/tx/v1beta1/tx.proto", "cosmos.tx.v1beta1")
        .import("google/protobuf/any.proto")
        .import("cosmos/base/v1beta1/coin.proto")
        .import("cosmos/crypto/multisig/v1beta1/multisig.proto")
        .message(
            MessageDescriptor::new(TX_RAW)?
                .field(1, "body_bytes", FieldKind::Bytes)
                .field(2, "auth_info_bytes", FieldKind::Bytes)
                .repeated(3, "signatures", FieldKind::Bytes),
        )
        .message(
            MessageDescriptor::new(TX_BODY)?
                .repeated(1, "messages", msg(ANY)?)
                .field(2, "memo", FieldKind::String)
                .field(3, "timeout_height", FieldKind::Uint64)
                .repeated(1023, "extension_options", msg(ANY)?)
                .repeated(2047, "non_critical_extension_options", msg(ANY)?)
                .non_critical_bits(TX_BODY_NON_CRITICAL_BIT),
        )
        .message(
            MessageDescriptor::new(AUTH_INFO)?
                .repeated(1, "signer_infos", msg(SIGNER_INFO)?)
                .field(2, "fee", msg(FEE)?)
                .field(3, "tip", msg(TIP)?),
        )
        .message(
            MessageDescriptor::new(SIGNER_INFO)?
                .field(1, "public_key", msg(ANY)?)
                .field(2, "mode_info", msg(MODE_INFO)?)
                .field(3, "sequence", FieldKind::Uint64),
        )
        .message(
            MessageDescriptor::new(MODE_INFO)?
                .field(1, "single", msg(MODE_INFO_SINGLE)?)
                .field(2, "multi", msg(MODE_INFO_MULTI)?),
        )
        .message(MessageDescriptor::new(MODE_INFO_SINGLE)?.field(1, "mode", FieldKind::Enum))
        .message(
            MessageDescriptor::new(MODE_INFO_MULTI)?
                .field(1, "bitarray", msg(COMPACT_BIT_ARRAY)?)
                .repeated(2, "mode_infos", msg(MODE_INFO)?),
        )
        .message(
            MessageDescriptor::new(FEE)?
                .repeated(1, "amount", msg(COIN)?)
                .field(2, "gas_limit", FieldKind::Uint64)
                .field(3, "payer", FieldKind::String)
                .field(4, "granter", FieldKind::String),
        )
        .message(
            MessageDescriptor::new(TIP)?
                .repeated(1, "amount", msg(COIN)?)
                .field(2, "tipper", FieldKind::String),
        );

    Ok(vec![any, coin, multisig, tx])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FileRegistry;

    #[test]
    fn envelope_registers_cleanly() {
        let registry = FileRegistry::with_envelope().unwrap();
        assert_eq!(registry.message_count(), 12);
        let body = registry
            .find_message(&FullName::parse(TX_BODY).unwrap())
            .unwrap();
        assert!(body.is_non_critical(1024));
        assert!(body.is_non_critical(3072));
        assert!(!body.is_non_critical(2048));
        assert!(body.find_field(2047).is_some());
    }
}
