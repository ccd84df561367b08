//! Envelope message types.
//!
//! Hand-written `prost` definitions matching the `cosmos.tx.v1beta1`
//! envelope descriptors in `txdecode_schema::envelope`. Field numbers here
//! and there must agree.

pub use prost_types::Any;

/// The signed wire envelope: body and auth info kept as raw bytes so the
/// signatures stay valid over exactly what was signed.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxRaw {
    /// Encoded [`TxBody`].
    #[prost(bytes = "vec", tag = "1")]
    pub body_bytes: Vec<u8>,
    /// Encoded [`AuthInfo`].
    #[prost(bytes = "vec", tag = "2")]
    pub auth_info_bytes: Vec<u8>,
    /// One signature per signer, in signer order.
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

/// A transaction with its body and auth info decoded.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Tx {
    /// Message list and metadata.
    #[prost(message, optional, tag = "1")]
    pub body: Option<TxBody>,
    /// Fee and signer metadata.
    #[prost(message, optional, tag = "2")]
    pub auth_info: Option<AuthInfo>,
    /// Raw signatures.
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub signatures: Vec<Vec<u8>>,
}

/// Messages to execute plus ancillary metadata.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TxBody {
    /// Messages, each packed with its type URL.
    #[prost(message, repeated, tag = "1")]
    pub messages: Vec<Any>,
    /// Free-form note.
    #[prost(string, tag = "2")]
    pub memo: String,
    /// Block height after which the transaction is no longer valid; zero disables.
    #[prost(uint64, tag = "3")]
    pub timeout_height: u64,
    /// Critical extension options.
    #[prost(message, repeated, tag = "1023")]
    pub extension_options: Vec<Any>,
    /// Extension options old decoders may ignore.
    #[prost(message, repeated, tag = "2047")]
    pub non_critical_extension_options: Vec<Any>,
}

/// Fee and per-signer metadata.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AuthInfo {
    /// One entry per signer.
    #[prost(message, repeated, tag = "1")]
    pub signer_infos: Vec<SignerInfo>,
    /// Fee paid for execution.
    #[prost(message, optional, tag = "2")]
    pub fee: Option<Fee>,
    /// Optional tip.
    #[prost(message, optional, tag = "3")]
    pub tip: Option<Tip>,
}

/// Signing metadata of one signer.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignerInfo {
    /// Public key, packed as `Any`.
    #[prost(message, optional, tag = "1")]
    pub public_key: Option<Any>,
    /// Signing mode.
    #[prost(message, optional, tag = "2")]
    pub mode_info: Option<ModeInfo>,
    /// Account sequence.
    #[prost(uint64, tag = "3")]
    pub sequence: u64,
}

/// Signing mode of a single or multisig signer.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ModeInfo {
    /// The mode.
    #[prost(oneof = "mode_info::Sum", tags = "1, 2")]
    pub sum: Option<mode_info::Sum>,
}

/// Nested types of [`ModeInfo`].
// The `Oneof` derive emits undocumented helper methods.
#[allow(missing_docs)]
pub mod mode_info {
    /// Mode of a single key.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Single {
        /// Raw sign-mode number.
        #[prost(int32, tag = "1")]
        pub mode: i32,
    }

    /// Modes of a multisig key's members.
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Multi {
        /// Which members signed.
        #[prost(message, optional, tag = "1")]
        pub bitarray: Option<super::CompactBitArray>,
        /// Per-member modes.
        #[prost(message, repeated, tag = "2")]
        pub mode_infos: Vec<super::ModeInfo>,
    }

    /// Single or multi.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Sum {
        /// A single key.
        #[prost(message, tag = "1")]
        Single(Single),
        /// A multisig key.
        #[prost(message, tag = "2")]
        Multi(Multi),
    }
}

/// Bit array over multisig members.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CompactBitArray {
    /// Number of meaningful bits in the last byte.
    #[prost(uint32, tag = "1")]
    pub extra_bits_stored: u32,
    /// Packed bits.
    #[prost(bytes = "vec", tag = "2")]
    pub elems: Vec<u8>,
}

/// Transaction fee.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Fee {
    /// Amount paid.
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<Coin>,
    /// Maximum gas the transaction may consume.
    #[prost(uint64, tag = "2")]
    pub gas_limit: u64,
    /// Fee payer, when not the first signer.
    #[prost(string, tag = "3")]
    pub payer: String,
    /// Fee granter.
    #[prost(string, tag = "4")]
    pub granter: String,
}

/// Tip paid to the fee payer.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Tip {
    /// Amount tipped.
    #[prost(message, repeated, tag = "1")]
    pub amount: Vec<Coin>,
    /// Tipper address.
    #[prost(string, tag = "2")]
    pub tipper: String,
}

/// A denomination and an amount, the amount kept as a decimal string.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Coin {
    /// Denomination.
    #[prost(string, tag = "1")]
    pub denom: String,
    /// Decimal amount.
    #[prost(string, tag = "2")]
    pub amount: String,
}
