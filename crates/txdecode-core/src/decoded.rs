use std::sync::OnceLock;

use prost::Message;
use tracing::trace;
use txdecode_canonical::TxHash;
use txdecode_schema::DynamicMessage;

use crate::errors::AccessError;
use crate::resolver::ConcreteMessage;
use crate::tx::{Fee, Tx, TxRaw};

/// A verified transaction.
///
/// Immutable once built, apart from the hash/bytes cache which is filled
/// on first use of [`hash`](Self::hash) or [`bytes`](Self::bytes).
#[derive(Debug)]
pub struct DecodedTx {
    tx: Tx,
    tx_raw: TxRaw,
    messages: Vec<Box<dyn ConcreteMessage>>,
    dynamic_messages: Vec<DynamicMessage>,
    signers: Vec<Vec<u8>>,
    has_unknown_non_criticals: bool,
    cache: OnceLock<(TxHash, Vec<u8>)>,
}

impl DecodedTx {
    pub(crate) fn new(
        tx: Tx,
        tx_raw: TxRaw,
        messages: Vec<Box<dyn ConcreteMessage>>,
        dynamic_messages: Vec<DynamicMessage>,
        signers: Vec<Vec<u8>>,
        has_unknown_non_criticals: bool,
    ) -> Self {
        Self {
            tx,
            tx_raw,
            messages,
            dynamic_messages,
            signers,
            has_unknown_non_criticals,
            cache: OnceLock::new(),
        }
    }

    /// Body, auth info and signatures.
    pub fn tx(&self) -> &Tx {
        &self.tx
    }

    /// The outer envelope as decoded.
    pub fn tx_raw(&self) -> &TxRaw {
        &self.tx_raw
    }

    /// Body messages as natively-typed instances, in body order.
    pub fn messages(&self) -> Result<&[Box<dyn ConcreteMessage>], AccessError> {
        if self.messages.is_empty() {
            return Err(AccessError::NoMessages);
        }
        Ok(&self.messages)
    }

    /// Body messages as schema-driven instances, in body order.
    pub fn dynamic_messages(&self) -> &[DynamicMessage] {
        &self.dynamic_messages
    }

    /// Deduplicated signer addresses in first-occurrence order.
    pub fn senders(&self) -> Result<&[Vec<u8>], AccessError> {
        if self.signers.is_empty() {
            return Err(AccessError::NoSigners);
        }
        Ok(&self.signers)
    }

    /// The fee.
    pub fn fee(&self) -> Result<&Fee, AccessError> {
        self.tx
            .auth_info
            .as_ref()
            .ok_or(AccessError::MissingAuthInfo)?
            .fee
            .as_ref()
            .ok_or(AccessError::MissingFee)
    }

    /// Gas limit from the fee.
    pub fn gas_limit(&self) -> Result<u64, AccessError> {
        Ok(self.fee()?.gas_limit)
    }

    /// Whether the body carried tolerated unknown fields.
    pub fn has_unknown_non_criticals(&self) -> bool {
        self.has_unknown_non_criticals
    }

    /// Content hash of [`bytes`](Self::bytes).
    pub fn hash(&self) -> TxHash {
        self.cached().0
    }

    /// Canonical serialization of the envelope.
    pub fn bytes(&self) -> &[u8] {
        &self.cached().1
    }

    /// Pairs each signer with the signature at the same position.
    pub fn signature_pairs(&self) -> Result<Vec<(&[u8], &[u8])>, AccessError> {
        let signatures = &self.tx_raw.signatures;
        if self.signers.len() != signatures.len() {
            return Err(AccessError::SignatureCountMismatch {
                signers: self.signers.len(),
                signatures: signatures.len(),
            });
        }
        Ok(self
            .signers
            .iter()
            .zip(signatures)
            .map(|(signer, sig)| (signer.as_slice(), sig.as_slice()))
            .collect())
    }

    fn cached(&self) -> &(TxHash, Vec<u8>) {
        self.cache.get_or_init(|| {
            let bytes = self.tx_raw.encode_to_vec();
            let hash = TxHash::compute(&bytes);
            trace!(tx_hash = %hash, len = bytes.len(), "computed transaction hash");
            (hash, bytes)
        })
    }
}
