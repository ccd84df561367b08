use proptest::prelude::*;
use txdecode_canonical::{
    CanonicalField, CanonicalLayout, CanonicalizationError, Canonicalizer, Digest, DigestAlg,
    FullName, TxHash, TypeUrl,
};

const TX_RAW_FIELDS: &[CanonicalField] = &[
    CanonicalField::bytes(1),
    CanonicalField::bytes(2),
    CanonicalField::repeated_bytes(3),
];
const TX_RAW: CanonicalLayout = CanonicalLayout {
    name: "TxRaw",
    fields: TX_RAW_FIELDS,
};

fn encode_field(out: &mut Vec<u8>, number: u32, data: &[u8]) {
    prost::encoding::encode_varint(u64::from(number << 3 | 2), out);
    prost::encoding::encode_varint(data.len() as u64, out);
    out.extend_from_slice(data);
}

fn encode_tx_raw(body: &[u8], auth: &[u8], sigs: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    if !body.is_empty() {
        encode_field(&mut out, 1, body);
    }
    if !auth.is_empty() {
        encode_field(&mut out, 2, auth);
    }
    for sig in sigs {
        encode_field(&mut out, 3, sig);
    }
    out
}

#[test]
fn digest_serializes_to_golden_json() {
    let digest = Digest {
        alg: DigestAlg::Sha256,
        b64: "Zm9vYmFy".into(),
    };

    assert_eq!(
        serde_json::to_string(&digest).unwrap(),
        r#"{"alg":"sha-256","b64":"Zm9vYmFy"}"#
    );
}

#[test]
fn tx_hash_serializes_as_uppercase_hex() {
    let hash = TxHash::compute(b"abc");
    assert_eq!(
        serde_json::to_string(&hash).unwrap(),
        r#""BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD""#
    );
    let back: TxHash = serde_json::from_str(&serde_json::to_string(&hash).unwrap()).unwrap();
    assert_eq!(back, hash);
}

#[test]
fn full_name_deserialization_validates() {
    let ok: FullName = serde_json::from_str(r#""cosmos.bank.v1beta1.MsgSend""#).unwrap();
    assert_eq!(ok.as_str(), "cosmos.bank.v1beta1.MsgSend");
    assert!(serde_json::from_str::<FullName>(r#""not a name""#).is_err());
    assert!(serde_json::from_str::<TypeUrl>(r#""""#).is_err());
}

#[test]
fn canonical_tx_raw_is_accepted() {
    let bytes = encode_tx_raw(b"body", b"auth", &[b"sig1".to_vec(), Vec::new()]);
    let report = Canonicalizer::new(TX_RAW).validate(&bytes).unwrap();
    assert_eq!(report.records, 4);
}

#[test]
fn reordered_tx_raw_is_rejected() {
    let mut bytes = Vec::new();
    encode_field(&mut bytes, 2, b"auth");
    encode_field(&mut bytes, 1, b"body");
    assert!(matches!(
        Canonicalizer::new(TX_RAW).validate(&bytes),
        Err(CanonicalizationError::OutOfOrder { .. })
    ));
}

proptest! {
    #[test]
    fn canonical_encodings_validate(
        body in proptest::collection::vec(any::<u8>(), 0..64),
        auth in proptest::collection::vec(any::<u8>(), 0..64),
        sigs in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..16), 0..4),
    ) {
        let bytes = encode_tx_raw(&body, &auth, &sigs);
        prop_assert!(Canonicalizer::new(TX_RAW).validate(&bytes).is_ok());
    }

    #[test]
    fn padding_any_length_prefix_is_rejected(
        body in proptest::collection::vec(any::<u8>(), 1..64),
    ) {
        // Re-encode the body length with one redundant continuation byte.
        let mut bytes = vec![0x0a];
        let len = body.len() as u8;
        bytes.push(len | 0x80);
        bytes.push(0x00);
        bytes.extend_from_slice(&body);
        let is_non_minimal = matches!(
            Canonicalizer::new(TX_RAW).validate(&bytes),
            Err(CanonicalizationError::NonMinimalVarint { .. })
        );
        prop_assert!(is_non_minimal);
    }
}
