use crate::wire::{is_minimal_varint, FieldValue, WireError, WireReader, WireType};

/// Error returned when bytes are not the canonical encoding of their content.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CanonicalizationError {
    /// The bytes are not well-formed protobuf records.
    #[error("malformed wire data: {0}")]
    Wire(#[from] WireError),
    /// A tag used more bytes than necessary.
    #[error("tag for field {number} at offset {offset} is not minimally encoded")]
    NonMinimalTag {
        /// Field number.
        number: u32,
        /// Byte offset of the tag.
        offset: usize,
    },
    /// Field numbers went backwards.
    #[error("field {number} at offset {offset} follows field {previous}; fields must be in ascending order")]
    OutOfOrder {
        /// Field number that arrived late.
        number: u32,
        /// Field number seen just before.
        previous: u32,
        /// Byte offset of the tag.
        offset: usize,
    },
    /// A singular field occurred more than once.
    #[error("singular field {number} occurs again at offset {offset}")]
    DuplicateField {
        /// Field number.
        number: u32,
        /// Byte offset of the second occurrence.
        offset: usize,
    },
    /// A declared field used the wrong wire type.
    #[error("field {number} at offset {offset} has wire type {actual:?}, expected {expected:?}")]
    WireTypeMismatch {
        /// Field number.
        number: u32,
        /// Byte offset of the tag.
        offset: usize,
        /// Wire type the layout declares.
        expected: WireType,
        /// Wire type found in the bytes.
        actual: WireType,
    },
    /// A length prefix or varint value used more bytes than necessary.
    #[error("value of field {number} at offset {offset} uses {actual} varint bytes, {minimal} suffice")]
    NonMinimalVarint {
        /// Field number.
        number: u32,
        /// Byte offset of the tag.
        offset: usize,
        /// Bytes used.
        actual: usize,
        /// Bytes required.
        minimal: usize,
    },
    /// A singular field carried its default value, which the canonical form omits.
    #[error("singular field {number} at offset {offset} encodes its default value")]
    DefaultValueEncoded {
        /// Field number.
        number: u32,
        /// Byte offset of the tag.
        offset: usize,
    },
}

/// A field declared by a [`CanonicalLayout`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalField {
    /// Field number.
    pub number: u32,
    /// Wire type the field must use.
    pub wire_type: WireType,
    /// Whether consecutive occurrences are allowed.
    pub repeated: bool,
}

impl CanonicalField {
    /// A singular length-delimited field.
    pub const fn bytes(number: u32) -> Self {
        Self {
            number,
            wire_type: WireType::LengthDelimited,
            repeated: false,
        }
    }

    /// A repeated length-delimited field.
    pub const fn repeated_bytes(number: u32) -> Self {
        Self {
            number,
            wire_type: WireType::LengthDelimited,
            repeated: true,
        }
    }
}

/// The declared shape of the structure a [`Canonicalizer`] checks.
///
/// Repeated fields are expected unpacked, one record per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalLayout {
    /// Human-readable structure name used in logs.
    pub name: &'static str,
    /// Declared fields.
    pub fields: &'static [CanonicalField],
}

impl CanonicalLayout {
    fn field(&self, number: u32) -> Option<&CanonicalField> {
        self.fields.iter().find(|f| f.number == number)
    }
}

/// Summary of an accepted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanonicalReport {
    /// Number of field records visited.
    pub records: usize,
    /// Number of records whose field number the layout does not declare.
    pub undeclared: usize,
}

/// Validator that accepts only the unique canonical encoding of a structure.
#[derive(Debug, Clone, Copy)]
pub struct Canonicalizer {
    layout: CanonicalLayout,
}

impl Canonicalizer {
    /// Creates a validator for the provided layout.
    pub const fn new(layout: CanonicalLayout) -> Self {
        Self { layout }
    }

    /// The layout this validator enforces.
    pub fn layout(&self) -> &CanonicalLayout {
        &self.layout
    }

    /// Checks that `bytes` is the canonical encoding of its content.
    ///
    /// Undeclared field numbers are only checked for ordering and minimal
    /// encoding; whether they are allowed at all is decided by the schema.
    pub fn validate(&self, bytes: &[u8]) -> Result<CanonicalReport, CanonicalizationError> {
        let mut reader = WireReader::new(bytes);
        let mut report = CanonicalReport::default();
        let mut previous: Option<u32> = None;

        while let Some(record) = reader.next_record()? {
            let tag = record.tag;
            report.records += 1;

            if !is_minimal_varint(tag.key(), tag.encoded_len) {
                return Err(CanonicalizationError::NonMinimalTag {
                    number: tag.number,
                    offset: tag.offset,
                });
            }

            let declared = self.layout.field(tag.number);
            if let Some(prev) = previous {
                if tag.number < prev {
                    return Err(CanonicalizationError::OutOfOrder {
                        number: tag.number,
                        previous: prev,
                        offset: tag.offset,
                    });
                }
                if tag.number == prev && !declared.is_some_and(|f| f.repeated) {
                    return Err(CanonicalizationError::DuplicateField {
                        number: tag.number,
                        offset: tag.offset,
                    });
                }
            }
            previous = Some(tag.number);

            let minimal_prefix = match record.value {
                FieldValue::Varint(v) => Some(v),
                FieldValue::Bytes(data) => Some(data.len() as u64),
                FieldValue::Fixed32(_) | FieldValue::Fixed64(_) => None,
            };
            if let Some(value) = minimal_prefix {
                if !is_minimal_varint(value, record.prefix_len) {
                    return Err(CanonicalizationError::NonMinimalVarint {
                        number: tag.number,
                        offset: tag.offset,
                        actual: record.prefix_len,
                        minimal: prost::encoding::encoded_len_varint(value),
                    });
                }
            }

            let Some(field) = declared else {
                report.undeclared += 1;
                continue;
            };
            if record.wire_type != field.wire_type {
                return Err(CanonicalizationError::WireTypeMismatch {
                    number: tag.number,
                    offset: tag.offset,
                    expected: field.wire_type,
                    actual: record.wire_type,
                });
            }
            if !field.repeated && is_default(&record.value) {
                return Err(CanonicalizationError::DefaultValueEncoded {
                    number: tag.number,
                    offset: tag.offset,
                });
            }
        }

        Ok(report)
    }
}

fn is_default(value: &FieldValue<'_>) -> bool {
    match value {
        FieldValue::Varint(v) | FieldValue::Fixed64(v) => *v == 0,
        FieldValue::Fixed32(v) => *v == 0,
        FieldValue::Bytes(data) => data.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[CanonicalField] = &[
        CanonicalField::bytes(1),
        CanonicalField::bytes(2),
        CanonicalField::repeated_bytes(3),
    ];
    const LAYOUT: CanonicalLayout = CanonicalLayout {
        name: "test",
        fields: FIELDS,
    };

    fn validate(bytes: &[u8]) -> Result<CanonicalReport, CanonicalizationError> {
        Canonicalizer::new(LAYOUT).validate(bytes)
    }

    #[test]
    fn accepts_ascending_fields_with_repeated_tail() {
        let bytes = [0x0a, 0x01, 0xaa, 0x12, 0x01, 0xbb, 0x1a, 0x00, 0x1a, 0x01, 0xcc];
        let report = validate(&bytes).unwrap();
        assert_eq!(report.records, 4);
        assert_eq!(report.undeclared, 0);
    }

    #[test]
    fn accepts_empty_input() {
        assert_eq!(validate(&[]).unwrap().records, 0);
    }

    #[test]
    fn rejects_descending_fields() {
        let bytes = [0x12, 0x01, 0xbb, 0x0a, 0x01, 0xaa];
        assert!(matches!(
            validate(&bytes),
            Err(CanonicalizationError::OutOfOrder {
                number: 1,
                previous: 2,
                ..
            })
        ));
    }

    #[test]
    fn rejects_duplicate_singular_field() {
        let bytes = [0x0a, 0x01, 0xaa, 0x0a, 0x01, 0xaa];
        assert!(matches!(
            validate(&bytes),
            Err(CanonicalizationError::DuplicateField { number: 1, .. })
        ));
    }

    #[test]
    fn rejects_padded_length_prefix() {
        // length 1 encoded as 0x81 0x00
        let bytes = [0x0a, 0x81, 0x00, 0xaa];
        assert!(matches!(
            validate(&bytes),
            Err(CanonicalizationError::NonMinimalVarint {
                actual: 2,
                minimal: 1,
                ..
            })
        ));
    }

    #[test]
    fn rejects_padded_tag() {
        // field 1 wire type 2 encoded as 0x8a 0x00
        let bytes = [0x8a, 0x00, 0x01, 0xaa];
        assert!(matches!(
            validate(&bytes),
            Err(CanonicalizationError::NonMinimalTag { number: 1, .. })
        ));
    }

    #[test]
    fn rejects_wrong_wire_type() {
        let bytes = [0x08, 0x01];
        assert!(matches!(
            validate(&bytes),
            Err(CanonicalizationError::WireTypeMismatch {
                expected: WireType::LengthDelimited,
                actual: WireType::Varint,
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_singular_field() {
        let bytes = [0x0a, 0x00];
        assert!(matches!(
            validate(&bytes),
            Err(CanonicalizationError::DefaultValueEncoded { number: 1, .. })
        ));
    }

    #[test]
    fn rejects_trailing_garbage() {
        let bytes = [0x0a, 0x01, 0xaa, 0x12];
        assert!(matches!(validate(&bytes), Err(CanonicalizationError::Wire(_))));
    }

    #[test]
    fn counts_undeclared_fields_without_rejecting_them() {
        let bytes = [0x0a, 0x01, 0xaa, 0x22, 0x01, 0xdd];
        let report = validate(&bytes).unwrap();
        assert_eq!(report.undeclared, 1);
    }
}
