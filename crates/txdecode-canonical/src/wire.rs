//! Low-level protobuf wire reader.
//!
//! The reader walks raw field records without materializing any message. It
//! reports the number of bytes every varint occupied so callers can decide
//! whether an encoding was minimal.

use prost::encoding::decode_varint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest legal field number.
pub const MIN_FIELD_NUMBER: u32 = 1;

/// Largest legal field number: `2^29 - 1`.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Protobuf wire type, taken from the low three bits of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireType {
    /// Base-128 varint (`0`).
    Varint,
    /// Little-endian 8 byte value (`1`).
    Fixed64,
    /// Varint length prefix followed by that many bytes (`2`).
    LengthDelimited,
    /// Deprecated group start (`3`).
    StartGroup,
    /// Deprecated group end (`4`).
    EndGroup,
    /// Little-endian 4 byte value (`5`).
    Fixed32,
}

impl WireType {
    /// Parses the three wire-type bits. Returns `None` for `6` and `7`.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            0 => Some(WireType::Varint),
            1 => Some(WireType::Fixed64),
            2 => Some(WireType::LengthDelimited),
            3 => Some(WireType::StartGroup),
            4 => Some(WireType::EndGroup),
            5 => Some(WireType::Fixed32),
            _ => None,
        }
    }

    /// Returns the three-bit value for this wire type.
    pub fn to_bits(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::StartGroup => 3,
            WireType::EndGroup => 4,
            WireType::Fixed32 => 5,
        }
    }
}

/// Errors raised while reading raw wire records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A varint was truncated or longer than ten bytes.
    #[error("invalid varint at offset {offset}: {reason}")]
    InvalidVarint {
        /// Byte offset where the varint starts.
        offset: usize,
        /// Decoder message.
        reason: String,
    },
    /// Field number outside `1..=2^29-1`.
    #[error("invalid field number {number} at offset {offset}")]
    InvalidFieldNumber {
        /// Byte offset of the tag.
        offset: usize,
        /// Offending field number.
        number: u64,
    },
    /// Wire-type bits `6` or `7`.
    #[error("invalid wire type {bits} for field {number} at offset {offset}")]
    InvalidWireType {
        /// Byte offset of the tag.
        offset: usize,
        /// Field number carried by the tag.
        number: u32,
        /// Raw wire-type bits.
        bits: u8,
    },
    /// A value runs past the end of the buffer.
    #[error("field {number} at offset {offset} needs {needed} bytes but only {available} remain")]
    Truncated {
        /// Byte offset of the tag.
        offset: usize,
        /// Field number carried by the tag.
        number: u32,
        /// Bytes the value claims.
        needed: u64,
        /// Bytes left in the buffer.
        available: usize,
    },
    /// Start/end group records are not accepted.
    #[error("group encoding is not supported (field {number} at offset {offset})")]
    GroupNotSupported {
        /// Byte offset of the tag.
        offset: usize,
        /// Field number carried by the tag.
        number: u32,
    },
}

/// A decoded tag: field number plus the raw wire-type bits.
///
/// The wire type is kept raw so that callers can reject an unknown field
/// number before deciding whether the wire type is even valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    /// Field number.
    pub number: u32,
    /// Raw wire-type bits (`0..=7`).
    pub wire_bits: u8,
    /// Byte offset of the tag within the reader's buffer.
    pub offset: usize,
    /// Number of bytes the tag varint occupied.
    pub encoded_len: usize,
}

impl Tag {
    /// Returns the wire type, failing for bit patterns `6` and `7`.
    pub fn wire_type(&self) -> Result<WireType, WireError> {
        WireType::from_bits(self.wire_bits).ok_or(WireError::InvalidWireType {
            offset: self.offset,
            number: self.number,
            bits: self.wire_bits,
        })
    }

    /// The integer key this tag encodes.
    pub fn key(&self) -> u64 {
        (u64::from(self.number) << 3) | u64::from(self.wire_bits)
    }
}

/// Payload of a single field record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    /// Varint payload.
    Varint(u64),
    /// 8 byte little-endian payload.
    Fixed64(u64),
    /// 4 byte little-endian payload.
    Fixed32(u32),
    /// Length-delimited payload.
    Bytes(&'a [u8]),
}

/// One complete field record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRecord<'a> {
    /// The record's tag.
    pub tag: Tag,
    /// Validated wire type.
    pub wire_type: WireType,
    /// The record's payload.
    pub value: FieldValue<'a>,
    /// Bytes used by the varint value or by the length prefix; zero for fixed-width values.
    pub prefix_len: usize,
}

/// Cursor over a protobuf-encoded buffer.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Creates a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns `true` when every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    /// Reads one varint, returning its value and encoded length.
    pub fn read_varint(&mut self) -> Result<(u64, usize), WireError> {
        let offset = self.pos;
        let mut rest = &self.buf[self.pos..];
        let before = rest.len();
        let value = decode_varint(&mut rest).map_err(|err| WireError::InvalidVarint {
            offset,
            reason: err.to_string(),
        })?;
        let len = before - rest.len();
        self.pos += len;
        Ok((value, len))
    }

    /// Reads a little-endian `u32`.
    pub fn read_fixed32(&mut self, number: u32) -> Result<u32, WireError> {
        let offset = self.pos;
        let bytes = self.take(offset, number, 4)?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(arr))
    }

    /// Reads a little-endian `u64`.
    pub fn read_fixed64(&mut self, number: u32) -> Result<u64, WireError> {
        let offset = self.pos;
        let bytes = self.take(offset, number, 8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(arr))
    }

    /// Reads the next tag, or `None` at end of input.
    pub fn read_tag(&mut self) -> Result<Option<Tag>, WireError> {
        if self.is_empty() {
            return Ok(None);
        }
        let offset = self.pos;
        let (key, encoded_len) = self.read_varint()?;
        let number = key >> 3;
        if number < u64::from(MIN_FIELD_NUMBER) || number > u64::from(MAX_FIELD_NUMBER) {
            return Err(WireError::InvalidFieldNumber { offset, number });
        }
        Ok(Some(Tag {
            number: number as u32,
            wire_bits: (key & 0x7) as u8,
            offset,
            encoded_len,
        }))
    }

    /// Reads the value that follows `tag`.
    ///
    /// Returns the value, the validated wire type and the prefix length
    /// described on [`FieldRecord::prefix_len`].
    pub fn read_value(
        &mut self,
        tag: &Tag,
    ) -> Result<(WireType, FieldValue<'a>, usize), WireError> {
        let wire_type = tag.wire_type()?;
        match wire_type {
            WireType::Varint => {
                let (value, len) = self.read_varint()?;
                Ok((wire_type, FieldValue::Varint(value), len))
            }
            WireType::Fixed64 => {
                let value = self.read_fixed64(tag.number)?;
                Ok((wire_type, FieldValue::Fixed64(value), 0))
            }
            WireType::Fixed32 => {
                let value = self.read_fixed32(tag.number)?;
                Ok((wire_type, FieldValue::Fixed32(value), 0))
            }
            WireType::LengthDelimited => {
                let (len, prefix_len) = self.read_varint()?;
                let data = self.take(tag.offset, tag.number, len)?;
                Ok((wire_type, FieldValue::Bytes(data), prefix_len))
            }
            WireType::StartGroup | WireType::EndGroup => Err(WireError::GroupNotSupported {
                offset: tag.offset,
                number: tag.number,
            }),
        }
    }

    /// Reads the next complete record, or `None` at end of input.
    pub fn next_record(&mut self) -> Result<Option<FieldRecord<'a>>, WireError> {
        let Some(tag) = self.read_tag()? else {
            return Ok(None);
        };
        let (wire_type, value, prefix_len) = self.read_value(&tag)?;
        Ok(Some(FieldRecord {
            tag,
            wire_type,
            value,
            prefix_len,
        }))
    }

    fn take(&mut self, offset: usize, number: u32, len: u64) -> Result<&'a [u8], WireError> {
        let available = self.remaining();
        if len > available as u64 {
            return Err(WireError::Truncated {
                offset,
                number,
                needed: len,
                available,
            });
        }
        let start = self.pos;
        let end = start + len as usize;
        self.pos = end;
        Ok(&self.buf[start..end])
    }
}

/// Returns `true` when `len` is the shortest possible varint length for `value`.
pub fn is_minimal_varint(value: u64, len: usize) -> bool {
    prost::encoding::encoded_len_varint(value) == len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_varint_and_bytes_records() {
        // field 1 varint 150, field 2 bytes "hi"
        let buf = [0x08, 0x96, 0x01, 0x12, 0x02, b'h', b'i'];
        let mut reader = WireReader::new(&buf);

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!(first.tag.number, 1);
        assert_eq!(first.value, FieldValue::Varint(150));
        assert_eq!(first.prefix_len, 2);

        let second = reader.next_record().unwrap().unwrap();
        assert_eq!(second.tag.number, 2);
        assert_eq!(second.value, FieldValue::Bytes(b"hi"));
        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn rejects_field_number_zero() {
        let mut reader = WireReader::new(&[0x00, 0x01]);
        assert!(matches!(
            reader.read_tag(),
            Err(WireError::InvalidFieldNumber { number: 0, .. })
        ));
    }

    #[test]
    fn reports_invalid_wire_type_after_tag() {
        // field 1, wire type 7
        let mut reader = WireReader::new(&[0x0f, 0x00]);
        let tag = reader.read_tag().unwrap().unwrap();
        assert_eq!(tag.number, 1);
        assert!(matches!(
            reader.read_value(&tag),
            Err(WireError::InvalidWireType { bits: 7, .. })
        ));
    }

    #[test]
    fn rejects_overrunning_length() {
        let mut reader = WireReader::new(&[0x0a, 0x05, 0x01]);
        assert!(matches!(
            reader.next_record(),
            Err(WireError::Truncated { needed: 5, available: 1, .. })
        ));
    }

    #[test]
    fn rejects_groups() {
        let mut reader = WireReader::new(&[0x0b]);
        assert!(matches!(
            reader.next_record(),
            Err(WireError::GroupNotSupported { number: 1, .. })
        ));
    }

    #[test]
    fn rejects_truncated_varint() {
        let mut reader = WireReader::new(&[0x08, 0x80]);
        assert!(matches!(
            reader.next_record(),
            Err(WireError::InvalidVarint { offset: 1, .. })
        ));
    }

    #[test]
    fn minimal_varint_lengths() {
        assert!(is_minimal_varint(0, 1));
        assert!(is_minimal_varint(127, 1));
        assert!(!is_minimal_varint(127, 2));
        assert!(is_minimal_varint(128, 2));
    }
}
