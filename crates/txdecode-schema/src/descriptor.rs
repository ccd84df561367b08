use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use txdecode_canonical::{FullName, ValidationError, WireType};

/// Value kind of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `uint32`
    Uint32,
    /// `uint64`
    Uint64,
    /// `sint32` (zig-zag)
    Sint32,
    /// `sint64` (zig-zag)
    Sint64,
    /// `bool`
    Bool,
    /// Any enum; kept as its raw `i32`.
    Enum,
    /// `fixed32`
    Fixed32,
    /// `fixed64`
    Fixed64,
    /// `sfixed32`
    Sfixed32,
    /// `sfixed64`
    Sfixed64,
    /// `float`
    Float,
    /// `double`
    Double,
    /// UTF-8 `string`
    String,
    /// `bytes`
    Bytes,
    /// Nested message of the named type.
    Message(FullName),
}

impl FieldKind {
    /// Wire type of one unpacked value of this kind.
    pub fn wire_type(&self) -> WireType {
        match self {
            FieldKind::Int32
            | FieldKind::Int64
            | FieldKind::Uint32
            | FieldKind::Uint64
            | FieldKind::Sint32
            | FieldKind::Sint64
            | FieldKind::Bool
            | FieldKind::Enum => WireType::Varint,
            FieldKind::Fixed32 | FieldKind::Sfixed32 | FieldKind::Float => WireType::Fixed32,
            FieldKind::Fixed64 | FieldKind::Sfixed64 | FieldKind::Double => WireType::Fixed64,
            FieldKind::String | FieldKind::Bytes | FieldKind::Message(_) => {
                WireType::LengthDelimited
            }
        }
    }

    /// Whether repeated values of this kind may be packed into one record.
    pub fn is_packable(&self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }

    /// The referenced message type, if any.
    pub fn message_type(&self) -> Option<&FullName> {
        match self {
            FieldKind::Message(name) => Some(name),
            _ => None,
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field number.
    pub number: u32,
    /// Field name.
    pub name: String,
    /// Value kind.
    pub kind: FieldKind,
    /// Whether the field is repeated.
    #[serde(default)]
    pub repeated: bool,
}

/// Structural description of one message type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    /// Fully-qualified name.
    pub full_name: FullName,
    /// Declared fields, ordered by number once registered.
    pub fields: Vec<FieldDescriptor>,
    /// Field-number ranges a lenient scan tolerates without understanding.
    #[serde(default)]
    pub non_critical_ranges: Vec<RangeInclusive<u32>>,
    /// Field numbers sharing any bit with this mask are also tolerated.
    #[serde(default)]
    pub non_critical_mask: u32,
    /// Names of the fields that carry this message's required signers.
    #[serde(default)]
    pub signer_fields: Vec<String>,
}

impl MessageDescriptor {
    /// Starts an empty descriptor.
    pub fn new(full_name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            full_name: FullName::parse(full_name)?,
            fields: Vec::new(),
            non_critical_ranges: Vec::new(),
            non_critical_mask: 0,
            signer_fields: Vec::new(),
        })
    }

    /// Adds a singular field.
    pub fn field(mut self, number: u32, name: &str, kind: FieldKind) -> Self {
        self.push(number, name, kind, false);
        self
    }

    /// Adds a repeated field.
    pub fn repeated(mut self, number: u32, name: &str, kind: FieldKind) -> Self {
        self.push(number, name, kind, true);
        self
    }

    /// Declares a tolerated non-critical range.
    pub fn non_critical(mut self, range: RangeInclusive<u32>) -> Self {
        self.non_critical_ranges.push(range);
        self
    }

    /// Declares every field number with a bit of `mask` set as non-critical.
    pub fn non_critical_bits(mut self, mask: u32) -> Self {
        self.non_critical_mask |= mask;
        self
    }

    /// Declares the signer-carrying fields.
    pub fn signers(mut self, fields: &[&str]) -> Self {
        self.signer_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    fn push(&mut self, number: u32, name: &str, kind: FieldKind, repeated: bool) {
        self.fields.push(FieldDescriptor {
            number,
            name: name.to_string(),
            kind,
            repeated,
        });
        self.fields.sort_by_key(|f| f.number);
    }

    /// Looks up a field by number.
    pub fn find_field(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }

    /// Looks up a field by name.
    pub fn find_field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whether an undeclared `number` is tolerated by a range or the mask.
    pub fn is_non_critical(&self, number: u32) -> bool {
        number & self.non_critical_mask != 0
            || self.non_critical_ranges.iter().any(|r| r.contains(&number))
    }
}

/// A schema file: a package of messages plus the files it imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// File name, unique within a registry.
    pub name: String,
    /// Package every message name must start with.
    #[serde(default)]
    pub package: String,
    /// Names of imported files.
    #[serde(default)]
    pub imports: Vec<String>,
    /// Declared messages.
    #[serde(default)]
    pub messages: Vec<MessageDescriptor>,
}

impl FileDescriptor {
    /// Starts an empty file.
    pub fn new(name: &str, package: &str) -> Self {
        Self {
            name: name.to_string(),
            package: package.to_string(),
            imports: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Adds an import.
    pub fn import(mut self, file: &str) -> Self {
        self.imports.push(file.to_string());
        self
    }

    /// Adds a message.
    pub fn message(mut self, message: MessageDescriptor) -> Self {
        self.messages.push(message);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_fields_sorted() {
        let desc = MessageDescriptor::new("test.Msg")
            .unwrap()
            .field(3, "c", FieldKind::Bool)
            .field(1, "a", FieldKind::String);
        let numbers: Vec<u32> = desc.fields.iter().map(|f| f.number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(desc.find_field_by_name("c").unwrap().number, 3);
    }

    #[test]
    fn non_critical_ranges_are_inclusive() {
        let desc = MessageDescriptor::new("test.Msg")
            .unwrap()
            .non_critical(1024..=2047);
        assert!(desc.is_non_critical(1024));
        assert!(desc.is_non_critical(2047));
        assert!(!desc.is_non_critical(2048));
        assert!(!desc.is_non_critical(5));
    }

    #[test]
    fn non_critical_mask_matches_any_set_bit() {
        let desc = MessageDescriptor::new("test.Msg").unwrap().non_critical_bits(1024);
        for number in [1024, 2047, 3072, 1025 + 4096] {
            assert!(desc.is_non_critical(number), "{number}");
        }
        for number in [1023, 2048, 4095 - 1024] {
            assert!(!desc.is_non_critical(number), "{number}");
        }
    }

    #[test]
    fn packable_kinds() {
        assert!(FieldKind::Uint64.is_packable());
        assert!(FieldKind::Double.is_packable());
        assert!(!FieldKind::Bytes.is_packable());
        assert!(!FieldKind::Message(FullName::parse("a.B").unwrap()).is_packable());
    }

    #[test]
    fn kind_json_shape() {
        let kind: FieldKind = serde_json::from_str(r#"{"message":"cosmos.base.v1beta1.Coin"}"#).unwrap();
        assert_eq!(kind.message_type().unwrap().as_str(), "cosmos.base.v1beta1.Coin");
        let scalar: FieldKind = serde_json::from_str(r#""uint64""#).unwrap();
        assert_eq!(scalar, FieldKind::Uint64);
    }
}
