//! Schema-driven generic messages.
//!
//! A [`DynamicMessage`] is a field-number-indexed value map built purely from
//! a [`MessageDescriptor`]. It lets the pipeline inspect message types whose
//! native Rust type is not compiled into the binary.
//!
//! `Any` fields are kept packed, but their payload must decode against the
//! descriptor the type URL names.

use std::collections::BTreeMap;
use std::sync::Arc;

use txdecode_canonical::{FieldValue, FullName, WireError, WireReader, WireType};

use crate::any::{is_any, payload_descriptor};
use crate::descriptor::{FieldDescriptor, FieldKind, MessageDescriptor};
use crate::errors::SchemaError;
use crate::limits::{Budget, WalkLimits};
use crate::registry::DescriptorResolver;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `int32`, `sint32`, `sfixed32`
    I32(i32),
    /// `int64`, `sint64`, `sfixed64`
    I64(i64),
    /// `uint32`, `fixed32`
    U32(u32),
    /// `uint64`, `fixed64`
    U64(u64),
    /// `bool`
    Bool(bool),
    /// `float`
    F32(f32),
    /// `double`
    F64(f64),
    /// `string`
    Str(String),
    /// `bytes`
    Bytes(Vec<u8>),
    /// Raw enum number.
    Enum(i32),
    /// Nested message.
    Message(DynamicMessage),
    /// Elements of a repeated field, in wire order.
    List(Vec<Value>),
}

impl Value {
    /// Borrow as bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow as a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Any unsigned integer, widened.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            Value::U32(v) => Some(u64::from(*v)),
            _ => None,
        }
    }

    /// Borrow as a nested message.
    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(m) => Some(m),
            _ => None,
        }
    }

    /// Borrow as the elements of a repeated field.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// Field-indexed message instance backed by a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: Arc<MessageDescriptor>,
    fields: BTreeMap<u32, Value>,
}

impl DynamicMessage {
    /// An empty instance of `descriptor`.
    pub fn new(descriptor: Arc<MessageDescriptor>) -> Self {
        Self {
            descriptor,
            fields: BTreeMap::new(),
        }
    }

    /// Decodes `bytes` as `descriptor`, rejecting any undeclared field.
    pub fn decode(
        bytes: &[u8],
        descriptor: Arc<MessageDescriptor>,
        resolver: &dyn DescriptorResolver,
        limits: WalkLimits,
    ) -> Result<Self, SchemaError> {
        let mut message = Self::new(descriptor);
        message.merge(bytes, resolver, limits)?;
        Ok(message)
    }

    /// Merges `bytes` into this instance with protobuf merge semantics.
    pub fn merge(
        &mut self,
        bytes: &[u8],
        resolver: &dyn DescriptorResolver,
        limits: WalkLimits,
    ) -> Result<(), SchemaError> {
        let mut budget = Budget::new(limits);
        self.merge_with(bytes, resolver, &mut budget)
    }

    /// The backing descriptor.
    pub fn descriptor(&self) -> &Arc<MessageDescriptor> {
        &self.descriptor
    }

    /// The message's full name.
    pub fn full_name(&self) -> &FullName {
        &self.descriptor.full_name
    }

    /// Value of field `number`, if present.
    pub fn get(&self, number: u32) -> Option<&Value> {
        self.fields.get(&number)
    }

    /// Value of the field called `name`, if declared and present.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let field = self.descriptor.find_field_by_name(name)?;
        self.fields.get(&field.number)
    }

    /// Present fields with their descriptors, ordered by number.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDescriptor, &Value)> {
        self.fields.iter().filter_map(|(number, value)| {
            self.descriptor.find_field(*number).map(|field| (field, value))
        })
    }

    /// Whether no field is present.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn merge_with(
        &mut self,
        bytes: &[u8],
        resolver: &dyn DescriptorResolver,
        budget: &mut Budget,
    ) -> Result<(), SchemaError> {
        budget.enter()?;
        let descriptor = Arc::clone(&self.descriptor);
        let wire_err = |source: WireError| SchemaError::Wire {
            message: descriptor.full_name.to_string(),
            source,
        };

        let mut reader = WireReader::new(bytes);
        while let Some(tag) = reader.read_tag().map_err(wire_err)? {
            budget.count_field()?;
            let Some(field) = descriptor.find_field(tag.number) else {
                return Err(SchemaError::UnknownField {
                    message: descriptor.full_name.to_string(),
                    number: tag.number,
                    wire_bits: tag.wire_bits,
                });
            };
            let (wire_type, raw, _) = reader.read_value(&tag).map_err(wire_err)?;
            let expected = field.kind.wire_type();

            if field.repeated && field.kind.is_packable() && wire_type == WireType::LengthDelimited {
                let FieldValue::Bytes(packed) = raw else {
                    unreachable!("length-delimited records carry bytes")
                };
                let items = unpack(&descriptor, field, packed)?;
                self.list_mut(field.number).extend(items);
                continue;
            }

            if wire_type != expected {
                return Err(SchemaError::WireTypeMismatch {
                    message: descriptor.full_name.to_string(),
                    field: field.name.clone(),
                    number: field.number,
                    expected,
                    actual: wire_type,
                });
            }

            if let FieldKind::Message(target) = &field.kind {
                let FieldValue::Bytes(data) = raw else {
                    unreachable!("length-delimited records carry bytes")
                };
                if field.repeated {
                    let nested = resolver.find_message(target)?;
                    let mut item = DynamicMessage::new(nested);
                    item.merge_with(data, resolver, budget)?;
                    item.check_packed(resolver, budget)?;
                    self.list_mut(field.number).push(Value::Message(item));
                } else {
                    match self.fields.get_mut(&field.number) {
                        Some(Value::Message(existing)) => {
                            existing.merge_with(data, resolver, budget)?;
                            existing.check_packed(resolver, budget)?;
                        }
                        _ => {
                            let nested = resolver.find_message(target)?;
                            let mut item = DynamicMessage::new(nested);
                            item.merge_with(data, resolver, budget)?;
                            item.check_packed(resolver, budget)?;
                            self.fields.insert(field.number, Value::Message(item));
                        }
                    }
                }
                continue;
            }

            let value = scalar(&descriptor, field, raw)?;
            if field.repeated {
                self.list_mut(field.number).push(value);
            } else {
                self.fields.insert(field.number, value);
            }
        }

        budget.leave();
        Ok(())
    }

    /// For an `Any`, decodes the packed payload against its own descriptor.
    /// The payload stays packed; only its validity is checked.
    fn check_packed(
        &self,
        resolver: &dyn DescriptorResolver,
        budget: &mut Budget,
    ) -> Result<(), SchemaError> {
        if !is_any(self.full_name()) {
            return Ok(());
        }
        let type_url = self.get(1).and_then(Value::as_str).unwrap_or_default();
        let value = self.get(2).and_then(Value::as_bytes).unwrap_or_default();
        let payload = payload_descriptor(type_url, resolver)?;
        DynamicMessage::new(payload).merge_with(value, resolver, budget)
    }

    fn list_mut(&mut self, number: u32) -> &mut Vec<Value> {
        let entry = self
            .fields
            .entry(number)
            .or_insert_with(|| Value::List(Vec::new()));
        if !matches!(entry, Value::List(_)) {
            *entry = Value::List(Vec::new());
        }
        match entry {
            Value::List(items) => items,
            _ => unreachable!("entry was just made a list"),
        }
    }
}

fn unpack(
    descriptor: &MessageDescriptor,
    field: &FieldDescriptor,
    packed: &[u8],
) -> Result<Vec<Value>, SchemaError> {
    let wire_err = |source: WireError| SchemaError::Wire {
        message: descriptor.full_name.to_string(),
        source,
    };
    let mut reader = WireReader::new(packed);
    let mut items = Vec::new();
    while !reader.is_empty() {
        let raw = match field.kind.wire_type() {
            WireType::Varint => FieldValue::Varint(reader.read_varint().map_err(wire_err)?.0),
            WireType::Fixed32 => FieldValue::Fixed32(reader.read_fixed32(field.number).map_err(wire_err)?),
            WireType::Fixed64 => FieldValue::Fixed64(reader.read_fixed64(field.number).map_err(wire_err)?),
            _ => unreachable!("only packable kinds are unpacked"),
        };
        items.push(scalar(descriptor, field, raw)?);
    }
    Ok(items)
}

fn scalar(
    descriptor: &MessageDescriptor,
    field: &FieldDescriptor,
    raw: FieldValue<'_>,
) -> Result<Value, SchemaError> {
    let value = match (&field.kind, raw) {
        (FieldKind::Int32, FieldValue::Varint(v)) => Value::I32(v as i32),
        (FieldKind::Int64, FieldValue::Varint(v)) => Value::I64(v as i64),
        (FieldKind::Uint32, FieldValue::Varint(v)) => Value::U32(v as u32),
        (FieldKind::Uint64, FieldValue::Varint(v)) => Value::U64(v),
        (FieldKind::Sint32, FieldValue::Varint(v)) => {
            let n = v as u32;
            Value::I32(((n >> 1) as i32) ^ -((n & 1) as i32))
        }
        (FieldKind::Sint64, FieldValue::Varint(v)) => {
            Value::I64(((v >> 1) as i64) ^ -((v & 1) as i64))
        }
        (FieldKind::Bool, FieldValue::Varint(v)) => Value::Bool(v != 0),
        (FieldKind::Enum, FieldValue::Varint(v)) => Value::Enum(v as i32),
        (FieldKind::Fixed32, FieldValue::Fixed32(v)) => Value::U32(v),
        (FieldKind::Sfixed32, FieldValue::Fixed32(v)) => Value::I32(v as i32),
        (FieldKind::Float, FieldValue::Fixed32(v)) => Value::F32(f32::from_bits(v)),
        (FieldKind::Fixed64, FieldValue::Fixed64(v)) => Value::U64(v),
        (FieldKind::Sfixed64, FieldValue::Fixed64(v)) => Value::I64(v as i64),
        (FieldKind::Double, FieldValue::Fixed64(v)) => Value::F64(f64::from_bits(v)),
        (FieldKind::Bytes, FieldValue::Bytes(b)) => Value::Bytes(b.to_vec()),
        (FieldKind::String, FieldValue::Bytes(b)) => {
            let s = std::str::from_utf8(b).map_err(|err| SchemaError::InvalidValue {
                message: descriptor.full_name.to_string(),
                field: field.name.clone(),
                reason: format!("invalid UTF-8: {}", err),
            })?;
            Value::Str(s.to_string())
        }
        (kind, _) => {
            return Err(SchemaError::InvalidValue {
                message: descriptor.full_name.to_string(),
                field: field.name.clone(),
                reason: format!("value does not fit kind {:?}", kind),
            })
        }
    };
    Ok(value)
}
