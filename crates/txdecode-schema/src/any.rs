//! Packed `google.protobuf.Any` payloads.
//!
//! Both walkers treat an `Any` as a pointer to another message: the
//! `type_url` is resolved to a descriptor and the packed `value` is checked
//! against it. Payloads are always checked strictly.

use std::sync::Arc;

use txdecode_canonical::{FieldValue, FullName, TypeUrl, WireError, WireReader};

use crate::descriptor::MessageDescriptor;
use crate::envelope::ANY;
use crate::errors::SchemaError;
use crate::registry::DescriptorResolver;

const TYPE_URL: u32 = 1;
const VALUE: u32 = 2;

pub(crate) fn is_any(name: &FullName) -> bool {
    name.as_str() == ANY
}

/// The two fields of an encoded `Any`. Later occurrences win.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PackedAny<'a> {
    pub(crate) type_url: &'a str,
    pub(crate) value: &'a [u8],
}

impl<'a> PackedAny<'a> {
    /// Splits encoded `Any` bytes. Wire types are assumed already checked.
    pub(crate) fn read(bytes: &'a [u8]) -> Result<Self, SchemaError> {
        let wire_err = |source: WireError| SchemaError::Wire {
            message: ANY.to_string(),
            source,
        };
        let mut packed = Self::default();
        let mut reader = WireReader::new(bytes);
        while let Some(tag) = reader.read_tag().map_err(wire_err)? {
            let (_, raw, _) = reader.read_value(&tag).map_err(wire_err)?;
            match (tag.number, raw) {
                (TYPE_URL, FieldValue::Bytes(data)) => {
                    packed.type_url =
                        std::str::from_utf8(data).map_err(|err| SchemaError::InvalidValue {
                            message: ANY.to_string(),
                            field: "type_url".to_string(),
                            reason: format!("invalid UTF-8: {}", err),
                        })?;
                }
                (VALUE, FieldValue::Bytes(data)) => packed.value = data,
                _ => {}
            }
        }
        Ok(packed)
    }

    /// Descriptor of the packed message.
    pub(crate) fn descriptor(
        &self,
        resolver: &dyn DescriptorResolver,
    ) -> Result<Arc<MessageDescriptor>, SchemaError> {
        payload_descriptor(self.type_url, resolver)
    }
}

/// Resolves a type URL. An empty or malformed URL is reported as not found.
pub(crate) fn payload_descriptor(
    type_url: &str,
    resolver: &dyn DescriptorResolver,
) -> Result<Arc<MessageDescriptor>, SchemaError> {
    let name = TypeUrl::parse(type_url)
        .and_then(|url| url.message_name())
        .map_err(|_| SchemaError::DescriptorNotFound(type_url.to_string()))?;
    resolver.find_message(&name)
}
